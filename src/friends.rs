use axum::{
    Form, Router, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, AppState, include_res, session,
    users::{self, User, UserRef},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/friends", get(friends_page).post(add_friend))
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyFriends,
}

/// Inserts the edge unless one already exists in either direction. The
/// check and the insert are a single statement, so two concurrent adds
/// for the same pair cannot both succeed.
pub async fn add_friendship(
    db_pool: &SqlitePool,
    user_id: i64,
    friend_id: i64,
) -> sqlx::Result<AddOutcome> {
    let result = sqlx::query(
        "INSERT INTO friendships (user_id, friend_id) \
         SELECT ?1, ?2 \
         WHERE NOT EXISTS (\
             SELECT 1 FROM friendships \
             WHERE (user_id = ?1 AND friend_id = ?2) \
                OR (user_id = ?2 AND friend_id = ?1))",
    )
    .bind(user_id)
    .bind(friend_id)
    .execute(db_pool)
    .await?;

    Ok(if result.rows_affected() == 0 {
        AddOutcome::AlreadyFriends
    } else {
        AddOutcome::Added
    })
}

/// Friends in either direction, resolved to users, oldest edge first.
pub async fn friends_of(db_pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as(
        "SELECT u.* FROM friendships f \
         JOIN users u ON u.id = CASE WHEN f.user_id = ?1 THEN f.friend_id ELSE f.user_id END \
         WHERE f.user_id = ?1 OR f.friend_id = ?1 \
         ORDER BY f.id",
    )
    .bind(user_id)
    .fetch_all(db_pool)
    .await
}

#[debug_handler]
pub(crate) async fn friends_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let mut items = String::new();
    for friend in friends_of(&db_pool, me.id).await? {
        items += &include_res!(str, "/pages/friend_item.html")
            .replace("{id}", &friend.id.to_string())
            .replace("{name}", friend.name())
            .replace("{username}", &friend.username);
    }

    let body = include_res!(str, "/pages/friends.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{friend_items}", &items);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct FriendSearchForm {
    search_type: String,
    query: String,
}

#[debug_handler]
pub(crate) async fn add_friend(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(FriendSearchForm { search_type, query }): Form<FriendSearchForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let user_ref = match search_type.as_str() {
        "id" => query.trim().parse::<i64>().ok().map(UserRef::ById),
        _ => Some(UserRef::ByUsername(query.trim().to_owned())),
    };

    let found = match &user_ref {
        Some(user_ref) => users::resolve(&db_pool, user_ref).await?,
        None => None,
    };

    match found {
        Some(user) if user.id != me.id => {
            match add_friendship(&db_pool, me.id, user.id).await? {
                AddOutcome::Added => {
                    session::flash(&session, "success", "Friend added!").await?;
                }
                AddOutcome::AlreadyFriends => {
                    session::flash(&session, "info", "Already friends!").await?;
                }
            }
        }
        _ => {
            session::flash(&session, "error", "User not found!").await?;
        }
    }

    Ok(Redirect::to("/friends").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, users::test_user};

    #[tokio::test]
    async fn a_pair_has_at_most_one_friendship() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;

        assert_eq!(add_friendship(&pool, alice.id, bob.id).await.unwrap(), AddOutcome::Added);
        assert_eq!(
            add_friendship(&pool, bob.id, alice.id).await.unwrap(),
            AddOutcome::AlreadyFriends
        );
        assert_eq!(
            add_friendship(&pool, alice.id, bob.id).await.unwrap(),
            AddOutcome::AlreadyFriends
        );

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM friendships")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn friendships_are_visible_from_both_ends() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;
        let carol = test_user(&pool, "carol").await;

        add_friendship(&pool, alice.id, bob.id).await.unwrap();
        add_friendship(&pool, carol.id, alice.id).await.unwrap();

        let of_alice: Vec<_> = friends_of(&pool, alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(of_alice, ["bob", "carol"]);

        let of_bob: Vec<_> = friends_of(&pool, bob.id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(of_bob, ["alice"]);

        assert!(friends_of(&pool, bob.id).await.unwrap().iter().all(|u| u.id != bob.id));
    }
}
