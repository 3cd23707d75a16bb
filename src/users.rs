use sqlx::SqlitePool;
use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub last_seen: Option<i64>,
    pub private_profile: bool,
}

impl User {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// Empty for private profiles and users never seen online.
    pub fn last_seen_label(&self) -> String {
        if self.private_profile {
            return String::new();
        }
        match self.last_seen {
            Some(unix) => format!("last seen {}", crate::ago(unix)),
            None => String::new(),
        }
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("a user with that username already exists")]
    DuplicateUsername,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// A user-supplied identifier: either a numeric id or a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    ById(i64),
    ByUsername(String),
}

impl UserRef {
    pub fn parse(raw: &str) -> UserRef {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => UserRef::ById(id),
            Err(_) => UserRef::ByUsername(raw.to_owned()),
        }
    }
}

pub async fn create_user(db_pool: &SqlitePool, new_user: NewUser) -> Result<User, CreateUserError> {
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password, display_name, avatar) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(&new_user.username)
    .bind(&new_user.password_hash)
    .bind(&new_user.display_name)
    .bind(&new_user.avatar)
    .fetch_one(db_pool)
    .await;

    match result {
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(CreateUserError::DuplicateUsername)
        }
        other => Ok(other?),
    }
}

pub async fn find_by_id(db_pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_username(db_pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(db_pool)
        .await
}

pub async fn resolve(db_pool: &SqlitePool, user_ref: &UserRef) -> sqlx::Result<Option<User>> {
    match user_ref {
        UserRef::ById(id) => find_by_id(db_pool, *id).await,
        UserRef::ByUsername(username) => find_by_username(db_pool, username).await,
    }
}

/// Overwrites display name and bio; the avatar reference only changes
/// when a new one is supplied.
pub async fn update_profile(
    db_pool: &SqlitePool,
    user_id: i64,
    display_name: &str,
    bio: &str,
    avatar: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE users SET display_name = ?, bio = ?, avatar = COALESCE(?, avatar) WHERE id = ?",
    )
    .bind(display_name)
    .bind(bio)
    .bind(avatar)
    .bind(user_id)
    .execute(db_pool)
    .await?;
    Ok(())
}

pub async fn touch_last_seen(db_pool: &SqlitePool, user_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET last_seen = ? WHERE id = ?")
        .bind(OffsetDateTime::now_utc().unix_timestamp())
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Everyone except the given user, for the home page.
pub async fn list_others(db_pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id != ? ORDER BY id")
        .bind(user_id)
        .fetch_all(db_pool)
        .await
}

#[cfg(test)]
pub(crate) async fn test_user(db_pool: &SqlitePool, username: &str) -> User {
    create_user(
        db_pool,
        NewUser {
            username: username.to_owned(),
            password_hash: "x".to_owned(),
            display_name: None,
            avatar: None,
        },
    )
    .await
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn creates_and_finds_users() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;

        assert_eq!(find_by_id(&pool, alice.id).await.unwrap().unwrap().username, "alice");
        assert_eq!(find_by_username(&pool, "alice").await.unwrap().unwrap().id, alice.id);
        assert!(find_by_username(&pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_without_a_second_row() {
        let pool = db::test_pool().await;
        test_user(&pool, "alice").await;

        let err = create_user(
            &pool,
            NewUser {
                username: "alice".to_owned(),
                password_hash: "y".to_owned(),
                display_name: Some("Other Alice".to_owned()),
                avatar: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CreateUserError::DuplicateUsername));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = 'alice'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn user_ref_parses_ids_and_usernames() {
        assert_eq!(UserRef::parse(" 42 "), UserRef::ById(42));
        assert_eq!(UserRef::parse("bob"), UserRef::ByUsername("bob".to_owned()));

        // usernames that merely contain digits are still usernames
        assert_eq!(UserRef::parse("bob7"), UserRef::ByUsername("bob7".to_owned()));
    }

    #[tokio::test]
    async fn resolve_looks_up_either_variant() {
        let pool = db::test_pool().await;
        let bob = test_user(&pool, "bob").await;

        let by_id = resolve(&pool, &UserRef::ById(bob.id)).await.unwrap().unwrap();
        let by_name = resolve(&pool, &UserRef::ByUsername("bob".to_owned()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, by_name.id);

        assert!(resolve(&pool, &UserRef::ById(9999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_profile_keeps_avatar_unless_replaced() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;

        update_profile(&pool, alice.id, "Alice", "hi", Some("alice.png"))
            .await
            .unwrap();
        update_profile(&pool, alice.id, "Alice A.", "hello", None)
            .await
            .unwrap();

        let alice = find_by_id(&pool, alice.id).await.unwrap().unwrap();
        assert_eq!(alice.display_name.as_deref(), Some("Alice A."));
        assert_eq!(alice.bio.as_deref(), Some("hello"));
        assert_eq!(alice.avatar.as_deref(), Some("alice.png"));
    }

    #[tokio::test]
    async fn touch_last_seen_records_a_timestamp() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        assert!(alice.last_seen.is_none());

        touch_last_seen(&pool, alice.id).await.unwrap();
        let alice = find_by_id(&pool, alice.id).await.unwrap().unwrap();
        assert!(alice.last_seen.is_some());
    }

    #[tokio::test]
    async fn list_others_excludes_the_caller() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        test_user(&pool, "bob").await;

        let others = list_others(&pool, alice.id).await.unwrap();
        assert!(others.iter().all(|u| u.id != alice.id));
        // the seeded bot plus bob
        assert!(others.iter().any(|u| u.username == "bob"));
        assert!(others.iter().any(|u| u.username == db::BOT_USERNAME));
    }
}
