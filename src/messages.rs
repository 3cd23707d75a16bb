use axum::{
    Form, Router, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::{AppResult, AppState, include_res, session, users};

pub fn router() -> Router<AppState> {
    Router::new().route("/chat/{recipient_id}", get(chat).post(send_message))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub content: String,
    pub timestamp: i64,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("messages cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub async fn send(
    db_pool: &SqlitePool,
    sender_id: i64,
    recipient_id: i64,
    content: &str,
) -> Result<Message, MessageError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(MessageError::EmptyMessage);
    }

    Ok(sqlx::query_as::<_, Message>(
        "INSERT INTO messages (sender_id, recipient_id, content, timestamp) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(content)
    .bind(OffsetDateTime::now_utc().unix_timestamp())
    .fetch_one(db_pool)
    .await?)
}

/// Every message exchanged between the two users, oldest first. The id
/// breaks ties between messages sharing a timestamp.
pub async fn thread_between(
    db_pool: &SqlitePool,
    user_a: i64,
    user_b: i64,
) -> sqlx::Result<Vec<Message>> {
    sqlx::query_as(
        "SELECT * FROM messages \
         WHERE (sender_id = ?1 AND recipient_id = ?2) \
            OR (sender_id = ?2 AND recipient_id = ?1) \
         ORDER BY timestamp ASC, id ASC",
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_all(db_pool)
    .await
}

fn render_content(content: &str) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, pulldown_cmark::Parser::new(content));
    html
}

#[debug_handler]
pub(crate) async fn chat(
    Path(recipient_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(recipient) = users::find_by_id(&db_pool, recipient_id).await? else {
        session::flash(&session, "error", "User not found").await?;
        return Ok(Redirect::to("/").into_response());
    };

    let mut items = String::new();
    for message in thread_between(&db_pool, me.id, recipient.id).await? {
        let sender = if message.sender_id == me.id { &me } else { &recipient };
        items += &include_res!(str, "/pages/message.html")
            .replace("{sender}", sender.name())
            .replace("{content}", &render_content(&message.content))
            .replace("{time}", &crate::ago(message.timestamp));
    }

    let body = include_res!(str, "/pages/chat.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{recipient_id}", &recipient.id.to_string())
        .replace("{recipient_name}", recipient.name())
        .replace("{messages}", &items);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct MessageForm {
    content: String,
}

#[debug_handler]
pub(crate) async fn send_message(
    Path(recipient_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(MessageForm { content }): Form<MessageForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    if users::find_by_id(&db_pool, recipient_id).await?.is_none() {
        session::flash(&session, "error", "User not found").await?;
        return Ok(Redirect::to("/").into_response());
    }

    match send(&db_pool, me.id, recipient_id, &content).await {
        Ok(_) => {}
        Err(MessageError::EmptyMessage) => {
            session::flash(&session, "error", "Message cannot be empty").await?;
        }
        Err(MessageError::Db(e)) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/chat/{recipient_id}")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, users::test_user};

    #[tokio::test]
    async fn empty_and_whitespace_messages_are_rejected() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;

        for body in ["", "   ", "\n\t"] {
            let err = send(&pool, alice.id, bob.id, body).await.unwrap_err();
            assert!(matches!(err, MessageError::EmptyMessage));
        }

        assert!(thread_between(&pool, alice.id, bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn thread_is_ordered_and_two_party_only() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;
        let carol = test_user(&pool, "carol").await;

        // sent within the same second, so ordering falls back to ids
        send(&pool, alice.id, bob.id, "one").await.unwrap();
        send(&pool, bob.id, alice.id, "two").await.unwrap();
        send(&pool, alice.id, bob.id, "three").await.unwrap();
        send(&pool, carol.id, alice.id, "psst").await.unwrap();
        send(&pool, bob.id, carol.id, "hey").await.unwrap();

        let thread = thread_between(&pool, alice.id, bob.id).await.unwrap();
        let bodies: Vec<_> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(bodies, ["one", "two", "three"]);

        // symmetric view
        let reverse = thread_between(&pool, bob.id, alice.id).await.unwrap();
        assert_eq!(reverse.len(), 3);
    }

    #[tokio::test]
    async fn sent_messages_are_timestamped() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;

        let message = send(&pool, alice.id, bob.id, "hello").await.unwrap();
        assert!(message.timestamp > 0);
        assert_eq!(message.sender_id, alice.id);
        assert_eq!(message.recipient_id, bob.id);
    }
}
