mod new;
mod room;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    AppState,
    users::{self, User, UserRef},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create_chat", get(new::create_chat_page).post(new::create_chat))
        .route("/chat_room/{id}", get(room::room))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatRoom {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: i64,
    pub is_public: bool,
    pub created_at: i64,
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room not found")]
    RoomNotFound,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Default)]
pub struct NewRoom {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
}

/// Creates the room with its creator as the first member. A blank name
/// falls back to "Chat <creator username>".
pub async fn create_room(
    db_pool: &SqlitePool,
    creator: &User,
    new_room: NewRoom,
) -> sqlx::Result<ChatRoom> {
    let name = new_room
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("Chat {}", creator.username));

    let room = sqlx::query_as::<_, ChatRoom>(
        "INSERT INTO chat_rooms (name, description, creator_id, is_public, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(name)
    .bind(&new_room.description)
    .bind(creator.id)
    .bind(new_room.is_public)
    .bind(OffsetDateTime::now_utc().unix_timestamp())
    .fetch_one(db_pool)
    .await?;

    add_member(db_pool, room.id, creator.id).await?;
    Ok(room)
}

/// Idempotent: the unique (room, user) constraint swallows duplicates.
pub async fn add_member(db_pool: &SqlitePool, room_id: i64, user_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT OR IGNORE INTO chat_room_members (room_id, user_id) VALUES (?, ?)")
        .bind(room_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Each identifier is a numeric id or a username. Identifiers that
/// resolve to nobody are skipped without complaint; the creator is
/// already a member and never re-added.
pub async fn invite_members(
    db_pool: &SqlitePool,
    room_id: i64,
    creator_id: i64,
    identifiers: &[String],
) -> sqlx::Result<()> {
    for raw in identifiers {
        if raw.trim().is_empty() {
            continue;
        }
        let Some(user) = users::resolve(db_pool, &UserRef::parse(raw)).await? else {
            continue;
        };
        if user.id == creator_id {
            continue;
        }
        add_member(db_pool, room_id, user.id).await?;
    }
    Ok(())
}

pub async fn is_member(db_pool: &SqlitePool, room_id: i64, user_id: i64) -> sqlx::Result<bool> {
    Ok(sqlx::query_as::<_, (i64,)>(
        "SELECT 1 FROM chat_room_members WHERE room_id = ? AND user_id = ?",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?
    .is_some())
}

pub async fn get_room(db_pool: &SqlitePool, room_id: i64) -> Result<ChatRoom, RoomError> {
    sqlx::query_as::<_, ChatRoom>("SELECT * FROM chat_rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(RoomError::RoomNotFound)
}

/// Members are visible to anyone who may view the room: members always,
/// everyone else only when the room is public.
pub async fn viewable_by(db_pool: &SqlitePool, room: &ChatRoom, user_id: i64) -> sqlx::Result<bool> {
    if room.is_public {
        return Ok(true);
    }
    is_member(db_pool, room.id, user_id).await
}

pub async fn members_of(db_pool: &SqlitePool, room_id: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as(
        "SELECT u.* FROM chat_room_members m \
         JOIN users u ON u.id = m.user_id \
         WHERE m.room_id = ? \
         ORDER BY m.id",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await
}
