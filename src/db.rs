use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use time::OffsetDateTime;
use tracing::info;

/// The system account that greets every new user.
pub const BOT_USERNAME: &str = "sound_bot";

// Never parses as a PHC hash, so nobody can log in as the bot.
const BOT_PASSWORD_SENTINEL: &str = "!";

pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        display_name TEXT,
        bio TEXT,
        avatar TEXT,
        last_seen INTEGER,
        private_profile INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS friendships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        friend_id INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'accepted',
        UNIQUE (user_id, friend_id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id INTEGER NOT NULL,
        recipient_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat_rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        creator_id INTEGER NOT NULL,
        is_public INTEGER NOT NULL DEFAULT 1,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat_room_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        room_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        UNIQUE (room_id, user_id)
    )",
];

/// Creates missing tables and the bot account. Safe to run on every start.
pub async fn init(db_pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }
    seed_bot(db_pool).await
}

async fn seed_bot(db_pool: &SqlitePool) -> sqlx::Result<()> {
    let inserted = sqlx::query(
        "INSERT INTO users (username, password, display_name, avatar, last_seen) \
         SELECT ?1, ?2, ?3, ?4, ?5 \
         WHERE NOT EXISTS (SELECT 1 FROM users WHERE username = ?1)",
    )
    .bind(BOT_USERNAME)
    .bind(BOT_PASSWORD_SENTINEL)
    .bind("Sound Bot")
    .bind("sound_bot.png")
    .bind(OffsetDateTime::now_utc().unix_timestamp())
    .execute(db_pool)
    .await?;

    if inserted.rows_affected() > 0 {
        info!("created bot account @{BOT_USERNAME}");
    }
    Ok(())
}

// A pool with more than one connection would see one empty in-memory
// database per connection.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init(&pool).await.unwrap();
    pool
}
