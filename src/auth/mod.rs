mod login;
mod logout;
mod register;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Router, routing::get};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    AppState, db, messages,
    users::{self, NewUser, User},
};

pub const WELCOME_MESSAGE: &str =
    "Welcome to Sound! I'm your assistant bot. Invite your friends and start chatting!";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/registration",
            get(register::registration_page).post(register::registration),
        )
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username unknown or password mismatch; callers never learn which.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("A user with that username already exists")]
    DuplicateUsername,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Hashes the password, creates the account, and has the bot greet the
/// newcomer if the bot account exists.
pub async fn register_user(
    db_pool: &SqlitePool,
    registration: Registration,
) -> Result<User, AuthError> {
    let password_hash = hash_password(&registration.password)?;

    let user = users::create_user(
        db_pool,
        NewUser {
            username: registration.username,
            password_hash,
            display_name: registration.display_name,
            avatar: registration.avatar,
        },
    )
    .await
    .map_err(|e| match e {
        users::CreateUserError::DuplicateUsername => AuthError::DuplicateUsername,
        users::CreateUserError::Db(e) => AuthError::Db(e),
    })?;

    if let Some(bot) = users::find_by_username(db_pool, db::BOT_USERNAME).await? {
        if let Err(e) = messages::send(db_pool, bot.id, user.id, WELCOME_MESSAGE).await {
            warn!("welcome message for {} not sent: {e}", user.username);
        }
    }

    info!("registered {}#{}", user.username, user.id);
    Ok(user)
}

pub async fn authenticate(
    db_pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = users::find_by_username(db_pool, username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    // The bot's sentinel password is not a parseable hash; treat it the
    // same as a wrong password.
    let stored = PasswordHash::new(&user.password).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &stored)
        .map_err(|_| AuthError::InvalidCredentials)?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn register(db_pool: &SqlitePool, username: &str, password: &str) -> Result<User, AuthError> {
        register_user(
            db_pool,
            Registration {
                username: username.to_owned(),
                password: password.to_owned(),
                display_name: None,
                avatar: None,
            },
        )
        .await
    }

    #[tokio::test]
    async fn registration_delivers_exactly_one_welcome_message() {
        let pool = db::test_pool().await;
        let alice = register(&pool, "alice", "hunter2").await.unwrap();

        let bot = users::find_by_username(&pool, db::BOT_USERNAME)
            .await
            .unwrap()
            .unwrap();
        let thread = messages::thread_between(&pool, alice.id, bot.id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].content, WELCOME_MESSAGE);
        assert_eq!(thread[0].sender_id, bot.id);
        assert_eq!(thread[0].recipient_id, alice.id);
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let pool = db::test_pool().await;
        register(&pool, "alice", "hunter2").await.unwrap();

        let err = register(&pool, "alice", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[tokio::test]
    async fn stored_passwords_are_hashed_and_verified() {
        let pool = db::test_pool().await;
        let alice = register(&pool, "alice", "hunter2").await.unwrap();
        assert_ne!(alice.password, "hunter2");

        let logged_in = authenticate(&pool, "alice", "hunter2").await.unwrap();
        assert_eq!(logged_in.id, alice.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let pool = db::test_pool().await;
        register(&pool, "alice", "hunter2").await.unwrap();

        let wrong = authenticate(&pool, "alice", "letmein").await.unwrap_err();
        let unknown = authenticate(&pool, "mallory", "letmein").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn nobody_can_log_in_as_the_bot() {
        let pool = db::test_pool().await;
        let err = authenticate(&pool, db::BOT_USERNAME, "!").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
