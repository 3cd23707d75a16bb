pub mod auth;
pub mod db;
pub mod friends;
pub mod index;
pub mod messages;
pub mod profiles;
pub mod res;
pub mod rooms;
pub mod session;
pub mod settings;
pub mod users;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use sqlx::SqlitePool;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

pub type AppResult<T> = Result<T, AppError>;
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Blank form fields arrive as empty strings, not as missing keys.
pub fn none_if_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

pub fn ago(unix: i64) -> String {
    let delta = (time::OffsetDateTime::now_utc().unix_timestamp() - unix).max(0);
    match delta {
        0..=59 => "just now".to_owned(),
        60..=3599 => format!("{}m ago", delta / 60),
        3600..=86399 => format!("{}h ago", delta / 3600),
        _ => format!("{}d ago", delta / 86400),
    }
}
