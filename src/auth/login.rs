use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;

use crate::{AppResult, include_res, session};

use super::AuthError;

#[debug_handler]
pub(crate) async fn login_page(session: Session) -> AppResult<Response> {
    let body = include_res!(str, "/pages/login.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?);
    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LoginForm { username, password }): Form<LoginForm>,
) -> AppResult<Response> {
    match super::authenticate(&db_pool, username.trim(), &password).await {
        Ok(user) => {
            session.insert(session::USER_ID, user.id).await?;
            info!("login {}#{}", user.username, user.id);
            Ok(Redirect::to(&format!("/profile/{}", user.id)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            session::flash(&session, "error", "Invalid credentials").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
