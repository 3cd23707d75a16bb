use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, none_if_empty, session};

use super::{AuthError, Registration};

#[debug_handler]
pub(crate) async fn registration_page(session: Session) -> AppResult<Response> {
    let body = include_res!(str, "/pages/registration.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?);
    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct RegistrationForm {
    username: String,
    password: String,
    display_name: Option<String>,
    avatar: Option<String>,
}

// The avatar field is a filename reference; the file itself lands in
// static/uploads outside of this handler.
#[debug_handler]
pub(crate) async fn registration(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    let registration = Registration {
        username: form.username.trim().to_owned(),
        password: form.password,
        display_name: none_if_empty(form.display_name),
        avatar: none_if_empty(form.avatar),
    };

    match super::register_user(&db_pool, registration).await {
        Ok(_) => {
            session::flash(&session, "success", "Registration successful").await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::DuplicateUsername) => {
            session::flash(&session, "error", "A user with that username already exists").await?;
            Ok(Redirect::to("/registration").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
