use axum::{
    Form, Router, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, AppState, include_res, session};

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(settings_page).post(update_settings))
}

#[debug_handler]
pub(crate) async fn settings_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    if session::current_user(&db_pool, &session).await?.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    let theme = session::theme(&session).await?;
    let body = include_res!(str, "/pages/settings.html")
        .replace("{theme}", &theme)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{current}", &theme);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct SettingsForm {
    theme: String,
}

#[debug_handler]
pub(crate) async fn update_settings(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(SettingsForm { theme }): Form<SettingsForm>,
) -> AppResult<Response> {
    if session::current_user(&db_pool, &session).await?.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    session.insert(session::THEME, theme).await?;
    session::flash(&session, "success", "Settings saved").await?;
    Ok(Redirect::to("/settings").into_response())
}
