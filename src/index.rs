use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, session, users};

#[debug_handler]
pub async fn index(State(db_pool): State<SqlitePool>, session: Session) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let mut user_items = String::new();
    for user in users::list_others(&db_pool, me.id).await? {
        user_items += &include_res!(str, "/pages/user_item.html")
            .replace("{id}", &user.id.to_string())
            .replace("{name}", user.name())
            .replace("{username}", &user.username)
            .replace("{last_seen}", &user.last_seen_label());
    }

    let body = include_res!(str, "/pages/index.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{user_items}", &user_items);

    Ok(Html(body).into_response())
}
