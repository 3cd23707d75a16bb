use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, friends, include_res, none_if_empty, session};

use super::NewRoom;

#[debug_handler]
pub(crate) async fn create_chat_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let mut friend_options = String::new();
    for friend in friends::friends_of(&db_pool, me.id).await? {
        friend_options += &include_res!(str, "/pages/friend_option.html")
            .replace("{username}", &friend.username)
            .replace("{name}", friend.name());
    }

    let body = include_res!(str, "/pages/create_chat.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{friend_options}", &friend_options);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct CreateChatForm {
    chat_type: String,
    name: Option<String>,
    description: Option<String>,
    is_public: Option<String>,
    /// Comma-separated usernames or numeric ids.
    invited: Option<String>,
}

#[debug_handler]
pub(crate) async fn create_chat(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<CreateChatForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let room = super::create_room(
        &db_pool,
        &me,
        NewRoom {
            name: form.name,
            description: none_if_empty(form.description),
            is_public: form.is_public.as_deref() == Some("on"),
        },
    )
    .await?;

    if form.chat_type == "group" {
        let identifiers: Vec<String> = form
            .invited
            .unwrap_or_default()
            .split(',')
            .map(str::to_owned)
            .collect();
        super::invite_members(&db_pool, room.id, me.id, &identifiers).await?;
    }

    session::flash(&session, "success", "Chat created!").await?;
    Ok(Redirect::to(&format!("/chat_room/{}", room.id)).into_response())
}
