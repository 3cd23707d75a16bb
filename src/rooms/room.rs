use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, session};

use super::RoomError;

#[debug_handler]
pub(crate) async fn room(
    Path(room_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let room = match super::get_room(&db_pool, room_id).await {
        Ok(room) => room,
        Err(RoomError::RoomNotFound) => {
            session::flash(&session, "error", "Room not found").await?;
            return Ok(Redirect::to("/").into_response());
        }
        Err(RoomError::Db(e)) => return Err(e.into()),
    };

    if !super::viewable_by(&db_pool, &room, me.id).await? {
        session::flash(&session, "error", "No access").await?;
        return Ok(Redirect::to("/").into_response());
    }

    let mut member_items = String::new();
    for member in super::members_of(&db_pool, room.id).await? {
        member_items += &include_res!(str, "/pages/member_item.html")
            .replace("{id}", &member.id.to_string())
            .replace("{name}", member.name())
            .replace(
                "{creator_mark}",
                if member.id == room.creator_id { " (creator)" } else { "" },
            );
    }

    let body = include_res!(str, "/pages/room.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{name}", &room.name)
        .replace("{description}", room.description.as_deref().unwrap_or(""))
        .replace("{visibility}", if room.is_public { "public" } else { "private" })
        .replace("{member_items}", &member_items);

    Ok(Html(body).into_response())
}
