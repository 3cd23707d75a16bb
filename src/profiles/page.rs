use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, none_if_empty, session, users};

#[debug_handler]
pub(crate) async fn profile(
    Path(user_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(user) = users::find_by_id(&db_pool, user_id).await? else {
        session::flash(&session, "error", "User not found").await?;
        return Ok(Redirect::to("/").into_response());
    };

    let editable = if user.id == me.id {
        include_res!(str, "/pages/profile_edit.html")
            .replace("{display_name}", user.display_name.as_deref().unwrap_or(""))
            .replace("{bio}", user.bio.as_deref().unwrap_or(""))
    } else {
        String::new()
    };

    let body = include_res!(str, "/pages/profile.html")
        .replace("{theme}", &session::theme(&session).await?)
        .replace("{notice}", &session::take_flash(&session).await?)
        .replace("{id}", &user.id.to_string())
        .replace("{name}", user.name())
        .replace("{username}", &user.username)
        .replace("{bio}", user.bio.as_deref().unwrap_or(""))
        .replace("{avatar}", user.avatar.as_deref().unwrap_or(""))
        .replace("{last_seen}", &user.last_seen_label())
        .replace("{editable}", &editable);

    Ok(Html(body).into_response())
}

#[derive(Deserialize)]
pub(crate) struct ProfileForm {
    display_name: String,
    bio: String,
    avatar: Option<String>,
}

#[debug_handler]
pub(crate) async fn edit_profile(
    Path(user_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let Some(me) = session::current_user(&db_pool, &session).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let avatar = none_if_empty(form.avatar);
    let applied = super::apply_edit(
        &db_pool,
        me.id,
        user_id,
        form.display_name.trim(),
        form.bio.trim(),
        avatar.as_deref(),
    )
    .await?;

    if applied {
        session::flash(&session, "success", "Profile updated").await?;
    }

    Ok(Redirect::to(&format!("/profile/{user_id}")).into_response())
}
