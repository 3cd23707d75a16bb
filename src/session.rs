use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, users::{self, User}};

pub const USER_ID: &str = "user_id";
pub const THEME: &str = "theme";
pub const FLASH: &str = "flash";

pub const DEFAULT_THEME: &str = "dark";

/// Resolves the identity behind the session, refreshing last-seen as a
/// side effect. `None` means the request is anonymous and the caller
/// should redirect to `/login`.
pub async fn current_user(db_pool: &SqlitePool, session: &Session) -> AppResult<Option<User>> {
    let Some(user_id) = session.get::<i64>(USER_ID).await? else {
        return Ok(None);
    };
    let Some(user) = users::find_by_id(db_pool, user_id).await? else {
        return Ok(None);
    };

    users::touch_last_seen(db_pool, user.id).await?;
    Ok(Some(user))
}

pub async fn theme(session: &Session) -> AppResult<String> {
    Ok(session
        .get::<String>(THEME)
        .await?
        .unwrap_or_else(|| DEFAULT_THEME.to_owned()))
}

/// Queues a one-shot notice for the next rendered page.
pub async fn flash(session: &Session, kind: &str, text: &str) -> AppResult<()> {
    session
        .insert(FLASH, (kind.to_owned(), text.to_owned()))
        .await?;
    Ok(())
}

/// Takes the pending notice, if any, already rendered as a fragment.
pub async fn take_flash(session: &Session) -> AppResult<String> {
    let Some((kind, text)) = session.remove::<(String, String)>(FLASH).await? else {
        return Ok(String::new());
    };

    Ok(include_res!(str, "/pages/notice.html")
        .replace("{kind}", &kind)
        .replace("{text}", &text))
}
