use axum::{debug_handler, response::Redirect};
use tower_sessions::Session;

use crate::{AppResult, session};

// Only the identity is dropped; the theme preference survives logout.
#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Redirect> {
    let _: Option<i64> = session.remove(session::USER_ID).await?;
    Ok(Redirect::to("/login"))
}
