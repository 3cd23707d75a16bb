mod page;

use axum::{Router, routing::get};
use sqlx::SqlitePool;

use crate::{AppState, users};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile/{id}", get(page::profile).post(page::edit_profile))
}

/// Applies a profile edit only when the editor owns the profile.
/// Non-owner edits are dropped, not errors. Returns whether anything
/// was written.
pub async fn apply_edit(
    db_pool: &SqlitePool,
    editor_id: i64,
    profile_id: i64,
    display_name: &str,
    bio: &str,
    avatar: Option<&str>,
) -> sqlx::Result<bool> {
    if editor_id != profile_id {
        return Ok(false);
    }
    users::update_profile(db_pool, profile_id, display_name, bio, avatar).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, users::test_user};

    #[tokio::test]
    async fn only_the_owner_can_edit_a_profile() {
        let pool = db::test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;

        let applied = apply_edit(&pool, alice.id, alice.id, "Alice", "my bio", None)
            .await
            .unwrap();
        assert!(applied);

        let ignored = apply_edit(&pool, bob.id, alice.id, "Hacked", "pwned", Some("x.png"))
            .await
            .unwrap();
        assert!(!ignored);

        let alice = users::find_by_id(&pool, alice.id).await.unwrap().unwrap();
        assert_eq!(alice.display_name.as_deref(), Some("Alice"));
        assert_eq!(alice.bio.as_deref(), Some("my bio"));
        assert!(alice.avatar.is_none());
    }
}
