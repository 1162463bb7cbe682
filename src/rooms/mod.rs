mod events;
mod history;
pub mod msg;
mod registry;
mod ws;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppResult, AppState, db::Match};

pub use events::{ClientEvent, ServerEvent};
pub use registry::Registry;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(history::chat_list))
        .route("/{match_id}/messages", get(history::chat_history))
        .route("/ws", get(ws::chat_ws))
}

/// The match, but only if `user_id` is one of its two participants.
pub(crate) async fn match_for(
    db_pool: &SqlitePool,
    match_id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<Match>> {
    let row: Option<(String, String, i64)> = sqlx::query_as(
        "SELECT user_low_id,user_high_id,created_at FROM matches \
         WHERE id=? AND (user_low_id=? OR user_high_id=?)",
    )
    .bind(match_id.to_string())
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(db_pool)
    .await?;
    let Some((low, high, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(Match {
        id: match_id,
        user_low_id: Uuid::parse_str(&low)?,
        user_high_id: Uuid::parse_str(&high)?,
        created_at,
    }))
}
