use axum::{Json, debug_handler, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser, db::Profile, profiles};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchSummary {
    id: Uuid,
    matched_at: i64,
    user: Profile,
}

/// The caller's matches, newest first, each carrying the *other*
/// participant's profile.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_matches(
    State(db_pool): State<SqlitePool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<MatchSummary>>> {
    let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
        "SELECT id,user_low_id,user_high_id,created_at FROM matches \
         WHERE user_low_id=? OR user_high_id=? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(&db_pool)
    .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for (id, low, high, matched_at) in rows {
        let low = Uuid::parse_str(&low)?;
        let high = Uuid::parse_str(&high)?;
        let other = if low == user_id { high } else { low };
        let user = profiles::fetch_user(&db_pool, other)
            .await?
            .ok_or(AppError::NotFound("user not found"))?;
        summaries.push(MatchSummary {
            id: Uuid::parse_str(&id)?,
            matched_at,
            user,
        });
    }
    Ok(Json(summaries))
}
