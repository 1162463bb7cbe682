pub mod rank;

use std::collections::HashSet;

use axum::{Json, debug_handler, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::AuthUser, db::Profile, profiles};

#[derive(Debug, Serialize)]
pub(crate) struct Candidate {
    user: Profile,
    score: f64,
}

/// Ranked discovery feed: everyone the caller has not already liked
/// or matched, best tag overlap first. Recomputed fresh on every
/// request; passing on a candidate is the client's business and is
/// never persisted here.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn feed(
    State(db_pool): State<SqlitePool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Candidate>>> {
    let me = profiles::fetch_user(&db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("user not found"))?;

    let mut excluded: HashSet<Uuid> = HashSet::from([user_id]);
    let liked: Vec<(String,)> = sqlx::query_as("SELECT liked_id FROM likes WHERE liker_id=?")
        .bind(user_id.to_string())
        .fetch_all(&db_pool)
        .await?;
    for (id,) in liked {
        excluded.insert(Uuid::parse_str(&id)?);
    }
    let matched: Vec<(String, String)> = sqlx::query_as(
        "SELECT user_low_id,user_high_id FROM matches WHERE user_low_id=? OR user_high_id=?",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(&db_pool)
    .await?;
    for (low, high) in matched {
        excluded.insert(Uuid::parse_str(&low)?);
        excluded.insert(Uuid::parse_str(&high)?);
    }

    let candidates = profiles::fetch_all(&db_pool).await?;
    let ranked = rank::rank(&me, candidates, &excluded)
        .into_iter()
        .map(|(user, score)| Candidate { user, score })
        .collect();
    Ok(Json(ranked))
}
