use axum::{Json, debug_handler, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppError, AppResult,
    auth::AuthUser,
    db::{self, Like, Match},
    profiles,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikeBody {
    liked_user_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikeResponse {
    message: &'static str,
    is_match: bool,
    like: Like,
    #[serde(rename = "match")]
    matched: Option<Match>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn like_user(
    State(db_pool): State<SqlitePool>,
    AuthUser(liker_id): AuthUser,
    Json(LikeBody { liked_user_id }): Json<LikeBody>,
) -> AppResult<Json<LikeResponse>> {
    let outcome = record_like(&db_pool, liker_id, liked_user_id).await?;
    Ok(Json(LikeResponse {
        message: if outcome.matched.is_some() {
            "it's a match!"
        } else {
            "like sent"
        },
        is_match: outcome.matched.is_some(),
        like: outcome.like,
        matched: outcome.matched,
    }))
}

#[derive(Debug)]
pub struct LikeOutcome {
    pub like: Like,
    pub matched: Option<Match>,
}

/// Records a directional like and, when the reverse like already
/// exists, creates the match for the pair. Repeat likes are rejected,
/// never overwritten.
pub async fn record_like(
    db_pool: &SqlitePool,
    liker_id: Uuid,
    liked_id: Uuid,
) -> AppResult<LikeOutcome> {
    if liker_id == liked_id {
        return Err(AppError::Invalid("you cannot like yourself"));
    }
    if profiles::fetch_user(db_pool, liked_id).await?.is_none() {
        return Err(AppError::NotFound("user not found"));
    }

    let like = Like {
        id: Uuid::now_v7(),
        liker_id,
        liked_id,
        created_at: db::now_millis(),
    };
    let inserted = sqlx::query("INSERT INTO likes (id,liker_id,liked_id,created_at) VALUES (?,?,?,?)")
        .bind(like.id.to_string())
        .bind(liker_id.to_string())
        .bind(liked_id.to_string())
        .bind(like.created_at)
        .execute(db_pool)
        .await;
    if let Err(e) = inserted {
        return Err(if is_unique_violation(&e) {
            AppError::Conflict("you have already liked this user")
        } else {
            e.into()
        });
    }

    let reverse: Option<(String,)> = sqlx::query_as("SELECT id FROM likes WHERE liker_id=? AND liked_id=?")
        .bind(liked_id.to_string())
        .bind(liker_id.to_string())
        .fetch_optional(db_pool)
        .await?;
    if reverse.is_none() {
        return Ok(LikeOutcome {
            like,
            matched: None,
        });
    }

    let matched = create_match(db_pool, liker_id, liked_id).await?;
    tracing::info!(match_id = %matched.id, "match formed");
    Ok(LikeOutcome {
        like,
        matched: Some(matched),
    })
}

/// Conditional insert on the canonical (low, high) pair. Two racing
/// creates both land here; the unique index turns the slower insert
/// into a no-op and the re-select hands back whichever row won.
async fn create_match(db_pool: &SqlitePool, a: Uuid, b: Uuid) -> AppResult<Match> {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    sqlx::query(
        "INSERT INTO matches (id,user_low_id,user_high_id,created_at) VALUES (?,?,?,?) \
         ON CONFLICT(user_low_id,user_high_id) DO NOTHING",
    )
    .bind(Uuid::now_v7().to_string())
    .bind(low.to_string())
    .bind(high.to_string())
    .bind(db::now_millis())
    .execute(db_pool)
    .await?;

    let (id, created_at): (String, i64) =
        sqlx::query_as("SELECT id,created_at FROM matches WHERE user_low_id=? AND user_high_id=?")
            .bind(low.to_string())
            .bind(high.to_string())
            .fetch_one(db_pool)
            .await?;
    Ok(Match {
        id: Uuid::parse_str(&id)?,
        user_low_id: low,
        user_high_id: high,
        created_at,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}
