use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppError, AppResult,
    auth::AuthUser,
    db::{ChatMessage, Profile, Sender},
    profiles,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatHistory {
    match_id: Uuid,
    messages: Vec<ChatMessage>,
}

/// The full message log for one match, in broadcast order. This is
/// the recovery path for anything missed while offline.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_history(
    State(db_pool): State<SqlitePool>,
    AuthUser(user_id): AuthUser,
    Path(match_id): Path<Uuid>,
) -> AppResult<Json<ChatHistory>> {
    if super::match_for(&db_pool, match_id, user_id).await?.is_none() {
        return Err(AppError::Forbidden("you are not part of this match"));
    }
    Ok(Json(ChatHistory {
        match_id,
        messages: messages_for(&db_pool, match_id).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatEntry {
    match_id: Uuid,
    other_user: Profile,
    last_message: Option<ChatMessage>,
    created_at: i64,
}

/// One entry per match, newest match first, with the latest message
/// for preview.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_list(
    State(db_pool): State<SqlitePool>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<ChatEntry>>> {
    let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
        "SELECT id,user_low_id,user_high_id,created_at FROM matches \
         WHERE user_low_id=? OR user_high_id=? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(&db_pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for (id, low, high, created_at) in rows {
        let match_id = Uuid::parse_str(&id)?;
        let low = Uuid::parse_str(&low)?;
        let high = Uuid::parse_str(&high)?;
        let other = if low == user_id { high } else { low };
        let other_user = profiles::fetch_user(&db_pool, other)
            .await?
            .ok_or(AppError::NotFound("user not found"))?;
        entries.push(ChatEntry {
            match_id,
            other_user,
            last_message: last_message_for(&db_pool, match_id).await?,
            created_at,
        });
    }
    Ok(Json(entries))
}

async fn messages_for(db_pool: &SqlitePool, match_id: Uuid) -> AppResult<Vec<ChatMessage>> {
    let rows: Vec<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT m.id,m.sender_id,u.name,m.content,m.created_at FROM messages m \
         JOIN users u ON u.id=m.sender_id \
         WHERE m.match_id=? ORDER BY m.created_at, m.id",
    )
    .bind(match_id.to_string())
    .fetch_all(db_pool)
    .await?;
    rows.into_iter()
        .map(|(id, sender_id, name, content, created_at)| {
            Ok(ChatMessage {
                id: Uuid::parse_str(&id)?,
                match_id,
                sender: Sender {
                    id: Uuid::parse_str(&sender_id)?,
                    name,
                },
                content,
                created_at,
            })
        })
        .collect()
}

async fn last_message_for(db_pool: &SqlitePool, match_id: Uuid) -> AppResult<Option<ChatMessage>> {
    let row: Option<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT m.id,m.sender_id,u.name,m.content,m.created_at FROM messages m \
         JOIN users u ON u.id=m.sender_id \
         WHERE m.match_id=? ORDER BY m.created_at DESC, m.id DESC LIMIT 1",
    )
    .bind(match_id.to_string())
    .fetch_optional(db_pool)
    .await?;
    let Some((id, sender_id, name, content, created_at)) = row else {
        return Ok(None);
    };
    Ok(Some(ChatMessage {
        id: Uuid::parse_str(&id)?,
        match_id,
        sender: Sender {
            id: Uuid::parse_str(&sender_id)?,
            name,
        },
        content,
        created_at,
    }))
}
