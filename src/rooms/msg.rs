use std::sync::{LazyLock, Mutex};

use sqlx::SqlitePool;
use uuid::{ContextV7, Timestamp, Uuid};

use crate::{
    AppError, AppResult,
    db::{self, ChatMessage, Sender},
};

use super::{
    Registry, ServerEvent,
    registry::{ConnId, EventSender},
};

// Message ids must keep increasing even within one millisecond: the
// history read sorts on (created_at, id) and has to agree with
// broadcast order.
static MSG_ID_SEQ: LazyLock<Mutex<ContextV7>> =
    LazyLock::new(|| Mutex::new(ContextV7::new()));

fn next_message_id() -> Uuid {
    Uuid::new_v7(Timestamp::now(&*MSG_ID_SEQ))
}

/// Membership is checked against the match itself, not the room, so a
/// connection can join a match formed while it was already online.
pub(crate) async fn join_match(
    db_pool: &SqlitePool,
    registry: &Registry,
    match_id: Uuid,
    user_id: Uuid,
    conn_id: ConnId,
    tx: EventSender,
) -> AppResult<()> {
    if super::match_for(db_pool, match_id, user_id).await?.is_none() {
        return Err(AppError::Forbidden("you are not part of this match"));
    }
    registry.join(match_id, conn_id, tx).await;
    Ok(())
}

/// Persists the message and fans it out to every connection currently
/// in the room, the sender's own included. The room lock is held from
/// before the insert until the last member has been handed the event,
/// which is what keeps delivery order identical to store order.
pub async fn send_message(
    db_pool: &SqlitePool,
    registry: &Registry,
    match_id: Uuid,
    sender_id: Uuid,
    content: String,
) -> AppResult<ChatMessage> {
    if content.trim().is_empty() {
        return Err(AppError::Invalid("message content is empty"));
    }
    if super::match_for(db_pool, match_id, sender_id).await?.is_none() {
        return Err(AppError::Forbidden("you are not part of this match"));
    }
    let sender_name: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id=?")
        .bind(sender_id.to_string())
        .fetch_optional(db_pool)
        .await?;
    let Some((name,)) = sender_name else {
        return Err(AppError::NotFound("user not found"));
    };

    let room = registry.room(match_id);
    let guard = room.lock().await;

    let message = ChatMessage {
        id: next_message_id(),
        match_id,
        sender: Sender {
            id: sender_id,
            name,
        },
        content,
        created_at: db::now_millis(),
    };
    sqlx::query("INSERT INTO messages (id,match_id,sender_id,content,created_at) VALUES (?,?,?,?,?)")
        .bind(message.id.to_string())
        .bind(match_id.to_string())
        .bind(sender_id.to_string())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(db_pool)
        .await?;

    guard.broadcast(&ServerEvent::NewMessage {
        message: message.clone(),
    });
    Ok(message)
}
