use std::collections::HashSet;

use axum::{
    debug_handler,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{AppError, AppResult, auth::Verifier, profiles};

use super::{ClientEvent, Registry, ServerEvent, msg};

#[derive(Deserialize)]
pub(crate) struct WsQuery {
    token: String,
}

/// A bad credential ends the connection right here with a 401;
/// nothing past the upgrade ever runs unauthenticated, and the bound
/// user id never changes for the life of the socket.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(verifier): State<Verifier>,
    State(registry): State<Registry>,
    Query(WsQuery { token }): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let user_id = verifier.verify(&token)?;
    if profiles::fetch_user(&db_pool, user_id).await?.is_none() {
        return Err(AppError::Unauthorized("unknown user"));
    }
    tracing::info!(%user_id, "chat connection opened");

    Ok(ws
        .on_upgrade(async move |socket| handle_socket(socket, db_pool, registry, user_id).await)
        .into_response())
}

async fn handle_socket(socket: WebSocket, db_pool: SqlitePool, registry: Registry, user_id: Uuid) {
    let conn_id = Uuid::now_v7();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let forward_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(text.into()).await.is_err() {
                break;
            }
        }
    });

    let mut joined: HashSet<Uuid> = HashSet::new();
    match match_ids_for(&db_pool, user_id).await {
        Ok(match_ids) => {
            for match_id in match_ids {
                registry.join(match_id, conn_id, tx.clone()).await;
                joined.insert(match_id);
            }
            tracing::debug!(%user_id, rooms = joined.len(), "joined existing match rooms");
        }
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "could not join match rooms");
        }
    }

    while let Some(Ok(frame)) = receiver.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let Ok(event) = serde_json::from_str::<ClientEvent>(&text) else {
            let _ = tx.send(ServerEvent::Error {
                reason: "unrecognized event".to_owned(),
            });
            continue;
        };

        match event {
            ClientEvent::JoinMatch { match_id } => {
                match msg::join_match(&db_pool, &registry, match_id, user_id, conn_id, tx.clone())
                    .await
                {
                    Ok(()) => {
                        joined.insert(match_id);
                        let _ = tx.send(ServerEvent::JoinedMatch { match_id });
                    }
                    Err(e) => {
                        let _ = tx.send(ServerEvent::Error { reason: e.reason() });
                    }
                }
            }
            ClientEvent::SendMessage { match_id, content } => {
                if let Err(e) = msg::send_message(&db_pool, &registry, match_id, user_id, content).await {
                    let _ = tx.send(ServerEvent::Error { reason: e.reason() });
                }
            }
        }
    }

    // teardown is synchronous with the close: memberships first, then
    // the forwarder
    registry.leave_all(conn_id, joined).await;
    forward_task.abort();
    tracing::info!(%user_id, "chat connection closed");
}

async fn match_ids_for(db_pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Uuid>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT id FROM matches WHERE user_low_id=? OR user_high_id=?")
            .bind(user_id.to_string())
            .bind(user_id.to_string())
            .fetch_all(db_pool)
            .await?;
    rows.into_iter()
        .map(|(id,)| Uuid::parse_str(&id).map_err(Into::into))
        .collect()
}
