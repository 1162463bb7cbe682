use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::ChatMessage;

/// Everything a client may send over the socket. A frame that does
/// not parse into this set is answered with an `error` event and
/// otherwise ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinMatch { match_id: Uuid },
    #[serde(rename_all = "camelCase")]
    SendMessage { match_id: Uuid, content: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    JoinedMatch { match_id: Uuid },
    NewMessage { message: ChatMessage },
    Error { reason: String },
}
