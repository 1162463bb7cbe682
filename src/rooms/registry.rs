use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use super::ServerEvent;

pub(crate) type ConnId = Uuid;
pub(crate) type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// One room per match, keyed by match id. All reads and writes of a
/// room's membership go through its mutex; the broadcaster holds it
/// across persist + fan-out so nobody ever broadcasts against a
/// half-updated member set.
#[derive(Clone, Default)]
pub struct Registry {
    rooms: Arc<DashMap<Uuid, Arc<Mutex<Room>>>>,
}

#[derive(Default)]
pub(crate) struct Room {
    members: HashMap<ConnId, EventSender>,
}

impl Room {
    pub(crate) fn broadcast(&self, event: &ServerEvent) {
        for tx in self.members.values() {
            // a dead receiver just means that connection is tearing
            // down; it gets dropped from the room right after
            let _ = tx.send(event.clone());
        }
    }

    pub(crate) fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl Registry {
    pub(crate) fn room(&self, match_id: Uuid) -> Arc<Mutex<Room>> {
        self.rooms.entry(match_id).or_default().clone()
    }

    pub(crate) async fn join(&self, match_id: Uuid, conn_id: ConnId, tx: EventSender) {
        self.room(match_id).lock().await.members.insert(conn_id, tx);
    }

    pub(crate) async fn leave(&self, match_id: Uuid, conn_id: ConnId) {
        let Some(room) = self.rooms.get(&match_id).map(|r| r.value().clone()) else {
            return;
        };
        room.lock().await.members.remove(&conn_id);
        // prune empty rooms; a contended lock means a join is in
        // flight, in which case the room has to stay
        self.rooms.remove_if(&match_id, |_, room| {
            room.try_lock().map(|r| r.members.is_empty()).unwrap_or(false)
        });
    }

    pub(crate) async fn leave_all(&self, conn_id: ConnId, joined: impl IntoIterator<Item = Uuid>) {
        for match_id in joined {
            self.leave(match_id, conn_id).await;
        }
    }
}
