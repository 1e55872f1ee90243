//! Connection registry: routes push messages to a user's live connections.
//!
//! Connections are grouped per user id. A user with several tabs or devices
//! has several connections in the same group; an offline user has none.
//! `send` fans one payload out to every member of a group and is a silent
//! no-op when the group is empty — there is no queuing for later delivery.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound buffer per connection. A connection whose buffer is full has a
/// stalled reader; deliveries to it are skipped rather than awaited so one
/// slow peer never holds up its siblings.
const CONNECTION_BUFFER: usize = 64;

/// Opaque handle to one registered connection, returned by [`ConnectionRegistry::join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    user_id: i64,
    id: Uuid,
}

impl ConnectionHandle {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

type Group = Mutex<HashMap<Uuid, mpsc::Sender<String>>>;

/// Per-user groups of live connections.
///
/// The outer map is read-locked on the hot paths, so sends to different
/// users never contend; each group has its own lock for membership changes.
/// Fan-out snapshots the member list, releases the lock, then attempts each
/// delivery independently.
#[derive(Default)]
pub struct ConnectionRegistry {
    groups: RwLock<HashMap<i64, Group>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection under `user:{user_id}` and returns the
    /// handle plus the receiving half the connection's socket task reads
    /// from. Dropping the receiver without calling [`leave`] is tolerated:
    /// the dead sender is evicted on the next send.
    ///
    /// [`leave`]: ConnectionRegistry::leave
    pub fn join(&self, user_id: i64) -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        let handle = ConnectionHandle {
            user_id,
            id: Uuid::new_v4(),
        };

        {
            let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
            if let Some(group) = groups.get(&user_id) {
                group
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(handle.id, tx);
                tracing::debug!(user_id, connection = %handle.id, "connection joined");
                return (handle, rx);
            }
        }

        // First connection for this user: take the write lock to create the
        // group. Another join may have raced us, so re-check under the lock.
        let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
        groups
            .entry(user_id)
            .or_default()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle.id, tx);
        tracing::debug!(user_id, connection = %handle.id, "connection joined");
        (handle, rx)
    }

    /// Removes a connection from its group. A no-op if the connection is
    /// already gone — disconnects race with send-side eviction.
    pub fn leave(&self, handle: &ConnectionHandle) {
        let empty = {
            let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
            let Some(group) = groups.get(&handle.user_id) else {
                return;
            };
            let mut members = group.lock().unwrap_or_else(|e| e.into_inner());
            members.remove(&handle.id);
            members.is_empty()
        };

        if empty {
            // Prune the empty group. A join may slip in between the check
            // and the write lock, so only remove if it is still empty.
            let mut groups = self.groups.write().unwrap_or_else(|e| e.into_inner());
            let still_empty = groups
                .get(&handle.user_id)
                .is_some_and(|g| g.lock().unwrap_or_else(|e| e.into_inner()).is_empty());
            if still_empty {
                groups.remove(&handle.user_id);
            }
        }
        tracing::debug!(user_id = handle.user_id, connection = %handle.id, "connection left");
    }

    /// Fans `payload` out to every connection in the user's group. Returns
    /// the number of connections the payload was handed to.
    ///
    /// Delivery is best-effort and never blocks: a closed connection is
    /// dropped from the group, a connection with a full buffer is skipped,
    /// and neither affects delivery to siblings. An absent or empty group
    /// is a silent no-op.
    pub fn send(&self, user_id: i64, payload: &str) -> usize {
        // Snapshot the members, then release every lock before delivering.
        let members: Vec<(Uuid, mpsc::Sender<String>)> = {
            let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
            let Some(group) = groups.get(&user_id) else {
                return 0;
            };
            group
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .map(|(id, tx)| (*id, tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in members {
            match tx.try_send(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(user_id, connection = %id, "connection buffer full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(user_id, connection = %id, "connection closed, evicting from group");
                    closed.push(id);
                }
            }
        }

        if !closed.is_empty() {
            let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
            if let Some(group) = groups.get(&user_id) {
                let mut members = group.lock().unwrap_or_else(|e| e.into_inner());
                for id in closed {
                    members.remove(&id);
                }
            }
        }
        delivered
    }

    /// Number of live connections in a user's group.
    pub fn group_size(&self, user_id: i64) -> usize {
        let groups = self.groups.read().unwrap_or_else(|e| e.into_inner());
        groups
            .get(&user_id)
            .map(|g| g.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }
}
