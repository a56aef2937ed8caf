//! Authority stub — the single source of truth per board.
//!
//! DESIGN
//! ======
//! The real authority is an external sequencer; this core only depends on
//! the narrow [`Authority`] contract. [`InMemoryAuthority`] implements it for
//! tests and in-process harnesses: it applies mutations under a write lock,
//! stamps `updated_at` as the last-write-wins hint, and fans out full-object
//! broadcast frames to every subscriber. No conflict resolution beyond
//! "last write observed wins" is attempted.

#[cfg(test)]
#[path = "authority_test.rs"]
mod tests;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use syncboard_wire::{
    BoardObject, Broadcast, ErrorCode, Frame, Mutation, ObjectId, decode_frame, now_ms,
};

/// Result of a single authority-level mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateOutcome {
    pub ok: bool,
    pub error: Option<String>,
}

impl MutateOutcome {
    /// Successful mutation.
    #[must_use]
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    /// Rejected mutation with a reportable reason.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self { ok: false, error: Some(error.into()) }
    }
}

/// The authoritative store contract consumed by the AI gateway and any
/// server-side twin of the dispatcher.
#[async_trait]
pub trait Authority: Send + Sync {
    /// All live objects on the board.
    async fn read_objects(&self) -> Vec<BoardObject>;

    /// One object by id, if present.
    async fn read_object(&self, id: ObjectId) -> Option<BoardObject>;

    /// Apply one mutation and sequence its broadcast.
    async fn mutate(&self, mutation: Mutation) -> MutateOutcome;
}

/// In-memory authority with broadcast fan-out.
pub struct InMemoryAuthority {
    objects: RwLock<HashMap<ObjectId, BoardObject>>,
    broadcasts: broadcast::Sender<Frame>,
}

/// Broadcast channel depth; lagging subscribers observe `RecvError::Lagged`.
const BROADCAST_CAPACITY: usize = 256;

impl InMemoryAuthority {
    #[must_use]
    pub fn new() -> Self {
        let (broadcasts, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { objects: RwLock::new(HashMap::new()), broadcasts }
    }

    /// Subscribe to the broadcast stream. Every successful mutation produces
    /// one `done` frame carrying the full resulting object (or the deleted id).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.broadcasts.subscribe()
    }

    /// The `board:init` frame a newly joined client receives.
    pub async fn init_frame(&self) -> Frame {
        let objects = self.read_objects().await;
        Broadcast::Init(objects).to_frame()
    }

    /// Decode and apply one client frame, the way a connection loop would.
    ///
    /// Malformed frames are rejected with the grepable code of the underlying
    /// decode/parse error; they never panic the authority.
    pub async fn apply_encoded(&self, bytes: &[u8]) -> MutateOutcome {
        let frame = match decode_frame(bytes) {
            Ok(frame) => frame,
            Err(err) => return Self::reject(&err),
        };
        let mutation = match Mutation::from_frame(&frame) {
            Ok(mutation) => mutation,
            Err(err) => return Self::reject(&err),
        };
        self.mutate(mutation).await
    }

    fn reject<E>(err: &E) -> MutateOutcome
    where
        E: ErrorCode + ?Sized,
    {
        MutateOutcome::rejected(format!("{}: {err}", err.error_code()))
    }

    fn publish(&self, broadcast_msg: &Broadcast) {
        // Send fails only when no subscriber exists, which is fine.
        let _ = self.broadcasts.send(broadcast_msg.to_frame());
    }
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authority for InMemoryAuthority {
    async fn read_objects(&self) -> Vec<BoardObject> {
        self.objects.read().await.values().cloned().collect()
    }

    async fn read_object(&self, id: ObjectId) -> Option<BoardObject> {
        self.objects.read().await.get(&id).cloned()
    }

    async fn mutate(&self, mutation: Mutation) -> MutateOutcome {
        let mut objects = self.objects.write().await;
        match mutation {
            Mutation::Create(mut obj) => {
                obj.updated_at = now_ms();
                debug!(id = %obj.id, kind = obj.kind.as_str(), "authority: create");
                self.publish(&Broadcast::Created(obj.clone()));
                objects.insert(obj.id, obj);
                MutateOutcome::ok()
            }
            Mutation::Update(patch) => {
                let Some(obj) = objects.get_mut(&patch.id) else {
                    return MutateOutcome::rejected(format!("object not found: {}", patch.id));
                };
                obj.apply_patch(&patch);
                obj.updated_at = now_ms();
                debug!(id = %obj.id, "authority: update");
                self.publish(&Broadcast::Updated(obj.clone()));
                MutateOutcome::ok()
            }
            Mutation::Delete(id) => {
                // Idempotent: deleting an absent object succeeds quietly.
                if objects.remove(&id).is_some() {
                    debug!(%id, "authority: delete");
                    self.publish(&Broadcast::Deleted(id));
                }
                MutateOutcome::ok()
            }
        }
    }
}
