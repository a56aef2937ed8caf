//! Board session — per-board object map, mutation dispatcher, and replay.
//!
//! DESIGN
//! ======
//! One `BoardSession` per board connection, constructed and destroyed with
//! the connection's lifetime, never a process-wide singleton. All local state
//! changes pass through the three dispatcher entry points, which apply the
//! mutation optimistically, record it for undo (unless a replay is in
//! flight), and forward it to the transport unconditionally — recording
//! failure must never block the mutation itself. The authority's broadcasts
//! come back through [`apply_broadcast`](BoardSession::apply_broadcast),
//! which is idempotent so a client's own echoed mutation is a no-op.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::collections::HashMap;

use tracing::{debug, info};

use syncboard_wire::{BoardObject, Broadcast, Mutation, ObjectId, ObjectPatch};

use crate::transport::Transport;
use crate::undo::{UndoAction, UndoStack};

/// Per-board client session: local object map + undo history + transport.
///
/// Single-threaded by design: one call path (UI event handler or AI response
/// handler) touches it at a time. There is no internal locking.
#[derive(Debug)]
pub struct BoardSession {
    objects: HashMap<ObjectId, BoardObject>,
    undo: UndoStack,
    transport: Transport,
}

impl BoardSession {
    /// Create an empty session over an outbound transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self { objects: HashMap::new(), undo: UndoStack::new(), transport }
    }

    /// Look up an object by id.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&BoardObject> {
        self.objects.get(&id)
    }

    /// Number of objects currently known locally.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterate all locally known objects in arbitrary order.
    pub fn objects(&self) -> impl Iterator<Item = &BoardObject> {
        self.objects.values()
    }

    // =========================================================================
    // MUTATION DISPATCHER
    // =========================================================================

    /// Create an object: record for undo (unless replaying), apply locally,
    /// forward to the authority.
    pub fn create_object(&mut self, obj: BoardObject) {
        if !self.undo.is_replaying() {
            self.undo.push(UndoAction::Create { obj: obj.clone() });
        }
        debug!(id = %obj.id, kind = obj.kind.as_str(), "dispatch: create");
        self.objects.insert(obj.id, obj.clone());
        self.transport.send(&Mutation::Create(obj));
    }

    /// Patch an object. If the object is known locally, before/after
    /// snapshots are recorded for undo; if it is not, the update is still
    /// forwarded but nothing is recorded — you cannot undo what you never
    /// observed.
    pub fn update_object(&mut self, patch: ObjectPatch) {
        if !self.undo.is_replaying() {
            if let Some(before) = self.objects.get(&patch.id).cloned() {
                let mut after = before.clone();
                after.apply_patch(&patch);
                self.undo.push(UndoAction::Update { before, after });
            }
        }
        debug!(id = %patch.id, "dispatch: update");
        if let Some(obj) = self.objects.get_mut(&patch.id) {
            obj.apply_patch(&patch);
        }
        self.transport.send(&Mutation::Update(patch));
    }

    /// Delete an object by id. Recorded for undo only when the object was
    /// known locally; the delete is forwarded regardless (idempotent delete).
    pub fn delete_object(&mut self, id: ObjectId) {
        if !self.undo.is_replaying() {
            if let Some(obj) = self.objects.get(&id).cloned() {
                self.undo.push(UndoAction::Delete { obj });
            }
        }
        debug!(%id, "dispatch: delete");
        self.objects.remove(&id);
        self.transport.send(&Mutation::Delete(id));
    }

    // =========================================================================
    // UNDO / REDO
    // =========================================================================

    /// Open an undo grouping window; see [`UndoStack::start_batch`].
    pub fn start_batch(&mut self) {
        self.undo.start_batch();
    }

    /// Close the grouping window; see [`UndoStack::commit_batch`].
    pub fn commit_batch(&mut self) {
        self.undo.commit_batch();
    }

    /// Record creations another actor already applied (via broadcasts) as a
    /// single tagged batch, without re-issuing them.
    pub fn record_external_creations(&mut self, objects: &[BoardObject], tag: impl Into<String>) {
        self.undo.push_external_batch(objects, tag);
    }

    /// Tag of the undoable entry at the cursor, if it is a tagged batch.
    #[must_use]
    pub fn top_undo_tag(&self) -> Option<&str> {
        self.undo.top_tag()
    }

    /// True when `undo` would do something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// True when `redo` would do something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Length of the recorded history. Exposed for replay-safety assertions.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Revert the action at the cursor. No-op when there is nothing to undo.
    ///
    /// Replays run back through the dispatcher entry points, which skip
    /// recording while the replay state is set; the cursor retreats only
    /// after the replay completes.
    pub fn undo(&mut self) {
        let Some(action) = self.undo.begin_undo() else {
            return;
        };
        info!(tag = self.undo.top_tag(), "undo");
        self.apply_reverse(&action);
        self.undo.finish_undo();
    }

    /// Re-apply the action just past the cursor. No-op when there is nothing
    /// to redo.
    pub fn redo(&mut self) {
        let Some(action) = self.undo.begin_redo() else {
            return;
        };
        info!("redo");
        self.apply_forward(&action);
        self.undo.finish_redo();
    }

    fn apply_reverse(&mut self, action: &UndoAction) {
        match action {
            UndoAction::Create { obj } => self.delete_object(obj.id),
            UndoAction::Update { before, after } => {
                self.update_object(ObjectPatch::replace(before, after));
            }
            UndoAction::Delete { obj } => self.create_object(obj.clone()),
            UndoAction::Batch { actions, .. } => {
                for inner in actions.iter().rev() {
                    self.apply_reverse(inner);
                }
            }
        }
    }

    fn apply_forward(&mut self, action: &UndoAction) {
        match action {
            UndoAction::Create { obj } => self.create_object(obj.clone()),
            UndoAction::Update { before, after } => {
                self.update_object(ObjectPatch::replace(after, before));
            }
            UndoAction::Delete { obj } => self.delete_object(obj.id),
            UndoAction::Batch { actions, .. } => {
                for inner in actions {
                    self.apply_forward(inner);
                }
            }
        }
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Apply an authority broadcast to local state.
    ///
    /// Broadcasts carry full objects and are applied idempotently: a client's
    /// own echoed mutation overwrites local state with identical content
    /// rather than double-applying. Broadcasts never touch the undo stack —
    /// they are reconciliation, not local actions.
    pub fn apply_broadcast(&mut self, broadcast: &Broadcast) {
        match broadcast {
            Broadcast::Init(objects) => {
                debug!(count = objects.len(), "reconcile: init snapshot");
                self.objects.clear();
                for obj in objects {
                    self.objects.insert(obj.id, obj.clone());
                }
            }
            Broadcast::Created(obj) | Broadcast::Updated(obj) => {
                self.objects.insert(obj.id, obj.clone());
            }
            Broadcast::Deleted(id) => {
                self.objects.remove(id);
            }
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub(crate) mod test_helpers {
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use syncboard_wire::{BoardObject, ObjectKind, Origin};

    use super::BoardSession;
    use crate::transport::Transport;

    /// Session over a fresh channel, returning the receiver for wire
    /// assertions.
    pub fn session() -> (BoardSession, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (transport, rx) = Transport::channel(Uuid::new_v4(), Origin::User(Uuid::new_v4()));
        (BoardSession::new(transport), rx)
    }

    /// A sticky note with the given label at a fixed position.
    #[must_use]
    pub fn sticky(label: &str) -> BoardObject {
        object(ObjectKind::StickyNote, label, 100.0, 200.0)
    }

    /// An object of arbitrary kind for mixed-history tests.
    #[must_use]
    pub fn object(kind: ObjectKind, label: &str, x: f64, y: f64) -> BoardObject {
        BoardObject {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            width: Some(180.0),
            height: Some(120.0),
            rotation: 0.0,
            props: serde_json::json!({"text": label, "color": "#1F1A17"}),
            created_by: Origin::User(Uuid::new_v4()),
            updated_at: 0,
            batch_id: None,
        }
    }
}
