//! Undo/redo engine — a bounded linear history of reversible actions.
//!
//! DESIGN
//! ======
//! One stack per board session, never shared across threads. The stack
//! records actions; it does not apply them. [`BoardSession`] drives replay
//! through the `begin_*`/`finish_*` protocol: `begin` clones the action at
//! the cursor and flips the state machine to `Replaying`, the session
//! re-applies the action through its normal dispatcher entry points (which
//! skip recording while the state is `Replaying`), and `finish` clears the
//! state and moves the cursor. The cursor moves only after the replay
//! completes, so an interrupted replay leaves the action retryable instead
//! of silently lost.
//!
//! [`BoardSession`]: crate::session::BoardSession

#[cfg(test)]
#[path = "undo_test.rs"]
mod tests;

use tracing::warn;

use syncboard_wire::BoardObject;

use crate::consts::UNDO_CAPACITY;

/// Client-local record of one reversible effect.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// An object was created; undo deletes it.
    Create { obj: BoardObject },
    /// An object was updated; undo applies `before`, redo applies `after`.
    Update { before: BoardObject, after: BoardObject },
    /// An object was deleted; undo re-creates it.
    Delete { obj: BoardObject },
    /// An ordered group, undone in reverse order and redone in forward order.
    Batch { actions: Vec<UndoAction>, tag: Option<String> },
}

/// Whether the session is currently replaying recorded history.
///
/// Checked by every dispatcher entry point: while `Replaying`, mutations are
/// applied and forwarded but never recorded. Without this, undo would record
/// its own reversal as a new forward action and corrupt the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayState {
    #[default]
    Idle,
    Replaying,
}

/// Bounded action stack with batch grouping and safe replay bookkeeping.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoAction>,
    /// Index of the last applied action; `None` means nothing to undo.
    cursor: Option<usize>,
    /// Buffer collecting pushes between `start_batch` and `commit_batch`.
    open_batch: Option<Vec<UndoAction>>,
    state: ReplayState,
}

impl UndoStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an undo or redo replay is in flight.
    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.state == ReplayState::Replaying
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `undo` would replay something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// True when `redo` would replay something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    /// Record a new forward action.
    ///
    /// While a batch is open the action lands in the batch buffer instead of
    /// the history. Otherwise any redo history past the cursor is invalidated,
    /// the action is appended, and the stack is trimmed to capacity from the
    /// front (clamping the cursor accordingly).
    pub fn push(&mut self, action: UndoAction) {
        if let Some(buffer) = self.open_batch.as_mut() {
            buffer.push(action);
            return;
        }

        match self.cursor {
            Some(c) => self.entries.truncate(c + 1),
            None => self.entries.clear(),
        }
        self.entries.push(action);
        if self.entries.len() > UNDO_CAPACITY {
            let overflow = self.entries.len() - UNDO_CAPACITY;
            self.entries.drain(..overflow);
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Open a grouping window: subsequent pushes collapse into one action at
    /// [`commit_batch`](Self::commit_batch) time.
    ///
    /// Calling this while a batch is already open is a recoverable programming
    /// error: the pending batch is committed first so it is not silently lost.
    pub fn start_batch(&mut self) {
        if self.open_batch.is_some() {
            warn!("start_batch called while a batch is open; committing pending batch");
            self.commit_batch();
        }
        self.open_batch = Some(Vec::new());
    }

    /// Close the grouping window. Zero buffered actions record nothing, one
    /// records the plain action, several record a single untagged batch.
    pub fn commit_batch(&mut self) {
        let Some(mut buffer) = self.open_batch.take() else {
            return;
        };
        match buffer.len() {
            0 => {}
            1 => {
                let Some(only) = buffer.pop() else { return };
                self.push(only);
            }
            _ => self.push(UndoAction::Batch { actions: buffer, tag: None }),
        }
    }

    /// Record externally-already-applied creations as one tagged batch,
    /// without re-issuing the creations.
    ///
    /// Used for objects another actor (the AI agent) placed through its own
    /// path, so a human can undo that whole move as a unit.
    pub fn push_external_batch(&mut self, objects: &[BoardObject], tag: impl Into<String>) {
        if objects.is_empty() {
            return;
        }
        let actions = objects
            .iter()
            .map(|obj| UndoAction::Create { obj: obj.clone() })
            .collect();
        self.push(UndoAction::Batch { actions, tag: Some(tag.into()) });
    }

    /// Tag of the batch at the cursor, if the top entry is a tagged batch.
    #[must_use]
    pub fn top_tag(&self) -> Option<&str> {
        let cursor = self.cursor?;
        match self.entries.get(cursor)? {
            UndoAction::Batch { tag, .. } => tag.as_deref(),
            _ => None,
        }
    }

    /// Start an undo replay: returns the action at the cursor and flips the
    /// state machine to `Replaying`. `None` when there is nothing to undo.
    ///
    /// Must be paired with [`finish_undo`](Self::finish_undo) after the
    /// returned action has been applied in the undo direction.
    #[must_use]
    pub fn begin_undo(&mut self) -> Option<UndoAction> {
        let cursor = self.cursor?;
        let action = self.entries.get(cursor)?.clone();
        self.state = ReplayState::Replaying;
        Some(action)
    }

    /// Complete an undo replay: clears the replay state and retreats the
    /// cursor. The cursor moves only here, after the replay, so a faulting
    /// replay leaves it unmoved and retryable.
    pub fn finish_undo(&mut self) {
        self.state = ReplayState::Idle;
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(c) => Some(c - 1),
        };
    }

    /// Start a redo replay: returns the action just past the cursor and flips
    /// the state machine to `Replaying`. `None` when there is nothing to redo.
    #[must_use]
    pub fn begin_redo(&mut self) -> Option<UndoAction> {
        let action = self.entries.get(self.next_index())?.clone();
        self.state = ReplayState::Replaying;
        Some(action)
    }

    /// Complete a redo replay: clears the replay state and advances the
    /// cursor. Same after-the-replay ordering as [`finish_undo`](Self::finish_undo).
    pub fn finish_redo(&mut self) {
        self.state = ReplayState::Idle;
        self.cursor = Some(self.next_index().min(self.entries.len().saturating_sub(1)));
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }
}
