//! Outbound transport handle: fire-and-forget mutation forwarding.
//!
//! DESIGN
//! ======
//! Every mutation forward is a non-blocking send of a protobuf-encoded frame
//! onto an unbounded channel; the session never awaits acknowledgment, so
//! user interaction and chained AI tool calls are never blocked on network
//! round-trips. Transport-level failures (a dropped receiver) are logged and
//! swallowed — the undo stack was already updated optimistically, and healing
//! the divergence is reconciliation's job, not the sender's.

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use syncboard_wire::{Mutation, Origin, encode_frame};

/// Sending half of a board connection, stamped with board and origin context.
#[derive(Debug, Clone)]
pub struct Transport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    board_id: Uuid,
    from: Origin,
}

impl Transport {
    /// Create a transport and the receiver end that a connection task (or a
    /// test) drains.
    #[must_use]
    pub fn channel(board_id: Uuid, from: Origin) -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound, board_id, from }, rx)
    }

    /// The board this transport is connected to.
    #[must_use]
    pub fn board_id(&self) -> Uuid {
        self.board_id
    }

    /// The origin stamped onto outgoing frames.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.from
    }

    /// Forward a mutation to the authority. Never blocks, never fails the
    /// caller.
    pub fn send(&self, mutation: &Mutation) {
        let frame = mutation
            .to_frame()
            .with_board_id(self.board_id)
            .with_from(String::from(self.from));
        if self.outbound.send(encode_frame(&frame)).is_err() {
            warn!(
                board_id = %self.board_id,
                syscall = mutation.syscall(),
                "transport closed; mutation dropped"
            );
        }
    }
}
