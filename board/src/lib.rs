//! Client-side board core: object map, per-client undo/redo, mutation
//! dispatch, and the AI tool gateway.
//!
//! DESIGN
//! ======
//! The crate is the embeddable core of a multiplayer canvas client. A
//! [`session::BoardSession`] owns the local object map and undo history and
//! forwards every mutation over a [`transport::Transport`]; the
//! [`authority::Authority`] trait abstracts the sequencing server, with
//! [`authority::InMemoryAuthority`] standing in for tests and in-process
//! harnesses. [`gateway::ToolGateway`] turns loosely-typed AI tool calls into
//! validated, placement-checked mutations against an authority. Wire types
//! and the frame codec live in the companion `syncboard-wire` crate.

pub mod authority;
pub mod consts;
pub mod gateway;
pub mod placement;
pub mod session;
pub mod tools;
pub mod transport;
pub mod undo;

pub use authority::{Authority, InMemoryAuthority, MutateOutcome};
pub use gateway::{GatewayError, GatewayMutation, ToolCall, ToolGateway, ToolOutcome, ToolTurn};
pub use session::BoardSession;
pub use transport::Transport;
pub use undo::{ReplayState, UndoAction, UndoStack};
