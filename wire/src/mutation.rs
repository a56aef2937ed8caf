//! Typed mutation and broadcast messages layered on the [`Frame`] envelope.
//!
//! DESIGN
//! ======
//! Clients send mutations as `request` frames; the authority answers every
//! connected client (the sender included) with `done` frames carrying full
//! objects, never partials. A freshly joined client receives one `board:init`
//! frame with the complete object list.

#[cfg(test)]
#[path = "mutation_test.rs"]
mod tests;

use serde_json::{Value, json};

use crate::object::{BoardObject, ObjectId, ObjectPatch};
use crate::{ErrorCode, Frame, Status};

/// Syscall for object creation.
pub const SYSCALL_CREATE: &str = "object:create";
/// Syscall for sparse object updates.
pub const SYSCALL_UPDATE: &str = "object:update";
/// Syscall for object deletion.
pub const SYSCALL_DELETE: &str = "object:delete";
/// Syscall for the full-snapshot frame sent to a newly joined client.
pub const SYSCALL_INIT: &str = "board:init";

/// Error produced when a frame cannot be read as a typed message.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("unexpected status {status:?} for syscall {syscall}")]
    UnexpectedStatus { syscall: String, status: Status },
    #[error("malformed payload for {syscall}: {detail}")]
    Payload { syscall: &'static str, detail: String },
}

impl ErrorCode for MutationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
            Self::UnexpectedStatus { .. } => "E_UNEXPECTED_STATUS",
            Self::Payload { .. } => "E_MALFORMED_PAYLOAD",
        }
    }
}

/// The wire-level unit of change, client → authority.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a new object. The creator assigns the id.
    Create(BoardObject),
    /// Patch an existing object; carries only changed fields.
    Update(ObjectPatch),
    /// Delete by id. Idempotent at the authority.
    Delete(ObjectId),
}

impl Mutation {
    /// The syscall string this mutation travels under.
    #[must_use]
    pub fn syscall(&self) -> &'static str {
        match self {
            Self::Create(_) => SYSCALL_CREATE,
            Self::Update(_) => SYSCALL_UPDATE,
            Self::Delete(_) => SYSCALL_DELETE,
        }
    }

    /// Id of the object this mutation touches.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        match self {
            Self::Create(obj) => obj.id,
            Self::Update(patch) => patch.id,
            Self::Delete(id) => *id,
        }
    }

    /// Wrap the mutation in a request frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        let data = match self {
            Self::Create(obj) => json!(obj),
            Self::Update(patch) => json!(patch),
            Self::Delete(id) => json!({ "id": id }),
        };
        Frame::request(self.syscall(), data)
    }

    /// Read a mutation out of a request frame.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] for unknown syscalls, non-request status, or
    /// payloads that do not deserialize.
    pub fn from_frame(frame: &Frame) -> Result<Self, MutationError> {
        if frame.status != Status::Request {
            return Err(MutationError::UnexpectedStatus {
                syscall: frame.syscall.clone(),
                status: frame.status,
            });
        }
        match frame.syscall.as_str() {
            SYSCALL_CREATE => parse_payload(SYSCALL_CREATE, &frame.data).map(Self::Create),
            SYSCALL_UPDATE => parse_payload(SYSCALL_UPDATE, &frame.data).map(Self::Update),
            SYSCALL_DELETE => parse_delete_id(SYSCALL_DELETE, &frame.data).map(Self::Delete),
            other => Err(MutationError::UnknownSyscall(other.to_owned())),
        }
    }
}

/// Authority → clients notification. Create/update carry full objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    /// Full object list for a newly joined client.
    Init(Vec<BoardObject>),
    /// An object was created.
    Created(BoardObject),
    /// An object changed; the full post-update object is carried.
    Updated(BoardObject),
    /// An object was deleted.
    Deleted(ObjectId),
}

impl Broadcast {
    /// The syscall string this broadcast travels under.
    #[must_use]
    pub fn syscall(&self) -> &'static str {
        match self {
            Self::Init(_) => SYSCALL_INIT,
            Self::Created(_) => SYSCALL_CREATE,
            Self::Updated(_) => SYSCALL_UPDATE,
            Self::Deleted(_) => SYSCALL_DELETE,
        }
    }

    /// Wrap the broadcast in a done frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        let data = match self {
            Self::Init(objects) => json!({ "objects": objects }),
            Self::Created(obj) | Self::Updated(obj) => json!(obj),
            Self::Deleted(id) => json!({ "id": id }),
        };
        let mut frame = Frame::request(self.syscall(), data);
        frame.status = Status::Done;
        frame
    }

    /// Read a broadcast out of a done frame.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError`] for unknown syscalls, non-done status, or
    /// payloads that do not deserialize.
    pub fn from_frame(frame: &Frame) -> Result<Self, MutationError> {
        if frame.status != Status::Done {
            return Err(MutationError::UnexpectedStatus {
                syscall: frame.syscall.clone(),
                status: frame.status,
            });
        }
        match frame.syscall.as_str() {
            SYSCALL_INIT => {
                let objects = frame
                    .data
                    .get("objects")
                    .cloned()
                    .unwrap_or(Value::Array(Vec::new()));
                parse_payload(SYSCALL_INIT, &objects).map(Self::Init)
            }
            SYSCALL_CREATE => parse_payload(SYSCALL_CREATE, &frame.data).map(Self::Created),
            SYSCALL_UPDATE => parse_payload(SYSCALL_UPDATE, &frame.data).map(Self::Updated),
            SYSCALL_DELETE => parse_delete_id(SYSCALL_DELETE, &frame.data).map(Self::Deleted),
            other => Err(MutationError::UnknownSyscall(other.to_owned())),
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    syscall: &'static str,
    data: &Value,
) -> Result<T, MutationError> {
    serde_json::from_value(data.clone())
        .map_err(|e| MutationError::Payload { syscall, detail: e.to_string() })
}

fn parse_delete_id(syscall: &'static str, data: &Value) -> Result<ObjectId, MutationError> {
    data.get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<ObjectId>().ok())
        .ok_or(MutationError::Payload { syscall, detail: "missing or invalid id".to_owned() })
}
