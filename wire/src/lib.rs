//! Shared wire vocabulary for the realtime board protocol.
//!
//! This crate owns everything both sides of the wire must agree on: the
//! [`Frame`] envelope and its protobuf codec, the [`BoardObject`] data model,
//! and the typed [`Mutation`]/[`Broadcast`] messages layered on top of frames.
//! Frame payloads stay flexible (`serde_json::Value`) while encoding over
//! protobuf for compact binary transport.

pub mod mutation;
pub mod object;

use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use mutation::{Broadcast, Mutation, MutationError};
pub use object::{BoardObject, ObjectId, ObjectKind, ObjectPatch, Origin, Props};

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
    /// An id field on the wire is not a valid UUID.
    #[error("invalid frame id field {field}: {value}")]
    InvalidId { field: &'static str, value: String },
}

/// Grepable error code and retryable flag for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for CodecError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_FRAME_DECODE",
            Self::InvalidStatus(_) => "E_FRAME_STATUS",
            Self::InvalidId { .. } => "E_FRAME_ID",
        }
    }
}

/// Lifecycle status of a frame in a request/response exchange.
///
/// Every exchange is `request → item* → done` or `request → error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Initial request frame sent by a client.
    Request,
    /// Intermediate streaming item (non-terminal).
    Item,
    /// Successful terminal response; also used for authority broadcasts.
    Done,
    /// Error terminal response.
    Error,
    /// Cancellation frame.
    Cancel,
}

impl Status {
    /// Terminal statuses end a response stream.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Error | Status::Cancel)
    }

    /// Convert status into wire enum integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Request => WireFrameStatus::Request as i32,
            Self::Item => WireFrameStatus::Item as i32,
            Self::Done => WireFrameStatus::Done as i32,
            Self::Error => WireFrameStatus::Error as i32,
            Self::Cancel => WireFrameStatus::Cancel as i32,
        }
    }

    /// Parse a status from wire enum integer value.
    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireFrameStatus::try_from(value) {
            Ok(WireFrameStatus::Request) => Ok(Self::Request),
            Ok(WireFrameStatus::Item) => Ok(Self::Item),
            Ok(WireFrameStatus::Done) => Ok(Self::Done),
            Ok(WireFrameStatus::Error) => Ok(Self::Error),
            Ok(WireFrameStatus::Cancel) => Ok(Self::Cancel),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }
}

/// A single message on the realtime wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame.
    pub id: Uuid,
    /// ID of the request frame this is responding to, if any.
    pub parent_id: Option<Uuid>,
    /// Milliseconds since the Unix epoch when the frame was created.
    pub ts: i64,
    /// Board context for this frame, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<Uuid>,
    /// Sender identifier (user ID string or the agent sentinel).
    pub from: Option<String>,
    /// Namespaced operation name, e.g. `"object:create"`.
    pub syscall: String,
    /// Lifecycle position of the frame.
    pub status: Status,
    /// Arbitrary JSON payload.
    pub data: Value,
}

/// Frame data key for error messages.
pub const FRAME_MESSAGE: &str = "message";

/// Frame data key for grepable error codes.
pub const FRAME_CODE: &str = "code";

/// Frame data key for the retryable flag on error frames.
pub const FRAME_RETRYABLE: &str = "retryable";

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame. Entry point for every syscall.
    pub fn request(syscall: impl Into<String>, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            board_id: None,
            from: None,
            syscall: syscall.into(),
            status: Status::Request,
            data,
        }
    }

    /// Create an item response carrying one result.
    #[must_use]
    pub fn item(&self, data: Value) -> Self {
        self.reply(Status::Item, data)
    }

    /// Create a done response.
    #[must_use]
    pub fn done(&self, data: Value) -> Self {
        self.reply(Status::Done, data)
    }

    /// Create a structured error response from a typed error. Terminal.
    #[must_use]
    pub fn error_from(&self, err: &(impl ErrorCode + ?Sized)) -> Self {
        let mut data = Map::new();
        data.insert(FRAME_CODE.into(), Value::String(err.error_code().to_owned()));
        data.insert(FRAME_MESSAGE.into(), Value::String(err.to_string()));
        data.insert(FRAME_RETRYABLE.into(), Value::Bool(err.retryable()));
        self.reply(Status::Error, Value::Object(data))
    }

    /// Build a reply frame. Inherits `parent_id`, `board_id`, and `syscall`.
    fn reply(&self, status: Status, data: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            board_id: self.board_id,
            from: None,
            syscall: self.syscall.clone(),
            status,
            data,
        }
    }

    #[must_use]
    pub fn with_board_id(mut self, board_id: Uuid) -> Self {
        self.board_id = Some(board_id);
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Extract the syscall prefix (everything before the first ':').
    #[must_use]
    pub fn prefix(&self) -> &str {
        let Some((prefix, _)) = self.syscall.split_once(':') else {
            return &self.syscall;
        };
        prefix
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Safety: encoding into a Vec<u8> is infallible; the only error prost
    // returns here is `BufferTooSmall`, which cannot occur with a growable Vec.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes,
/// [`CodecError::InvalidStatus`] for out-of-range status values, and
/// [`CodecError::InvalidId`] for non-UUID id fields.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.to_string(),
        parent_id: frame.parent_id.map(|id| id.to_string()),
        ts: frame.ts,
        board_id: frame.board_id.map(|id| id.to_string()),
        from: frame.from.clone(),
        syscall: frame.syscall.clone(),
        status: frame.status.as_i32(),
        data: Some(json_to_proto_value(&frame.data)),
    }
}

fn parse_id(field: &'static str, value: &str) -> Result<Uuid, CodecError> {
    value
        .parse::<Uuid>()
        .map_err(|_| CodecError::InvalidId { field, value: value.to_owned() })
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, CodecError> {
    Ok(Frame {
        id: parse_id("id", &wire.id)?,
        parent_id: wire
            .parent_id
            .as_deref()
            .map(|id| parse_id("parent_id", id))
            .transpose()?,
        ts: wire.ts,
        board_id: wire
            .board_id
            .as_deref()
            .map(|id| parse_id("board_id", id))
            .transpose()?,
        from: wire.from,
        syscall: wire.syscall,
        status: Status::from_i32(wire.status)?,
        data: wire
            .data
            .map_or(Value::Object(Map::new()), |v| proto_to_json_value(&v)),
    })
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => {
            serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number)
        }
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json_value).collect())
        }
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, optional, tag = "4")]
    board_id: Option<String>,
    #[prost(string, optional, tag = "5")]
    from: Option<String>,
    #[prost(string, tag = "6")]
    syscall: String,
    #[prost(enumeration = "WireFrameStatus", tag = "7")]
    status: i32,
    #[prost(message, optional, tag = "8")]
    data: Option<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireFrameStatus {
    Request = 0,
    Done = 1,
    Error = 2,
    Cancel = 3,
    Item = 4,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
