//! Board object model: the closed kind union, origin tags, full objects,
//! and the sparse patch type used by update mutations.
//!
//! DESIGN
//! ======
//! `props` stays an open-ended JSON bag validated per-kind by whichever tool
//! creates the object; everything that interprets it must switch on
//! [`ObjectKind`] first. The kind union is deliberately closed — adding a
//! variant is a compiler-checked change at every match site, not a silent
//! stringly-typed one.

#[cfg(test)]
#[path = "object_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a board object.
pub type ObjectId = Uuid;

/// The kind of a board object. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Text-bearing note card.
    StickyNote,
    /// Axis-aligned rectangle.
    Rectangle,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// Free-standing text label.
    Text,
    /// Titled rectangular region that groups content.
    Frame,
    /// Line/arrow between two objects; width/height hold the signed
    /// center-to-center vector.
    Connector,
    /// Placeable character sprite.
    Character,
}

impl ObjectKind {
    /// Stable snake_case label, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StickyNote => "sticky_note",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Text => "text",
            Self::Frame => "frame",
            Self::Connector => "connector",
            Self::Character => "character",
        }
    }
}

/// The actor that caused a mutation: a human user or the AI agent sentinel.
///
/// Serialized as the user UUID string, or the literal `"agent"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Origin {
    User(Uuid),
    Agent,
}

/// Wire representation of [`Origin::Agent`].
pub const AGENT_ORIGIN: &str = "agent";

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::User(id) => id.to_string(),
            Origin::Agent => AGENT_ORIGIN.to_owned(),
        }
    }
}

impl TryFrom<String> for Origin {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == AGENT_ORIGIN {
            return Ok(Self::Agent);
        }
        value
            .parse::<Uuid>()
            .map(Self::User)
            .map_err(|_| format!("invalid origin: {value}"))
    }
}

/// A board object as stored in the session map and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    /// Creator-assigned identifier, stable for the object's lifetime.
    pub id: ObjectId,
    /// Shape or edge type.
    pub kind: ObjectKind,
    /// Left edge of the bounding box in world coordinates.
    pub x: f64,
    /// Top edge of the bounding box in world coordinates.
    pub y: f64,
    /// Bounding-box width; signed for directional kinds, `None` for
    /// kind-default sizing.
    pub width: Option<f64>,
    /// Bounding-box height; signed for directional kinds.
    pub height: Option<f64>,
    /// Clockwise rotation in degrees around the bounding-box center.
    pub rotation: f64,
    /// Open-ended per-kind properties (fill, text, endpoints, head style, …).
    pub props: serde_json::Value,
    /// The actor that created this object.
    pub created_by: Origin,
    /// Milliseconds since epoch of the last authority-observed write.
    /// A last-write-wins hint, not a vector clock.
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub updated_at: i64,
    /// Creation batch this object belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
}

impl BoardObject {
    /// Apply a sparse patch in place. Present geometry fields overwrite;
    /// `props` keys shallow-merge, with `null` values removing keys.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.width {
            self.width = Some(w);
        }
        if let Some(h) = patch.height {
            self.height = Some(h);
        }
        if let Some(r) = patch.rotation {
            self.rotation = r;
        }
        if let Some(ts) = patch.updated_at {
            self.updated_at = ts;
        }
        if let Some(ref incoming) = patch.props {
            if !self.props.is_object() {
                self.props = serde_json::json!({});
            }
            if let Some(existing) = self.props.as_object_mut() {
                for (k, v) in incoming {
                    if v.is_null() {
                        existing.remove(k);
                    } else {
                        existing.insert(k.clone(), v.clone());
                    }
                }
            }
        }
    }
}

/// Sparse update for a board object, keyed by id. Only present fields are
/// applied; `props` is a shallow merge map, never a wholesale replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPatch {
    /// Target object id.
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New rotation in degrees, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Props keys to merge or remove (`null` values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Map<String, serde_json::Value>>,
    /// Authority-stamped write time; absent on client-originated patches.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_i64_from_number"
    )]
    pub updated_at: Option<i64>,
}

impl ObjectPatch {
    /// An empty patch targeting `id`.
    #[must_use]
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            x: None,
            y: None,
            width: None,
            height: None,
            rotation: None,
            props: None,
            updated_at: None,
        }
    }

    /// A full-field patch that rewrites an object to match `target`. Used by
    /// undo/redo to re-apply a recorded snapshot.
    ///
    /// The props merge can only add or overwrite keys, so keys `current`
    /// carries that `target` lacks are emitted as `null` (which
    /// [`BoardObject::apply_patch`] removes). Without that, reverting an
    /// update that added a key would leave the key behind.
    #[must_use]
    pub fn replace(target: &BoardObject, current: &BoardObject) -> Self {
        let mut props = target.props.as_object().cloned().unwrap_or_default();
        if let Some(current_props) = current.props.as_object() {
            for key in current_props.keys() {
                if !props.contains_key(key) {
                    props.insert(key.clone(), serde_json::Value::Null);
                }
            }
        }
        Self {
            id: target.id,
            x: Some(target.x),
            y: Some(target.y),
            width: target.width,
            height: target.height,
            rotation: Some(target.rotation),
            props: Some(props),
            updated_at: Some(target.updated_at),
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Merge a single props key into the patch.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props
            .get_or_insert_with(serde_json::Map::new)
            .insert(key.into(), value);
        self
    }

    /// True when the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
            && self.updated_at.is_none()
            && self.props.as_ref().is_none_or(serde_json::Map::is_empty)
    }
}

/// Accept both integer and integral-float JSON numbers as `i64`.
///
/// The protobuf `Value` bridge represents every number as `f64`, so timestamps
/// that crossed the binary codec arrive as floats.
fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return Ok(int);
            }
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            if let Some(float) = number.as_f64() {
                if float.is_finite()
                    && float.fract() == 0.0
                    && float >= i64::MIN as f64
                    && float <= i64::MAX as f64
                {
                    return Ok(float as i64);
                }
            }
            Err(D::Error::custom("expected integer-compatible number"))
        }
        _ => Err(D::Error::custom("expected number")),
    }
}

fn deserialize_opt_i64_from_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        // `serde_json::Value` is itself a deserializer, so the scalar helper applies.
        Some(number) => deserialize_i64_from_number(number)
            .map(Some)
            .map_err(D::Error::custom),
    }
}

/// Typed access to common props fields from a `BoardObject.props` JSON value.
pub struct Props<'a> {
    value: &'a serde_json::Value,
}

impl<'a> Props<'a> {
    /// Wrap a reference to a `props` JSON value for typed access.
    #[must_use]
    pub fn new(value: &'a serde_json::Value) -> Self {
        Self { value }
    }

    /// Fill color as a CSS color string. Defaults to `"#D94B4B"` when absent.
    #[must_use]
    pub fn fill(&self) -> &str {
        self.str_or("fill", "#D94B4B")
    }

    /// Text/ink color. Defaults to `"#1F1A17"` when absent.
    #[must_use]
    pub fn color(&self) -> &str {
        self.str_or("color", "#1F1A17")
    }

    /// Label text displayed on the object. Empty string when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.str_or("text", "")
    }

    /// Frame title. Empty string when absent.
    #[must_use]
    pub fn title(&self) -> &str {
        self.str_or("title", "")
    }

    /// Arrowhead style at the connector head. Empty string when absent.
    #[must_use]
    pub fn head(&self) -> &str {
        self.str_or("head", "")
    }

    fn str_or(&self, key: &str, default: &'a str) -> &str {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }
}
