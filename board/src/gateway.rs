//! AI tool gateway — tool calls → authority mutations.
//!
//! DESIGN
//! ======
//! The agent loop hands each tool call to a [`ToolTurn`], which parses the
//! loose JSON input, applies the placement policy, and submits mutations to
//! the [`Authority`]. Tool inputs come from an LLM and are treated as
//! untrusted: missing or malformed arguments are defaulted or reported back
//! through the tool result so the agent can correct itself, rather than
//! aborting the whole turn.
//!
//! A turn owns a batch id and a creation budget. Every object created during
//! the turn carries the batch id, so a client can record the whole turn as
//! one undoable unit, and the budget keeps a confused agent from flooding
//! the board.

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use syncboard_wire::{
    BoardObject, ErrorCode, Mutation, ObjectId, ObjectKind, ObjectPatch, Origin,
};

use crate::authority::Authority;
use crate::consts::{
    BOARD_SUMMARY_THRESHOLD, DEFAULT_NOTE_COLOR, DEFAULT_SHAPE_FILL, MAX_CREATES_PER_TURN,
};
use crate::placement;
use crate::tools::{Tool, board_tools};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("object not found: {0}")]
    NotFound(ObjectId),
    #[error("connector endpoints {0} and {1} share a center")]
    DegenerateConnector(ObjectId, ObjectId),
    #[error("creation limit reached: at most {MAX_CREATES_PER_TURN} objects per turn")]
    CreateBudgetExhausted,
    #[error("authority rejected {op}: {reason}")]
    Rejected { op: &'static str, reason: String },
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "E_UNKNOWN_TOOL",
            Self::NotFound(_) => "E_OBJECT_NOT_FOUND",
            Self::DegenerateConnector(..) => "E_DEGENERATE_CONNECTOR",
            Self::CreateBudgetExhausted => "E_CREATE_BUDGET",
            Self::Rejected { .. } => "E_AUTHORITY_REJECTED",
        }
    }
}

/// One tool invocation as produced by the agent loop.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// The result block returned to the agent loop for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

/// One applied mutation, in execution order, for broadcast-side bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayMutation {
    Created(BoardObject),
    Updated(ObjectId),
    Deleted(ObjectId),
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Tool entry point bound to one board's authority.
pub struct ToolGateway {
    authority: Arc<dyn Authority>,
}

impl ToolGateway {
    #[must_use]
    pub fn new(authority: Arc<dyn Authority>) -> Self {
        Self { authority }
    }

    /// The tool definitions to advertise to the model.
    #[must_use]
    pub fn tools() -> Vec<Tool> {
        board_tools()
    }

    /// Start a tool-invocation turn with a fresh batch id and creation budget.
    #[must_use]
    pub fn begin_turn(&self) -> ToolTurn {
        ToolTurn {
            authority: Arc::clone(&self.authority),
            batch_id: Uuid::new_v4(),
            mutations: Vec::new(),
        }
    }
}

/// One agent turn: shared batch id, bounded creations, ordered mutation log.
pub struct ToolTurn {
    authority: Arc<dyn Authority>,
    batch_id: Uuid,
    mutations: Vec<GatewayMutation>,
}

impl ToolTurn {
    /// Batch id stamped on every object this turn creates.
    #[must_use]
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Mutations applied so far, in execution order.
    #[must_use]
    pub fn mutations(&self) -> &[GatewayMutation] {
        &self.mutations
    }

    /// Objects created this turn, for recording as one undoable unit.
    #[must_use]
    pub fn created_objects(&self) -> Vec<BoardObject> {
        self.mutations
            .iter()
            .filter_map(|m| match m {
                GatewayMutation::Created(obj) => Some(obj.clone()),
                _ => None,
            })
            .collect()
    }

    /// Consume the turn, yielding the full mutation log.
    #[must_use]
    pub fn into_mutations(self) -> Vec<GatewayMutation> {
        self.mutations
    }

    /// Execute one tool call, always producing a result block.
    ///
    /// Failures surface as `is_error` results carrying the reason; they are
    /// never propagated as Rust errors because the agent loop must go on.
    pub async fn execute(&mut self, call: &ToolCall) -> ToolOutcome {
        info!(tool = %call.name, "gateway: executing tool");
        match self.dispatch(&call.name, &call.input).await {
            Ok(content) => {
                info!(tool = %call.name, "gateway: tool ok — {content}");
                ToolOutcome { tool_use_id: call.id.clone(), content, is_error: false }
            }
            Err(e) => {
                warn!(tool = %call.name, code = e.error_code(), error = %e, "gateway: tool error");
                ToolOutcome { tool_use_id: call.id.clone(), content: e.to_string(), is_error: true }
            }
        }
    }

    async fn dispatch(
        &mut self,
        tool_name: &str,
        input: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        match tool_name {
            "createStickyNote" => self.create_sticky_note(input).await,
            "createShape" => self.create_shape(input).await,
            "createFrame" => self.create_frame(input).await,
            "createConnector" => self.create_connector(input).await,
            "moveObject" => self.move_object(input).await,
            "resizeObject" => self.resize_object(input).await,
            "updateText" => self.update_text(input).await,
            "changeColor" => self.change_color(input).await,
            "getBoardState" => self.get_board_state(input).await,
            "deleteObject" => self.delete_object(input).await,
            _ => Err(GatewayError::UnknownTool(tool_name.into())),
        }
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    async fn create_sticky_note(
        &mut self,
        input: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        let text = str_arg(input, "text").unwrap_or("");
        let color = str_arg(input, "color").unwrap_or(DEFAULT_NOTE_COLOR);
        let props = json!({"text": text, "color": color});
        let obj = self.place_and_create(ObjectKind::StickyNote, input, props).await?;
        Ok(format!("created sticky note {}", obj.id))
    }

    async fn create_shape(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let kind = match str_arg(input, "type") {
            Some("ellipse") => ObjectKind::Ellipse,
            // An unrecognized type still yields a visible shape the agent
            // can correct, rather than a stalled turn.
            _ => ObjectKind::Rectangle,
        };
        let fill = str_arg(input, "fill")
            .or_else(|| str_arg(input, "color"))
            .unwrap_or(DEFAULT_SHAPE_FILL);
        let props = json!({"fill": fill});
        let obj = self.place_and_create(kind, input, props).await?;
        Ok(format!("created {} {}", kind.as_str(), obj.id))
    }

    async fn create_frame(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let title = str_arg(input, "title").unwrap_or("Untitled");
        let props = json!({"title": title});
        let obj = self.place_and_create(ObjectKind::Frame, input, props).await?;
        Ok(format!("created frame \"{title}\" {}", obj.id))
    }

    async fn create_connector(
        &mut self,
        input: &serde_json::Value,
    ) -> Result<String, GatewayError> {
        let Some(from_id) = uuid_arg(input, "fromId") else {
            return Ok("error: missing or invalid fromId".into());
        };
        let Some(to_id) = uuid_arg(input, "toId") else {
            return Ok("error: missing or invalid toId".into());
        };
        let style = str_arg(input, "style").unwrap_or("arrow");

        let from = self
            .authority
            .read_object(from_id)
            .await
            .ok_or(GatewayError::NotFound(from_id))?;
        let to = self
            .authority
            .read_object(to_id)
            .await
            .ok_or(GatewayError::NotFound(to_id))?;

        // Geometry is derived, never taken from the input: anchor at the
        // source center, extent the signed center-to-center vector.
        let Some((cx, cy, dx, dy)) = placement::connector_vector(&from, &to) else {
            return Err(GatewayError::DegenerateConnector(from_id, to_id));
        };

        let obj = self
            .submit_create(BoardObject {
                id: Uuid::new_v4(),
                kind: ObjectKind::Connector,
                x: cx,
                y: cy,
                width: Some(dx),
                height: Some(dy),
                rotation: 0.0,
                props: json!({
                    "from_id": from_id.to_string(),
                    "to_id": to_id.to_string(),
                    "head": style,
                }),
                created_by: Origin::Agent,
                updated_at: 0,
                batch_id: Some(self.batch_id),
            })
            .await?;
        Ok(format!("created connector {} from {from_id} to {to_id}", obj.id))
    }

    /// Size, place, clamp, and nudge a new object, then submit it.
    async fn place_and_create(
        &mut self,
        kind: ObjectKind,
        input: &serde_json::Value,
        props: serde_json::Value,
    ) -> Result<BoardObject, GatewayError> {
        let (dw, dh) = placement::default_size(kind);
        let w = f64_arg(input, "width").unwrap_or(dw);
        let h = f64_arg(input, "height").unwrap_or(dh);
        let (x, y) = match (f64_arg(input, "x"), f64_arg(input, "y")) {
            (Some(x), Some(y)) => (x, y),
            _ => placement::random_position(w, h),
        };
        let (x, y) = placement::clamp_to_canvas(x, y, w, h);
        let existing = self.authority.read_objects().await;
        let (x, y) = placement::nudge_off_overlaps(x, y, w, h, &existing);

        self.submit_create(BoardObject {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            width: Some(w),
            height: Some(h),
            rotation: 0.0,
            props,
            created_by: Origin::Agent,
            updated_at: 0,
            batch_id: Some(self.batch_id),
        })
        .await
    }

    async fn submit_create(&mut self, obj: BoardObject) -> Result<BoardObject, GatewayError> {
        if self.creations() >= MAX_CREATES_PER_TURN {
            return Err(GatewayError::CreateBudgetExhausted);
        }
        let outcome = self.authority.mutate(Mutation::Create(obj.clone())).await;
        if !outcome.ok {
            return Err(GatewayError::Rejected {
                op: "create",
                reason: outcome.error.unwrap_or_default(),
            });
        }
        self.mutations.push(GatewayMutation::Created(obj.clone()));
        Ok(obj)
    }

    fn creations(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, GatewayMutation::Created(_)))
            .count()
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    async fn move_object(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let Some(id) = uuid_arg(input, "objectId") else {
            return Ok("error: missing or invalid objectId".into());
        };
        let mut patch = ObjectPatch::new(id);
        if let Some(x) = f64_arg(input, "x") {
            patch.x = Some(x);
        }
        if let Some(y) = f64_arg(input, "y") {
            patch.y = Some(y);
        }
        self.submit_update(patch, "moving").await?;
        Ok(format!("moved object {id}"))
    }

    async fn resize_object(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let Some(id) = uuid_arg(input, "objectId") else {
            return Ok("error: missing or invalid objectId".into());
        };
        let mut patch = ObjectPatch::new(id);
        if let Some(w) = f64_arg(input, "width") {
            patch.width = Some(w);
        }
        if let Some(h) = f64_arg(input, "height") {
            patch.height = Some(h);
        }
        self.submit_update(patch, "resizing").await?;
        Ok(format!("resized object {id}"))
    }

    async fn update_text(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let Some(id) = uuid_arg(input, "objectId") else {
            return Ok("error: missing or invalid objectId".into());
        };
        let new_text = str_arg(input, "newText").unwrap_or("");
        let patch = ObjectPatch::new(id).with_prop("text", json!(new_text));
        self.submit_update(patch, "updating text on").await?;
        Ok(format!("updated text on {id}"))
    }

    async fn change_color(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let Some(id) = uuid_arg(input, "objectId") else {
            return Ok("error: missing or invalid objectId".into());
        };
        let color = str_arg(input, "color").unwrap_or(DEFAULT_SHAPE_FILL);

        // Which props key "color" means depends on the kind, so this tool
        // reads before writing instead of blind-patching.
        let obj = self
            .authority
            .read_object(id)
            .await
            .ok_or(GatewayError::NotFound(id))?;
        let key = match obj.kind {
            ObjectKind::StickyNote | ObjectKind::Text | ObjectKind::Character => "color",
            ObjectKind::Rectangle
            | ObjectKind::Ellipse
            | ObjectKind::Frame
            | ObjectKind::Connector => "fill",
        };
        let patch = ObjectPatch::new(id).with_prop(key, json!(color));
        self.submit_update(patch, "recoloring").await?;
        Ok(format!("changed {key} of {id} to {color}"))
    }

    async fn submit_update(
        &mut self,
        patch: ObjectPatch,
        op: &'static str,
    ) -> Result<(), GatewayError> {
        let id = patch.id;
        let outcome = self.authority.mutate(Mutation::Update(patch)).await;
        if !outcome.ok {
            let reason = outcome.error.unwrap_or_default();
            warn!(%id, op, reason, "gateway: update rejected");
            return Err(GatewayError::Rejected { op, reason });
        }
        self.mutations.push(GatewayMutation::Updated(id));
        Ok(())
    }

    // =========================================================================
    // READ / DELETE
    // =========================================================================

    async fn get_board_state(&self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let objects = self.authority.read_objects().await;

        if let Some(ids) = input.get("ids").and_then(serde_json::Value::as_array) {
            let wanted: HashSet<Uuid> = ids
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| s.parse().ok()))
                .collect();
            let selected: Vec<_> = objects.into_iter().filter(|o| wanted.contains(&o.id)).collect();
            return Ok(listing(&selected));
        }

        if let Some(kind_str) = str_arg(input, "kind") {
            let Ok(kind) = serde_json::from_value::<ObjectKind>(json!(kind_str)) else {
                return Ok(format!("error: unknown kind {kind_str}"));
            };
            let selected: Vec<_> = objects.into_iter().filter(|o| o.kind == kind).collect();
            return Ok(listing(&selected));
        }

        if objects.len() > BOARD_SUMMARY_THRESHOLD {
            return Ok(summary(&objects));
        }
        Ok(listing(&objects))
    }

    async fn delete_object(&mut self, input: &serde_json::Value) -> Result<String, GatewayError> {
        let Some(id) = uuid_arg(input, "objectId") else {
            return Ok("error: missing or invalid objectId".into());
        };
        let outcome = self.authority.mutate(Mutation::Delete(id)).await;
        if !outcome.ok {
            return Err(GatewayError::Rejected {
                op: "delete",
                reason: outcome.error.unwrap_or_default(),
            });
        }
        self.mutations.push(GatewayMutation::Deleted(id));
        Ok(format!("deleted object {id}"))
    }
}

// =============================================================================
// BOARD STATE RENDERING
// =============================================================================

fn listing(objects: &[BoardObject]) -> String {
    let entries: Vec<serde_json::Value> = objects
        .iter()
        .map(|obj| {
            json!({
                "id": obj.id,
                "kind": obj.kind,
                "x": obj.x,
                "y": obj.y,
                "width": obj.width,
                "height": obj.height,
                "rotation": obj.rotation,
                "props": obj.props,
                "updated_at": obj.updated_at,
            })
        })
        .collect();
    json!({ "objects": entries, "count": entries.len() }).to_string()
}

fn summary(objects: &[BoardObject]) -> String {
    let mut kinds: BTreeMap<&'static str, usize> = BTreeMap::new();
    for obj in objects {
        *kinds.entry(obj.kind.as_str()).or_default() += 1;
    }
    json!({
        "summary": true,
        "count": objects.len(),
        "kinds": kinds,
        "hint": format!(
            "board has more than {BOARD_SUMMARY_THRESHOLD} objects; pass kind or ids to narrow"
        ),
    })
    .to_string()
}

// =============================================================================
// LOOSE INPUT PARSING
// =============================================================================

fn str_arg<'a>(input: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(|v| v.as_str())
}

fn f64_arg(input: &serde_json::Value, key: &str) -> Option<f64> {
    input.get(key).and_then(serde_json::Value::as_f64)
}

fn uuid_arg(input: &serde_json::Value, key: &str) -> Option<Uuid> {
    str_arg(input, key).and_then(|s| s.parse().ok())
}
