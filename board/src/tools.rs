//! Tool definitions exposed to the AI agent.

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;

/// A callable tool: name, human description, and a JSON Schema for its input.
///
/// The schema is advisory. The gateway parses inputs leniently and reports
/// problems back through tool results rather than rejecting calls outright,
/// because a stalled agent loop is worse than a defaulted argument.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Build the board manipulation tool set.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn board_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "createStickyNote".into(),
            description: "Create a sticky note on the board.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text content of the sticky note" },
                    "x": { "type": "number", "description": "X position on canvas (auto-placed if omitted)" },
                    "y": { "type": "number", "description": "Y position on canvas (auto-placed if omitted)" },
                    "color": { "type": "string", "description": "Background color (hex, e.g. #FFEB3B)" }
                },
                "required": ["text"]
            }),
        },
        Tool {
            name: "createShape".into(),
            description: "Create a shape (rectangle or ellipse) on the board.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["rectangle", "ellipse"], "description": "Shape type" },
                    "x": { "type": "number", "description": "X position on canvas (auto-placed if omitted)" },
                    "y": { "type": "number", "description": "Y position on canvas (auto-placed if omitted)" },
                    "width": { "type": "number", "description": "Width in pixels" },
                    "height": { "type": "number", "description": "Height in pixels" },
                    "fill": { "type": "string", "description": "Fill color (hex)" }
                },
                "required": ["type"]
            }),
        },
        Tool {
            name: "createFrame".into(),
            description: "Create a frame — a titled rectangular region that groups content on the board.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Frame title displayed at the top" },
                    "x": { "type": "number", "description": "X position on canvas (auto-placed if omitted)" },
                    "y": { "type": "number", "description": "Y position on canvas (auto-placed if omitted)" },
                    "width": { "type": "number", "description": "Width in pixels" },
                    "height": { "type": "number", "description": "Height in pixels" }
                },
                "required": ["title"]
            }),
        },
        Tool {
            name: "createConnector".into(),
            description: "Create a connector line/arrow between two existing objects. \
                          Its geometry is derived from the endpoints' centers."
                .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "fromId": { "type": "string", "format": "uuid", "description": "Source object ID" },
                    "toId": { "type": "string", "format": "uuid", "description": "Target object ID" },
                    "style": { "type": "string", "enum": ["line", "arrow", "dashed"], "description": "Connector visual style" }
                },
                "required": ["fromId", "toId"]
            }),
        },
        Tool {
            name: "moveObject".into(),
            description: "Move an object to a new position.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "objectId": { "type": "string", "format": "uuid", "description": "ID of the object to move" },
                    "x": { "type": "number", "description": "New X position" },
                    "y": { "type": "number", "description": "New Y position" }
                },
                "required": ["objectId", "x", "y"]
            }),
        },
        Tool {
            name: "resizeObject".into(),
            description: "Resize an object to new dimensions.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "objectId": { "type": "string", "format": "uuid", "description": "ID of the object to resize" },
                    "width": { "type": "number", "description": "New width in pixels" },
                    "height": { "type": "number", "description": "New height in pixels" }
                },
                "required": ["objectId", "width", "height"]
            }),
        },
        Tool {
            name: "updateText".into(),
            description: "Update the text content of an object (sticky note, frame title, etc).".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "objectId": { "type": "string", "format": "uuid", "description": "ID of the object to update" },
                    "newText": { "type": "string", "description": "New text content" }
                },
                "required": ["objectId", "newText"]
            }),
        },
        Tool {
            name: "changeColor".into(),
            description: "Change the color of an object. Applies to the text color of notes \
                          and text, or the fill of shapes, frames, and connectors."
                .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "objectId": { "type": "string", "format": "uuid", "description": "ID of the object to recolor" },
                    "color": { "type": "string", "description": "New color (hex, e.g. #FF5722)" }
                },
                "required": ["objectId", "color"]
            }),
        },
        Tool {
            name: "getBoardState".into(),
            description: "Retrieve the current state of objects on the board. Use this to understand \
                          what's on the board before making changes. Large unfiltered boards return \
                          a per-kind summary; pass a filter or ids to narrow."
                .into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "kind": {
                        "type": "string",
                        "enum": ["sticky_note", "rectangle", "ellipse", "text", "frame", "connector", "character"],
                        "description": "Only return objects of this kind"
                    },
                    "ids": {
                        "type": "array",
                        "items": { "type": "string", "format": "uuid" },
                        "description": "Only return these objects"
                    }
                }
            }),
        },
        Tool {
            name: "deleteObject".into(),
            description: "Delete an object from the board.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "objectId": { "type": "string", "format": "uuid", "description": "ID of the object to delete" }
                },
                "required": ["objectId"]
            }),
        },
    ]
}
