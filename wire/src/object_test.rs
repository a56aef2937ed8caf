use uuid::Uuid;

use super::*;

fn sticky(text: &str) -> BoardObject {
    BoardObject {
        id: Uuid::new_v4(),
        kind: ObjectKind::StickyNote,
        x: 100.0,
        y: 200.0,
        width: Some(180.0),
        height: Some(120.0),
        rotation: 0.0,
        props: serde_json::json!({"text": text, "color": "#1F1A17"}),
        created_by: Origin::Agent,
        updated_at: 1,
        batch_id: None,
    }
}

#[test]
fn kind_serde_uses_snake_case() {
    let json = serde_json::to_string(&ObjectKind::StickyNote).unwrap();
    assert_eq!(json, "\"sticky_note\"");
    let kind: ObjectKind = serde_json::from_str("\"connector\"").unwrap();
    assert_eq!(kind, ObjectKind::Connector);
}

#[test]
fn kind_as_str_matches_serde_name() {
    for kind in [
        ObjectKind::StickyNote,
        ObjectKind::Rectangle,
        ObjectKind::Ellipse,
        ObjectKind::Text,
        ObjectKind::Frame,
        ObjectKind::Connector,
        ObjectKind::Character,
    ] {
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json.as_str().unwrap(), kind.as_str());
    }
}

#[test]
fn origin_serializes_agent_sentinel() {
    let json = serde_json::to_string(&Origin::Agent).unwrap();
    assert_eq!(json, "\"agent\"");
}

#[test]
fn origin_round_trips_user_uuid() {
    let id = Uuid::new_v4();
    let json = serde_json::to_string(&Origin::User(id)).unwrap();
    let restored: Origin = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, Origin::User(id));
}

#[test]
fn origin_rejects_garbage() {
    let result: Result<Origin, _> = serde_json::from_str("\"not-an-origin\"");
    assert!(result.is_err());
}

#[test]
fn board_object_serde_round_trip() {
    let obj = sticky("hello");
    let json = serde_json::to_string(&obj).unwrap();
    let restored: BoardObject = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, obj);
}

#[test]
fn patch_applies_geometry_fields() {
    let mut obj = sticky("hi");
    let patch = ObjectPatch::new(obj.id).with_position(5.0, 6.0).with_size(50.0, 60.0);
    obj.apply_patch(&patch);
    assert!((obj.x - 5.0).abs() < f64::EPSILON);
    assert!((obj.y - 6.0).abs() < f64::EPSILON);
    assert_eq!(obj.width, Some(50.0));
    assert_eq!(obj.height, Some(60.0));
    // Untouched fields survive.
    assert!((obj.rotation).abs() < f64::EPSILON);
}

#[test]
fn patch_shallow_merges_props() {
    let mut obj = sticky("old");
    let patch = ObjectPatch::new(obj.id).with_prop("text", serde_json::json!("new"));
    obj.apply_patch(&patch);
    assert_eq!(Props::new(&obj.props).text(), "new");
    // Sibling keys are preserved, not wiped by the merge.
    assert_eq!(Props::new(&obj.props).color(), "#1F1A17");
}

#[test]
fn patch_null_prop_removes_key() {
    let mut obj = sticky("hi");
    let patch = ObjectPatch::new(obj.id).with_prop("color", serde_json::Value::Null);
    obj.apply_patch(&patch);
    assert!(obj.props.get("color").is_none());
}

#[test]
fn replace_patch_reproduces_object() {
    let original = sticky("snapshot");
    let mut mutated = original.clone();
    mutated.x = 999.0;
    mutated.props = serde_json::json!({"text": "changed", "color": "#FFFFFF"});

    mutated.apply_patch(&ObjectPatch::replace(&original, &mutated.clone()));
    assert!((mutated.x - original.x).abs() < f64::EPSILON);
    assert_eq!(Props::new(&mutated.props).text(), "snapshot");
}

#[test]
fn replace_patch_removes_props_keys_the_target_lacks() {
    let original = sticky("plain");
    let mut mutated = original.clone();
    mutated.props = serde_json::json!({
        "text": "plain",
        "color": "#1F1A17",
        "highlight": true,
    });

    // Rewriting back to the original must strip the key the mutation added.
    mutated.apply_patch(&ObjectPatch::replace(&original, &mutated.clone()));
    assert!(mutated.props.get("highlight").is_none());
    assert_eq!(Props::new(&mutated.props).text(), "plain");
    assert_eq!(Props::new(&mutated.props).color(), "#1F1A17");
}

#[test]
fn empty_patch_is_empty() {
    let patch = ObjectPatch::new(Uuid::new_v4());
    assert!(patch.is_empty());
    assert!(!patch.with_position(1.0, 2.0).is_empty());
}

#[test]
fn props_accessor_defaults() {
    let props = serde_json::json!({});
    let view = Props::new(&props);
    assert_eq!(view.fill(), "#D94B4B");
    assert_eq!(view.color(), "#1F1A17");
    assert_eq!(view.text(), "");
    assert_eq!(view.title(), "");
    assert_eq!(view.head(), "");
}

#[test]
fn connector_geometry_may_be_signed() {
    let mut obj = sticky("v");
    obj.kind = ObjectKind::Connector;
    obj.width = Some(-200.0);
    obj.height = Some(-50.0);
    let json = serde_json::to_string(&obj).unwrap();
    let restored: BoardObject = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.width, Some(-200.0));
    assert_eq!(restored.height, Some(-50.0));
}
