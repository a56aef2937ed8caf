use uuid::Uuid;

use syncboard_wire::{Broadcast, Mutation, ObjectKind, ObjectPatch, Props, decode_frame};

use super::test_helpers::{session, sticky};
use super::*;

fn snapshot(session: &BoardSession) -> Vec<BoardObject> {
    let mut objects: Vec<BoardObject> = session.objects().cloned().collect();
    objects.sort_by_key(|o| o.id);
    objects
}

fn drain_mutations(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Mutation> {
    let mut out = Vec::new();
    while let Ok(bytes) = rx.try_recv() {
        let frame = decode_frame(&bytes).expect("decode");
        out.push(Mutation::from_frame(&frame).expect("parse"));
    }
    out
}

// =========================================================================
// Dispatcher
// =========================================================================

#[test]
fn create_applies_locally_and_forwards() {
    let (mut session, mut rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());

    assert_eq!(session.object(obj.id), Some(&obj));
    assert_eq!(session.undo_len(), 1);
    assert_eq!(drain_mutations(&mut rx), vec![Mutation::Create(obj)]);
}

#[test]
fn update_applies_patch_and_records_snapshots() {
    let (mut session, mut rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());

    session.update_object(ObjectPatch::new(obj.id).with_position(500.0, 600.0));
    let updated = session.object(obj.id).expect("present");
    assert!((updated.x - 500.0).abs() < f64::EPSILON);
    assert_eq!(session.undo_len(), 2);

    let sent = drain_mutations(&mut rx);
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[1], Mutation::Update(_)));
}

#[test]
fn unknown_update_forwards_without_recording() {
    let (mut session, mut rx) = session();
    let patch = ObjectPatch::new(Uuid::new_v4()).with_position(5.0, 5.0);
    session.update_object(patch.clone());

    // Forwarded on the wire, but no undo record — cannot undo what was
    // never observed locally.
    assert_eq!(session.undo_len(), 0);
    assert_eq!(drain_mutations(&mut rx), vec![Mutation::Update(patch)]);
}

#[test]
fn delete_of_unknown_object_is_forwarded_idempotently() {
    let (mut session, mut rx) = session();
    let id = Uuid::new_v4();
    session.delete_object(id);

    assert_eq!(session.undo_len(), 0);
    assert_eq!(drain_mutations(&mut rx), vec![Mutation::Delete(id)]);
}

// =========================================================================
// Undo / redo
// =========================================================================

#[test]
fn undo_create_deletes_and_forwards_the_delete() {
    let (mut session, mut rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());
    session.undo();

    assert!(session.object(obj.id).is_none());
    let sent = drain_mutations(&mut rx);
    assert_eq!(sent.last(), Some(&Mutation::Delete(obj.id)));
}

#[test]
fn undo_update_restores_before_redo_restores_after() {
    let (mut session, _rx) = session();
    let obj = sticky("old");
    session.create_object(obj.clone());
    session.update_object(
        ObjectPatch::new(obj.id).with_prop("text", serde_json::json!("new")),
    );

    session.undo();
    assert_eq!(Props::new(&session.object(obj.id).expect("present").props).text(), "old");

    session.redo();
    assert_eq!(Props::new(&session.object(obj.id).expect("present").props).text(), "new");
}

#[test]
fn undo_of_prop_adding_update_removes_the_key() {
    let (mut session, _rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());
    session.update_object(
        ObjectPatch::new(obj.id).with_prop("highlight", serde_json::json!(true)),
    );
    assert!(session.object(obj.id).expect("present").props.get("highlight").is_some());

    // The before snapshot had no such key, so undo must strip it, not
    // merely merge the old values over it.
    session.undo();
    let reverted = session.object(obj.id).expect("present");
    assert!(reverted.props.get("highlight").is_none());
    assert_eq!(reverted.props, obj.props);

    session.redo();
    assert!(session.object(obj.id).expect("present").props.get("highlight").is_some());
}

#[test]
fn redo_of_prop_removing_update_removes_the_key_again() {
    let (mut session, _rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());
    session.update_object(ObjectPatch::new(obj.id).with_prop("color", serde_json::Value::Null));
    assert!(session.object(obj.id).expect("present").props.get("color").is_none());

    session.undo();
    assert_eq!(
        Props::new(&session.object(obj.id).expect("present").props).color(),
        "#1F1A17"
    );

    session.redo();
    assert!(session.object(obj.id).expect("present").props.get("color").is_none());
}

#[test]
fn undo_of_recolor_on_unfilled_object_restores_its_props() {
    let (mut session, _rx) = session();
    let mut frame = sticky("grouping");
    frame.kind = ObjectKind::Frame;
    frame.props = serde_json::json!({"title": "Backlog"});
    session.create_object(frame.clone());

    // A recolor introduces "fill" on an object that never had one.
    session.update_object(
        ObjectPatch::new(frame.id).with_prop("fill", serde_json::json!("#AA0000")),
    );
    session.undo();
    assert_eq!(session.object(frame.id).expect("present").props, frame.props);
}

#[test]
fn undo_delete_recreates_the_object() {
    let (mut session, _rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());
    session.delete_object(obj.id);
    assert!(session.object(obj.id).is_none());

    session.undo();
    assert_eq!(session.object(obj.id), Some(&obj));
}

#[test]
fn undo_redo_inverse_law() {
    let (mut session, _rx) = session();
    let a = sticky("a");
    let b = sticky("b");
    session.create_object(a.clone());
    session.update_object(ObjectPatch::new(a.id).with_position(700.0, 800.0));
    session.create_object(b.clone());
    session.delete_object(a.id);

    let final_state = snapshot(&session);
    for _ in 0..4 {
        session.undo();
    }
    assert_eq!(snapshot(&session), Vec::new());
    for _ in 0..4 {
        session.redo();
    }
    assert_eq!(snapshot(&session), final_state);
}

#[test]
fn replay_never_grows_the_stack() {
    let (mut session, _rx) = session();
    session.create_object(sticky("a"));
    session.create_object(sticky("b"));
    let len_before = session.undo_len();

    session.undo();
    session.redo();
    session.undo();
    assert_eq!(session.undo_len(), len_before);
}

#[test]
fn redo_slot_is_invalidated_by_new_action() {
    let (mut session, _rx) = session();
    let a = sticky("a");
    let b = sticky("b");
    let c = sticky("c");
    session.create_object(a.clone());
    session.create_object(b.clone());
    session.undo();
    session.create_object(c.clone());

    session.redo();
    // B must not resurrect; its redo slot died when C was pushed.
    assert!(session.object(b.id).is_none());
    assert!(session.object(a.id).is_some());
    assert!(session.object(c.id).is_some());
}

#[test]
fn batch_is_undone_and_redone_atomically() {
    let (mut session, _rx) = session();
    let a = sticky("a");
    let b = sticky("b");
    session.start_batch();
    session.create_object(a.clone());
    session.create_object(b.clone());
    session.commit_batch();
    assert_eq!(session.undo_len(), 1);

    session.undo();
    assert!(session.object(a.id).is_none());
    assert!(session.object(b.id).is_none());

    session.redo();
    assert!(session.object(a.id).is_some());
    assert!(session.object(b.id).is_some());
}

#[test]
fn external_batch_undoes_agent_turn_as_one_unit() {
    let (mut session, mut rx) = session();
    let a = sticky("agent-1");
    let b = sticky("agent-2");
    // Agent objects arrive via broadcast, then get recorded without
    // re-issuing the creations.
    session.apply_broadcast(&Broadcast::Created(a.clone()));
    session.apply_broadcast(&Broadcast::Created(b.clone()));
    session.record_external_creations(&[a.clone(), b.clone()], "ai-turn");

    assert_eq!(session.top_undo_tag(), Some("ai-turn"));
    // Recording alone puts nothing on the wire.
    assert!(drain_mutations(&mut rx).is_empty());

    session.undo();
    assert!(session.object(a.id).is_none());
    assert!(session.object(b.id).is_none());
    // The undo itself issues the two deletes.
    let sent = drain_mutations(&mut rx);
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| matches!(m, Mutation::Delete(_))));
}

// =========================================================================
// Reconciliation
// =========================================================================

#[test]
fn init_broadcast_replaces_local_state() {
    let (mut session, _rx) = session();
    session.create_object(sticky("stale"));

    let fresh = vec![sticky("x"), sticky("y")];
    session.apply_broadcast(&Broadcast::Init(fresh.clone()));
    assert_eq!(session.object_count(), 2);
    for obj in &fresh {
        assert_eq!(session.object(obj.id), Some(obj));
    }
}

#[test]
fn own_echo_is_a_no_op() {
    let (mut session, _rx) = session();
    let obj = sticky("a");
    session.create_object(obj.clone());
    let before = snapshot(&session);
    let undo_before = session.undo_len();

    // The authority echoes our own create back to us.
    session.apply_broadcast(&Broadcast::Created(obj));
    assert_eq!(snapshot(&session), before);
    assert_eq!(session.undo_len(), undo_before);
}

#[test]
fn update_broadcast_overwrites_with_full_object() {
    let (mut session, _rx) = session();
    let mut obj = sticky("a");
    session.apply_broadcast(&Broadcast::Created(obj.clone()));

    obj.x = 999.0;
    obj.updated_at = 42;
    session.apply_broadcast(&Broadcast::Updated(obj.clone()));
    assert_eq!(session.object(obj.id), Some(&obj));
}

#[test]
fn delete_broadcast_removes_object() {
    let (mut session, _rx) = session();
    let obj = sticky("a");
    session.apply_broadcast(&Broadcast::Created(obj.clone()));
    session.apply_broadcast(&Broadcast::Deleted(obj.id));
    assert!(session.object(obj.id).is_none());

    // Re-delivery of the same delete stays a no-op.
    session.apply_broadcast(&Broadcast::Deleted(obj.id));
    assert_eq!(session.object_count(), 0);
}

#[test]
fn broadcasts_never_touch_the_undo_stack() {
    let (mut session, _rx) = session();
    session.apply_broadcast(&Broadcast::Created(sticky("a")));
    session.apply_broadcast(&Broadcast::Init(vec![sticky("b")]));
    assert_eq!(session.undo_len(), 0);
    assert!(!session.can_undo());
}
