//! End-to-end agent turn: gateway mutations reach the authority, broadcasts
//! reconcile a client session, and the recorded batch undoes as one unit.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use syncboard::authority::{Authority, InMemoryAuthority};
use syncboard::gateway::{ToolCall, ToolGateway};
use syncboard::session::BoardSession;
use syncboard::transport::Transport;
use syncboard_wire::{Broadcast, Origin, decode_frame};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn client_session() -> (BoardSession, tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
    let (transport, rx) = Transport::channel(Uuid::new_v4(), Origin::User(Uuid::new_v4()));
    (BoardSession::new(transport), rx)
}

fn call(name: &str, input: serde_json::Value) -> ToolCall {
    ToolCall { id: format!("toolu_{name}"), name: name.into(), input }
}

#[tokio::test]
async fn agent_turn_round_trips_through_authority_session_and_undo() {
    init_tracing();
    let authority = Arc::new(InMemoryAuthority::new());
    let mut broadcasts = authority.subscribe();
    let (mut session, mut wire_rx) = client_session();

    // The agent creates two notes and links them.
    let gateway = ToolGateway::new(authority.clone());
    let mut turn = gateway.begin_turn();
    let a = turn
        .execute(&call("createStickyNote", json!({"text": "cause", "x": 100.0, "y": 200.0})))
        .await;
    let b = turn
        .execute(&call("createStickyNote", json!({"text": "effect", "x": 700.0, "y": 600.0})))
        .await;
    assert!(!a.is_error && !b.is_error);

    let created = turn.created_objects();
    let connector = turn
        .execute(&call(
            "createConnector",
            json!({
                "fromId": created[0].id.to_string(),
                "toId": created[1].id.to_string(),
            }),
        ))
        .await;
    assert!(!connector.is_error, "{}", connector.content);

    // The client observes the turn through broadcasts only.
    loop {
        match broadcasts.try_recv() {
            Ok(frame) => {
                session.apply_broadcast(&Broadcast::from_frame(&frame).expect("parse"));
            }
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("broadcast stream broken: {e}"),
        }
    }
    assert_eq!(session.object_count(), 3);

    // Recording the turn makes it a single undoable unit.
    session.record_external_creations(&turn.created_objects(), "agent turn");
    assert_eq!(session.top_undo_tag(), Some("agent turn"));

    session.undo();
    assert_eq!(session.object_count(), 0);

    // The undo's deletes flow back to the authority over the wire.
    while let Ok(bytes) = wire_rx.try_recv() {
        let outcome = authority.apply_encoded(&bytes).await;
        assert!(outcome.ok, "{:?}", outcome.error);
    }
    assert!(authority.read_objects().await.is_empty());

    session.redo();
    assert_eq!(session.object_count(), 3);
}

#[tokio::test]
async fn late_joiner_bootstraps_from_the_init_frame() {
    init_tracing();
    let authority = Arc::new(InMemoryAuthority::new());

    let gateway = ToolGateway::new(authority.clone());
    let mut turn = gateway.begin_turn();
    let outcome = turn
        .execute(&call("createFrame", json!({"title": "Backlog", "x": 200.0, "y": 300.0})))
        .await;
    assert!(!outcome.is_error);

    // A client joining later replays the snapshot frame as if it arrived on
    // its socket.
    let bytes = syncboard_wire::encode_frame(&authority.init_frame().await);
    let frame = decode_frame(&bytes).expect("decode");
    let (mut session, _rx) = client_session();
    session.apply_broadcast(&Broadcast::from_frame(&frame).expect("parse"));

    assert_eq!(session.object_count(), 1);
    assert!(!session.can_undo());
}
