//! Unit tests for tracker-hub

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracker_hub::{
    BroadcastHub, ClientMessage, ConnectionMetadata, ConnectionState, DetectionSink, Frame,
    SearchScoped, ServerMessage, Subscription, CONNECTED_GREETING,
};

#[derive(Debug, Serialize)]
struct TestDetection {
    id: String,
    search_id: String,
    camera_id: String,
    confidence: f64,
}

impl TestDetection {
    fn for_search(search_id: &str) -> Self {
        Self {
            id: format!("DET_{}", search_id),
            search_id: search_id.to_string(),
            camera_id: "CAM_001".to_string(),
            confidence: 0.9,
        }
    }
}

impl SearchScoped for TestDetection {
    fn search_id(&self) -> &str {
        &self.search_id
    }
}

fn decode(frame: Frame) -> ServerMessage {
    serde_json::from_str(&frame).unwrap()
}

/// Register and swallow the greeting
fn connect(hub: &BroadcastHub) -> (tracker_hub::ConnectionHandle, mpsc::Receiver<Frame>) {
    let (handle, mut rx) = hub.register(ConnectionMetadata::default());
    match decode(rx.try_recv().unwrap()) {
        ServerMessage::Connected { .. } => {}
        other => panic!("expected greeting, got {:?}", other),
    }
    (handle, rx)
}

fn subscribe(hub: &BroadcastHub, handle: &tracker_hub::ConnectionHandle, ids: &[&str]) {
    let raw = serde_json::json!({ "type": "subscribe", "searchIds": ids }).to_string();
    hub.handle_incoming(handle, &raw);
}

fn received_detection_for(rx: &mut mpsc::Receiver<Frame>) -> Option<String> {
    match rx.try_recv().ok().map(decode) {
        Some(ServerMessage::Detection { data, .. }) => {
            Some(data["search_id"].as_str().unwrap().to_string())
        }
        Some(other) => panic!("unexpected frame {:?}", other),
        None => None,
    }
}

// ============== Registration Tests ==============

#[tokio::test]
async fn test_register_sends_greeting_only_to_new_connection() {
    let hub = BroadcastHub::default();
    let (_c1, mut rx1) = connect(&hub);

    let (_c2, mut rx2) = hub.register(ConnectionMetadata::new(
        Some("10.0.0.1".to_string()),
        Some("Mozilla/5.0".to_string()),
    ));

    match decode(rx2.try_recv().unwrap()) {
        ServerMessage::Connected { message, timestamp } => {
            assert_eq!(message, CONNECTED_GREETING);
            assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
        }
        other => panic!("expected greeting, got {:?}", other),
    }
    assert!(rx1.try_recv().is_err());
    assert_eq!(hub.connected_count(), 2);
}

#[tokio::test]
async fn test_new_connection_subscribes_to_all_searches() {
    let hub = BroadcastHub::default();
    let (conn, _rx) = connect(&hub);

    assert_eq!(conn.subscription(), Subscription::AllSearches);
    assert_eq!(conn.state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_unregister_is_idempotent() {
    let hub = BroadcastHub::default();
    let (c1, _rx1) = connect(&hub);
    let (_c2, _rx2) = connect(&hub);

    hub.unregister(&c1);
    assert_eq!(hub.connected_count(), 1);

    hub.unregister(&c1);
    assert_eq!(hub.connected_count(), 1);
}

#[tokio::test]
async fn test_independent_hubs_do_not_share_connections() {
    let hub_a = BroadcastHub::default();
    let hub_b = BroadcastHub::default();

    let (_conn, mut rx) = connect(&hub_a);
    assert_eq!(hub_b.broadcast_detection(&TestDetection::for_search("S1")), 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(hub_b.connected_count(), 0);
}

// ============== Filtering Tests ==============

#[tokio::test]
async fn test_empty_filter_receives_every_detection() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);
    subscribe(&hub, &conn, &[]);

    for search in ["S1", "S2", "SEARCH_x"] {
        hub.broadcast_detection(&TestDetection::for_search(search));
        assert_eq!(received_detection_for(&mut rx).as_deref(), Some(search));
    }
}

#[tokio::test]
async fn test_non_empty_filter_is_exact_membership() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);
    subscribe(&hub, &conn, &["S1", "S3"]);

    hub.broadcast_detection(&TestDetection::for_search("S1"));
    hub.broadcast_detection(&TestDetection::for_search("S2"));
    hub.broadcast_detection(&TestDetection::for_search("S3"));

    assert_eq!(received_detection_for(&mut rx).as_deref(), Some("S1"));
    assert_eq!(received_detection_for(&mut rx).as_deref(), Some("S3"));
    assert_eq!(received_detection_for(&mut rx), None);
}

#[tokio::test]
async fn test_subscribe_replaces_instead_of_merging() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);

    subscribe(&hub, &conn, &["A"]);
    subscribe(&hub, &conn, &["B"]);

    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("A")), 0);
    assert_eq!(received_detection_for(&mut rx), None);

    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("B")), 1);
    assert_eq!(received_detection_for(&mut rx).as_deref(), Some("B"));
}

#[tokio::test]
async fn test_subscribe_with_empty_list_clears_filter() {
    let hub = BroadcastHub::default();
    let (conn, _rx) = connect(&hub);

    subscribe(&hub, &conn, &["A"]);
    subscribe(&hub, &conn, &[]);
    assert!(conn.subscription().is_all());

    hub.handle_incoming(&conn, r#"{"type":"subscribe","searchIds":["A"]}"#);
    hub.handle_incoming(&conn, r#"{"type":"subscribe"}"#);
    assert!(conn.subscription().is_all());

    hub.handle_incoming(&conn, r#"{"type":"subscribe","searchIds":["A"]}"#);
    hub.handle_incoming(&conn, r#"{"type":"subscribe","searchIds":null}"#);
    assert!(conn.subscription().is_all());
}

#[tokio::test]
async fn test_alert_ignores_filters() {
    let hub = BroadcastHub::default();
    let (c1, mut rx1) = connect(&hub);
    let (_c2, mut rx2) = connect(&hub);
    subscribe(&hub, &c1, &["A"]);

    let sent = hub.broadcast_alert(&serde_json::json!({"message": "camera offline", "severity": "warning"}));
    assert_eq!(sent, 2);

    for rx in [&mut rx1, &mut rx2] {
        match decode(rx.try_recv().unwrap()) {
            ServerMessage::Alert { data, .. } => assert_eq!(data["message"], "camera offline"),
            other => panic!("expected alert, got {:?}", other),
        }
    }
}

// ============== Scenario Tests ==============

#[tokio::test]
async fn test_three_connection_scenario() {
    let hub = BroadcastHub::default();
    let (c1, mut rx1) = connect(&hub);
    let (c2, mut rx2) = connect(&hub);
    let (c3, mut rx3) = connect(&hub);
    subscribe(&hub, &c1, &[]);
    subscribe(&hub, &c2, &["S1"]);
    subscribe(&hub, &c3, &["S2"]);

    // Detection for S1 reaches C1 and C2
    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("S1")), 2);
    assert_eq!(received_detection_for(&mut rx1).as_deref(), Some("S1"));
    assert_eq!(received_detection_for(&mut rx2).as_deref(), Some("S1"));
    assert_eq!(received_detection_for(&mut rx3), None);

    // C2 moves to S2; only C1 still gets S1
    subscribe(&hub, &c2, &["S2"]);
    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("S1")), 1);
    assert_eq!(received_detection_for(&mut rx1).as_deref(), Some("S1"));
    assert_eq!(received_detection_for(&mut rx2), None);
    assert_eq!(received_detection_for(&mut rx3), None);

    // C3 leaves; S2 now reaches C1 (all) and C2 (moved), without error
    hub.unregister(&c3);
    drop(rx3);
    let sent = hub.broadcast_detection(&TestDetection::for_search("S2"));
    assert_eq!(sent, 2);
    assert_eq!(hub.connected_count(), 2);
}

#[tokio::test]
async fn test_broadcast_for_departed_subscriber_reaches_nobody() {
    let hub = BroadcastHub::default();
    let (c1, _rx1) = connect(&hub);
    let (c3, _rx3) = connect(&hub);
    subscribe(&hub, &c1, &["S1"]);
    subscribe(&hub, &c3, &["S2"]);

    hub.unregister(&c3);
    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("S2")), 0);
}

#[tokio::test]
async fn test_no_connections_is_a_noop() {
    let hub = BroadcastHub::default();
    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("S1")), 0);
    assert_eq!(hub.broadcast_alert(&serde_json::json!({})), 0);
}

// ============== Ping / Parse Tests ==============

#[tokio::test]
async fn test_ping_replies_only_to_sender() {
    let hub = BroadcastHub::default();
    let (c1, mut rx1) = connect(&hub);
    let (_c2, mut rx2) = connect(&hub);

    hub.handle_incoming(&c1, r#"{"type":"ping"}"#);

    match decode(rx1.try_recv().unwrap()) {
        ServerMessage::Pong { timestamp } => assert!(timestamp > 0),
        other => panic!("expected pong, got {:?}", other),
    }
    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());
    assert_eq!(hub.connected_count(), 2);
}

#[tokio::test]
async fn test_malformed_and_unknown_messages_are_ignored() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);
    subscribe(&hub, &conn, &["S1"]);

    hub.handle_incoming(&conn, "not json at all");
    hub.handle_incoming(&conn, r#"{"searchIds":["S9"]}"#);
    hub.handle_incoming(&conn, r#"{"type":"subscribe","searchIds":"S9"}"#);
    hub.handle_incoming(&conn, r#"{"type":"unsubscribe","searchIds":["S1"]}"#);

    assert!(rx.try_recv().is_err());
    assert_eq!(hub.connected_count(), 1);
    assert!(conn.subscription().matches("S1"));
    assert!(!conn.subscription().matches("S9"));
}

#[test]
fn test_client_message_parse() {
    assert_eq!(ClientMessage::parse(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
    assert_eq!(
        ClientMessage::parse(r#"{"type":"subscribe","searchIds":["a","b"]}"#),
        Some(ClientMessage::Subscribe {
            search_ids: Some(vec!["a".to_string(), "b".to_string()])
        })
    );
    assert_eq!(ClientMessage::parse(r#"{"type":"hello"}"#), Some(ClientMessage::Unknown));
    assert_eq!(ClientMessage::parse("[1,2,3]"), None);
}

#[test]
fn test_server_message_wire_shape() {
    let frame = ServerMessage::Pong { timestamp: 42 }.encode().unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value, serde_json::json!({"type": "pong", "timestamp": 42}));

    let detection = ServerMessage::detection(&TestDetection::for_search("S1")).unwrap();
    assert_eq!(detection.kind(), "detection");
    let value: serde_json::Value = serde_json::from_str(&detection.encode().unwrap()).unwrap();
    assert_eq!(value["type"], "detection");
    assert_eq!(value["data"]["search_id"], "S1");
    assert!(value["timestamp"].is_string());
}

// ============== Failure Tests ==============

#[tokio::test]
async fn test_failed_send_does_not_block_other_connections() {
    let hub = BroadcastHub::default();
    let (_c1, mut rx1) = connect(&hub);
    let (_c2, rx2) = connect(&hub);
    let (_c3, mut rx3) = connect(&hub);

    // C2's client side is gone
    drop(rx2);

    let sent = hub.broadcast_detection(&TestDetection::for_search("S1"));
    assert_eq!(sent, 2);
    assert_eq!(received_detection_for(&mut rx1).as_deref(), Some("S1"));
    assert_eq!(received_detection_for(&mut rx3).as_deref(), Some("S1"));
    assert_eq!(hub.connected_count(), 2);
}

#[tokio::test]
async fn test_slow_consumer_is_dropped() {
    let hub = BroadcastHub::new(1);

    // Greeting is never drained, so the one-slot queue stays full
    let (_slow, _slow_rx) = hub.register(ConnectionMetadata::default());
    let (_fast, mut fast_rx) = connect(&hub);

    let sent = hub.broadcast_detection(&TestDetection::for_search("S1"));
    assert_eq!(sent, 1);
    assert_eq!(received_detection_for(&mut fast_rx).as_deref(), Some("S1"));
    assert_eq!(hub.connected_count(), 1);
}

#[tokio::test]
async fn test_dropped_slow_consumer_channel_is_closed() {
    let hub = BroadcastHub::new(1);
    let (slow, mut slow_rx) = hub.register(ConnectionMetadata::default());

    hub.broadcast_detection(&TestDetection::for_search("S1"));
    assert_eq!(hub.connected_count(), 0);
    assert_eq!(slow.state(), ConnectionState::Closed);

    // The queued greeting is still readable, then the channel ends
    match decode(slow_rx.recv().await.unwrap()) {
        ServerMessage::Connected { .. } => {}
        other => panic!("expected greeting, got {:?}", other),
    }
    assert!(slow_rx.recv().await.is_none());

    // A dropped connection no longer answers pings
    hub.handle_incoming(&slow, r#"{"type":"ping"}"#);
    assert!(slow_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_unregister_closes_channel() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);

    hub.unregister(&conn);
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(conn.try_send(Arc::from("{}")).is_err());
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_closing_connection_is_skipped() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);

    conn.mark_closing();
    assert_eq!(conn.state(), ConnectionState::Closing);
    assert_eq!(hub.broadcast_detection(&TestDetection::for_search("S1")), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_cleanup_dead_connections() {
    let hub = BroadcastHub::default();
    let (_c1, rx1) = connect(&hub);
    let (_c2, _rx2) = connect(&hub);

    drop(rx1);
    assert_eq!(hub.cleanup_dead_connections(), 1);
    assert_eq!(hub.connected_count(), 1);
    assert_eq!(hub.list_connections().len(), 1);
}

// ============== Ordering / Sink Tests ==============

#[tokio::test]
async fn test_per_connection_order_follows_broadcast_order() {
    let hub = BroadcastHub::default();
    let (_conn, mut rx) = connect(&hub);

    for search in ["S1", "S2", "S3", "S4"] {
        hub.broadcast_detection(&TestDetection::for_search(search));
    }
    for search in ["S1", "S2", "S3", "S4"] {
        assert_eq!(received_detection_for(&mut rx).as_deref(), Some(search));
    }
}

#[tokio::test]
async fn test_hub_as_detection_sink() {
    let hub = BroadcastHub::default();
    let (conn, mut rx) = connect(&hub);
    subscribe(&hub, &conn, &["S7"]);

    let sink: Arc<dyn DetectionSink<TestDetection>> = Arc::new(hub.clone());
    sink.on_detection_persisted(&TestDetection::for_search("S7"));
    sink.on_detection_persisted(&TestDetection::for_search("S8"));

    assert_eq!(received_detection_for(&mut rx).as_deref(), Some("S7"));
    assert_eq!(received_detection_for(&mut rx), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribe_and_broadcast() {
    let hub = BroadcastHub::new(1024);
    let (conn, mut rx) = connect(&hub);

    let flipper = {
        let hub = hub.clone();
        let conn = conn.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let ids: &[&str] = if i % 2 == 0 { &["S1"] } else { &["S2"] };
                subscribe(&hub, &conn, ids);
                tokio::task::yield_now().await;
            }
        })
    };
    let broadcaster = {
        let hub = hub.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                hub.broadcast_detection(&TestDetection::for_search("S1"));
                tokio::task::yield_now().await;
            }
        })
    };
    flipper.await.unwrap();
    broadcaster.await.unwrap();

    // Every delivered frame is a well-formed S1 detection
    while let Some(search) = received_detection_for(&mut rx) {
        assert_eq!(search, "S1");
    }
    assert_eq!(hub.connected_count(), 1);
    assert_eq!(conn.subscription(), Subscription::from_search_ids(vec!["S2".to_string()]));
}
