//! Live Stream Integration Tests
//!
//! Tests the WebSocket client against an in-process server: authentication,
//! subscription flushing, incremental subscribes, and reconnection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use polygon_datafeed::{
    ApiKey, ReconnectConfig, StreamClient, StreamClientConfig, StreamEvent,
};

const AUTH_SUCCESS: &str = r#"[{"ev":"status","status":"auth_success"}]"#;
const CONNECTED: &str = r#"[{"ev":"status","status":"connected","message":"Connected Successfully"}]"#;

/// Build a client pointed at the given local server with a short reconnect
/// delay.
fn test_client(
    addr: std::net::SocketAddr,
    cancel: CancellationToken,
) -> (Arc<StreamClient>, mpsc::Receiver<StreamEvent>) {
    let (event_tx, event_rx) = mpsc::channel(64);

    let mut config = StreamClientConfig::new(
        format!("ws://{addr}"),
        ApiKey::new("test-key").unwrap(),
    );
    config.reconnect = ReconnectConfig {
        delay: Duration::from_millis(50),
    };

    (
        Arc::new(StreamClient::new(config, event_tx, cancel)),
        event_rx,
    )
}

/// Accept one connection and walk it through the auth handshake.
async fn accept_and_auth(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client should connect")
        .unwrap();
    let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

    ws.send(Message::Text(CONNECTED.into())).await.unwrap();

    let auth = recv_text(&mut ws).await;
    let frame: serde_json::Value = serde_json::from_str(&auth).unwrap();
    assert_eq!(frame["action"], "auth");
    assert_eq!(frame["params"], "test-key");

    ws.send(Message::Text(AUTH_SUCCESS.into())).await.unwrap();
    ws
}

/// Receive the next text frame, skipping non-text messages.
async fn recv_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        match timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("expected a frame before timeout")
        {
            Some(Ok(Message::Text(text))) => return text.to_string(),
            Some(Ok(_)) => {}
            other => panic!("connection ended unexpectedly: {other:?}"),
        }
    }
}

/// Wait for a specific lifecycle event, skipping others.
async fn wait_for_connected(event_rx: &mut mpsc::Receiver<StreamEvent>) {
    loop {
        match timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .expect("expected an event before timeout")
        {
            Some(StreamEvent::Connected) => return,
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}

// =============================================================================
// Subscription Flush Tests
// =============================================================================

#[tokio::test]
async fn pre_auth_subscriptions_flush_once_after_auth() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    // Subscribed before the connection even exists.
    client.subscribe(["AM.AAPL"]);
    client.subscribe(["AM.MSFT", "AM.AAPL"]);

    let run = tokio::spawn(Arc::clone(&client).run());

    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;

    let flush = recv_text(&mut ws).await;
    let frame: serde_json::Value = serde_json::from_str(&flush).unwrap();
    assert_eq!(frame["action"], "subscribe");
    assert_eq!(frame["params"], "AM.AAPL,AM.MSFT");

    // The flush covers everything; no second subscribe frame may follow.
    let extra = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(extra.is_err(), "unexpected extra frame: {extra:?}");

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn post_auth_subscribe_sends_only_the_delta() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    client.subscribe(["AM.AAPL"]);

    let run = tokio::spawn(Arc::clone(&client).run());

    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;

    let flush = recv_text(&mut ws).await;
    let frame: serde_json::Value = serde_json::from_str(&flush).unwrap();
    assert_eq!(frame["params"], "AM.AAPL");

    // Already-tracked channels are deduplicated out of the delta.
    client.subscribe(["AM.MSFT", "AM.AAPL"]);

    let delta = recv_text(&mut ws).await;
    let frame: serde_json::Value = serde_json::from_str(&delta).unwrap();
    assert_eq!(frame["action"], "subscribe");
    assert_eq!(frame["params"], "AM.MSFT");

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn fully_duplicate_subscribe_sends_nothing() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    client.subscribe(["AM.AAPL"]);

    let run = tokio::spawn(Arc::clone(&client).run());

    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;
    let _flush = recv_text(&mut ws).await;

    client.subscribe(["AM.AAPL"]);

    let extra = timeout(Duration::from_millis(200), ws.next()).await;
    assert!(extra.is_err(), "duplicate subscribe produced a frame");

    cancel.cancel();
    run.await.unwrap().unwrap();
}

// =============================================================================
// Reconnection Tests
// =============================================================================

#[tokio::test]
async fn reconnects_and_reflushes_after_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    client.subscribe(["AM.AAPL"]);

    let run = tokio::spawn(Arc::clone(&client).run());

    // First session: auth, flush, then the server drops the socket.
    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;
    let _flush = recv_text(&mut ws).await;

    // Grows the channel set mid-session.
    client.subscribe(["AM.TSLA"]);
    let _delta = recv_text(&mut ws).await;

    drop(ws);

    // Second session: the full grown set is flushed again.
    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;

    let flush = recv_text(&mut ws).await;
    let frame: serde_json::Value = serde_json::from_str(&flush).unwrap();
    assert_eq!(frame["action"], "subscribe");
    assert_eq!(frame["params"], "AM.AAPL,AM.TSLA");

    cancel.cancel();
    run.await.unwrap().unwrap();
}

// =============================================================================
// Record Delivery Tests
// =============================================================================

#[tokio::test]
async fn aggregates_are_emitted_in_arrival_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    let run = tokio::spawn(Arc::clone(&client).run());

    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;

    let batch = r#"[
        {"ev":"AM","sym":"AAPL","o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":10,"s":1000,"e":2000},
        {"ev":"AM","sym":"MSFT","o":3.0,"h":4.0,"l":2.5,"c":3.5,"v":20,"s":3000,"e":4000}
    ]"#;
    ws.send(Message::Text(batch.into())).await.unwrap();

    let mut symbols = Vec::new();
    while symbols.len() < 2 {
        match timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .expect("expected aggregates before timeout")
        {
            Some(StreamEvent::Aggregate(agg)) => symbols.push(agg.sym),
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);

    cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_frames_do_not_drop_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let (client, mut event_rx) = test_client(addr, cancel.clone());

    let run = tokio::spawn(Arc::clone(&client).run());

    let mut ws = accept_and_auth(&listener).await;
    wait_for_connected(&mut event_rx).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"[{"ev":"mystery"}]"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(
        r#"[{"ev":"AM","sym":"AAPL","o":1.0,"h":2.0,"l":0.5,"c":1.5,"v":10,"s":1000,"e":2000}]"#
            .into(),
    ))
    .await
    .unwrap();

    // The aggregate after the garbage still arrives on the same connection.
    loop {
        match timeout(Duration::from_secs(5), event_rx.recv())
            .await
            .expect("expected an aggregate before timeout")
        {
            Some(StreamEvent::Aggregate(agg)) => {
                assert_eq!(agg.sym, "AAPL");
                break;
            }
            Some(StreamEvent::Disconnected | StreamEvent::Reconnecting { .. }) => {
                panic!("connection dropped on malformed frame");
            }
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }

    cancel.cancel();
    run.await.unwrap().unwrap();
}
