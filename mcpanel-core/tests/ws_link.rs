//! Integration tests: the WebSocket link and the full dashboard against
//! a real tokio-tungstenite server on localhost.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use mcpanel_core::{
    ChannelStatus, Dashboard, Endpoint, Input, Link, LinkEvent, PanelConfig, UserAction, ViewEvent,
    WsLink,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// ── Helpers ──────────────────────────────────────────────────────

async fn ephemeral_listener() -> (TcpListener, Endpoint) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = Endpoint::new(addr.ip().to_string(), addr.port()).unwrap();
    (listener, endpoint)
}

async fn next_input(rx: &mut mpsc::UnboundedReceiver<Input>) -> Input {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout")
        .expect("input queue closed")
}

/// Wait for the first view event matching `pred`.
async fn wait_for(
    rx: &mut mpsc::UnboundedReceiver<ViewEvent>,
    pred: impl Fn(&ViewEvent) -> bool,
) -> ViewEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let ev = rx.recv().await.expect("view channel closed");
            if pred(&ev) {
                return ev;
            }
        }
    })
    .await
    .expect("timeout waiting for view event")
}

// ── WsLink ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_link_round_trip() {
    let (listener, endpoint) = ephemeral_listener().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut link = WsLink::new(tx, Duration::from_secs(5));

    link.open(&endpoint, 7);
    let (stream, _) = listener.accept().await.unwrap();
    let mut server = tokio_tungstenite::accept_async(stream).await.unwrap();

    match next_input(&mut rx).await {
        Input::Link {
            generation: 7,
            event: LinkEvent::Opened,
        } => {}
        other => panic!("unexpected {other:?}"),
    }

    // Peer → panel
    server
        .send(Message::Text(r#"{"type":"heartbeat"}"#.into()))
        .await
        .unwrap();
    match next_input(&mut rx).await {
        Input::Link {
            generation: 7,
            event: LinkEvent::Frame(text),
        } => assert_eq!(text, r#"{"type":"heartbeat"}"#),
        other => panic!("unexpected {other:?}"),
    }

    // Panel → peer
    link.send(r#"{"action":"refresh_servers"}"#.to_string()).unwrap();
    let msg = tokio::time::timeout(Duration::from_secs(5), server.next())
        .await
        .expect("timeout")
        .expect("stream ended")
        .unwrap();
    assert_eq!(msg, Message::Text(r#"{"action":"refresh_servers"}"#.into()));

    // Peer closes
    server.close(None).await.unwrap();
    match next_input(&mut rx).await {
        Input::Link {
            generation: 7,
            event: LinkEvent::Closed { .. },
        } => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_link_refused_reports_close() {
    let (listener, endpoint) = ephemeral_listener().await;
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut link = WsLink::new(tx, Duration::from_secs(5));
    link.open(&endpoint, 3);

    match next_input(&mut rx).await {
        Input::Link {
            generation: 3,
            event: LinkEvent::Closed { code, .. },
        } => assert_eq!(code, 1006),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_send_without_session_fails() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut link = WsLink::new(tx, Duration::from_secs(5));
    assert!(link.send("{}".into()).is_err());
}

// ── Dashboard over WebSocket ─────────────────────────────────────

#[tokio::test]
async fn test_dashboard_end_to_end() {
    let (listener, endpoint) = ephemeral_listener().await;
    let mut config = PanelConfig::default();
    config.network.host = endpoint.host().to_string();
    config.network.port = endpoint.port();

    let (tx, rx) = mpsc::unbounded_channel();
    let mut dash = Dashboard::websocket(&config, tx.clone()).unwrap();
    let mut events = dash.subscribe();
    let driver = tokio::spawn(dash.run(rx));

    let (stream, _) = listener.accept().await.unwrap();
    let mut server = tokio_tungstenite::accept_async(stream).await.unwrap();

    wait_for(&mut events, |e| {
        *e == ViewEvent::ChannelStatus(ChannelStatus::Online)
    })
    .await;

    server
        .send(Message::Text(
            r#"{"type":"server_list","servers":[{"name":"s1","display_name":"Survival"}]}"#.into(),
        ))
        .await
        .unwrap();
    let list = wait_for(&mut events, |e| matches!(e, ViewEvent::ProcessList(_))).await;
    let ViewEvent::ProcessList(list) = list else {
        unreachable!()
    };
    assert_eq!(list[0].display_name, "Survival");

    tx.send(Input::User(UserAction::Connect {
        server_name: "s1".into(),
    }))
    .unwrap();
    let msg = tokio::time::timeout(Duration::from_secs(5), server.next())
        .await
        .expect("timeout")
        .expect("stream ended")
        .unwrap();
    let Message::Text(text) = msg else {
        panic!("expected text frame")
    };
    let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(value["action"], "connect_server");
    assert_eq!(value["server_name"], "s1");

    // Peer drops: the dashboard schedules a reconnect.
    server.close(None).await.unwrap();
    wait_for(&mut events, |e| {
        matches!(
            e,
            ViewEvent::ChannelStatus(ChannelStatus::Reconnecting { attempt: 1, .. })
        )
    })
    .await;

    tx.send(Input::Shutdown).unwrap();
    tokio::time::timeout(Duration::from_secs(5), driver)
        .await
        .expect("driver did not stop")
        .unwrap();
}
