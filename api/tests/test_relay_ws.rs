//! Live log relay integration tests
//!
//! Drives the real WebSocket endpoint with a client connection against a
//! listener bound to an ephemeral port.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use skiff_api::launcher::Launcher;
use skiff_api::relay::hub::RelayHub;
use skiff_api::server::serve::build_router;
use skiff_api::server::state::{DispatchOptions, ServerState};
use skiff_platform::errors::PlatformError;
use skiff_platform::models::LaunchSpec;

struct NoopLauncher;

#[async_trait]
impl Launcher for NoopLauncher {
    async fn launch(&self, _spec: &LaunchSpec) -> Result<(), PlatformError> {
        Ok(())
    }
}

async fn start_server(hub: Arc<RelayHub>) -> String {
    let state = Arc::new(ServerState::new(
        Arc::new(NoopLauncher),
        hub,
        DispatchOptions::default(),
    ));
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}/logs/ws", addr)
}

async fn next_json<S>(socket: &mut S) -> serde_json::Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = socket.next().await.unwrap().unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_join_is_acked_then_messages_flow_in_order() {
    let hub = Arc::new(RelayHub::new(16));
    let url = start_server(hub.clone()).await;

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
    socket
        .send(Message::Text(r#"{"event":"join","deployment_id":"dep-1"}"#.into()))
        .await
        .unwrap();

    let ack = next_json(&mut socket).await;
    assert_eq!(ack["event"], "logs");
    assert_eq!(ack["message"], "Joined dep-1");

    // Once the ack is observed the subscription is live
    assert_eq!(hub.publish("dep-1", "line A".to_string()).await, 1);
    assert_eq!(hub.publish("dep-1", "line B".to_string()).await, 1);

    assert_eq!(next_json(&mut socket).await["message"], "line A");
    assert_eq!(next_json(&mut socket).await["message"], "line B");
}

#[tokio::test]
async fn test_viewer_never_sees_other_deployments() {
    let hub = Arc::new(RelayHub::new(16));
    let url = start_server(hub.clone()).await;

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
    socket
        .send(Message::Text(r#"{"event":"join","deployment_id":"dep-y"}"#.into()))
        .await
        .unwrap();
    let ack = next_json(&mut socket).await;
    assert_eq!(ack["message"], "Joined dep-y");

    // Nobody views dep-x, and dep-y viewers must not receive it
    assert_eq!(hub.publish("dep-x", "not for y".to_string()).await, 0);
    assert_eq!(hub.publish("dep-y", "for y".to_string()).await, 1);

    // The first thing the viewer sees after its ack is dep-y's message
    assert_eq!(next_json(&mut socket).await["message"], "for y");
}

#[tokio::test]
async fn test_malformed_frame_leaves_connection_usable() {
    let hub = Arc::new(RelayHub::new(16));
    let url = start_server(hub.clone()).await;

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
    socket
        .send(Message::Text("this is not a frame".into()))
        .await
        .unwrap();

    // The connection survives and a join still works
    socket
        .send(Message::Text(r#"{"event":"join","deployment_id":"dep-1"}"#.into()))
        .await
        .unwrap();
    let ack = next_json(&mut socket).await;
    assert_eq!(ack["message"], "Joined dep-1");
}
