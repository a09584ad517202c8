//! WebSocket endpoint for live build log streaming

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::server::state::ServerState;

/// Frames accepted from a viewer connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Attach to one deployment's log stream
    Join { deployment_id: String },

    /// Detach from the current stream
    Leave,
}

/// Frames emitted to a viewer connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerFrame {
    Logs { message: String },
}

/// Upgrade handler for `/logs/ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();

    // A connection views at most one deployment at a time; joining another
    // replaces the current subscription. No join is required to stay
    // connected.
    let mut joined: Option<broadcast::Receiver<String>> = None;

    loop {
        let forward = async {
            match joined.as_mut() {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = forward => {
                match result {
                    Ok(body) => {
                        if send_logs(&mut sender, body).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // This viewer fell behind; it loses the oldest
                        // messages, everyone else is unaffected
                        warn!("Viewer lagged, {} message(s) dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        joined = None;
                    }
                }
            }
            frame = next_frame(&mut receiver) => {
                match frame {
                    FrameAction::Join(deployment_id) => {
                        joined = Some(state.hub.join(&deployment_id).await);
                        let ack = format!("Joined {}", deployment_id);
                        if send_logs(&mut sender, ack).await.is_err() {
                            break;
                        }
                    }
                    FrameAction::Leave => {
                        joined = None;
                    }
                    FrameAction::Ignore => {}
                    FrameAction::Disconnect => break,
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

enum FrameAction {
    Join(String),
    Leave,
    Ignore,
    Disconnect,
}

async fn next_frame(receiver: &mut SplitStream<WebSocket>) -> FrameAction {
    match receiver.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Join { deployment_id }) => FrameAction::Join(deployment_id),
            Ok(ClientFrame::Leave) => FrameAction::Leave,
            Err(e) => {
                // A malformed frame only affects this connection
                debug!("Ignoring malformed viewer frame: {}", e);
                FrameAction::Ignore
            }
        },
        Some(Ok(Message::Close(_))) | None => FrameAction::Disconnect,
        Some(Ok(_)) => FrameAction::Ignore,
        Some(Err(e)) => {
            debug!("Viewer socket error: {}", e);
            FrameAction::Disconnect
        }
    }
}

async fn send_logs(
    sender: &mut SplitSink<WebSocket, Message>,
    message: String,
) -> Result<(), axum::Error> {
    let frame = ServerFrame::Logs { message };
    let text = serde_json::to_string(&frame).unwrap_or_default();
    sender.send(Message::Text(text.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_frame_parsing() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"event":"join","deployment_id":"dep-1"}"#).unwrap();
        match frame {
            ClientFrame::Join { deployment_id } => assert_eq!(deployment_id, "dep-1"),
            other => panic!("Expected join, got {:?}", other),
        }
    }

    #[test]
    fn test_leave_frame_parsing() {
        let frame: ClientFrame = serde_json::from_str(r#"{"event":"leave"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Leave));
    }

    #[test]
    fn test_malformed_frame_is_rejected() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"event":"shout"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>("not json").is_err());
    }

    #[test]
    fn test_logs_frame_serialization() {
        let json = serde_json::to_string(&ServerFrame::Logs {
            message: "Joined dep-1".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"logs","message":"Joined dep-1"}"#);
    }
}
