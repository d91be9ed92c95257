//! WebSocket connection lifecycle.

use axum::extract::ws::{Message, WebSocket};
use fastdl_core::{EventSink, ProgressEvent, TriggerOutcome};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::protocol::ClientMessage;
use crate::state::AppState;

/// Handle a WebSocket connection until the client goes away.
///
/// Runs started from this connection are not cancelled when it closes; their
/// remaining events are dropped.
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ProgressEvent>();

    tracing::info!("Client connected");

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            events_tx.emit(ProgressEvent::error("Binary data must be UTF-8"));
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {}", e);
                        break;
                    }
                };
                dispatch(&text, &state, &events_tx);
            }
            Some(event) = events_rx.recv() => {
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("Client disconnected");
}

/// Handles one text frame from the client.
///
/// Returns the handle of the run task when an update was requested. The
/// trigger gate decides inside that task whether the run actually starts.
pub fn dispatch(
    text: &str,
    state: &AppState,
    events: &mpsc::UnboundedSender<ProgressEvent>,
) -> Option<JoinHandle<TriggerOutcome>> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::StartUpdate) => {
            let updater = state.updater.clone();
            let events = events.clone();
            Some(tokio::spawn(async move {
                let outcome = updater.trigger_now(&events).await;
                if let TriggerOutcome::Completed(Err(e)) = &outcome {
                    tracing::error!(error = %e, "Update run failed");
                }
                outcome
            }))
        }
        Err(e) => {
            events.emit(ProgressEvent::error(format!("Invalid message: {}", e)));
            None
        }
    }
}

async fn send_event(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &ProgressEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}
