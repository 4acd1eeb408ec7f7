//! Browser overlay collaborator: renders synthesized audio and reports
//! playback completion back to the sequencer.
//!
//! The bot core never touches presentation. The overlay page connects to
//! `/ws`, receives play/stop control messages, fetches clip bytes from
//! `/audio/:id`, and reports `{"type":"ended"}` when its audio element
//! finishes.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::Bytes;
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use jukebot_tts::{AudioClip, AudioSink};

/// Control messages pushed to the overlay page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlMessage {
    Play { id: Uuid, url: String },
    Stop,
}

/// Reports sent back by the overlay page.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OverlayReport {
    Ended,
}

/// Playback reports surfaced to the run loop.
#[derive(Debug)]
pub enum PlayerEvent {
    Ended,
}

#[derive(Clone)]
struct OverlayState {
    clips: Arc<RwLock<HashMap<Uuid, Bytes>>>,
    control_tx: broadcast::Sender<ControlMessage>,
    player_tx: mpsc::Sender<PlayerEvent>,
}

pub struct OverlaySink {
    state: OverlayState,
}

#[async_trait]
impl AudioSink for OverlaySink {
    async fn play(&self, clip: &AudioClip) -> Result<()> {
        {
            // Only the current clip is ever served; finished clips are
            // discarded, never replayed.
            let mut clips = self.state.clips.write().await;
            clips.clear();
            clips.insert(clip.id, clip.audio.clone());
        }

        let message = ControlMessage::Play { id: clip.id, url: format!("/audio/{}", clip.id) };
        if self.state.control_tx.send(message).is_err() {
            warn!("[Overlay] No overlay connected; clip {} will not render", clip.id);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let _ = self.state.control_tx.send(ControlMessage::Stop);
        Ok(())
    }
}

/// Bind the overlay server and return the audio sink plus the playback
/// report channel for the run loop.
pub async fn spawn(bind: &str) -> Result<(Arc<OverlaySink>, mpsc::Receiver<PlayerEvent>)> {
    let (control_tx, _) = broadcast::channel(16);
    let (player_tx, player_rx) = mpsc::channel(16);
    let state = OverlayState {
        clips: Arc::new(RwLock::new(HashMap::new())),
        control_tx,
        player_tx,
    };

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/audio/:id", get(serve_clip))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("[Overlay] Listening on {bind}");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!("[Overlay] Server stopped: {err}");
        }
    });

    Ok((Arc::new(OverlaySink { state }), player_rx))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<OverlayState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: OverlayState) {
    info!("[Overlay] Overlay connected");
    let (mut sender, mut receiver) = socket.split();
    let mut control_rx = state.control_tx.subscribe();

    // Forward control messages to the page.
    let mut send_task = tokio::spawn(async move {
        while let Ok(message) = control_rx.recv().await {
            let json = serde_json::to_string(&message).unwrap();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Route playback reports back to the run loop.
    let player_tx = state.player_tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(text) => match serde_json::from_str::<OverlayReport>(&text) {
                    Ok(OverlayReport::Ended) => {
                        let _ = player_tx.send(PlayerEvent::Ended).await;
                    }
                    Err(_) => warn!("[Overlay] Invalid report: {text}"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // If either task exits, abort the other.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    info!("[Overlay] Overlay disconnected");
}

async fn serve_clip(
    Path(id): Path<Uuid>,
    State(state): State<OverlayState>,
) -> impl IntoResponse {
    match state.clips.read().await.get(&id) {
        Some(audio) => ([(header::CONTENT_TYPE, "audio/mpeg")], audio.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
