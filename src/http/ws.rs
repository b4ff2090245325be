use super::state::AppState;
use crate::session::{
    Inbound, RegisteredSession, ServerMessage, SessionConfig, SessionController,
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::future;
use futures::sink::SinkExt;
use futures::stream::{SplitSink, SplitStream, Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long the writer may keep flushing to the socket after the session ends
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// GET /ws/video-analysis/, GET /ws/video/
/// Upgrade to a websocket and run one streaming session on it
pub async fn video_analysis(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_session(socket, state))
}

async fn serve_session(socket: WebSocket, state: AppState) {
    let session_id = format!("session-{}", uuid::Uuid::new_v4());
    info!("Websocket connected: {}", session_id);

    let config = SessionConfig::from_settings(session_id.clone(), &state.session_settings);
    let (tx, rx) = mpsc::channel(state.session_settings.outbound_buffer);
    let controller = SessionController::new(config, tx);
    let cancel = CancellationToken::new();

    state
        .sessions
        .register(
            session_id.clone(),
            RegisteredSession {
                cancel: cancel.clone(),
                stats: controller.subscribe(),
            },
        )
        .await;

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(forward_outbound(rx, sink));

    controller
        .run(&state.inference, inbound_messages(stream), cancel)
        .await;

    state.sessions.remove(&session_id).await;

    // The controller is gone, so the writer drains what is left and closes.
    // A peer that stopped reading can stall the sink, so the drain is bounded.
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Websocket writer task panicked: {}", e),
        Err(_) => {
            warn!(
                "Websocket writer for {} still blocked after {:?}, aborting",
                session_id, WRITER_DRAIN_TIMEOUT
            );
            writer.abort();
        }
    }

    info!("Websocket disconnected: {}", session_id);
}

/// Map websocket messages to session input, ending at the first close or error
fn inbound_messages(stream: SplitStream<WebSocket>) -> impl Stream<Item = Inbound> {
    stream
        .take_while(|msg| {
            if let Err(e) = msg {
                debug!("Websocket receive failed: {}", e);
            }
            future::ready(matches!(msg, Ok(m) if !matches!(m, Message::Close(_))))
        })
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Inbound::Text(text)),
                Ok(Message::Binary(data)) => Some(Inbound::Binary(data)),
                // Ping/pong are answered by the websocket layer
                _ => None,
            })
        })
}

async fn forward_outbound(
    mut rx: mpsc::Receiver<ServerMessage>,
    mut sink: SplitSink<WebSocket, Message>,
) {
    while let Some(msg) = rx.recv().await {
        let text = match serde_json::to_string(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            debug!("Websocket send failed, stopping writer: {}", e);
            return;
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Websocket close failed: {}", e);
    }
}
