// Live feed for viewers: every announcement of one match, as JSON text frames

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use criclive_models::MatchId;
use criclive_stream::StreamMessage;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct LiveFeedParams {
    /// Without a match every announcement is forwarded.
    pub match_id: Option<MatchId>,
}

/// Upgrades to a WebSocket that streams score updates, optionally filtered to one match.
pub async fn live_feed(
    State(state): State<AppState>,
    Query(params): Query<LiveFeedParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let updates = state.events.subscribe();
    ws.on_upgrade(move |socket| forward_updates(socket, updates, params.match_id))
}

fn wanted(filter: Option<MatchId>, message: &StreamMessage) -> bool {
    filter.map_or(true, |id| id == message.match_id)
}

async fn forward_updates(socket: WebSocket, mut updates: broadcast::Receiver<StreamMessage>, filter: Option<MatchId>) {
    match filter {
        Some(id) => info!("👀 Viewer connected to match {}", id),
        None => info!("👀 Viewer connected to all matches"),
    }
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("⚠️ Viewer socket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(message) if wanted(filter, &message) => {
                        let text = match message.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("⚠️ Could not encode {}: {}", message.update.kind(), e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("⚠️ Viewer fell behind, {} updates skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    let _ = sender.close().await;
    debug!("viewer disconnected");
}
