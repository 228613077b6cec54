use crate::services::Analytics;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::time::{interval, Duration};

/// Live check-in counter for the organizer dashboard. Pushes a snapshot on
/// connect, then again whenever the counters move (checked at one-second
/// granularity). Clients may send `refresh` to force a push.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(analytics): State<Arc<Analytics>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, analytics))
}

async fn handle_socket(socket: WebSocket, analytics: Arc<Analytics>) {
    let (mut sender, mut receiver) = socket.split();

    let mut ticker = interval(Duration::from_secs(1));
    let mut last_counters: Option<(u64, u64)> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let stats = analytics.get_stats().await;
                let counters = (stats.total_check_ins, stats.rejections_total);
                if last_counters == Some(counters) {
                    continue;
                }

                match serde_json::to_string(&stats) {
                    Ok(frame) => {
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                        last_counters = Some(counters);
                    }
                    Err(e) => tracing::warn!("Could not serialize stats frame: {}", e),
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text.trim() == "refresh" => {
                        // Force a fresh frame on the next tick.
                        last_counters = None;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("Check-in feed socket error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("Check-in feed connection closed");
}
