use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::SinkExt;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use uuid::Uuid;

use super::admin::admin_session;
use crate::error::AppError;
use crate::session::SessionEventKind;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/orders", get(order_events))
        .route("/sessions/:id/events", get(session_events))
}

#[derive(Deserialize)]
pub struct OrderFeedQuery {
    pub session_id: Uuid,
}

/// Admin feed of order status changes. Browsers cannot set headers on a
/// websocket handshake, so the session travels in the query string.
async fn order_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderFeedQuery>,
) -> Response {
    if let Err(err) = admin_session(&state, query.session_id).await {
        return err.into_response();
    }

    let events = BroadcastStream::new(state.order_events_tx.subscribe());
    ws.on_upgrade(move |socket| forward(socket, events, |_| true, |_| false))
}

async fn session_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Response {
    // Subscribe before the liveness check so an ending that lands in between is still delivered.
    let events = BroadcastStream::new(state.sessions.subscribe());
    if state.sessions.get(session_id).is_none() {
        return AppError::Unauthorized.into_response();
    }
    ws.on_upgrade(move |socket| {
        forward(
            socket,
            events,
            move |event| event.session_id == session_id,
            |event| event.kind != SessionEventKind::SignedIn,
        )
    })
}

/// Pushes every event passing `keep` to the socket as JSON, closing after one
/// for which `last` holds.
async fn forward<T, K, L>(socket: WebSocket, mut events: BroadcastStream<T>, keep: K, last: L)
where
    T: Clone + Serialize + Send + 'static,
    K: Fn(&T) -> bool + Send + 'static,
    L: Fn(&T) -> bool + Send + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    info!("websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(item) = events.next().await {
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "websocket client fell behind");
                    continue;
                }
            };
            if !keep(&event) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() || last(&event) {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket client disconnected");
}
