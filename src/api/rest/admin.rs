use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::{self, Authenticated};
use crate::engine::admin::{AdminOrderPanel, AdminOrderRow, Reconciliation};
use crate::engine::statistics::{self, Profitability, ReportRange};
use crate::error::AppError;
use crate::models::order::OrderStatus;
use crate::state::{AppState, OrderStatusEvent};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/:id/status", put(update_status))
        .route("/admin/statistics", get(statistics))
}

fn restricted(state: &AppState) -> AppError {
    AppError::Restricted {
        redirect_after_ms: state.settings.admin_redirect_delay_ms,
    }
}

/// The session behind `session_id`, when its profile is an administrator's.
pub async fn admin_session(state: &AppState, session_id: Uuid) -> Result<Authenticated, AppError> {
    let token = state
        .sessions
        .token(session_id)
        .ok_or_else(|| restricted(state))?;

    match state
        .call("profile", Some(session_id), state.backend.profile(&token))
        .await
    {
        Ok(profile) if profile.is_admin => Ok(Authenticated { session_id, token }),
        Ok(profile) => {
            warn!(session_id = %session_id, email = %profile.email, "non-admin denied admin access");
            Err(restricted(state))
        }
        Err(_) => Err(restricted(state)),
    }
}

async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Authenticated, AppError> {
    let session_id = auth::session_id(headers).ok_or_else(|| restricted(state))?;
    admin_session(state, session_id).await
}

#[derive(Serialize)]
pub struct AdminOrdersResponse {
    pub orders: Vec<AdminOrderRow>,
    pub loaded_at: Option<chrono::DateTime<Utc>>,
}

async fn load_panel(state: &AppState, admin: &Authenticated) -> Result<AdminOrdersResponse, AppError> {
    let orders = state
        .call("orders", Some(admin.session_id), state.backend.orders(&admin.token))
        .await?;

    let mut panel = state
        .admin_panels
        .entry(admin.session_id)
        .or_insert_with(AdminOrderPanel::default);
    panel.replace_orders(orders);

    Ok(AdminOrdersResponse {
        orders: panel.rows().to_vec(),
        loaded_at: panel.loaded_at(),
    })
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminOrdersResponse>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    Ok(Json(load_panel(&state, &admin).await?))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
    pub order: Option<AdminOrderRow>,
    pub error: Option<String>,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<u64>,
    headers: HeaderMap,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<(StatusCode, Json<StatusUpdateResponse>), AppError> {
    let admin = require_admin(&state, &headers).await?;

    if !state.admin_panels.contains_key(&admin.session_id) {
        load_panel(&state, &admin).await?;
    }

    let command = state
        .admin_panels
        .get_mut(&admin.session_id)
        .and_then(|mut panel| panel.dispatch(order_id, payload.status))
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;
    publish(&state, order_id, payload.status, false);

    let result = state
        .call(
            "update_order_status",
            Some(admin.session_id),
            state
                .backend
                .update_order_status(&admin.token, order_id, payload.status),
        )
        .await;
    let error = result.as_ref().err().map(ToString::to_string);

    let (reconciliation, row) = match state.admin_panels.get_mut(&admin.session_id) {
        Some(mut panel) => {
            let outcome = panel.reconcile(&command, result.map_err(|err| err.to_string()));
            (outcome, panel.row(order_id).cloned())
        }
        // Session ended while the call was in flight.
        None => (Reconciliation::Superseded, None),
    };

    let (status, label) = match reconciliation {
        Reconciliation::Confirmed => {
            publish(&state, order_id, payload.status, true);
            info!(order_id, status = %payload.status, "order status updated");
            (StatusCode::OK, "confirmed")
        }
        Reconciliation::Reverted { restored } => {
            publish(&state, order_id, restored, true);
            warn!(order_id, restored = %restored, "order status change reverted");
            (StatusCode::BAD_GATEWAY, "reverted")
        }
        Reconciliation::Superseded => (StatusCode::ACCEPTED, "superseded"),
    };
    state
        .metrics
        .status_updates_total
        .with_label_values(&[label])
        .inc();

    Ok((
        status,
        Json(StatusUpdateResponse {
            reconciliation,
            order: row,
            error,
        }),
    ))
}

fn publish(state: &AppState, order_id: u64, status: OrderStatus, confirmed: bool) {
    let _ = state.order_events_tx.send(OrderStatusEvent {
        order_id,
        status,
        confirmed,
        at: Utc::now(),
    });
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub location_id: Option<u64>,
}

async fn statistics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<Profitability>, AppError> {
    let admin = require_admin(&state, &headers).await?;
    let orders = state
        .call("orders", Some(admin.session_id), state.backend.orders(&admin.token))
        .await?;

    let range = ReportRange::resolve(query.start, query.end, Utc::now().date_naive());
    Ok(Json(statistics::profitability(&orders, range, query.location_id)))
}
