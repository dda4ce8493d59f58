use std::cmp::Reverse;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::authenticate;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::profile::{ProfileEnvelope, ProfileUpdate};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).put(update_profile).delete(delete_account),
        )
        .route("/profile/orders", get(list_orders))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ProfileEnvelope>, AppError> {
    let auth = authenticate(&state, &headers)?;
    let user = state
        .call("profile", Some(auth.session_id), state.backend.profile(&auth.token))
        .await?;

    Ok(Json(ProfileEnvelope { user }))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileEnvelope>, AppError> {
    let auth = authenticate(&state, &headers)?;
    let user = state
        .call(
            "update_profile",
            Some(auth.session_id),
            state.backend.update_profile(&auth.token, &update),
        )
        .await?;

    Ok(Json(ProfileEnvelope { user }))
}

#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<StatusCode, AppError> {
    let auth = authenticate(&state, &headers)?;
    if payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "password is required to delete the account".to_string(),
        ));
    }

    state
        .call(
            "delete_account",
            Some(auth.session_id),
            state.backend.delete_account(&auth.token, &payload.password),
        )
        .await?;

    state.end_session(auth.session_id, false);
    info!(session_id = %auth.session_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OrderHistory {
    pub upcoming: Vec<Order>,
    pub past: Vec<Order>,
}

/// Open orders versus finished ones, each newest first.
pub fn split_history(mut orders: Vec<Order>) -> OrderHistory {
    orders.sort_by_key(|order| Reverse((order.created_at, order.id)));
    let (upcoming, past) = orders
        .into_iter()
        .partition(|order| order.status.is_open());

    OrderHistory { upcoming, past }
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<OrderHistory>, AppError> {
    let auth = authenticate(&state, &headers)?;
    let orders = state
        .call("orders", Some(auth.session_id), state.backend.orders(&auth.token))
        .await?;

    Ok(Json(split_history(orders)))
}
