use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::{self, authenticate};
use crate::engine::directory::LocationDirectory;
use crate::engine::wizard::{BeginSubmit, BookingWizard, WizardError, WizardView};
use crate::error::AppError;
use crate::models::booking::{FiltersPatch, FormPatch};
use crate::models::location::GeoPoint;
use crate::models::order::Order;
use crate::state::AppState;

pub const CONFIRMATION_REDIRECT: &str = "/my-profile";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", get(get_booking).delete(discard_booking))
        .route("/bookings/:id/filters", patch(update_filters))
        .route("/bookings/:id/filters/reset", post(reset_filters))
        .route("/bookings/:id/location", post(select_location))
        .route("/bookings/:id/form", patch(update_form))
        .route("/bookings/:id/next", post(next_step))
        .route("/bookings/:id/back", post(previous_step))
        .route("/bookings/:id/refresh-locations", post(refresh_locations))
        .route("/bookings/:id/submit", post(submit_booking))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("booking {id} not found"))
}

/// Search text and proximity origin applied to the location list of a view.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl ViewQuery {
    fn near(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

/// Runs `change` on the wizard and returns its refreshed view.
fn with_wizard<F>(state: &AppState, id: Uuid, change: F) -> Result<Json<WizardView>, AppError>
where
    F: FnOnce(&mut BookingWizard, NaiveDate) -> Result<(), WizardError>,
{
    let mut wizard = state.wizards.get_mut(&id).ok_or_else(|| not_found(id))?;
    let today = today();

    change(wizard.value_mut(), today)?;
    Ok(Json(wizard.view(today, None, None)))
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<WizardView> {
    let session_id =
        auth::session_id(&headers).filter(|id| state.sessions.get(*id).is_some());
    let fetched = state
        .call("locations", None, state.backend.locations())
        .await;

    let wizard = BookingWizard::new(
        session_id,
        LocationDirectory::from_fetch(fetched),
        state.settings.pricing_model,
    );
    let view = wizard.view(today(), None, None);

    state.wizards.insert(wizard.id, wizard);
    state.track_wizards();
    info!(wizard_id = %view.id, "booking wizard created");

    Json(view)
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<WizardView>, AppError> {
    let wizard = state.wizards.get(&id).ok_or_else(|| not_found(id))?;

    Ok(Json(wizard.view(today(), query.q.as_deref(), query.near())))
}

async fn update_filters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FiltersPatch>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, _| wizard.update_filters(patch))
}

async fn reset_filters(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, _| wizard.reset_filters())
}

#[derive(Deserialize)]
pub struct SelectLocationRequest {
    pub location_id: u64,
}

async fn select_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectLocationRequest>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, _| {
        wizard.select_location(payload.location_id)
    })
}

async fn update_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FormPatch>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, today| wizard.update_form(patch, today))
}

async fn next_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, today| wizard.next(today).map(|_| ()))
}

async fn previous_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    with_wizard(&state, id, |wizard, _| {
        wizard.back();
        Ok(())
    })
}

async fn refresh_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WizardView>, AppError> {
    if !state.wizards.contains_key(&id) {
        return Err(not_found(id));
    }

    let fetched = state
        .call("locations", None, state.backend.locations())
        .await;
    let directory = LocationDirectory::from_fetch(fetched);

    with_wizard(&state, id, |wizard, _| {
        wizard.replace_directory(directory);
        Ok(())
    })
}

#[derive(Debug, Serialize)]
pub struct BookingConfirmation {
    pub order: Order,
    pub redirect: &'static str,
    pub redirect_after_ms: u64,
}

async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<BookingConfirmation>, AppError> {
    let auth = authenticate(&state, &headers)?;
    let confirmation = |order: Order| BookingConfirmation {
        order,
        redirect: CONFIRMATION_REDIRECT,
        redirect_after_ms: state.settings.booking_redirect_delay_ms,
    };

    // The map guard must not be held across the upstream call.
    let begun = {
        let mut wizard = state.wizards.get_mut(&id).ok_or_else(|| not_found(id))?;
        if let Some(owner) = wizard.session_id {
            if owner != auth.session_id && state.sessions.get(owner).is_some() {
                return Err(AppError::Conflict(format!(
                    "booking {id} belongs to another session"
                )));
            }
        }
        wizard.session_id = Some(auth.session_id);
        wizard.begin_submit(today())
    };

    let ticket = match begun {
        Ok(BeginSubmit::Started(ticket)) => ticket,
        Ok(BeginSubmit::AlreadyConfirmed(order)) => return Ok(Json(confirmation(order))),
        Err(err) => {
            if err == WizardError::SubmissionInFlight {
                state
                    .metrics
                    .bookings_total
                    .with_label_values(&["duplicate"])
                    .inc();
            }
            return Err(err.into());
        }
    };

    let result = state
        .call(
            "create_order",
            Some(auth.session_id),
            state
                .backend
                .create_order(&auth.token, &ticket.order, ticket.idempotency_key),
        )
        .await;

    let settled = result.clone().map_err(|err| err.to_string());
    match state.wizards.get_mut(&id) {
        Some(mut wizard) => {
            if !wizard.complete_submit(ticket.idempotency_key, settled) {
                warn!(wizard_id = %id, "submission result no longer matches the wizard");
            }
        }
        None => warn!(wizard_id = %id, "booking wizard discarded before its submission settled"),
    }

    match result {
        Ok(order) => {
            state
                .metrics
                .bookings_total
                .with_label_values(&["confirmed"])
                .inc();
            info!(wizard_id = %id, order_id = order.id, "booking confirmed");
            Ok(Json(confirmation(order)))
        }
        Err(err) => {
            state
                .metrics
                .bookings_total
                .with_label_values(&["failed"])
                .inc();
            Err(err.into())
        }
    }
}

async fn discard_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.wizards.remove(&id).ok_or_else(|| not_found(id))?;
    state.track_wizards();
    info!(wizard_id = %id, "booking wizard discarded");

    Ok(StatusCode::NO_CONTENT)
}
