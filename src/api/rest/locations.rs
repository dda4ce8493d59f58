use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::engine::directory::{DirectoryEntry, LocationDirectory};
use crate::models::booking::{BookingFilters, ServiceType};
use crate::models::location::{GeoPoint, LockerSize};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/locations", get(list_locations))
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub locker_size: Option<LockerSize>,
    pub service_type: Option<ServiceType>,
    #[serde(default)]
    pub open_24_hours: bool,
    #[serde(default)]
    pub available_now: bool,
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationQuery {
    pub fn filters(&self) -> BookingFilters {
        BookingFilters {
            locker_size: self.locker_size,
            service_type: self.service_type.unwrap_or_default(),
            open_24_hours: self.open_24_hours,
            available_now: self.available_now,
        }
    }

    /// Proximity origin, only when both coordinates are given.
    pub fn near(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

#[derive(Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<DirectoryEntry>,
    pub error: Option<String>,
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Json<LocationsResponse> {
    let fetched = state
        .call("locations", None, state.backend.locations())
        .await;
    let directory = LocationDirectory::from_fetch(fetched);

    Json(LocationsResponse {
        locations: directory.visible(&query.filters(), query.q.as_deref(), query.near()),
        error: directory.load_error().map(str::to_string),
    })
}
