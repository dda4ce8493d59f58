use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::BackendError;
use crate::engine::filters::matches_query;
use crate::engine::wizard::WizardError;
use crate::geo::haversine_km;
use crate::models::booking::BookingFilters;
use crate::models::location::{GeoPoint, LockerLocation};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub location: LockerLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Snapshot of the backend's locker locations. Replaced wholesale on refresh.
#[derive(Debug, Clone, Default)]
pub struct LocationDirectory {
    locations: Vec<LockerLocation>,
    load_error: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
}

impl LocationDirectory {
    pub fn from_locations(locations: Vec<LockerLocation>) -> Self {
        Self {
            locations,
            load_error: None,
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            locations: Vec::new(),
            load_error: Some(message.into()),
            fetched_at: Some(Utc::now()),
        }
    }

    /// A failed fetch yields an empty directory that remembers why.
    pub fn from_fetch(result: Result<Vec<LockerLocation>, BackendError>) -> Self {
        match result {
            Ok(locations) => {
                info!(count = locations.len(), "locker locations loaded");
                Self::from_locations(locations)
            }
            Err(err) => {
                warn!(error = %err, "failed to load locker locations");
                Self::failed(format!("could not load locker locations: {err}"))
            }
        }
    }

    pub fn locations(&self) -> &[LockerLocation] {
        &self.locations
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn find(&self, id: u64) -> Option<&LockerLocation> {
        self.locations.iter().find(|location| location.id == id)
    }

    /// Lockers with no free compartment are not interactive.
    pub fn selectable(&self, id: u64) -> Result<&LockerLocation, WizardError> {
        let location = self
            .find(id)
            .filter(|location| location.is_active)
            .ok_or(WizardError::UnknownLocation(id))?;

        if !location.has_free_locker() {
            return Err(WizardError::LocationUnavailable(id));
        }

        Ok(location)
    }

    pub fn visible(
        &self,
        filters: &BookingFilters,
        query: Option<&str>,
        near: Option<GeoPoint>,
    ) -> Vec<DirectoryEntry> {
        let mut entries: Vec<DirectoryEntry> = self
            .locations
            .iter()
            .filter(|location| location.is_active && filters.matches(location))
            .filter(|location| query.is_none_or(|q| matches_query(location, q)))
            .map(|location| DirectoryEntry {
                location: location.clone(),
                distance_km: near.map(|origin| haversine_km(&origin, &location.position())),
            })
            .collect();

        if near.is_some() {
            entries.sort_by(|a, b| {
                let a = a.distance_km.unwrap_or(f64::MAX);
                let b = b.distance_km.unwrap_or(f64::MAX);
                a.total_cmp(&b)
            });
        }

        entries
    }
}
