use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LockerSize {
    Small,
    Medium,
    Large,
}

impl LockerSize {
    pub const ALL: [LockerSize; 3] = [LockerSize::Small, LockerSize::Medium, LockerSize::Large];

    /// Heaviest load, in kg, a locker of this size accepts.
    pub fn max_weight_kg(self) -> u8 {
        match self {
            LockerSize::Small => 5,
            LockerSize::Medium => 10,
            LockerSize::Large => 15,
        }
    }
}

/// Per-size day rate published by a location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SizePricing {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl SizePricing {
    pub fn for_size(&self, size: LockerSize) -> f64 {
        match size {
            LockerSize::Small => self.small,
            LockerSize::Medium => self.medium,
            LockerSize::Large => self.large,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LockerLocation {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub available_lockers: u32,
    #[serde(rename = "isOpen24Hours", default)]
    pub is_open_24_hours: bool,
    #[serde(default)]
    pub locker_sizes: Vec<LockerSize>,
    #[serde(default)]
    pub pricing: Option<SizePricing>,
    #[serde(rename = "is_active", default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl LockerLocation {
    pub fn position(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn offers(&self, size: LockerSize) -> bool {
        self.locker_sizes.contains(&size)
    }

    pub fn has_free_locker(&self) -> bool {
        self.available_lockers > 0
    }
}
