use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::location::LockerSize;
use crate::models::time_slot::TimeSlot;

pub const DEFAULT_WEIGHT_KG: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[default]
    WashFold,
    DryClean,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BookingFilters {
    pub locker_size: Option<LockerSize>,
    pub service_type: ServiceType,
    pub open_24_hours: bool,
    pub available_now: bool,
}

/// Partial update of [`BookingFilters`]. An explicit `"locker_size": null` clears the size.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FiltersPatch {
    #[serde(default, deserialize_with = "present")]
    pub locker_size: Option<Option<LockerSize>>,
    pub service_type: Option<ServiceType>,
    pub open_24_hours: Option<bool>,
    pub available_now: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingForm {
    pub dropoff_date: Option<NaiveDate>,
    pub dropoff_time: Option<TimeSlot>,
    pub pickup_date: Option<NaiveDate>,
    pub pickup_time: Option<TimeSlot>,
    pub estimated_weight: u8,
    pub special_instructions: String,
    pub use_stored_payment: bool,
}

impl Default for BookingForm {
    fn default() -> Self {
        Self {
            dropoff_date: None,
            dropoff_time: None,
            pickup_date: None,
            pickup_time: None,
            estimated_weight: DEFAULT_WEIGHT_KG,
            special_instructions: String::new(),
            use_stored_payment: true,
        }
    }
}

impl BookingForm {
    pub fn schedule_complete(&self) -> bool {
        self.dropoff_date.is_some()
            && self.dropoff_time.is_some()
            && self.pickup_date.is_some()
            && self.pickup_time.is_some()
    }
}

/// Partial update of [`BookingForm`]. Dates and slots accept `null` to clear them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FormPatch {
    #[serde(default, deserialize_with = "present")]
    pub dropoff_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub dropoff_time: Option<Option<TimeSlot>>,
    #[serde(default, deserialize_with = "present")]
    pub pickup_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub pickup_time: Option<Option<TimeSlot>>,
    pub estimated_weight: Option<u8>,
    pub special_instructions: Option<String>,
    pub use_stored_payment: Option<bool>,
}

// Distinguishes an absent key (outer None) from an explicit null (Some(None)).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{FiltersPatch, FormPatch, ServiceType};
    use crate::models::location::LockerSize;

    #[test]
    fn filters_patch_tells_null_from_missing() {
        let cleared: FiltersPatch = serde_json::from_str(r#"{ "locker_size": null }"#).unwrap();
        assert_eq!(cleared.locker_size, Some(None));

        let untouched: FiltersPatch =
            serde_json::from_str(r#"{ "service_type": "dry_clean" }"#).unwrap();
        assert_eq!(untouched.locker_size, None);
        assert_eq!(untouched.service_type, Some(ServiceType::DryClean));

        let set: FiltersPatch = serde_json::from_str(r#"{ "locker_size": "large" }"#).unwrap();
        assert_eq!(set.locker_size, Some(Some(LockerSize::Large)));
    }

    #[test]
    fn form_patch_parses_dates_and_slots() {
        let patch: FormPatch = serde_json::from_str(
            r#"{ "dropoff_date": "2026-10-20", "dropoff_time": "7:00 - 9:00", "pickup_date": null }"#,
        )
        .unwrap();

        assert!(matches!(patch.dropoff_date, Some(Some(_))));
        assert!(matches!(patch.dropoff_time, Some(Some(_))));
        assert_eq!(patch.pickup_date, Some(None));
        assert!(patch.pickup_time.is_none());
    }
}
