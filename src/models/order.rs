use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::LockerSize;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Scheduled")]
    Scheduled,
    #[serde(alias = "Processing")]
    Processing,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Scheduled,
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Scheduled => "scheduled",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_open(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Scheduled | OrderStatus::Processing
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLocation {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLocker {
    pub size: LockerSize,
    pub max_weight: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderServices {
    pub base: String,
    #[serde(default)]
    pub additional: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSchedule {
    pub dropoff: ScheduleEntry,
    pub pickup: ScheduleEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub weight: u8,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderPricing {
    pub base_price: f64,
    pub total_weight: u8,
    pub additional_services: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_fee: Option<f64>,
}

/// Order as returned by the backend. Only `id` and `status` are guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    #[serde(default)]
    pub location: Option<OrderLocation>,
    #[serde(default)]
    pub locker: Option<OrderLocker>,
    #[serde(default)]
    pub services: Option<OrderServices>,
    #[serde(default)]
    pub schedule: Option<OrderSchedule>,
    #[serde(default)]
    pub details: Option<OrderDetails>,
    #[serde(default)]
    pub pricing: Option<OrderPricing>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub awb: Option<String>,
}

/// Payload posted to the backend when a booking is finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub location: OrderLocation,
    pub locker: OrderLocker,
    pub services: OrderServices,
    pub schedule: OrderSchedule,
    pub details: OrderDetails,
    pub pricing: OrderPricing,
    pub use_stored_payment: bool,
}

#[cfg(test)]
mod tests {
    use super::{Order, OrderStatus};

    #[test]
    fn status_accepts_capitalized_alias() {
        let status: OrderStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"completed\"");
        assert_eq!("Processing".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn sparse_backend_order_parses() {
        let order: Order = serde_json::from_str(
            r#"{ "id": 42, "status": "pending", "created_at": "2025-03-15T10:00:00Z" }"#,
        )
        .unwrap();

        assert_eq!(order.id, 42);
        assert!(order.location.is_none());
        assert!(order.created_at.is_some());
        assert!(order.status.is_open());
    }
}
