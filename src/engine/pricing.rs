use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::booking::ServiceType;
use crate::models::location::{LockerLocation, LockerSize};

pub const RATE_PER_KG: f64 = 20.0;
pub const SERVICE_FEE: f64 = 2.99;
pub const TAX_RATE: f64 = 0.19;

/// Which quoting rule a deployment uses. Exactly one is active per process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    /// `RATE_PER_KG * weight + surcharge`, location pricing ignored.
    #[default]
    WeightBased,
    /// Location's day rate for the chosen size plus a flat surcharge.
    SizeTier,
}

impl PricingModel {
    pub fn surcharge(self, service: ServiceType) -> f64 {
        match (self, service) {
            (_, ServiceType::WashFold) => 0.0,
            (PricingModel::SizeTier, ServiceType::DryClean) => 5.0,
            (PricingModel::SizeTier, ServiceType::Both) => 7.5,
            (PricingModel::WeightBased, ServiceType::DryClean) => 20.0,
            (PricingModel::WeightBased, ServiceType::Both) => 40.0,
        }
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingModel::WeightBased => f.write_str("weight_based"),
            PricingModel::SizeTier => f.write_str("size_tier"),
        }
    }
}

impl FromStr for PricingModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weight_based" | "weight" => Ok(PricingModel::WeightBased),
            "size_tier" | "size" => Ok(PricingModel::SizeTier),
            other => Err(format!(
                "unknown pricing model: {other}, expected weight_based/size_tier"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriceInputs<'a> {
    pub location: Option<&'a LockerLocation>,
    pub locker_size: Option<LockerSize>,
    pub service_type: ServiceType,
    pub weight_kg: u8,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct Quote {
    pub base_price: f64,
    pub additional_services: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CheckoutSummary {
    pub subtotal: f64,
    pub service_fee: f64,
    pub tax: f64,
    pub total: f64,
}

/// Zero when the model's preconditions are unmet, never an error.
pub fn quote(model: PricingModel, inputs: &PriceInputs<'_>) -> Quote {
    let base_price = match model {
        PricingModel::WeightBased => RATE_PER_KG * f64::from(inputs.weight_kg),
        PricingModel::SizeTier => {
            let (Some(location), Some(size)) = (inputs.location, inputs.locker_size) else {
                return Quote::default();
            };
            location
                .pricing
                .map(|pricing| pricing.for_size(size))
                .unwrap_or(0.0)
        }
    };

    let additional_services = model.surcharge(inputs.service_type);
    Quote {
        base_price,
        additional_services,
        total: base_price + additional_services,
    }
}

pub fn checkout_summary(subtotal: f64) -> CheckoutSummary {
    let taxable = subtotal + SERVICE_FEE;
    let tax = taxable * TAX_RATE;

    CheckoutSummary {
        subtotal,
        service_fee: SERVICE_FEE,
        tax,
        total: taxable + tax,
    }
}
