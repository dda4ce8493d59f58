use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::order::{Order, OrderStatus};

pub const MONTHLY_LOCKER_COST: f64 = 50.0;

pub fn reporting_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    /// Nothing before the epoch; an inverted range collapses onto `end`.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let epoch = reporting_epoch();
        let end = end.unwrap_or(today).max(epoch);
        let start = start.unwrap_or(epoch).max(epoch).min(end);
        Self { start, end }
    }

    pub fn months(&self) -> u32 {
        let years = self.end.year() - self.start.year();
        let months = years * 12 + self.end.month() as i32 - self.start.month() as i32 + 1;
        months.max(1) as u32
    }

    fn contains(&self, order: &Order) -> bool {
        order
            .created_at
            .map(|at| at.date_naive())
            .is_some_and(|day| self.start <= day && day <= self.end)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Profitability {
    pub range: ReportRange,
    pub location_id: Option<u64>,
    pub months: u32,
    pub total_orders: usize,
    pub completed_orders: usize,
    /// Every status is present, zero when no order has it.
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub total_costs: f64,
    pub total_processing_fees: f64,
    pub profit: f64,
    pub monthly_average: f64,
}

pub fn profitability(orders: &[Order], range: ReportRange, location_id: Option<u64>) -> Profitability {
    let selected: Vec<&Order> = orders
        .iter()
        .filter(|order| {
            location_id.is_none_or(|id| order.location.as_ref().is_some_and(|l| l.id == id))
        })
        .filter(|order| range.contains(order))
        .collect();

    let completed: Vec<&&Order> = selected
        .iter()
        .filter(|order| order.status == OrderStatus::Completed)
        .collect();

    let mut by_status: BTreeMap<OrderStatus, usize> =
        OrderStatus::ALL.into_iter().map(|status| (status, 0)).collect();
    for order in &selected {
        *by_status.entry(order.status).or_default() += 1;
    }

    let months = range.months();
    let total_costs = f64::from(months) * MONTHLY_LOCKER_COST;
    let total_processing_fees: f64 = completed
        .iter()
        .filter_map(|order| order.pricing.as_ref().and_then(|p| p.processing_fee))
        .sum();
    let profit = total_processing_fees - total_costs;

    Profitability {
        range,
        location_id,
        months,
        total_orders: selected.len(),
        completed_orders: completed.len(),
        by_status,
        total_costs,
        total_processing_fees,
        profit,
        monthly_average: profit / f64::from(months),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::models::order::{OrderLocation, OrderPricing};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(id: u64, location: u64, status: OrderStatus, day: NaiveDate, fee: f64) -> Order {
        Order {
            id,
            status,
            location: Some(OrderLocation {
                id: location,
                name: String::new(),
                address: String::new(),
            }),
            locker: None,
            services: None,
            schedule: None,
            details: None,
            pricing: Some(OrderPricing {
                base_price: 0.0,
                total_weight: 0,
                additional_services: 0.0,
                total: 0.0,
                processing_fee: Some(fee),
            }),
            created_at: Some(Utc.from_utc_datetime(&day.and_hms_opt(23, 30, 0).unwrap())),
            updated_at: None,
            awb: None,
        }
    }

    #[test]
    fn range_is_clamped_to_epoch_and_ordered() {
        let today = date(2026, 10, 18);

        let defaulted = ReportRange::resolve(None, None, today);
        assert_eq!(defaulted.start, date(2025, 1, 1));
        assert_eq!(defaulted.end, today);

        let early = ReportRange::resolve(Some(date(2024, 6, 1)), Some(date(2025, 3, 1)), today);
        assert_eq!(early.start, date(2025, 1, 1));

        let inverted = ReportRange::resolve(Some(date(2025, 9, 1)), Some(date(2025, 5, 1)), today);
        assert_eq!(inverted.start, inverted.end);
        assert_eq!(inverted.end, date(2025, 5, 1));
    }

    #[test]
    fn months_are_counted_inclusively() {
        let range = ReportRange {
            start: date(2025, 1, 31),
            end: date(2025, 3, 1),
        };
        assert_eq!(range.months(), 3);

        let across_years = ReportRange {
            start: date(2025, 11, 1),
            end: date(2026, 2, 1),
        };
        assert_eq!(across_years.months(), 4);
    }

    #[test]
    fn only_completed_fees_count_toward_profit() {
        let orders = vec![
            order(1, 1, OrderStatus::Completed, date(2025, 1, 10), 80.0),
            order(2, 1, OrderStatus::Pending, date(2025, 1, 12), 30.0),
            order(3, 2, OrderStatus::Completed, date(2025, 2, 28), 45.0),
            order(4, 1, OrderStatus::Completed, date(2025, 4, 1), 99.0),
        ];
        let range = ReportRange {
            start: date(2025, 1, 1),
            end: date(2025, 2, 28),
        };

        let all = profitability(&orders, range, None);
        assert_eq!(all.total_orders, 3);
        assert_eq!(all.completed_orders, 2);
        assert_eq!(all.by_status[&OrderStatus::Completed], 2);
        assert_eq!(all.by_status[&OrderStatus::Pending], 1);
        assert_eq!(all.by_status[&OrderStatus::Cancelled], 0);
        assert_eq!(all.by_status.len(), OrderStatus::ALL.len());
        assert_eq!(all.total_costs, 100.0);
        assert!((all.total_processing_fees - 125.0).abs() < 1e-9);
        assert!((all.profit - 25.0).abs() < 1e-9);
        assert!((all.monthly_average - 12.5).abs() < 1e-9);

        let first_locker = profitability(&orders, range, Some(1));
        assert_eq!(first_locker.total_orders, 2);
        assert!((first_locker.total_processing_fees - 80.0).abs() < 1e-9);
    }
}
