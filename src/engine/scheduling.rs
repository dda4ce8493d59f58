//! Dropoff/pickup calendar rules.
//!
//! Dropoff may be booked from today up to [`DROPOFF_HORIZON_DAYS`] ahead; pickup
//! from the dropoff day up to [`PICKUP_HORIZON_DAYS`] after it. Slot selection
//! requires the matching date. Moving or clearing the dropoff date drops any
//! pickup that no longer fits.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::models::booking::BookingForm;
use crate::models::location::LockerSize;
use crate::models::time_slot::{TimeSlot, ROUND_THE_CLOCK_SLOTS, STANDARD_SLOTS};

pub const DROPOFF_HORIZON_DAYS: u64 = 30;
pub const PICKUP_HORIZON_DAYS: u64 = 7;
pub const MIN_WEIGHT_KG: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Dropoff,
    Pickup,
}

impl Leg {
    fn as_str(self) -> &'static str {
        match self {
            Leg::Dropoff => "dropoff",
            Leg::Pickup => "pickup",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DateWindow {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateWindow {
    fn starting(first: NaiveDate, days: u64) -> Self {
        Self {
            first,
            last: first.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("{leg} date {date} is outside the selectable range {first}..={last}")]
    OutOfRange {
        leg: &'static str,
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },

    #[error("choose a dropoff date before the pickup date")]
    DropoffRequired,

    #[error("choose a {0} date before picking a time slot")]
    SlotWithoutDate(&'static str),

    #[error("time slot {0} is not offered at this location")]
    SlotNotOffered(TimeSlot),
}

pub fn slots_for(open_24_hours: bool) -> &'static [TimeSlot] {
    if open_24_hours {
        &ROUND_THE_CLOCK_SLOTS
    } else {
        &STANDARD_SLOTS
    }
}

pub fn dropoff_window(today: NaiveDate) -> DateWindow {
    DateWindow::starting(today, DROPOFF_HORIZON_DAYS)
}

pub fn pickup_window(dropoff: NaiveDate) -> DateWindow {
    DateWindow::starting(dropoff, PICKUP_HORIZON_DAYS)
}

pub fn set_dropoff_date(
    form: &mut BookingForm,
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), ScheduleError> {
    let Some(date) = date else {
        form.dropoff_date = None;
        form.dropoff_time = None;
        form.pickup_date = None;
        form.pickup_time = None;
        return Ok(());
    };

    let window = dropoff_window(today);
    if !window.contains(date) {
        return Err(out_of_range(Leg::Dropoff, date, window));
    }

    form.dropoff_date = Some(date);
    if form.pickup_date.is_some_and(|pickup| !pickup_window(date).contains(pickup)) {
        form.pickup_date = None;
        form.pickup_time = None;
    }

    Ok(())
}

pub fn set_pickup_date(form: &mut BookingForm, date: Option<NaiveDate>) -> Result<(), ScheduleError> {
    let Some(date) = date else {
        form.pickup_date = None;
        form.pickup_time = None;
        return Ok(());
    };

    let dropoff = form.dropoff_date.ok_or(ScheduleError::DropoffRequired)?;
    let window = pickup_window(dropoff);
    if !window.contains(date) {
        return Err(out_of_range(Leg::Pickup, date, window));
    }

    form.pickup_date = Some(date);
    Ok(())
}

pub fn set_slot(
    form: &mut BookingForm,
    leg: Leg,
    slot: Option<TimeSlot>,
    open_24_hours: bool,
) -> Result<(), ScheduleError> {
    let (date, target) = match leg {
        Leg::Dropoff => (form.dropoff_date, &mut form.dropoff_time),
        Leg::Pickup => (form.pickup_date, &mut form.pickup_time),
    };

    if let Some(slot) = slot {
        if date.is_none() {
            return Err(ScheduleError::SlotWithoutDate(leg.as_str()));
        }
        if !slots_for(open_24_hours).contains(&slot) {
            return Err(ScheduleError::SlotNotOffered(slot));
        }
    }

    *target = slot;
    Ok(())
}

/// Drops chosen slots the current location does not offer.
pub fn retain_offered_slots(form: &mut BookingForm, open_24_hours: bool) {
    let offered = slots_for(open_24_hours);
    if form.dropoff_time.is_some_and(|slot| !offered.contains(&slot)) {
        form.dropoff_time = None;
    }
    if form.pickup_time.is_some_and(|slot| !offered.contains(&slot)) {
        form.pickup_time = None;
    }
}

/// Re-checks a filled-in schedule against today's calendar.
pub fn validate(form: &BookingForm, today: NaiveDate) -> Result<(), ScheduleError> {
    if let Some(dropoff) = form.dropoff_date {
        let window = dropoff_window(today);
        if !window.contains(dropoff) {
            return Err(out_of_range(Leg::Dropoff, dropoff, window));
        }
        if let Some(pickup) = form.pickup_date {
            let window = pickup_window(dropoff);
            if !window.contains(pickup) {
                return Err(out_of_range(Leg::Pickup, pickup, window));
            }
        }
    }
    Ok(())
}

pub fn max_weight_kg(size: Option<LockerSize>) -> u8 {
    size.unwrap_or(LockerSize::Large).max_weight_kg()
}

pub fn clamp_weight(weight: u8, size: Option<LockerSize>) -> u8 {
    weight.clamp(MIN_WEIGHT_KG, max_weight_kg(size))
}

fn out_of_range(leg: Leg, date: NaiveDate, window: DateWindow) -> ScheduleError {
    ScheduleError::OutOfRange {
        leg: leg.as_str(),
        date,
        first: window.first,
        last: window.last,
    }
}
