//! Three-step booking wizard.
//!
//! `SelectLocation -> ScheduleAndConfigure -> ReviewAndPay`, linear. Forward
//! moves are guarded, backward moves keep every entered value. Once a
//! submission is pending the wizard is frozen until the backend answers.
//! The idempotency key is drawn on the first submit and kept for the life of
//! the wizard, so no retry can create a second order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::directory::{DirectoryEntry, LocationDirectory};
use crate::engine::filters::apply_filters;
use crate::engine::pricing::{self, CheckoutSummary, PriceInputs, PricingModel, Quote};
use crate::engine::scheduling::{self, DateWindow, Leg, ScheduleError};
use crate::models::booking::{BookingFilters, BookingForm, FiltersPatch, FormPatch, ServiceType};
use crate::models::location::{GeoPoint, LockerLocation, LockerSize};
use crate::models::order::{
    NewOrder, Order, OrderDetails, OrderLocation, OrderLocker, OrderPricing, OrderSchedule,
    OrderServices, ScheduleEntry,
};
use crate::models::time_slot::TimeSlot;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectLocation,
    ScheduleAndConfigure,
    ReviewAndPay,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::SelectLocation => 1,
            WizardStep::ScheduleAndConfigure => 2,
            WizardStep::ReviewAndPay => 3,
        }
    }

    fn next(self) -> Self {
        match self {
            WizardStep::SelectLocation => WizardStep::ScheduleAndConfigure,
            WizardStep::ScheduleAndConfigure | WizardStep::ReviewAndPay => WizardStep::ReviewAndPay,
        }
    }

    fn prev(self) -> Self {
        match self {
            WizardStep::SelectLocation | WizardStep::ScheduleAndConfigure => {
                WizardStep::SelectLocation
            }
            WizardStep::ReviewAndPay => WizardStep::ScheduleAndConfigure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("location {0} not found")]
    UnknownLocation(u64),

    #[error("location {0} has no free lockers")]
    LocationUnavailable(u64),

    #[error("select a locker location first")]
    LocationRequired,

    #[error("select a locker size to continue")]
    LockerSizeRequired,

    #[error("locker size {0:?} is not offered at the selected location")]
    SizeNotOffered(LockerSize),

    #[error("choose dropoff and pickup dates and time slots to continue")]
    ScheduleIncomplete,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("booking can only be submitted from the review step")]
    NotReadyToSubmit,

    #[error("a submission for this booking is already in progress")]
    SubmissionInFlight,

    #[error("booking has already been confirmed")]
    Finalized,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Submission {
    Idle,
    Pending {
        idempotency_key: Uuid,
        started_at: DateTime<Utc>,
    },
    Failed {
        idempotency_key: Uuid,
        message: String,
    },
    Confirmed {
        order: Box<Order>,
    },
}

#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub idempotency_key: Uuid,
    pub order: NewOrder,
}

#[derive(Debug, Clone)]
pub enum BeginSubmit {
    Started(SubmissionTicket),
    AlreadyConfirmed(Order),
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub id: Uuid,
    pub step: WizardStep,
    pub step_number: u8,
    pub filters: BookingFilters,
    pub form: BookingForm,
    pub locations: Vec<DirectoryEntry>,
    pub locations_error: Option<String>,
    pub locations_fetched_at: Option<DateTime<Utc>>,
    pub selected_location: Option<LockerLocation>,
    pub time_slots: Vec<TimeSlot>,
    pub dropoff_window: DateWindow,
    pub pickup_window: Option<DateWindow>,
    pub max_weight_kg: u8,
    pub pricing_model: PricingModel,
    pub quote: Quote,
    pub checkout: Option<CheckoutSummary>,
    pub can_continue: bool,
    pub blocking_reason: Option<String>,
    pub submission: Submission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    step: WizardStep,
    filters: BookingFilters,
    form: BookingForm,
    selected_location: Option<u64>,
    directory: LocationDirectory,
    pricing_model: PricingModel,
    submission: Submission,
    idempotency_key: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingWizard {
    pub fn new(
        session_id: Option<Uuid>,
        directory: LocationDirectory,
        pricing_model: PricingModel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            step: WizardStep::SelectLocation,
            filters: BookingFilters::default(),
            form: BookingForm::default(),
            selected_location: None,
            directory,
            pricing_model,
            submission: Submission::Idle,
            idempotency_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn filters(&self) -> &BookingFilters {
        &self.filters
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn selected_location(&self) -> Option<&LockerLocation> {
        self.selected_location.and_then(|id| self.directory.find(id))
    }

    fn open_24_hours(&self) -> bool {
        self.selected_location()
            .is_some_and(|location| location.is_open_24_hours)
    }

    pub fn replace_directory(&mut self, directory: LocationDirectory) {
        self.directory = directory;
        if self.selected_location.is_some() && self.selected_location().is_none() {
            self.selected_location = None;
            self.filters.locker_size = None;
        }
        let open_24_hours = self.open_24_hours();
        scheduling::retain_offered_slots(&mut self.form, open_24_hours);
        self.updated_at = Utc::now();
    }

    pub fn update_filters(&mut self, patch: FiltersPatch) -> Result<(), WizardError> {
        self.ensure_editable()?;

        let next = apply_filters(&self.filters, patch);
        if let (Some(size), Some(location)) = (next.locker_size, self.selected_location()) {
            if !location.offers(size) {
                return Err(WizardError::SizeNotOffered(size));
            }
        }

        self.form.estimated_weight =
            scheduling::clamp_weight(self.form.estimated_weight, next.locker_size);
        self.filters = next;
        self.edited();
        Ok(())
    }

    pub fn reset_filters(&mut self) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.filters = BookingFilters::default();
        self.edited();
        Ok(())
    }

    /// Picks a locker location and, from the first step, moves on to scheduling.
    pub fn select_location(&mut self, location_id: u64) -> Result<(), WizardError> {
        self.ensure_editable()?;

        let open_24_hours = self.directory.selectable(location_id)?.is_open_24_hours;

        if self.selected_location != Some(location_id) {
            self.filters.locker_size = None;
        }
        self.selected_location = Some(location_id);
        scheduling::retain_offered_slots(&mut self.form, open_24_hours);

        if self.step == WizardStep::SelectLocation {
            self.step = WizardStep::ScheduleAndConfigure;
        }
        self.edited();
        Ok(())
    }

    /// Applies every field of the patch or none of them.
    pub fn update_form(&mut self, patch: FormPatch, today: NaiveDate) -> Result<(), WizardError> {
        self.ensure_editable()?;

        let open_24_hours = self.open_24_hours();
        let mut form = self.form.clone();

        if let Some(date) = patch.dropoff_date {
            scheduling::set_dropoff_date(&mut form, date, today)?;
        }
        if let Some(date) = patch.pickup_date {
            scheduling::set_pickup_date(&mut form, date)?;
        }
        if let Some(slot) = patch.dropoff_time {
            scheduling::set_slot(&mut form, Leg::Dropoff, slot, open_24_hours)?;
        }
        if let Some(slot) = patch.pickup_time {
            scheduling::set_slot(&mut form, Leg::Pickup, slot, open_24_hours)?;
        }
        if let Some(weight) = patch.estimated_weight {
            form.estimated_weight = scheduling::clamp_weight(weight, self.filters.locker_size);
        }
        if let Some(instructions) = patch.special_instructions {
            form.special_instructions = instructions;
        }
        if let Some(use_stored_payment) = patch.use_stored_payment {
            form.use_stored_payment = use_stored_payment;
        }

        self.form = form;
        self.edited();
        Ok(())
    }

    /// Why the current step cannot advance, if it cannot.
    pub fn blocking_reason(&self, today: NaiveDate) -> Option<WizardError> {
        match self.step {
            WizardStep::SelectLocation => self.check_location().err(),
            WizardStep::ScheduleAndConfigure => self.check_configuration(today).err(),
            WizardStep::ReviewAndPay => None,
        }
    }

    pub fn next(&mut self, today: NaiveDate) -> Result<WizardStep, WizardError> {
        if let Some(reason) = self.blocking_reason(today) {
            return Err(reason);
        }
        self.step = self.step.next();
        self.updated_at = Utc::now();
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        self.step = self.step.prev();
        self.updated_at = Utc::now();
        self.step
    }

    pub fn quote(&self) -> Quote {
        pricing::quote(
            self.pricing_model,
            &PriceInputs {
                location: self.selected_location(),
                locker_size: self.filters.locker_size,
                service_type: self.filters.service_type,
                weight_kg: self.form.estimated_weight,
            },
        )
    }

    pub fn checkout(&self) -> CheckoutSummary {
        pricing::checkout_summary(self.quote().total)
    }

    pub fn begin_submit(&mut self, today: NaiveDate) -> Result<BeginSubmit, WizardError> {
        match &self.submission {
            Submission::Pending { .. } => return Err(WizardError::SubmissionInFlight),
            Submission::Confirmed { order } => {
                return Ok(BeginSubmit::AlreadyConfirmed(order.as_ref().clone()));
            }
            Submission::Failed { .. } | Submission::Idle => {}
        }

        if self.step != WizardStep::ReviewAndPay {
            return Err(WizardError::NotReadyToSubmit);
        }
        self.check_configuration(today)?;
        let order = self.build_order()?;
        let idempotency_key = *self.idempotency_key.get_or_insert_with(Uuid::new_v4);

        self.submission = Submission::Pending {
            idempotency_key,
            started_at: Utc::now(),
        };
        self.updated_at = Utc::now();

        Ok(BeginSubmit::Started(SubmissionTicket {
            idempotency_key,
            order,
        }))
    }

    /// Records the backend's answer. Returns false when `idempotency_key` does
    /// not belong to the pending submission, in which case nothing changes.
    pub fn complete_submit(&mut self, idempotency_key: Uuid, result: Result<Order, String>) -> bool {
        let matches_pending = matches!(
            &self.submission,
            Submission::Pending { idempotency_key: pending, .. } if *pending == idempotency_key
        );
        if !matches_pending {
            return false;
        }

        self.submission = match result {
            Ok(order) => Submission::Confirmed {
                order: Box::new(order),
            },
            Err(message) => Submission::Failed {
                idempotency_key,
                message,
            },
        };
        self.updated_at = Utc::now();
        true
    }

    pub fn view(&self, today: NaiveDate, query: Option<&str>, near: Option<GeoPoint>) -> WizardView {
        let blocking = self.blocking_reason(today);

        WizardView {
            id: self.id,
            step: self.step,
            step_number: self.step.number(),
            filters: self.filters.clone(),
            form: self.form.clone(),
            locations: self.directory.visible(&self.filters, query, near),
            locations_error: self.directory.load_error().map(str::to_string),
            locations_fetched_at: self.directory.fetched_at(),
            selected_location: self.selected_location().cloned(),
            time_slots: scheduling::slots_for(self.open_24_hours()).to_vec(),
            dropoff_window: scheduling::dropoff_window(today),
            pickup_window: self.form.dropoff_date.map(scheduling::pickup_window),
            max_weight_kg: scheduling::max_weight_kg(self.filters.locker_size),
            pricing_model: self.pricing_model,
            quote: self.quote(),
            checkout: (self.step == WizardStep::ReviewAndPay).then(|| self.checkout()),
            can_continue: blocking.is_none() && self.step != WizardStep::ReviewAndPay,
            blocking_reason: blocking.map(|reason| reason.to_string()),
            submission: self.submission.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.submission {
            Submission::Pending { .. } => Err(WizardError::SubmissionInFlight),
            Submission::Confirmed { .. } => Err(WizardError::Finalized),
            Submission::Failed { .. } | Submission::Idle => Ok(()),
        }
    }

    /// Records an accepted edit. A failed attempt's message is cleared, its key is not.
    fn edited(&mut self) {
        if matches!(self.submission, Submission::Failed { .. }) {
            self.submission = Submission::Idle;
        }
        self.updated_at = Utc::now();
    }

    fn check_location(&self) -> Result<&LockerLocation, WizardError> {
        self.selected_location().ok_or(WizardError::LocationRequired)
    }

    fn check_configuration(&self, today: NaiveDate) -> Result<(), WizardError> {
        self.check_location()?;
        if self.filters.locker_size.is_none() {
            return Err(WizardError::LockerSizeRequired);
        }
        if !self.form.schedule_complete() {
            return Err(WizardError::ScheduleIncomplete);
        }
        scheduling::validate(&self.form, today)?;
        Ok(())
    }

    fn build_order(&self) -> Result<NewOrder, WizardError> {
        let location = self.check_location()?;
        let size = self.filters.locker_size.ok_or(WizardError::LockerSizeRequired)?;
        let form = &self.form;
        let (Some(dropoff_date), Some(dropoff_time), Some(pickup_date), Some(pickup_time)) = (
            form.dropoff_date,
            form.dropoff_time,
            form.pickup_date,
            form.pickup_time,
        ) else {
            return Err(WizardError::ScheduleIncomplete);
        };

        let quote = self.quote();
        let (base, additional) = match self.filters.service_type {
            ServiceType::WashFold => ("wash_fold", vec![]),
            ServiceType::DryClean => ("dry_clean", vec![]),
            ServiceType::Both => ("wash_fold", vec!["dry_clean".to_string()]),
        };

        Ok(NewOrder {
            location: OrderLocation {
                id: location.id,
                name: location.name.clone(),
                address: location.address.clone(),
            },
            locker: OrderLocker {
                size,
                max_weight: size.max_weight_kg(),
            },
            services: OrderServices {
                base: base.to_string(),
                additional,
            },
            schedule: OrderSchedule {
                dropoff: ScheduleEntry {
                    date: dropoff_date,
                    time_slot: dropoff_time.label().to_string(),
                },
                pickup: ScheduleEntry {
                    date: pickup_date,
                    time_slot: pickup_time.label().to_string(),
                },
            },
            details: OrderDetails {
                weight: form.estimated_weight,
                special_instructions: form.special_instructions.clone(),
            },
            pricing: OrderPricing {
                base_price: quote.base_price,
                total_weight: form.estimated_weight,
                additional_services: quote.additional_services,
                total: pricing::checkout_summary(quote.total).total,
                processing_fee: None,
            },
            use_stored_payment: form.use_stored_payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::engine::filters::tests::location;
    use crate::models::order::OrderStatus;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn day(d: u32) -> Option<Option<NaiveDate>> {
        Some(NaiveDate::from_ymd_opt(2026, 10, d))
    }

    fn wizard(model: PricingModel) -> BookingWizard {
        let directory = LocationDirectory::from_locations(vec![
            location(1, 8, true, &LockerSize::ALL),
            location(2, 0, false, &LockerSize::ALL),
            location(3, 2, false, &[LockerSize::Small, LockerSize::Medium]),
        ]);
        BookingWizard::new(None, directory, model)
    }

    fn filters(size: LockerSize, service_type: ServiceType) -> FiltersPatch {
        FiltersPatch {
            locker_size: Some(Some(size)),
            service_type: Some(service_type),
            ..FiltersPatch::default()
        }
    }

    fn full_schedule() -> FormPatch {
        FormPatch {
            dropoff_date: day(20),
            dropoff_time: Some(Some(TimeSlot::From9)),
            pickup_date: day(22),
            pickup_time: Some(Some(TimeSlot::From17)),
            ..FormPatch::default()
        }
    }

    fn ready_for_review(model: PricingModel) -> BookingWizard {
        let mut wizard = wizard(model);
        wizard.select_location(1).unwrap();
        wizard
            .update_filters(filters(LockerSize::Medium, ServiceType::Both))
            .unwrap();
        wizard.update_form(full_schedule(), today()).unwrap();
        wizard.next(today()).unwrap();
        wizard
    }

    fn created_order(id: u64) -> Order {
        Order {
            id,
            status: OrderStatus::Pending,
            location: None,
            locker: None,
            services: None,
            schedule: None,
            details: None,
            pricing: None,
            created_at: None,
            updated_at: None,
            awb: None,
        }
    }

    #[test]
    fn first_step_requires_a_location() {
        let mut wizard = wizard(PricingModel::WeightBased);
        assert_eq!(wizard.next(today()), Err(WizardError::LocationRequired));
        assert_eq!(wizard.step(), WizardStep::SelectLocation);
    }

    #[test]
    fn selecting_a_location_advances_to_scheduling() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        assert_eq!(wizard.step(), WizardStep::ScheduleAndConfigure);
        assert_eq!(wizard.selected_location().map(|l| l.id), Some(1));
    }

    #[test]
    fn full_location_is_rejected() {
        let mut wizard = wizard(PricingModel::WeightBased);
        assert_eq!(
            wizard.select_location(2),
            Err(WizardError::LocationUnavailable(2))
        );
        assert_eq!(wizard.step(), WizardStep::SelectLocation);
        assert!(wizard.selected_location().is_none());
    }

    #[test]
    fn continue_is_blocked_until_pickup_is_chosen() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        wizard
            .update_filters(filters(LockerSize::Large, ServiceType::WashFold))
            .unwrap();
        wizard
            .update_form(
                FormPatch {
                    dropoff_date: day(20),
                    dropoff_time: Some(Some(TimeSlot::From7)),
                    ..FormPatch::default()
                },
                today(),
            )
            .unwrap();

        let view = wizard.view(today(), None, None);
        assert!(!view.can_continue);
        assert!(view.blocking_reason.is_some());
        assert_eq!(wizard.next(today()), Err(WizardError::ScheduleIncomplete));
        assert_eq!(wizard.step(), WizardStep::ScheduleAndConfigure);
    }

    #[test]
    fn size_is_required_before_review() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        wizard.update_form(full_schedule(), today()).unwrap();

        assert_eq!(wizard.next(today()), Err(WizardError::LockerSizeRequired));

        wizard
            .update_filters(filters(LockerSize::Small, ServiceType::WashFold))
            .unwrap();
        assert_eq!(wizard.next(today()), Ok(WizardStep::ReviewAndPay));
    }

    #[test]
    fn changing_location_clears_size_and_unoffered_slots() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        wizard
            .update_filters(filters(LockerSize::Large, ServiceType::WashFold))
            .unwrap();
        wizard
            .update_form(
                FormPatch {
                    dropoff_date: day(20),
                    dropoff_time: Some(Some(TimeSlot::From23)),
                    ..FormPatch::default()
                },
                today(),
            )
            .unwrap();

        wizard.select_location(3).unwrap();
        assert_eq!(wizard.filters().locker_size, None);
        assert_eq!(wizard.form().dropoff_time, None);
        assert_eq!(wizard.form().dropoff_date, NaiveDate::from_ymd_opt(2026, 10, 20));

        assert_eq!(
            wizard.update_filters(filters(LockerSize::Large, ServiceType::WashFold)),
            Err(WizardError::SizeNotOffered(LockerSize::Large))
        );
    }

    #[test]
    fn shrinking_the_locker_clamps_weight() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        assert_eq!(wizard.form().estimated_weight, 10);

        wizard
            .update_filters(filters(LockerSize::Small, ServiceType::WashFold))
            .unwrap();
        assert_eq!(wizard.form().estimated_weight, 5);

        wizard
            .update_form(
                FormPatch {
                    estimated_weight: Some(14),
                    ..FormPatch::default()
                },
                today(),
            )
            .unwrap();
        assert_eq!(wizard.form().estimated_weight, 5);
    }

    #[test]
    fn rejected_patch_leaves_form_untouched() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(3).unwrap();

        let result = wizard.update_form(
            FormPatch {
                dropoff_date: day(20),
                dropoff_time: Some(Some(TimeSlot::From1)),
                special_instructions: Some("cold wash".to_string()),
                ..FormPatch::default()
            },
            today(),
        );

        assert!(matches!(result, Err(WizardError::Schedule(_))));
        assert_eq!(wizard.form(), &BookingForm::default());
    }

    #[test]
    fn back_keeps_entered_state() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        let form_before = wizard.form().clone();

        assert_eq!(wizard.back(), WizardStep::ScheduleAndConfigure);
        assert_eq!(wizard.back(), WizardStep::SelectLocation);
        assert_eq!(wizard.back(), WizardStep::SelectLocation);

        assert_eq!(wizard.form(), &form_before);
        assert_eq!(wizard.filters().locker_size, Some(LockerSize::Medium));
        assert_eq!(wizard.selected_location().map(|l| l.id), Some(1));
    }

    #[test]
    fn review_step_shows_checkout() {
        let wizard = ready_for_review(PricingModel::SizeTier);
        let view = wizard.view(today(), None, None);

        assert_eq!(view.step_number, 3);
        assert!((view.quote.total - 15.49).abs() < 1e-9);
        let checkout = view.checkout.unwrap();
        assert!((checkout.total - (15.49 + 2.99) * 1.19).abs() < 1e-9);
    }

    #[test]
    fn submit_requires_review_step() {
        let mut wizard = wizard(PricingModel::WeightBased);
        wizard.select_location(1).unwrap();
        assert!(matches!(
            wizard.begin_submit(today()),
            Err(WizardError::NotReadyToSubmit)
        ));
    }

    #[test]
    fn order_payload_carries_every_choice() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        wizard
            .update_form(
                FormPatch {
                    estimated_weight: Some(5),
                    special_instructions: Some("no softener".to_string()),
                    ..FormPatch::default()
                },
                today(),
            )
            .unwrap();

        let BeginSubmit::Started(ticket) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a new submission");
        };
        let order = ticket.order;

        assert_eq!(order.location.id, 1);
        assert_eq!(order.locker.size, LockerSize::Medium);
        assert_eq!(order.locker.max_weight, 10);
        assert_eq!(order.services.base, "wash_fold");
        assert_eq!(order.services.additional, vec!["dry_clean".to_string()]);
        assert_eq!(order.schedule.dropoff.time_slot, "9:00 - 11:00");
        assert_eq!(order.details.weight, 5);
        assert_eq!(order.details.special_instructions, "no softener");
        assert!((order.pricing.base_price - 100.0).abs() < 1e-9);
        assert!((order.pricing.additional_services - 40.0).abs() < 1e-9);
        assert!((order.pricing.total - (140.0 + 2.99) * 1.19).abs() < 1e-9);
    }

    #[test]
    fn duplicate_submit_is_rejected_while_pending() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        assert!(matches!(
            wizard.begin_submit(today()),
            Ok(BeginSubmit::Started(_))
        ));
        assert!(matches!(
            wizard.begin_submit(today()),
            Err(WizardError::SubmissionInFlight)
        ));
        assert_eq!(
            wizard.update_form(FormPatch::default(), today()),
            Err(WizardError::SubmissionInFlight)
        );
    }

    #[test]
    fn failed_submit_is_retried_with_the_same_key() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        let BeginSubmit::Started(first) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a new submission");
        };

        assert!(wizard.complete_submit(first.idempotency_key, Err("backend returned 500".into())));
        assert!(matches!(wizard.submission(), Submission::Failed { .. }));
        assert_eq!(wizard.step(), WizardStep::ReviewAndPay);

        let BeginSubmit::Started(retry) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a retry");
        };
        assert_eq!(retry.idempotency_key, first.idempotency_key);
        assert_eq!(retry.order, first.order);

        assert!(wizard.complete_submit(retry.idempotency_key, Ok(created_order(42))));
        assert!(matches!(
            wizard.begin_submit(today()),
            Ok(BeginSubmit::AlreadyConfirmed(order)) if order.id == 42
        ));
        assert_eq!(wizard.reset_filters(), Err(WizardError::Finalized));
    }

    #[test]
    fn editing_after_failure_keeps_the_key() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        let BeginSubmit::Started(first) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a new submission");
        };
        wizard.complete_submit(first.idempotency_key, Err("timeout".into()));

        wizard
            .update_form(
                FormPatch {
                    estimated_weight: Some(3),
                    ..FormPatch::default()
                },
                today(),
            )
            .unwrap();
        assert_eq!(wizard.submission(), &Submission::Idle);

        let BeginSubmit::Started(second) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a new submission");
        };
        assert_eq!(second.idempotency_key, first.idempotency_key);
        assert_eq!(second.order.details.weight, 3);
    }

    #[test]
    fn rejected_edit_after_failure_keeps_the_failed_attempt() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        let BeginSubmit::Started(first) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a new submission");
        };
        wizard.complete_submit(first.idempotency_key, Err("timeout".into()));

        let rejected = wizard.update_form(
            FormPatch {
                dropoff_date: Some(NaiveDate::from_ymd_opt(2020, 1, 1)),
                ..FormPatch::default()
            },
            today(),
        );
        assert!(matches!(rejected, Err(WizardError::Schedule(_))));
        assert!(matches!(wizard.submission(), Submission::Failed { .. }));

        assert_eq!(wizard.select_location(2), Err(WizardError::LocationUnavailable(2)));
        assert!(matches!(wizard.submission(), Submission::Failed { .. }));

        let BeginSubmit::Started(retry) = wizard.begin_submit(today()).unwrap() else {
            panic!("expected a retry");
        };
        assert_eq!(retry.idempotency_key, first.idempotency_key);
        assert_eq!(retry.order, first.order);
    }

    #[test]
    fn unknown_key_does_not_settle_the_submission() {
        let mut wizard = ready_for_review(PricingModel::WeightBased);
        wizard.begin_submit(today()).unwrap();

        assert!(!wizard.complete_submit(Uuid::new_v4(), Ok(created_order(7))));
        assert!(matches!(wizard.submission(), Submission::Pending { .. }));
    }
}
