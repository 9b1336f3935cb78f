use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::order_number::OrderNumber;
use crate::references::{Address, Payment, Pharmacy, Relation};
use crate::vocabulary::{FillType, OriginType, PaymentOption};

use super::milestones::{
    DeliveryMilestone, InsuranceMilestone, Milestone, MilestoneKind, MilestoneRegion,
    MilestoneStatus, NewRxMilestone, PaymentMilestone, RefillMilestone, StockCheckMilestone,
    TransferMilestone,
};
use super::missing_info::{MissingInfoState, MissingStatus};
use super::sleep::{timed_sleep_stop, SleepSchedule, SleepState, SleepStatus};
use super::{Command, Event};

/// Order aggregate: independent milestone regions, a sleep schedule and a
/// single suspension overlay.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fill_type: FillType,
    pub payment_option: Option<PaymentOption>,
    pub origin_type: Option<OriginType>,
    pub transfer_all: bool,
    pub should_contact_customer_for_payment_approval: bool,
    pub archived: bool,

    // Regions
    pub transfer_milestone: Option<TransferMilestone>,
    pub new_rx_milestone: Option<NewRxMilestone>,
    pub insurance_milestone: Option<InsuranceMilestone>,
    pub payment_milestone: Option<PaymentMilestone>,
    pub stock_check_milestone: Option<StockCheckMilestone>,
    pub delivery_milestone: Option<DeliveryMilestone>,
    pub refill_milestone: Option<RefillMilestone>,

    #[serde(rename = "sleepStatusList")]
    pub sleep_schedule: SleepSchedule,
    pub missing_info_state: Option<MissingInfoState>,

    pub fax_sent_count: u32,
    #[serde(rename = "calledMDCount")]
    pub called_md_count: u32,
    pub e_script_sent_count: u32,

    // References, hydrated by the resolver
    pub address_ref: Option<String>,
    pub payment_ref: Option<String>,
    pub origin_pharmacy_ref: Option<String>,
    pub partner_pharmacy_ref: Option<String>,
    #[serde(skip)]
    pub address: Option<Address>,
    #[serde(skip)]
    pub payment: Option<Payment>,
    #[serde(skip)]
    pub origin_pharmacy: Option<Pharmacy>,
    #[serde(skip)]
    pub partner_pharmacy: Option<Pharmacy>,
}

pub const AGGREGATE_TYPE: &str = "Order";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for Order {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        _services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match &command {
            Command::InitializeOrder { .. } => self.validate_new()?,
            _ => self.validate_existing()?,
        }

        let now = Utc::now();

        let event = match command {
            Command::InitializeOrder { id, order_number, origin_type } => {
                tracing::info!("Initializing order {} ({}) from {}", order_number, id, origin_type);
                Event::OrderInitialized {
                    id,
                    order_number: order_number.into(),
                    origin_type,
                    created_at: now,
                }
            }

            Command::StartRefill => Event::RefillStarted { updated_at: now },

            Command::SetPaymentOption { payment_option } => Event::PaymentOptionSet {
                payment_option,
                updated_at: now,
            },

            Command::SetMilestoneStatus { milestone, status, comment } => {
                Event::MilestoneStatusSet {
                    milestone,
                    status,
                    comment,
                    updated_at: now,
                }
            }

            Command::MoveToScrubAndRoute => {
                if !self.awaiting_scrub_and_route() {
                    return Ok(vec![]);
                }
                Event::MovedToScrubAndRoute { updated_at: now }
            }

            Command::SavePendingPriorStatus => Event::PendingPriorStatusSaved { updated_at: now },

            Command::PendingActionTaken => Event::PendingActionTaken { updated_at: now },

            Command::SetMissingInfoState { missing_status } => Event::MissingInfoStateSet {
                state: MissingInfoState::new(missing_status),
                updated_at: now,
            },

            Command::ReportMissingInfo { state } => Event::MissingInfoStateSet {
                state,
                updated_at: now,
            },

            Command::InsuranceOverride => {
                if self.insurance_milestone.is_none() {
                    return Ok(vec![]);
                }
                Event::InsuranceOverridden { updated_at: now }
            }

            Command::InsuranceProvided => Event::InsuranceProvided { updated_at: now },

            Command::AuthorizePayment => {
                if !self.awaiting_payment_approval() {
                    return Ok(vec![]);
                }
                Event::PaymentAuthorized { updated_at: now }
            }

            Command::Sleep { state, start_date, stop_date } => {
                let start = start_date.unwrap_or(now);
                let stop = stop_date.or_else(|| {
                    (state == SleepState::TimedSleep).then(|| timed_sleep_stop(now))
                });
                if let Some(stop) = stop_date {
                    if stop < start {
                        return Err(Error::Validation {
                            message: format!("{state} sleep cannot stop before it starts"),
                        });
                    }
                }
                Event::SleepScheduled {
                    state,
                    start_date: Some(start),
                    stop_date: stop,
                    updated_at: now,
                }
            }

            Command::TimedSleep { wakeup_at } => Event::SleepScheduled {
                state: SleepState::TimedSleep,
                start_date: Some(wakeup_at),
                stop_date: Some(timed_sleep_stop(now)),
                updated_at: now,
            },

            Command::RemoveSleepStatus { state } => {
                if self.sleep_status(state).is_none() {
                    return Ok(vec![]);
                }
                Event::SleepStatusRemoved { state, updated_at: now }
            }

            Command::AcknowledgeSleepReset { state } => {
                if self.sleep_status(state).is_none() {
                    return Err(Error::NotFound {
                        entity: format!("{state} sleep status"),
                    });
                }
                Event::SleepResetAcknowledged { state, updated_at: now }
            }

            Command::AttachReference { relation, reference_id } => {
                if !relation.is_order_relation() {
                    return Err(Error::Validation {
                        message: format!("an order has no {relation} reference"),
                    });
                }
                if reference_id.trim().is_empty() {
                    return Err(Error::Validation {
                        message: format!("{relation} reference cannot be empty"),
                    });
                }
                Event::ReferenceAttached {
                    relation,
                    reference_id,
                    updated_at: now,
                }
            }

            Command::RecordFaxSent => Event::FaxSentRecorded { updated_at: now },

            Command::RecordMdCalled => Event::MdCalledRecorded { updated_at: now },

            Command::RecordEScriptSent => Event::EScriptSentRecorded { updated_at: now },

            Command::Archive => Event::OrderArchived { updated_at: now },
        };

        Ok(vec![event])
    }

    fn apply(&mut self, event: Self::Event) {
        let at = event.updated_at();

        match event {
            Event::OrderInitialized { id, order_number, origin_type, created_at } => {
                *self = Order::initialize(id, order_number, origin_type, created_at);
            }

            Event::RefillStarted { updated_at } => self.start_refill(updated_at),

            Event::PaymentOptionSet { payment_option, .. } => {
                self.payment_option = Some(payment_option);
            }

            Event::MilestoneStatusSet { milestone, status, comment, updated_at } => {
                let region = self.set_milestone_status(milestone, status, updated_at);
                if let Some(comment) = comment {
                    region.comment = comment;
                }
            }

            Event::MovedToScrubAndRoute { updated_at } => self.move_to_scrub_and_route(updated_at),

            Event::PendingPriorStatusSaved { .. } => self.save_pending_prior_status(),

            Event::PendingActionTaken { updated_at } => self.pending_action_taken(updated_at),

            Event::MissingInfoStateSet { state, .. } => self.report_missing_info(state),

            Event::InsuranceOverridden { .. } => self.insurance_override(),

            Event::InsuranceProvided { .. } => self.insurance_provided(),

            Event::PaymentAuthorized { updated_at } => {
                self.authorize_payment(updated_at);
            }

            Event::SleepScheduled { state, start_date, stop_date, .. } => {
                self.update_sleep_state_with_start_and_stop_date(state, start_date, stop_date);
            }

            Event::SleepStatusRemoved { state, .. } => self.remove_sleep_status(state),

            Event::SleepResetAcknowledged { state, .. } => {
                self.sleep_schedule.acknowledge_reset(state);
            }

            Event::ReferenceAttached { relation, reference_id, .. } => {
                self.attach_reference(relation, reference_id);
            }

            Event::FaxSentRecorded { .. } => self.fax_sent_count += 1,

            Event::MdCalledRecorded { .. } => self.called_md_count += 1,

            Event::EScriptSentRecorded { .. } => self.e_script_sent_count += 1,

            Event::OrderArchived { .. } => self.archived = true,
        }

        self.updated_at = at;
    }
}

impl Order {
    /// New first-fill order. A transfer seeds the transfer region, any other
    /// origin the new-prescription region; both start past the welcome call.
    pub fn initialize(
        id: impl Into<String>,
        order_number: impl Into<String>,
        origin_type: OriginType,
        at: DateTime<Utc>,
    ) -> Self {
        let mut order = Order {
            id: id.into(),
            order_number: order_number.into(),
            created_at: at,
            updated_at: at,
            fill_type: FillType::FirstFill,
            origin_type: Some(origin_type),
            ..Default::default()
        };

        if origin_type == OriginType::Transfer {
            order.transfer_milestone = Some(TransferMilestone {
                milestone: Milestone::new(MilestoneStatus::CallCompleted),
                days_of_supply: 30,
                ..Default::default()
            });
            order.transfer_all = true;
        } else {
            order.new_rx_milestone = Some(NewRxMilestone {
                milestone: Milestone::new(MilestoneStatus::CallCompleted),
                medication_quantity: 30,
                ..Default::default()
            });
        }

        order.initialize_milestones();
        order
    }

    /// Same as [`Order::initialize`] for a validated order number.
    pub fn initialize_order(
        id: impl Into<String>,
        order_number: &OrderNumber,
        origin_type: OriginType,
        at: DateTime<Utc>,
    ) -> Self {
        Self::initialize(id, order_number.as_str(), origin_type, at)
    }

    /// Seed the processing regions at `NOT_INITIATED`.
    pub fn initialize_milestones(&mut self) {
        self.insurance_milestone = Some(InsuranceMilestone {
            send_copay_confirm_email: true,
            ..Default::default()
        });
        self.payment_milestone = Some(PaymentMilestone::default());
        self.stock_check_milestone = Some(StockCheckMilestone::default());
        self.delivery_milestone = Some(DeliveryMilestone::default());
    }

    pub fn start_refill(&mut self, at: DateTime<Utc>) {
        self.fill_type = FillType::ReFill;
        self.initialize_milestones();
        self.refill_milestone = Some(RefillMilestone::default());
        self.updated_at = at;
    }

    pub fn milestone(&self, kind: MilestoneKind) -> Option<&Milestone> {
        match kind {
            MilestoneKind::Transfer => self.transfer_milestone.as_ref().map(|r| r.milestone()),
            MilestoneKind::NewRx => self.new_rx_milestone.as_ref().map(|r| r.milestone()),
            MilestoneKind::Insurance => self.insurance_milestone.as_ref().map(|r| r.milestone()),
            MilestoneKind::Payment => self.payment_milestone.as_ref().map(|r| r.milestone()),
            MilestoneKind::Delivery => self.delivery_milestone.as_ref().map(|r| r.milestone()),
            MilestoneKind::StockCheck => {
                self.stock_check_milestone.as_ref().map(|r| r.milestone())
            }
            MilestoneKind::RefillAuth => self.refill_milestone.as_ref().map(|r| r.milestone()),
        }
    }

    /// Status of a region, `None` when the region does not exist.
    pub fn milestone_status(&self, kind: MilestoneKind) -> Option<MilestoneStatus> {
        self.milestone(kind).map(|milestone| milestone.status)
    }

    /// Set a region's status, creating the region when absent.
    pub fn set_milestone_status(
        &mut self,
        kind: MilestoneKind,
        status: MilestoneStatus,
        at: DateTime<Utc>,
    ) -> &mut Milestone {
        let milestone = match kind {
            MilestoneKind::Transfer => region_mut(&mut self.transfer_milestone),
            MilestoneKind::NewRx => region_mut(&mut self.new_rx_milestone),
            MilestoneKind::Insurance => region_mut(&mut self.insurance_milestone),
            MilestoneKind::Payment => region_mut(&mut self.payment_milestone),
            MilestoneKind::Delivery => region_mut(&mut self.delivery_milestone),
            MilestoneKind::StockCheck => region_mut(&mut self.stock_check_milestone),
            MilestoneKind::RefillAuth => region_mut(&mut self.refill_milestone),
        };
        milestone.set_status(status, at);
        milestone
    }

    /// Advance a not-yet-initiated transfer or new prescription to
    /// `CALL_COMPLETED`. Regions already past that point are left alone.
    pub fn move_to_scrub_and_route(&mut self, at: DateTime<Utc>) {
        if let Some(transfer) = self.transfer_milestone.as_mut() {
            if transfer.milestone.is(MilestoneStatus::NotInitiated) {
                transfer.set_status(MilestoneStatus::CallCompleted, at);
            }
        }
        if let Some(new_rx) = self.new_rx_milestone.as_mut() {
            if new_rx.milestone.is(MilestoneStatus::NotInitiated) {
                new_rx.set_status(MilestoneStatus::CallCompleted, at);
            }
        }
    }

    /// Force the intake region to `PENDING_ACTION_TAKEN`, lift the overlay
    /// and stop waiting on the patient call.
    pub fn pending_action_taken(&mut self, at: DateTime<Utc>) {
        if let Some(transfer) = self.transfer_milestone.as_mut() {
            transfer.set_status(MilestoneStatus::PendingActionTaken, at);
        }
        if let Some(new_rx) = self.new_rx_milestone.as_mut() {
            new_rx.set_status(MilestoneStatus::PendingActionTaken, at);
        }

        self.missing_info_state = None;
        self.remove_sleep_status(SleepState::CallPatient);
    }

    /// Snapshot the intake status before it is forced to pending. A region
    /// already pending keeps its earlier snapshot.
    pub fn save_pending_prior_status(&mut self) {
        if let Some(transfer) = self.transfer_milestone.as_mut() {
            if !transfer.milestone.is(MilestoneStatus::PendingActionTaken) {
                transfer.pending_prior_status = Some(transfer.milestone.status);
            }
        }
        if let Some(new_rx) = self.new_rx_milestone.as_mut() {
            if !new_rx.milestone.is(MilestoneStatus::PendingActionTaken) {
                new_rx.pending_prior_status = Some(new_rx.milestone.status);
            }
        }
    }

    /// Replace the overlay with one carrying only `status`.
    pub fn set_missing_info_state(&mut self, status: MissingStatus) {
        self.missing_info_state = Some(MissingInfoState::new(status));
    }

    pub fn report_missing_info(&mut self, state: MissingInfoState) {
        self.missing_info_state = Some(state);
    }

    /// Lift the overlay when its status matches. Returns whether it was lifted.
    pub fn clear_missing_info_if(&mut self, matches: impl Fn(MissingStatus) -> bool) -> bool {
        match &self.missing_info_state {
            Some(state) if matches(state.missing_status) => {
                self.missing_info_state = None;
                true
            }
            _ => false,
        }
    }

    pub fn insurance_override(&mut self) {
        if let Some(insurance) = self.insurance_milestone.as_mut() {
            insurance.milestone.status = MilestoneStatus::InsuranceOverride;
            insurance.send_to_partner_pharmacy = false;
        }
    }

    pub fn insurance_provided(&mut self) {
        self.clear_missing_info_if(|status| status.is_insurance_problem());
    }

    /// Approve a pending payment, regardless of the overlay. Lifts a payment
    /// exception and drops the payment-approval sleeps.
    pub fn authorize_payment(&mut self, at: DateTime<Utc>) -> bool {
        if !self.awaiting_payment_approval() {
            return false;
        }
        if let Some(payment) = self.payment_milestone.as_mut() {
            payment.set_status(MilestoneStatus::PaymentAuthorized, at);
        }
        self.clear_missing_info_if(|status| status.is_payment_problem());
        self.remove_sleep_status(SleepState::PaymentApproval);
        self.remove_sleep_status(SleepState::PaymentApprovalUntilFreeTrialDelivered);
        true
    }

    pub fn update_sleep_state(&mut self, state: SleepState, now: DateTime<Utc>) {
        self.update_sleep_state_with_start_date(state, now, now);
    }

    /// A timed sleep stops one day after `now`, whatever the start date.
    pub fn update_sleep_state_with_start_date(
        &mut self,
        state: SleepState,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) {
        let stop = (state == SleepState::TimedSleep).then(|| timed_sleep_stop(now));
        self.update_sleep_state_with_start_and_stop_date(state, Some(start), stop);
    }

    // TODO: honour `wakeup_at` as the stop date once product confirms which
    // window is authoritative; today the stop is always now + 24h.
    pub fn update_timed_sleep_state(&mut self, wakeup_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.update_sleep_state_with_start_date(SleepState::TimedSleep, wakeup_at, now);
    }

    pub fn update_sleep_state_with_start_and_stop_date(
        &mut self,
        state: SleepState,
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
    ) {
        self.sleep_schedule.upsert(state, start, stop);
    }

    pub fn remove_sleep_status(&mut self, state: SleepState) {
        self.sleep_schedule.remove(state);
    }

    pub fn sleep_status(&self, state: SleepState) -> Option<&SleepStatus> {
        self.sleep_schedule.get(state)
    }

    pub fn reference(&self, relation: Relation) -> Option<&str> {
        match relation {
            Relation::Address => self.address_ref.as_deref(),
            Relation::Payment => self.payment_ref.as_deref(),
            Relation::OriginPharmacy => self.origin_pharmacy_ref.as_deref(),
            Relation::PartnerPharmacy => self.partner_pharmacy_ref.as_deref(),
            Relation::CurrentOrder | Relation::Insurance => None,
        }
    }

    /// Record a reference and drop any stale hydrated copy. A new payment
    /// method lifts a payment-error overlay.
    pub fn attach_reference(&mut self, relation: Relation, reference_id: String) {
        match relation {
            Relation::Address => {
                self.address_ref = Some(reference_id);
                self.address = None;
            }
            Relation::Payment => {
                self.payment_ref = Some(reference_id);
                self.payment = None;
                self.clear_missing_info_if(|status| status == MissingStatus::PaymentError);
            }
            Relation::OriginPharmacy => {
                self.origin_pharmacy_ref = Some(reference_id);
                self.origin_pharmacy = None;
            }
            Relation::PartnerPharmacy => {
                self.partner_pharmacy_ref = Some(reference_id);
                self.partner_pharmacy = None;
            }
            Relation::CurrentOrder | Relation::Insurance => {}
        }
    }

    fn awaiting_scrub_and_route(&self) -> bool {
        self.milestone_status(MilestoneKind::Transfer) == Some(MilestoneStatus::NotInitiated)
            || self.milestone_status(MilestoneKind::NewRx) == Some(MilestoneStatus::NotInitiated)
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness { field: "id".to_string() });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound { entity: AGGREGATE_TYPE.to_string() });
        }
        if self.archived {
            return Err(Error::Forbidden);
        }
        Ok(())
    }
}

fn region_mut<R: MilestoneRegion + Default>(slot: &mut Option<R>) -> &mut Milestone {
    slot.get_or_insert_with(Default::default).milestone_mut()
}
