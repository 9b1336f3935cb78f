use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use super::milestones::{MilestoneKind, MilestoneStatus};
use super::missing_info::MissingInfoState;
use super::sleep::SleepState;
use crate::references::Relation;
use crate::vocabulary::{OriginType, PaymentOption};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    OrderInitialized {
        id: String,
        order_number: String,
        origin_type: OriginType,
        created_at: DateTime<Utc>,
    },

    RefillStarted {
        updated_at: DateTime<Utc>,
    },

    PaymentOptionSet {
        payment_option: PaymentOption,
        updated_at: DateTime<Utc>,
    },

    MilestoneStatusSet {
        milestone: MilestoneKind,
        status: MilestoneStatus,
        comment: Option<String>,
        updated_at: DateTime<Utc>,
    },

    MovedToScrubAndRoute {
        updated_at: DateTime<Utc>,
    },

    PendingPriorStatusSaved {
        updated_at: DateTime<Utc>,
    },

    PendingActionTaken {
        updated_at: DateTime<Utc>,
    },

    MissingInfoStateSet {
        state: MissingInfoState,
        updated_at: DateTime<Utc>,
    },

    InsuranceOverridden {
        updated_at: DateTime<Utc>,
    },

    InsuranceProvided {
        updated_at: DateTime<Utc>,
    },

    PaymentAuthorized {
        updated_at: DateTime<Utc>,
    },

    SleepScheduled {
        state: SleepState,
        start_date: Option<DateTime<Utc>>,
        stop_date: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    },

    SleepStatusRemoved {
        state: SleepState,
        updated_at: DateTime<Utc>,
    },

    SleepResetAcknowledged {
        state: SleepState,
        updated_at: DateTime<Utc>,
    },

    ReferenceAttached {
        relation: Relation,
        reference_id: String,
        updated_at: DateTime<Utc>,
    },

    FaxSentRecorded {
        updated_at: DateTime<Utc>,
    },

    MdCalledRecorded {
        updated_at: DateTime<Utc>,
    },

    EScriptSentRecorded {
        updated_at: DateTime<Utc>,
    },

    OrderArchived {
        updated_at: DateTime<Utc>,
    },
}

impl Event {
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Event::OrderInitialized { created_at, .. } => *created_at,
            Event::RefillStarted { updated_at }
            | Event::PaymentOptionSet { updated_at, .. }
            | Event::MilestoneStatusSet { updated_at, .. }
            | Event::MovedToScrubAndRoute { updated_at }
            | Event::PendingPriorStatusSaved { updated_at }
            | Event::PendingActionTaken { updated_at }
            | Event::MissingInfoStateSet { updated_at, .. }
            | Event::InsuranceOverridden { updated_at }
            | Event::InsuranceProvided { updated_at }
            | Event::PaymentAuthorized { updated_at }
            | Event::SleepScheduled { updated_at, .. }
            | Event::SleepStatusRemoved { updated_at, .. }
            | Event::SleepResetAcknowledged { updated_at, .. }
            | Event::ReferenceAttached { updated_at, .. }
            | Event::FaxSentRecorded { updated_at }
            | Event::MdCalledRecorded { updated_at }
            | Event::EScriptSentRecorded { updated_at }
            | Event::OrderArchived { updated_at } => *updated_at,
        }
    }
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::OrderInitialized { .. } => "Order:Initialized".to_string(),
            Event::RefillStarted { .. } => "Order:RefillStarted".to_string(),
            Event::PaymentOptionSet { .. } => "Order:PaymentOptionSet".to_string(),
            Event::MilestoneStatusSet { .. } => "Order:MilestoneStatusSet".to_string(),
            Event::MovedToScrubAndRoute { .. } => "Order:MovedToScrubAndRoute".to_string(),
            Event::PendingPriorStatusSaved { .. } => "Order:PendingPriorStatusSaved".to_string(),
            Event::PendingActionTaken { .. } => "Order:PendingActionTaken".to_string(),
            Event::MissingInfoStateSet { .. } => "Order:MissingInfoStateSet".to_string(),
            Event::InsuranceOverridden { .. } => "Order:InsuranceOverridden".to_string(),
            Event::InsuranceProvided { .. } => "Order:InsuranceProvided".to_string(),
            Event::PaymentAuthorized { .. } => "Order:PaymentAuthorized".to_string(),
            Event::SleepScheduled { .. } => "Order:SleepScheduled".to_string(),
            Event::SleepStatusRemoved { .. } => "Order:SleepStatusRemoved".to_string(),
            Event::SleepResetAcknowledged { .. } => "Order:SleepResetAcknowledged".to_string(),
            Event::ReferenceAttached { .. } => "Order:ReferenceAttached".to_string(),
            Event::FaxSentRecorded { .. } => "Order:FaxSentRecorded".to_string(),
            Event::MdCalledRecorded { .. } => "Order:MdCalledRecorded".to_string(),
            Event::EScriptSentRecorded { .. } => "Order:EScriptSentRecorded".to_string(),
            Event::OrderArchived { .. } => "Order:Archived".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
