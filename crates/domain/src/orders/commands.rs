use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::milestones::{MilestoneKind, MilestoneStatus};
use super::missing_info::{MissingInfoState, MissingStatus};
use super::sleep::SleepState;
use crate::order_number::OrderNumber;
use crate::references::Relation;
use crate::vocabulary::{OriginType, PaymentOption};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum Command {
    /// Create the order and seed its milestones from the origin
    InitializeOrder {
        id: String,
        order_number: OrderNumber,
        origin_type: OriginType,
    },

    /// Reset the processing regions for a refill cycle
    StartRefill,

    SetPaymentOption {
        payment_option: PaymentOption,
    },

    /// Set any region to any status
    SetMilestoneStatus {
        milestone: MilestoneKind,
        status: MilestoneStatus,
        comment: Option<String>,
    },

    MoveToScrubAndRoute,

    SavePendingPriorStatus,

    /// Resolve the current exception and hand the order back to processing
    PendingActionTaken,

    /// Suspend the order with a bare status
    SetMissingInfoState {
        missing_status: MissingStatus,
    },

    /// Suspend the order with a fully detailed exception
    ReportMissingInfo {
        state: MissingInfoState,
    },

    /// Ship without waiting for insurance verification
    InsuranceOverride,

    InsuranceProvided,

    AuthorizePayment,

    /// Start defaults to now; a timed sleep without stop wakes a day later
    Sleep {
        state: SleepState,
        start_date: Option<DateTime<Utc>>,
        stop_date: Option<DateTime<Utc>>,
    },

    TimedSleep {
        wakeup_at: DateTime<Utc>,
    },

    RemoveSleepStatus {
        state: SleepState,
    },

    AcknowledgeSleepReset {
        state: SleepState,
    },

    AttachReference {
        relation: Relation,
        reference_id: String,
    },

    RecordFaxSent,

    RecordMdCalled,

    RecordEScriptSent,

    /// Logical delete
    Archive,
}
