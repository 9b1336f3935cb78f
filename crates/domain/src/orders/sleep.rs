use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::vocabulary::closed_vocabulary;

closed_vocabulary! {
    /// Why an order is parked until the poller looks at it again.
    pub enum SleepState as "sleep state" {
        /// Waiting on a call to the patient
        CallPatient => "CallPatient",
        /// In scrub and transfer
        ScrubAndRoute => "ScrubAndRoute",
        /// Routed, waiting for the origin pharmacy to act
        ScrubbedAndRouted => "ScrubbedAndRouted",
        /// Fax sent to the MD office
        CheckFax => "CheckFax",
        /// MD office called directly
        CallMD => "CallMD",
        PaymentApproval => "PaymentApproval",
        PaymentApprovalUntilFreeTrialDelivered => "PaymentApprovalUntilFreeTrialDelivered",
        /// Routed, not yet processed
        ProcessOrder => "ProcessOrder",
        TransferFaxFollowUp => "TransferFaxFollowUp",
        DelayedEmailSent => "DelayedEmailSent",
        DelayedCalledCustomer => "DelayedCallCustomer",
        /// Sleeps for a fixed window
        TimedSleep => "TimedSleep",
    }
}

/// Fixed window of a [`SleepState::TimedSleep`] entry.
pub const TIMED_SLEEP_WINDOW_HOURS: i64 = 24;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepStatus {
    pub state: SleepState,
    #[serde(default)]
    pub sleep_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sleep_stop_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reset_needed: bool,
    #[serde(default)]
    pub sleep_reset_count: u32,
}

impl SleepStatus {
    /// Fresh entries need a reset, except timed sleeps whose wake time is fixed.
    pub fn new(
        state: SleepState,
        sleep_start_date: Option<DateTime<Utc>>,
        sleep_stop_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            state,
            sleep_start_date,
            sleep_stop_date,
            reset_needed: state != SleepState::TimedSleep,
            sleep_reset_count: 0,
        }
    }

    /// Whether the poller should pick this entry up at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.reset_needed || self.sleep_stop_date.is_some_and(|stop| stop <= now)
    }
}

/// Per-order sleep entries, at most one per [`SleepState`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct SleepSchedule(Vec<SleepStatus>);

impl SleepSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SleepStatus> {
        self.0.iter()
    }

    pub fn get(&self, state: SleepState) -> Option<&SleepStatus> {
        self.0.iter().find(|status| status.state == state)
    }

    /// Upsert keyed by state. An existing entry keeps its reset count and is
    /// flagged for reset again unless it is a timed sleep.
    pub fn upsert(
        &mut self,
        state: SleepState,
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
    ) {
        match self.0.iter_mut().find(|status| status.state == state) {
            Some(status) => {
                if state != SleepState::TimedSleep {
                    status.reset_needed = true;
                }
                status.sleep_start_date = start;
                status.sleep_stop_date = stop;
            }
            None => self.0.push(SleepStatus::new(state, start, stop)),
        }
    }

    pub fn remove(&mut self, state: SleepState) {
        self.0.retain(|status| status.state != state);
    }

    /// Record that the poller reactivated the entry.
    pub fn acknowledge_reset(&mut self, state: SleepState) -> bool {
        match self.0.iter_mut().find(|status| status.state == state) {
            Some(status) => {
                status.reset_needed = false;
                status.sleep_reset_count += 1;
                true
            }
            None => false,
        }
    }

    pub fn due(&self, now: DateTime<Utc>) -> impl Iterator<Item = &SleepStatus> {
        self.0.iter().filter(move |status| status.is_due(now))
    }
}

/// Stop date of a timed sleep started at `now`.
pub fn timed_sleep_stop(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(TIMED_SLEEP_WINDOW_HOURS)
}
