use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::milestones::{MilestoneKind, MilestoneStatus};
use super::missing_info::{
    InsuranceExceptionType, MissingField, MissingInfoState, MissingStatus, RefillDeniedType,
};
use super::sleep::SleepState;
use super::Command;
use crate::errors::Error;
use crate::order_number::OrderNumber;
use crate::references::Relation;
use crate::vocabulary::{OriginType, PaymentOption};

// Boundary payloads carry raw strings; converting them into commands is where
// the closed vocabularies are enforced.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitializeOrderInput {
    pub order_number: String,
    pub origin_type: String,
}

impl TryFrom<InitializeOrderInput> for Command {
    type Error = Error;

    fn try_from(input: InitializeOrderInput) -> Result<Self, Self::Error> {
        Ok(Command::InitializeOrder {
            id: Ulid::new().to_string(),
            order_number: OrderNumber::parse(&input.order_number)?,
            origin_type: input.origin_type.parse::<OriginType>()?,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetPaymentOptionInput {
    pub payment_option: String,
}

impl TryFrom<SetPaymentOptionInput> for Command {
    type Error = Error;

    fn try_from(input: SetPaymentOptionInput) -> Result<Self, Self::Error> {
        Ok(Command::SetPaymentOption {
            payment_option: input.payment_option.parse::<PaymentOption>()?,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetMilestoneStatusInput {
    pub milestone: String,
    pub status: String,
    pub comment: Option<String>,
}

impl TryFrom<SetMilestoneStatusInput> for Command {
    type Error = Error;

    fn try_from(input: SetMilestoneStatusInput) -> Result<Self, Self::Error> {
        Ok(Command::SetMilestoneStatus {
            milestone: input.milestone.parse::<MilestoneKind>()?,
            status: input.status.parse::<MilestoneStatus>()?,
            comment: input.comment,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetMissingInfoStateInput {
    pub missing_status: String,
}

impl TryFrom<SetMissingInfoStateInput> for Command {
    type Error = Error;

    fn try_from(input: SetMissingInfoStateInput) -> Result<Self, Self::Error> {
        Ok(Command::SetMissingInfoState {
            missing_status: input.missing_status.parse::<MissingStatus>()?,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReportMissingInfoInput {
    pub missing_status: String,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    pub comment: Option<String>,
    pub insurance_exception_type: Option<String>,
    pub refill_denied_type: Option<String>,
}

impl TryFrom<ReportMissingInfoInput> for Command {
    type Error = Error;

    fn try_from(input: ReportMissingInfoInput) -> Result<Self, Self::Error> {
        let fields = input
            .missing_fields
            .iter()
            .map(|field| field.parse::<MissingField>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = MissingInfoState::new(input.missing_status.parse::<MissingStatus>()?)
            .with_fields(fields);
        if let Some(comment) = input.comment {
            state = state.with_comment(comment);
        }
        if let Some(exception) = input.insurance_exception_type {
            state = state.with_insurance_exception(exception.parse::<InsuranceExceptionType>()?);
        }
        if let Some(denied) = input.refill_denied_type {
            state = state.with_refill_denied(denied.parse::<RefillDeniedType>()?);
        }

        Ok(Command::ReportMissingInfo { state })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SleepInput {
    pub state: String,
    pub start_date: Option<DateTime<Utc>>,
    pub stop_date: Option<DateTime<Utc>>,
}

impl TryFrom<SleepInput> for Command {
    type Error = Error;

    fn try_from(input: SleepInput) -> Result<Self, Self::Error> {
        Ok(Command::Sleep {
            state: input.state.parse::<SleepState>()?,
            start_date: input.start_date,
            stop_date: input.stop_date,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SleepStateInput {
    pub state: String,
}

impl SleepStateInput {
    pub fn remove(self) -> Result<Command, Error> {
        Ok(Command::RemoveSleepStatus {
            state: self.state.parse::<SleepState>()?,
        })
    }

    pub fn acknowledge_reset(self) -> Result<Command, Error> {
        Ok(Command::AcknowledgeSleepReset {
            state: self.state.parse::<SleepState>()?,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttachReferenceInput {
    pub relation: String,
    pub reference_id: String,
}

impl TryFrom<AttachReferenceInput> for Command {
    type Error = Error;

    fn try_from(input: AttachReferenceInput) -> Result<Self, Self::Error> {
        Ok(Command::AttachReference {
            relation: input.relation.parse::<Relation>()?,
            reference_id: input.reference_id,
        })
    }
}
