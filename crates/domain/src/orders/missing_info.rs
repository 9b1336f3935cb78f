use serde::{Deserialize, Serialize};

use crate::vocabulary::closed_vocabulary;

closed_vocabulary! {
    /// Reason an order is suspended.
    pub enum MissingStatus as "missing status" {
        MissingInfo => "MISSING_INFO",
        Exception => "EXCEPTION",
        NotCovered => "NOT_COVERED",
        MissingInsurance => "MISSING_INSURANCE",
        InvalidInsurance => "INVALID_INSURANCE",
        InsuranceExpired => "INSURANCE_EXPIRED",
        NoPatient => "NO_PATIENT",
        RefillsDenied => "REFILLS_DENIED",
        PriorAuthDenied => "PRIOR_AUTH_DENIED",
        StepTherapyDenied => "STEP_THERAPY_DENIED",
        NewRxDenied => "NEW_RX_DENIED",
        PaymentError => "PAYMENT_ERROR",
        CopayIncreased => "COPAY_INCREASED",
        CopayDecreased => "COPAY_DECREASED",
        OriginalCopayNotAvailable => "ORIGINAL_COPAY_NOTAVAILABLE",
        InvalidOpNoPatient => "INVALID_OP_NO_PATIENT",
        InvalidOpNoTransferableRx => "INVALID_OP_NO_TRANSFERABLE_RX",
        OpRefusal => "OP_REFUSAL",
        C2Drugs => "C2_DRUGS",
        InsuranceOverride => "INSURANCE_OVERRIDE",
        DeliveryFailed => "DELIVERY_FAILED",
        DeliveryReturned => "DELIVERY_RETURNED",
        StockException => "STOCK_EXCEPTION",
    }
}

impl MissingStatus {
    /// Exceptions cleared once the patient supplies insurance.
    pub fn is_insurance_problem(&self) -> bool {
        matches!(
            self,
            Self::MissingInsurance
                | Self::InvalidInsurance
                | Self::InsuranceExpired
                | Self::NotCovered
        )
    }

    /// Exceptions cleared once payment is approved.
    pub fn is_payment_problem(&self) -> bool {
        matches!(
            self,
            Self::PaymentError
                | Self::CopayIncreased
                | Self::CopayDecreased
                | Self::OriginalCopayNotAvailable
        )
    }
}

closed_vocabulary! {
    pub enum MissingField as "missing field" {
        Insurance => "INSURANCE",
        DateOfBirth => "DOB",
        DeliveryAddress => "ADDRESS",
        Payment => "PAYMENT",
        Doctor => "DOCTOR",
        Mrn => "MRN",
        ContactPhone => "CONTACT_PHONE",
        Other => "OTHER",
    }
}

closed_vocabulary! {
    pub enum InsuranceExceptionType as "insurance exception type" {
        InvalidCardHolderId => "INVALID_CARD_HOLDER_ID",
        InvalidGroup => "INVALID_GROUP",
        InvalidDob => "INVALID_DOB",
        InvalidGenderCode => "INVALID_GENDER_CODE",
        InvalidPersonCode => "INVALID_PERSON_CODE",
        PriorAuthRequired => "PRIOR_AUTH_REQUIRED",
        StepTherapyRequired => "STEP_THERAPY_REQUIRED",
        NonFormularyMed => "NON_FORMULARY_MED",
        PlanLimitationsExceeded => "PLAN_LIMITATIONS_EXCEEDED",
        CoverageTerminated => "COVERAGE_TERMINATED",
        MedicarePartBRequired => "MEDICARE_PART_B_REQUIRED",
        SubmitToOtherProcessor => "SUBMIT_TO_OTHER_PROCESSOR",
        PharmacyNotContracted => "PHARMACY_NOT_CONTRACTED",
        NonPreferredPharmacy => "NON_PREFERRED_PHARMACY",
        MustUseMailOrder => "MUST_USE_MAIL_ORDER",
        MdNotInNetwork => "MD_NOT_IN_NETWORK",
        MissingInsurance => "MISSING_INSURANCE",
        InvalidInsurance => "INVALID_INSURANCE",
    }
}

closed_vocabulary! {
    pub enum RefillDeniedType as "refill denied type" {
        NeedOfficeVisit => "NEED_OFFICE_VISIT",
        NoLongerTakingMeds => "NO_LONGER_TAKING_MEDS",
        PatientNotOnFile => "PATIENT_NOT_ON_FILE",
        NoResponseFromMd => "NO_RESPONSE_FROM_MD",
        Other => "OTHER",
    }
}

/// The single exception slot of an order. Only the latest exception is kept.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MissingInfoState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<MissingField>,
    pub missing_status: MissingStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub insurance_exception_type: Option<InsuranceExceptionType>,
    #[serde(default)]
    pub refill_denied_type: Option<RefillDeniedType>,
}

impl MissingInfoState {
    pub fn new(missing_status: MissingStatus) -> Self {
        Self {
            missing_fields: Vec::new(),
            missing_status,
            comment: String::new(),
            insurance_exception_type: None,
            refill_denied_type: None,
        }
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = MissingField>) -> Self {
        self.missing_fields.extend(fields);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_insurance_exception(mut self, exception: InsuranceExceptionType) -> Self {
        self.insurance_exception_type = Some(exception);
        self
    }

    pub fn with_refill_denied(mut self, denied: RefillDeniedType) -> Self {
        self.refill_denied_type = Some(denied);
        self
    }

    pub fn is(&self, status: MissingStatus) -> bool {
        self.missing_status == status
    }
}
