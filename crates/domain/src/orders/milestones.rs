use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vocabulary::{closed_vocabulary, DrugType, PaymentProvider, YesNo};

closed_vocabulary! {
    /// Status shared by every milestone region. Only a subset is meaningful
    /// for any one region, but any region may hold any value.
    pub enum MilestoneStatus as "milestone status" {
        /// Milestone hasn't been initiated or processed yet
        NotInitiated => "NOT_INITIATED",
        CallCompleted => "CALL_COMPLETED",
        Completed => "COMPLETED",
        TransferInitiated => "TRANSFER_INITIATED",
        TransferRequested => "TRANSFER_REQUEST_SENT",
        ZeroRefills => "ZERO_REFILLS",
        EScriptRequestSent => "ESCRIPT_REQUEST_SENT",
        TransferBack => "TRANSFER_BACK",
        TransferOut => "TRANSFER_OUT",
        VerificationInitiated => "VERIFICATION_INITIATED",
        TransferBackCompleted => "TRANSFER_BACK_COMPLETED",
        TransferOutCompleted => "TRANSFER_OUT_COMPLETED",
        RefillNotDue => "REFILL_NOT_DUE",
        SendNewRxFax => "SEND_NEW_RX_FAX",
        TransferControlled => "TRANSFER_CONTROLLED",
        RouteControlled => "ROUTE_CONTROLLED",
        ReverseInsurance => "REVERSE_INSURANCE",
        InsuranceReversed => "INSURANCE_REVERSED",
        PendingApproval => "PENDING_APPROVAL",
        PaymentAuthorized => "PAYMENT_AUTHORIZED",
        FaxSent => "FAX_SENT",
        PriorAuth => "PRIOR_AUTH",
        PriorAuthProcessing => "PRIOR_AUTH_PROCESSING",
        Shipped => "SHIPPED",
        WaitingLabelScan => "WAITING_LABEL_SCAN",
        ShippingLabelGenerated => "SHIPPING_LABEL_GENERATED",
        GenerateShippingLabel => "GENERATE_SHIPPING_LABEL",
        PendingActionTaken => "PENDING_ACTION_TAKEN",
        CashPriceCheck => "CASH_PRICE_CHECK",
        CashPriceIdentified => "CASH_PRICE_IDENTIFIED",
        PendingApprovalUntilFreeTrial => "PENDING_APPROVAL_UNTIL_FREE_TRIAL",
        PendingApprovalUntilPriceInspection => "PENDING_APPROVAL_UNTIL_PRICE_INSPECTION",
        PendingApprovalUntilPriceInspectionByPartner => "PENDING_APPROVAL_UNTIL_PRICE_INSPECTION_BY_PP",
        PendingApprovalUntilPriceInspectionNoFreeTrial => "PENDING_APPROVAL_UNTIL_PRICE_INSPECTION_NO_FREE_TRIAL",
        PendingApprovalUntilPriceInspectionFreeTrial => "PENDING_APPROVAL_UNTIL_PRICE_INSPECTION_FREE_TRIAL",
        PendingApprovalAfterPriceInspection => "PENDING_APPROVAL_AFTER_PRICE_INSPECTION",
        PendingApprovalAndSignup => "PENDING_APPROVAL_AND_SIGNUP",
        PendingPaymentOffline => "PENDING_APPROVAL_OFFLINE",
        PaymentCompleteInvoicePending => "PAYMENT_COMPLETE_INVOICE_PENDING",
        PaymentIncompleteInvoicePending => "PAYMENT_INCOMPLETE_INVOICE_PENDING",
        PaymentIncompleteOffline => "PAYMENT_INCOMPLETE_OFFLINE",
        InsuranceOverride => "INSURANCE_OVERRIDE",
        InTransit => "IN_TRANSIT",
        Delivered => "DELIVERED",
    }
}

impl Default for MilestoneStatus {
    fn default() -> Self {
        Self::NotInitiated
    }
}

closed_vocabulary! {
    /// The seven fulfillment regions, spelled as the order's region fields.
    pub enum MilestoneKind as "milestone" {
        Transfer => "transferMilestone",
        NewRx => "newRxMilestone",
        Insurance => "insuranceMilestone",
        Payment => "paymentMilestone",
        Delivery => "deliveryMilestone",
        StockCheck => "stockCheckMilestone",
        RefillAuth => "refillMilestone",
    }
}

/// Known keys of the milestone parameter bag.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_authorization_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fill_date: Option<DateTime<Utc>>,
}

/// Progress record embedded in every region.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub status: MilestoneStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub parameters: MilestoneParameters,
    #[serde(default)]
    pub last_processed_date: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn new(status: MilestoneStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Any status may follow any other; only the vocabulary is closed.
    pub fn set_status(&mut self, status: MilestoneStatus, at: DateTime<Utc>) {
        self.status = status;
        self.last_processed_date = Some(at);
    }

    pub fn is(&self, status: MilestoneStatus) -> bool {
        self.status == status
    }
}

/// A typed region wrapping the shared [`Milestone`].
pub trait MilestoneRegion {
    const KIND: MilestoneKind;

    fn milestone(&self) -> &Milestone;

    fn milestone_mut(&mut self) -> &mut Milestone;

    fn status(&self) -> MilestoneStatus {
        self.milestone().status
    }

    fn set_status(&mut self, status: MilestoneStatus, at: DateTime<Utc>) {
        self.milestone_mut().set_status(status, at);
    }
}

macro_rules! region {
    ($region:ty, $kind:expr) => {
        impl MilestoneRegion for $region {
            const KIND: MilestoneKind = $kind;

            fn milestone(&self) -> &Milestone {
                &self.milestone
            }

            fn milestone_mut(&mut self) -> &mut Milestone {
                &mut self.milestone
            }
        }
    };
}

/// Contact details of the prescribing doctor as captured during a stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorContact {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_phone_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_fax_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_npi: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doctor_city: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medication_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medication_strength: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medication_form: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sig: String,
    #[serde(default)]
    pub medication_quantity: u32,
    #[serde(default)]
    pub days_of_supply: u32,
    #[serde(default)]
    pub number_of_refills_transferred: u32,
    #[serde(flatten)]
    pub doctor: DoctorContact,
    #[serde(default)]
    pub drug_type: Option<DrugType>,
    #[serde(default)]
    pub last_fill_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_copay: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fax_queue_id: String,
    #[serde(default)]
    pub refill_requested_date: Option<DateTime<Utc>>,
    /// Status held before the region was forced to `PENDING_ACTION_TAKEN`.
    #[serde(default)]
    pub pending_prior_status: Option<MilestoneStatus>,
    #[serde(default)]
    pub md_approved_over_phone: bool,
    #[serde(default)]
    pub op_sent_fax: bool,
}

region!(TransferMilestone, MilestoneKind::Transfer);

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRxMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medication_name: String,
    #[serde(default)]
    pub medication_quantity: u32,
    #[serde(default)]
    pub days_of_supply: u32,
    #[serde(default)]
    pub refills_remaining: u32,
    #[serde(flatten)]
    pub doctor: DoctorContact,
    #[serde(default)]
    pub drug_type: Option<DrugType>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fax_queue_id: String,
    #[serde(default)]
    pub pending_prior_status: Option<MilestoneStatus>,
    #[serde(default)]
    pub needs_md_approval: bool,
}

region!(NewRxMilestone, MilestoneKind::NewRx);

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default)]
    pub can_refill: Option<YesNo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_rx_number: String,
    #[serde(default)]
    pub is_federal_sponsored_insurance: Option<YesNo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_copay: String,
    #[serde(default)]
    pub earliest_refill_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub insurance_run_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refill_not_due_count: u32,
    #[serde(default)]
    pub refill_window: u32,
    #[serde(flatten)]
    pub doctor: DoctorContact,
    #[serde(default)]
    pub send_copay_confirm_email: bool,
    #[serde(default)]
    pub high_copay: bool,
    #[serde(default)]
    pub copay_changed: bool,
    #[serde(default)]
    pub step_therapy_required: bool,
    /// Route the fill to the partner pharmacy.
    #[serde(default, rename = "sendToPP")]
    pub send_to_partner_pharmacy: bool,
}

region!(InsuranceMilestone, MilestoneKind::Insurance);

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payment_error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_code: String,
    #[serde(default)]
    pub charge_attempt: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub applied_promo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transaction_id: String,
    #[serde(default)]
    pub payment_provider_used: Option<PaymentProvider>,
    #[serde(default)]
    pub applied_dummy_charge: bool,
    #[serde(default)]
    pub applied_free_trial_charge: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub medication_price: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delivery_charge: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub final_charge: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub applied_promo_discount: String,
    #[serde(default)]
    pub payment_processed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_reminder_count: u32,
}

region!(PaymentMilestone, MilestoneKind::Payment);

impl PaymentMilestone {
    /// A discount string of zero in any spelling counts as not applied.
    pub fn is_promo_discount_applied(&self) -> bool {
        !matches!(self.applied_promo_discount.as_str(), "" | "0" | "0.0" | "0.00")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default)]
    pub stock_availability: Option<DateTime<Utc>>,
}

region!(StockCheckMilestone, MilestoneKind::StockCheck);

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tracking_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipping_label_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shipping_service_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub carrier_type: String,
    #[serde(default)]
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shipped_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivery_confirmed: bool,
    #[serde(default)]
    pub same_day_delivery: bool,
    /// Status reported by the carrier, independent of the region status.
    #[serde(default, rename = "deliveryStatus")]
    pub carrier_status: Option<MilestoneStatus>,
}

region!(DeliveryMilestone, MilestoneKind::Delivery);

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefillMilestone {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rx_name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub days_of_supply: u32,
    #[serde(default)]
    pub authorized_refills: u32,
    #[serde(flatten)]
    pub doctor: DoctorContact,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fax_queue_id: String,
    #[serde(default)]
    pub refill_requested_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub md_approved_over_phone: bool,
}

region!(RefillMilestone, MilestoneKind::RefillAuth);
