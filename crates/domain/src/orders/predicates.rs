use chrono::{DateTime, Utc};

use crate::vocabulary::{FillType, PaymentOption};

use super::aggregate::Order;
use super::milestones::{MilestoneKind, MilestoneStatus, MilestoneStatus as MS};
use super::missing_info::{MissingStatus, RefillDeniedType};

/// Read-side predicates used by pollers and notifiers to pick the next step.
///
/// Every `is_processing_*` and `is_pending_*` predicate answers `false` while
/// the order is suspended by a missing-info overlay.
impl Order {
    pub fn is_first_fill(&self) -> bool {
        self.fill_type == FillType::FirstFill
    }

    pub fn is_refill(&self) -> bool {
        self.fill_type == FillType::ReFill
    }

    pub fn is_pay_out_of_pocket(&self) -> bool {
        self.payment_option == Some(PaymentOption::PayDirectly)
    }

    pub fn is_pay_through_insurance(&self) -> bool {
        self.payment_option == Some(PaymentOption::PayThroughInsurance)
    }

    /// Whether a missing-info overlay holds the order.
    pub fn is_suspended(&self) -> bool {
        self.missing_info_state.is_some()
    }

    /// Region status as seen by the progress predicates.
    fn progressing(&self, kind: MilestoneKind) -> Option<MilestoneStatus> {
        if self.is_suspended() {
            return None;
        }
        self.milestone_status(kind)
    }

    fn status_is(&self, kind: MilestoneKind, statuses: &[MilestoneStatus]) -> bool {
        self.milestone_status(kind)
            .is_some_and(|status| statuses.contains(&status))
    }

    // Progress

    /// A transfer being sent back to the origin pharmacy is never processing.
    pub fn is_processing_transfer(&self) -> bool {
        self.progressing(MilestoneKind::Transfer)
            .is_some_and(|status| status != MS::Completed)
            && !self.is_transfer_back()
    }

    pub fn is_processing_new_prescription(&self) -> bool {
        self.progressing(MilestoneKind::NewRx)
            .is_some_and(|status| status != MS::Completed)
    }

    pub fn is_processing_insurance(&self) -> bool {
        !self.is_pay_out_of_pocket()
            && self
                .progressing(MilestoneKind::Insurance)
                .is_some_and(|status| status != MS::Completed)
    }

    pub fn is_processing_insurance_complete(&self) -> bool {
        !self.is_pay_out_of_pocket()
            && self.progressing(MilestoneKind::Insurance) == Some(MS::Completed)
    }

    /// Cash price not yet determined.
    pub fn is_processing_cash(&self) -> bool {
        self.is_pay_out_of_pocket()
            && self.progressing(MilestoneKind::Payment) == Some(MS::NotInitiated)
    }

    pub fn is_processing_payment(&self) -> bool {
        self.progressing(MilestoneKind::Payment)
            .is_some_and(|status| status != MS::Completed)
    }

    pub fn is_processing_stock_check(&self) -> bool {
        self.progressing(MilestoneKind::StockCheck)
            .is_some_and(|status| status != MS::Completed)
    }

    pub fn is_processing_delivery(&self) -> bool {
        self.progressing(MilestoneKind::Delivery)
            .is_some_and(|status| status != MS::Shipped)
    }

    /// Unlike the other regions, a refill authorization that has not been
    /// initiated is not processing.
    pub fn is_processing_refill_auth(&self) -> bool {
        self.progressing(MilestoneKind::RefillAuth)
            .is_some_and(|status| !matches!(status, MS::Completed | MS::NotInitiated))
    }

    /// Past the welcome call but not yet transferred.
    pub fn is_pending_transfer(&self) -> bool {
        matches!(
            self.progressing(MilestoneKind::Transfer),
            Some(MS::NotInitiated | MS::CallCompleted)
        )
    }

    pub fn is_pending_payment_approval(&self) -> bool {
        !self.is_suspended() && self.awaiting_payment_approval()
    }

    pub fn is_pending_payment_approval_and_signup(&self) -> bool {
        self.progressing(MilestoneKind::Payment) == Some(MS::PendingApprovalAndSignup)
    }

    pub fn is_pending_approval_until_free_trial(&self) -> bool {
        self.progressing(MilestoneKind::Payment) == Some(MS::PendingApprovalUntilFreeTrial)
    }

    pub fn is_pending_approval_until_price_inspection_free_trial(&self) -> bool {
        self.progressing(MilestoneKind::Payment)
            == Some(MS::PendingApprovalUntilPriceInspectionFreeTrial)
    }

    pub fn is_pending_approval_until_price_inspection_no_free_trial(&self) -> bool {
        self.progressing(MilestoneKind::Payment)
            == Some(MS::PendingApprovalUntilPriceInspectionNoFreeTrial)
    }

    /// Raw approval check, ignoring the overlay. After a price inspection the
    /// order only waits on approval when the customer need not be contacted.
    pub(crate) fn awaiting_payment_approval(&self) -> bool {
        match self.milestone_status(MilestoneKind::Payment) {
            Some(MS::PendingApproval) => true,
            Some(MS::PendingApprovalAfterPriceInspection) => {
                !self.should_contact_customer_for_payment_approval
            }
            _ => false,
        }
    }

    // Region status

    pub fn is_not_due(&self) -> bool {
        !self.is_pay_out_of_pocket()
            && self.status_is(MilestoneKind::Insurance, &[MS::RefillNotDue])
    }

    pub fn is_transfer_in_process(&self) -> bool {
        self.milestone_status(MilestoneKind::Transfer).is_some_and(|status| {
            !matches!(status, MS::Completed | MS::CallCompleted | MS::NotInitiated)
        })
    }

    pub fn is_transfer_back(&self) -> bool {
        self.status_is(MilestoneKind::Transfer, &[MS::TransferBack, MS::TransferBackCompleted])
    }

    pub fn is_transfer_back_complete(&self) -> bool {
        self.status_is(MilestoneKind::Transfer, &[MS::TransferBackCompleted])
    }

    pub fn is_transfer_out(&self) -> bool {
        self.status_is(MilestoneKind::NewRx, &[MS::TransferOut, MS::TransferOutCompleted])
    }

    pub fn is_transfer_out_complete(&self) -> bool {
        self.status_is(MilestoneKind::NewRx, &[MS::TransferOutCompleted])
    }

    pub fn is_transfer_request_sent(&self) -> bool {
        self.status_is(MilestoneKind::Transfer, &[MS::TransferRequested, MS::FaxSent])
    }

    pub fn is_transfer_initiated(&self) -> bool {
        self.status_is(MilestoneKind::Transfer, &[MS::TransferInitiated])
    }

    pub fn is_order_verification_initiated(&self) -> bool {
        self.status_is(MilestoneKind::NewRx, &[MS::VerificationInitiated])
    }

    pub fn requires_doctor_approval(&self) -> bool {
        self.status_is(
            MilestoneKind::Transfer,
            &[MS::ZeroRefills, MS::EScriptRequestSent, MS::FaxSent],
        )
    }

    pub fn requires_doctor_approval_for_new_prescription(&self) -> bool {
        self.status_is(MilestoneKind::NewRx, &[MS::FaxSent, MS::EScriptRequestSent])
    }

    pub fn requires_prior_auth(&self) -> bool {
        self.status_is(MilestoneKind::Insurance, &[MS::PriorAuth, MS::FaxSent])
    }

    pub fn is_in_reverse_insurance_process(&self) -> bool {
        self.status_is(MilestoneKind::Insurance, &[MS::ReverseInsurance])
    }

    pub fn is_insurance_reversed(&self) -> bool {
        self.status_is(MilestoneKind::Insurance, &[MS::InsuranceReversed])
    }

    pub fn is_cash_price_identified(&self) -> bool {
        self.status_is(MilestoneKind::Payment, &[MS::CashPriceIdentified])
    }

    pub fn is_payment_authorized(&self) -> bool {
        self.status_is(MilestoneKind::Payment, &[MS::PaymentAuthorized])
    }

    /// The customer has been charged.
    pub fn is_payment_complete(&self) -> bool {
        self.status_is(MilestoneKind::Payment, &[MS::Completed])
    }

    pub fn is_invoice_pending(&self) -> bool {
        self.status_is(
            MilestoneKind::Payment,
            &[MS::PaymentCompleteInvoicePending, MS::PaymentIncompleteInvoicePending],
        )
    }

    pub fn is_payment_incomplete_offline(&self) -> bool {
        self.status_is(MilestoneKind::Payment, &[MS::PaymentIncompleteOffline])
    }

    pub fn is_shipped(&self) -> bool {
        self.status_is(MilestoneKind::Delivery, &[MS::Shipped, MS::WaitingLabelScan])
    }

    pub fn is_shipping_label_generated(&self) -> bool {
        self.is_shipped() || self.status_is(MilestoneKind::Delivery, &[MS::ShippingLabelGenerated])
    }

    pub fn is_delivered(&self) -> bool {
        self.delivery_milestone
            .as_ref()
            .is_some_and(|delivery| delivery.delivery_confirmed)
    }

    /// Carrier-reported, independent of the region status.
    pub fn is_in_transit(&self) -> bool {
        self.delivery_milestone
            .as_ref()
            .is_some_and(|delivery| delivery.carrier_status == Some(MS::InTransit))
    }

    // Overlay

    pub fn missing_status(&self) -> Option<MissingStatus> {
        self.missing_info_state.as_ref().map(|state| state.missing_status)
    }

    fn overlay_is(&self, statuses: &[MissingStatus]) -> bool {
        self.missing_status()
            .is_some_and(|status| statuses.contains(&status))
    }

    pub fn has_payment_error(&self) -> bool {
        self.overlay_is(&[MissingStatus::PaymentError])
    }

    pub fn has_delivery_failed(&self) -> bool {
        self.overlay_is(&[MissingStatus::DeliveryFailed])
    }

    pub fn has_delivery_returned(&self) -> bool {
        self.overlay_is(&[MissingStatus::DeliveryReturned])
    }

    pub fn is_refills_denied(&self) -> bool {
        self.overlay_is(&[MissingStatus::RefillsDenied])
    }

    pub fn refill_denied_type(&self) -> Option<RefillDeniedType> {
        if !self.is_refills_denied() {
            return None;
        }
        self.missing_info_state.as_ref()?.refill_denied_type
    }

    pub fn is_prior_auth_denied(&self) -> bool {
        self.overlay_is(&[MissingStatus::PriorAuthDenied])
    }

    pub fn is_step_therapy_denied(&self) -> bool {
        self.overlay_is(&[MissingStatus::StepTherapyDenied])
    }

    pub fn is_invalid_insurance(&self) -> bool {
        self.overlay_is(&[MissingStatus::InvalidInsurance, MissingStatus::InsuranceExpired])
    }

    pub fn is_stock_exception(&self) -> bool {
        self.overlay_is(&[MissingStatus::StockException])
    }

    // Derived values

    pub fn earliest_refill_date(&self) -> Option<DateTime<Utc>> {
        self.insurance_milestone.as_ref()?.earliest_refill_date
    }

    /// Authorization token for the preferred payment path, falling back to
    /// the other path's token.
    pub fn payment_auth_token(&self) -> Option<&str> {
        let insurance = self
            .insurance_milestone
            .as_ref()
            .and_then(|region| region.milestone.parameters.payment_authorization_token.as_deref())
            .filter(|token| !token.is_empty());
        let cash = self
            .payment_milestone
            .as_ref()
            .and_then(|region| region.milestone.parameters.payment_authorization_token.as_deref())
            .filter(|token| !token.is_empty());

        if self.is_pay_through_insurance() {
            insurance.or(cash)
        } else {
            cash.or(insurance)
        }
    }

    /// Every relevant region has reached its terminal status and nothing
    /// holds the order. Insurance is irrelevant when paying directly and
    /// refill authorization only matters for refills.
    pub fn is_fulfilled(&self) -> bool {
        if self.is_suspended() {
            return false;
        }

        let relevant = MilestoneKind::ALL.iter().copied().filter(|kind| match kind {
            MilestoneKind::Insurance => !self.is_pay_out_of_pocket(),
            MilestoneKind::RefillAuth => self.is_refill(),
            _ => true,
        });

        let mut seen = false;
        for kind in relevant {
            let Some(status) = self.milestone_status(kind) else {
                continue;
            };
            seen = true;
            let done = match kind {
                MilestoneKind::Delivery => matches!(status, MS::Shipped | MS::Completed),
                _ => status == MS::Completed,
            };
            if !done {
                return false;
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::missing_info::MissingInfoState;
    use crate::vocabulary::OriginType;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn order(origin_type: OriginType) -> Order {
        Order::initialize("o", "1234-1234-1234", origin_type, now())
    }

    fn completed(option: PaymentOption) -> Order {
        let mut order = order(OriginType::Transfer);
        order.payment_option = Some(option);
        for kind in [
            MilestoneKind::Transfer,
            MilestoneKind::Insurance,
            MilestoneKind::Payment,
            MilestoneKind::StockCheck,
        ] {
            order.set_milestone_status(kind, MS::Completed, now());
        }
        order.set_milestone_status(MilestoneKind::Delivery, MS::Shipped, now());
        order
    }

    #[test]
    fn test_fresh_order_is_processing_intake_and_regions() {
        let order = order(OriginType::Transfer);

        assert!(order.is_processing_transfer());
        assert!(order.is_pending_transfer());
        assert!(!order.is_processing_new_prescription());
        assert!(order.is_processing_insurance());
        assert!(order.is_processing_payment());
        assert!(order.is_processing_stock_check());
        assert!(order.is_processing_delivery());
        assert!(!order.is_processing_refill_auth());
    }

    #[test]
    fn test_transfer_back_is_never_processing() {
        let mut order = order(OriginType::Transfer);
        order.set_milestone_status(MilestoneKind::Transfer, MS::TransferBack, now());
        assert!(!order.is_processing_transfer());
        assert!(order.is_transfer_back());
        assert!(!order.is_transfer_back_complete());
    }

    #[test]
    fn test_delivery_stops_processing_once_shipped() {
        let mut order = order(OriginType::Transfer);
        order.set_milestone_status(MilestoneKind::Delivery, MS::Completed, now());
        assert!(order.is_processing_delivery());
        order.set_milestone_status(MilestoneKind::Delivery, MS::Shipped, now());
        assert!(!order.is_processing_delivery());
        assert!(order.is_shipped());
        assert!(order.is_shipping_label_generated());
    }

    #[test]
    fn test_refill_auth_excludes_not_initiated() {
        let mut order = order(OriginType::Transfer);
        order.start_refill(now());
        assert!(!order.is_processing_refill_auth());
        order.set_milestone_status(MilestoneKind::RefillAuth, MS::FaxSent, now());
        assert!(order.is_processing_refill_auth());
        order.set_milestone_status(MilestoneKind::RefillAuth, MS::Completed, now());
        assert!(!order.is_processing_refill_auth());
    }

    #[test]
    fn test_payment_path_exclusivity() {
        let mut order = order(OriginType::Transfer);

        order.payment_option = Some(PaymentOption::PayDirectly);
        assert!(!order.is_processing_insurance());
        assert!(order.is_processing_cash());

        order.payment_option = Some(PaymentOption::PayThroughInsurance);
        assert!(order.is_processing_insurance());
        assert!(!order.is_processing_cash());
    }

    #[test]
    fn test_cash_only_while_price_undetermined() {
        let mut order = order(OriginType::FromDoctorDirect);
        order.payment_option = Some(PaymentOption::PayDirectly);
        order.set_milestone_status(MilestoneKind::Payment, MS::CashPriceIdentified, now());
        assert!(!order.is_processing_cash());
        assert!(order.is_cash_price_identified());
    }

    #[test]
    fn test_pending_approval_after_price_inspection() {
        let mut order = order(OriginType::Transfer);
        order.set_milestone_status(
            MilestoneKind::Payment,
            MS::PendingApprovalAfterPriceInspection,
            now(),
        );
        assert!(order.is_pending_payment_approval());

        order.should_contact_customer_for_payment_approval = true;
        assert!(!order.is_pending_payment_approval());
    }

    #[test]
    fn test_overlay_predicates() {
        let mut order = order(OriginType::Transfer);
        order.report_missing_info(
            MissingInfoState::new(MissingStatus::RefillsDenied)
                .with_refill_denied(RefillDeniedType::NoResponseFromMd),
        );
        assert!(order.is_refills_denied());
        assert_eq!(order.refill_denied_type(), Some(RefillDeniedType::NoResponseFromMd));
        assert!(!order.has_payment_error());

        order.set_missing_info_state(MissingStatus::InsuranceExpired);
        assert!(order.is_invalid_insurance());
        assert!(order.refill_denied_type().is_none());
    }

    #[test]
    fn test_doctor_and_prior_auth_requirements() {
        let mut order = order(OriginType::Transfer);
        order.set_milestone_status(MilestoneKind::Transfer, MS::ZeroRefills, now());
        order.set_milestone_status(MilestoneKind::Insurance, MS::PriorAuth, now());
        assert!(order.requires_doctor_approval());
        assert!(order.requires_prior_auth());
        assert!(order.is_transfer_in_process());
        assert!(!order.requires_doctor_approval_for_new_prescription());
    }

    #[test]
    fn test_payment_auth_token_prefers_current_path() {
        let mut order = order(OriginType::Transfer);
        let insurance = &mut order.insurance_milestone.as_mut().unwrap().milestone.parameters;
        insurance.payment_authorization_token = Some("ins".to_string());
        let payment = &mut order.payment_milestone.as_mut().unwrap().milestone.parameters;
        payment.payment_authorization_token = Some("cash".to_string());

        order.payment_option = Some(PaymentOption::PayThroughInsurance);
        assert_eq!(order.payment_auth_token(), Some("ins"));
        order.payment_option = Some(PaymentOption::PayDirectly);
        assert_eq!(order.payment_auth_token(), Some("cash"));

        let payment = &mut order.payment_milestone.as_mut().unwrap().milestone.parameters;
        payment.payment_authorization_token = None;
        assert_eq!(order.payment_auth_token(), Some("ins"));
    }

    #[test]
    fn test_is_fulfilled_and_semantics() {
        let mut order = completed(PaymentOption::PayThroughInsurance);
        assert!(order.is_fulfilled());

        order.set_milestone_status(MilestoneKind::Insurance, MS::PriorAuth, now());
        assert!(!order.is_fulfilled());

        order.payment_option = Some(PaymentOption::PayDirectly);
        assert!(order.is_fulfilled());

        order.set_missing_info_state(MissingStatus::DeliveryReturned);
        assert!(!order.is_fulfilled());
        assert!(order.has_delivery_returned());
    }

    #[test]
    fn test_refill_needs_refill_auth_for_fulfillment() {
        let mut order = completed(PaymentOption::PayThroughInsurance);
        order.fill_type = FillType::ReFill;
        order.refill_milestone = Some(Default::default());
        assert!(!order.is_fulfilled());
        order.set_milestone_status(MilestoneKind::RefillAuth, MS::Completed, now());
        assert!(order.is_fulfilled());
    }

    #[test]
    fn test_empty_order_is_not_fulfilled() {
        assert!(!Order::default().is_fulfilled());
    }

    fn progress_predicates(order: &Order) -> [bool; 14] {
        [
            order.is_processing_transfer(),
            order.is_processing_new_prescription(),
            order.is_processing_insurance(),
            order.is_processing_insurance_complete(),
            order.is_processing_cash(),
            order.is_processing_payment(),
            order.is_processing_stock_check(),
            order.is_processing_delivery(),
            order.is_processing_refill_auth(),
            order.is_pending_transfer(),
            order.is_pending_payment_approval(),
            order.is_pending_payment_approval_and_signup(),
            order.is_pending_approval_until_free_trial(),
            order.is_pending_approval_until_price_inspection_free_trial(),
        ]
    }

    proptest! {
        #[test]
        fn prop_overlay_dominates_progress(
            statuses in proptest::collection::vec(0..MS::ALL.len(), MilestoneKind::ALL.len()),
            missing in 0..MissingStatus::ALL.len(),
            direct in any::<bool>(),
            refill in any::<bool>(),
        ) {
            let mut order = order(OriginType::Transfer);
            if refill {
                order.start_refill(now());
            }
            order.payment_option = Some(if direct {
                PaymentOption::PayDirectly
            } else {
                PaymentOption::PayThroughInsurance
            });
            for (kind, status) in MilestoneKind::ALL.iter().zip(statuses) {
                order.set_milestone_status(*kind, MS::ALL[status], now());
            }
            order.set_missing_info_state(MissingStatus::ALL[missing]);

            prop_assert!(progress_predicates(&order).iter().all(|held| !held));
            prop_assert!(!order.is_pending_approval_until_price_inspection_no_free_trial());
            prop_assert!(!order.is_fulfilled());
        }

        #[test]
        fn prop_payment_paths_are_exclusive(
            insurance in 0..MS::ALL.len(),
            payment in 0..MS::ALL.len(),
        ) {
            let mut order = order(OriginType::FromDoctorPaper);
            order.set_milestone_status(MilestoneKind::Insurance, MS::ALL[insurance], now());
            order.set_milestone_status(MilestoneKind::Payment, MS::ALL[payment], now());

            order.payment_option = Some(PaymentOption::PayDirectly);
            prop_assert!(!order.is_processing_insurance());
            order.payment_option = Some(PaymentOption::PayThroughInsurance);
            prop_assert!(!order.is_processing_cash());
        }
    }
}
