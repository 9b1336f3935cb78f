use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::{MissingStatus, Order};
use crate::references::Relation;
use crate::vocabulary::{OriginType, PaymentOption};

/// Current-order and insurance hydration
pub mod resolver;

pub use resolver::{PrescriptionResolver, PrescriptionStore};

/// Insurance card on file for a prescription.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Insurance {
    pub id: String,
    #[serde(default)]
    pub insurance_id: String,
    #[serde(default)]
    pub bin_number: String,
    #[serde(default)]
    pub pcn_number: String,
    #[serde(default)]
    pub group_number: String,
    #[serde(default)]
    pub card_image_id: String,
    #[serde(default)]
    pub patient_id: String,
}

/// A prescription and the order currently filling it. Fulfillment questions
/// are answered by the current order once it has been resolved.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub strength: String,
    pub origin_type: Option<OriginType>,
    #[serde(default)]
    pub days_of_supply: u32,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub suspended: bool,
    pub schedule_date: Option<DateTime<Utc>>,
    pub last_fill_date: Option<DateTime<Utc>>,
    pub current_order_id: Option<String>,

    // References, hydrated by the resolver
    pub current_order_ref: Option<String>,
    pub insurance_ref: Option<String>,
    #[serde(skip)]
    pub current_order: Option<Order>,
    #[serde(skip)]
    pub insurance: Option<Insurance>,
}

impl Prescription {
    pub fn initialize(
        id: impl Into<String>,
        name: impl Into<String>,
        origin_type: OriginType,
        schedule_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            origin_type: Some(origin_type),
            schedule_date,
            ..Default::default()
        }
    }

    pub fn reference(&self, relation: Relation) -> Option<&str> {
        match relation {
            Relation::CurrentOrder => self.current_order_ref.as_deref(),
            Relation::Insurance => self.insurance_ref.as_deref(),
            _ => None,
        }
    }

    /// Make `order` the one filling this prescription.
    pub fn add_order(&mut self, order: Order) {
        self.current_order_ref = Some(order.id.clone());
        self.current_order_id = Some(order.id.clone());
        self.current_order = Some(order);
    }

    pub fn add_insurance(&mut self, insurance: Insurance) {
        self.insurance_ref = Some(insurance.id.clone());
        self.insurance = Some(insurance);
    }

    pub fn set_payment_option(&mut self, out_of_pocket: bool) {
        if let Some(order) = self.current_order.as_mut() {
            order.payment_option = Some(if out_of_pocket {
                PaymentOption::PayDirectly
            } else {
                PaymentOption::PayThroughInsurance
            });
        }
    }

    /// Suspend the current order. No-op without a resolved order.
    pub fn set_missing_info(&mut self, status: MissingStatus) {
        if let Some(order) = self.current_order.as_mut() {
            order.set_missing_info_state(status);
        }
    }

    /// Scheduled to start after the end of `now`'s UTC day.
    pub fn is_scheduled_for_later(&self, now: DateTime<Utc>) -> bool {
        let end_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
        self.schedule_date
            .is_some_and(|scheduled| scheduled >= end_of_day)
    }

    fn is_on_hold(&self, now: DateTime<Utc>) -> bool {
        self.archived || self.suspended || self.is_scheduled_for_later(now)
    }

    pub fn has_valid_insurance(&self) -> bool {
        self.insurance.as_ref().is_some_and(|insurance| {
            (!insurance.insurance_id.is_empty() && !insurance.bin_number.is_empty())
                || !insurance.card_image_id.is_empty()
        })
    }

    /// Paying through insurance while the card is absent or the order is
    /// suspended for an insurance problem.
    pub fn insurance_missing_or_exception(&self) -> bool {
        let Some(order) = self.current_order.as_ref() else {
            return false;
        };
        if !order.is_pay_through_insurance() {
            return false;
        }
        if self.insurance.is_none() {
            return true;
        }
        order
            .missing_status()
            .is_some_and(|status| status.is_insurance_problem())
    }

    /// Paying through insurance with no insurance referenced at all.
    pub fn is_insurance_missing(&self) -> bool {
        self.current_order
            .as_ref()
            .is_some_and(|order| order.is_pay_through_insurance() && self.insurance_ref.is_none())
    }

    pub fn has_payment_error(&self, now: DateTime<Utc>) -> bool {
        self.authorized_order(now)
            .is_some_and(|order| order.has_payment_error())
    }

    /// Requires the current order's relations to be resolved.
    pub fn is_missing_payment(&self, now: DateTime<Utc>) -> bool {
        self.authorized_order(now)
            .is_some_and(|order| order.payment.is_none())
    }

    /// Current order with payment authorized, unless the prescription is on hold.
    fn authorized_order(&self, now: DateTime<Utc>) -> Option<&Order> {
        let order = self.current_order.as_ref()?;
        if !order.is_payment_authorized() || self.is_on_hold(now) {
            return None;
        }
        Some(order)
    }

    /// The current order's earliest refill date, else 80% of the days of
    /// supply after the last fill.
    pub fn earliest_refill_date(&self) -> Option<DateTime<Utc>> {
        if let Some(date) = self.current_order.as_ref().and_then(Order::earliest_refill_date) {
            return Some(date);
        }
        let minutes = i64::from(self.days_of_supply) * 24 * 60 * 4 / 5;
        self.last_fill_date
            .map(|last_fill| last_fill + Duration::minutes(minutes))
    }

    pub fn full_name(&self) -> String {
        if self.name.is_empty() {
            match self.origin_type {
                Some(OriginType::FromDoctorDirect) => return "New Prescription".to_string(),
                Some(OriginType::FromDoctorPaper) => return "Paper Prescription".to_string(),
                _ => {}
            }
        }

        [self.name.as_str(), self.form.as_str(), self.strength.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{MilestoneKind, MilestoneStatus};
    use crate::references::Payment;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 15, 30, 0).unwrap()
    }

    fn prescription(payment_option: PaymentOption) -> Prescription {
        let mut order = Order::initialize("o-1", "1234-5678-9012", OriginType::Transfer, now());
        order.payment_option = Some(payment_option);

        let mut rx = Prescription::initialize("rx-1", "Lisinopril", OriginType::Transfer, None);
        rx.add_order(order);
        rx
    }

    fn authorized(payment_option: PaymentOption) -> Prescription {
        let mut rx = prescription(payment_option);
        let order = rx.current_order.as_mut().unwrap();
        let status = MilestoneStatus::PaymentAuthorized;
        order.set_milestone_status(MilestoneKind::Payment, status, now());
        rx
    }

    #[test]
    fn test_add_order_links_current_order() {
        let rx = prescription(PaymentOption::PayDirectly);

        assert_eq!(rx.current_order_ref.as_deref(), Some("o-1"));
        assert_eq!(rx.current_order_id.as_deref(), Some("o-1"));
        assert_eq!(rx.reference(Relation::CurrentOrder), Some("o-1"));
        assert_eq!(rx.reference(Relation::Address), None);
    }

    #[test]
    fn test_set_missing_info_suspends_current_order() {
        let mut rx = prescription(PaymentOption::PayDirectly);
        rx.set_missing_info(MissingStatus::NoPatient);

        let order = rx.current_order.as_ref().unwrap();
        assert_eq!(order.missing_status(), Some(MissingStatus::NoPatient));
        assert!(order.is_suspended());

        let mut bare = Prescription::default();
        bare.set_missing_info(MissingStatus::NoPatient);
        assert!(bare.current_order.is_none());
    }

    #[test]
    fn test_set_payment_option_applies_to_current_order() {
        let mut rx = prescription(PaymentOption::PayDirectly);
        rx.set_payment_option(false);
        assert!(rx.current_order.as_ref().unwrap().is_pay_through_insurance());
        rx.set_payment_option(true);
        assert!(rx.current_order.as_ref().unwrap().is_pay_out_of_pocket());
    }

    #[test]
    fn test_insurance_missing_or_exception() {
        let mut rx = prescription(PaymentOption::PayThroughInsurance);
        assert!(rx.insurance_missing_or_exception());

        rx.add_insurance(Insurance {
            id: "ins-1".to_string(),
            insurance_id: "A100".to_string(),
            bin_number: "610014".to_string(),
            ..Default::default()
        });
        assert!(!rx.insurance_missing_or_exception());

        for status in [
            MissingStatus::MissingInsurance,
            MissingStatus::InvalidInsurance,
            MissingStatus::InsuranceExpired,
            MissingStatus::NotCovered,
        ] {
            rx.set_missing_info(status);
            assert!(rx.insurance_missing_or_exception(), "{status} not reported");
        }

        rx.set_missing_info(MissingStatus::PaymentError);
        assert!(!rx.insurance_missing_or_exception());

        rx.set_payment_option(true);
        rx.insurance = None;
        assert!(!rx.insurance_missing_or_exception());
    }

    #[test]
    fn test_is_insurance_missing_reads_reference() {
        let mut rx = prescription(PaymentOption::PayThroughInsurance);
        assert!(rx.is_insurance_missing());

        rx.insurance_ref = Some("ins-1".to_string());
        assert!(!rx.is_insurance_missing());

        assert!(!Prescription::default().is_insurance_missing());
        assert!(!prescription(PaymentOption::PayDirectly).is_insurance_missing());
    }

    #[test]
    fn test_payment_error_requires_authorized_payment() {
        let mut rx = prescription(PaymentOption::PayDirectly);
        rx.set_missing_info(MissingStatus::PaymentError);
        assert!(!rx.has_payment_error(now()));

        let mut rx = authorized(PaymentOption::PayDirectly);
        rx.set_missing_info(MissingStatus::PaymentError);
        assert!(rx.has_payment_error(now()));
    }

    #[test]
    fn test_payment_checks_skip_prescriptions_on_hold() {
        let mut archived = authorized(PaymentOption::PayDirectly);
        archived.set_missing_info(MissingStatus::PaymentError);
        archived.archived = true;
        assert!(!archived.has_payment_error(now()));
        assert!(!archived.is_missing_payment(now()));

        let mut suspended = authorized(PaymentOption::PayDirectly);
        suspended.suspended = true;
        assert!(!suspended.is_missing_payment(now()));

        let mut later = authorized(PaymentOption::PayDirectly);
        later.schedule_date = Some(now() + Duration::days(2));
        assert!(!later.is_missing_payment(now()));
    }

    #[test]
    fn test_is_missing_payment_reads_resolved_payment() {
        let mut rx = authorized(PaymentOption::PayDirectly);
        assert!(rx.is_missing_payment(now()));

        rx.current_order.as_mut().unwrap().payment = Some(Payment {
            id: "pay-1".to_string(),
            ..Default::default()
        });
        assert!(!rx.is_missing_payment(now()));
        assert!(!prescription(PaymentOption::PayDirectly).is_missing_payment(now()));
    }

    #[test]
    fn test_scheduled_for_later_means_after_today() {
        let mut rx = Prescription::default();
        assert!(!rx.is_scheduled_for_later(now()));

        rx.schedule_date = Some(Utc.with_ymd_and_hms(2024, 6, 3, 23, 59, 59).unwrap());
        assert!(!rx.is_scheduled_for_later(now()));

        rx.schedule_date = Some(Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap());
        assert!(rx.is_scheduled_for_later(now()));
    }

    #[test]
    fn test_earliest_refill_date_falls_back_to_last_fill() {
        let mut rx = Prescription {
            days_of_supply: 30,
            last_fill_date: Some(now()),
            ..Default::default()
        };
        assert_eq!(rx.earliest_refill_date(), Some(now() + Duration::days(24)));

        let mut order = Order::initialize("o-1", "1234-5678-9012", OriginType::Transfer, now());
        order.insurance_milestone.as_mut().unwrap().earliest_refill_date =
            Some(now() + Duration::days(20));
        rx.add_order(order);
        assert_eq!(rx.earliest_refill_date(), Some(now() + Duration::days(20)));
    }

    #[test]
    fn test_valid_insurance_and_full_name() {
        let mut rx = Prescription::initialize("rx", "", OriginType::FromDoctorPaper, None);
        assert_eq!(rx.full_name(), "Paper Prescription");
        assert!(!rx.has_valid_insurance());

        rx.add_insurance(Insurance {
            id: "ins-1".to_string(),
            card_image_id: "img-1".to_string(),
            ..Default::default()
        });
        assert!(rx.has_valid_insurance());

        rx.name = "Atorvastatin".to_string();
        rx.form = "tablet".to_string();
        rx.strength = "20mg".to_string();
        assert_eq!(rx.full_name(), "ATORVASTATIN TABLET 20MG");
    }

    #[test]
    fn test_hydrated_relations_are_not_persisted() {
        let rx = prescription(PaymentOption::PayDirectly);
        let json = serde_json::to_value(&rx).unwrap();

        assert_eq!(json["currentOrderRef"], "o-1");
        assert!(json.get("currentOrder").is_none());

        let back: Prescription = serde_json::from_value(json).unwrap();
        assert!(back.current_order.is_none());
        assert_eq!(back.current_order_ref, rx.current_order_ref);
    }
}
