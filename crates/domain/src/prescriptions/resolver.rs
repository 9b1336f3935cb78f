use async_trait::async_trait;
use derive_new::new;

use super::{Insurance, Prescription};
use crate::errors::{ReferenceLoadError, StoreError};
use crate::orders::Order;
use crate::references::resolver::settle;
use crate::references::Relation;

/// Lookup port for the documents a prescription points at.
#[async_trait]
pub trait PrescriptionStore: Send + Sync {
    async fn find_order(&self, id: &str) -> Result<Order, StoreError>;

    async fn find_insurance(&self, id: &str) -> Result<Insurance, StoreError>;
}

/// Attaches a prescription's current order and insurance. A missing document
/// is left unset, every other failure is reported once all were tried.
#[derive(new)]
pub struct PrescriptionResolver<S> {
    store: S,
}

impl<S: PrescriptionStore> PrescriptionResolver<S> {
    pub async fn load_current_order(
        &self,
        rx: &mut Prescription,
    ) -> Result<(), ReferenceLoadError> {
        self.load(rx, &[Relation::CurrentOrder]).await
    }

    pub async fn load_references(
        &self,
        rx: &mut Prescription,
    ) -> Result<(), ReferenceLoadError> {
        self.load(rx, &[Relation::CurrentOrder, Relation::Insurance]).await
    }

    async fn load(
        &self,
        rx: &mut Prescription,
        relations: &[Relation],
    ) -> Result<(), ReferenceLoadError> {
        let mut failures = Vec::new();

        for relation in relations {
            let Some(id) = rx.reference(*relation).map(str::to_string) else {
                continue;
            };
            match relation {
                Relation::CurrentOrder => {
                    let result = self.store.find_order(&id).await;
                    settle(&mut rx.current_order, *relation, &id, result, &mut failures);
                }
                Relation::Insurance => {
                    let result = self.store.find_insurance(&id).await;
                    settle(&mut rx.insurance, *relation, &id, result, &mut failures);
                }
                _ => {}
            }
        }

        match ReferenceLoadError::from_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{OriginType, PaymentOption};
    use chrono::Utc;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryStore {
        orders: HashMap<String, Order>,
        insurances: HashMap<String, Insurance>,
        broken: Vec<String>,
    }

    impl InMemoryStore {
        fn lookup<T: Clone>(
            &self,
            collection: &str,
            items: &HashMap<String, T>,
            id: &str,
        ) -> Result<T, StoreError> {
            if self.broken.iter().any(|broken| broken == id) {
                return Err(StoreError::Backend(format!("{collection} read timed out")));
            }
            items
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(collection, id))
        }
    }

    #[async_trait]
    impl PrescriptionStore for InMemoryStore {
        async fn find_order(&self, id: &str) -> Result<Order, StoreError> {
            self.lookup("order", &self.orders, id)
        }

        async fn find_insurance(&self, id: &str) -> Result<Insurance, StoreError> {
            self.lookup("insurance", &self.insurances, id)
        }
    }

    fn store() -> InMemoryStore {
        let mut order =
            Order::initialize("o-1", "1234-5678-9012", OriginType::Transfer, Utc::now());
        order.payment_option = Some(PaymentOption::PayThroughInsurance);

        InMemoryStore {
            orders: HashMap::from([("o-1".to_string(), order)]),
            insurances: HashMap::from([(
                "ins-1".to_string(),
                Insurance {
                    id: "ins-1".to_string(),
                    card_image_id: "img-1".to_string(),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        }
    }

    fn prescription(order_ref: &str) -> Prescription {
        Prescription {
            id: "rx-1".to_string(),
            current_order_ref: Some(order_ref.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_current_order_attaches_order() {
        let resolver = PrescriptionResolver::new(store());
        let mut rx = prescription("o-1");
        rx.insurance_ref = Some("ins-1".to_string());

        resolver.load_current_order(&mut rx).await.unwrap();

        assert_eq!(rx.current_order.as_ref().unwrap().order_number, "1234-5678-9012");
        assert!(rx.insurance.is_none());
        assert!(!rx.is_insurance_missing());
    }

    #[tokio::test]
    async fn test_missing_current_order_is_left_unset() {
        let resolver = PrescriptionResolver::new(store());
        let mut rx = prescription("o-gone");

        resolver.load_current_order(&mut rx).await.unwrap();

        assert!(rx.current_order.is_none());
        assert!(!rx.insurance_missing_or_exception());
    }

    #[tokio::test]
    async fn test_failures_are_collected_after_every_relation() {
        let mut store = store();
        store.broken.push("o-1".to_string());
        let resolver = PrescriptionResolver::new(store);
        let mut rx = prescription("o-1");
        rx.insurance_ref = Some("ins-1".to_string());

        let err = resolver.load_references(&mut rx).await.unwrap_err();

        assert_eq!(err.relations().collect::<Vec<_>>(), vec![Relation::CurrentOrder]);
        assert!(err.to_string().contains("currentOrder"));
        assert!(rx.current_order.is_none());
        assert!(rx.has_valid_insurance());
    }

    #[tokio::test]
    async fn test_resolved_order_answers_fulfillment_questions() {
        let resolver = PrescriptionResolver::new(store());
        let mut rx = prescription("o-1");

        resolver.load_references(&mut rx).await.unwrap();

        assert!(rx.is_insurance_missing());
        assert!(rx.insurance_missing_or_exception());
    }
}
