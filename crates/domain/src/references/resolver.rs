use derive_new::new;

use super::{ReferenceStore, Relation};
use crate::errors::{ReferenceFailure, ReferenceLoadError, StoreError};
use crate::orders::Order;

/// Which relations a resolve call may fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadConfig {
    pub address: bool,
    pub payment: bool,
    pub origin_pharmacy: bool,
    pub partner_pharmacy: bool,
}

impl LoadConfig {
    pub fn all() -> Self {
        Self {
            address: true,
            payment: true,
            origin_pharmacy: true,
            partner_pharmacy: true,
        }
    }

    pub fn only(relations: impl IntoIterator<Item = Relation>) -> Self {
        relations
            .into_iter()
            .fold(Self::default(), |config, relation| config.with(relation))
    }

    pub fn with(mut self, relation: Relation) -> Self {
        match relation {
            Relation::Address => self.address = true,
            Relation::Payment => self.payment = true,
            Relation::OriginPharmacy => self.origin_pharmacy = true,
            Relation::PartnerPharmacy => self.partner_pharmacy = true,
            Relation::CurrentOrder | Relation::Insurance => {}
        }
        self
    }

    pub fn enables(&self, relation: Relation) -> bool {
        match relation {
            Relation::Address => self.address,
            Relation::Payment => self.payment,
            Relation::OriginPharmacy => self.origin_pharmacy,
            Relation::PartnerPharmacy => self.partner_pharmacy,
            Relation::CurrentOrder | Relation::Insurance => false,
        }
    }
}

/// Attaches an order's related documents from a [`ReferenceStore`].
///
/// A relation the store does not know is left unset. Every other failure is
/// collected and reported once, after all requested relations were tried.
#[derive(new)]
pub struct ReferenceResolver<S> {
    store: S,
}

impl<S: ReferenceStore> ReferenceResolver<S> {
    /// Fetch every referenced relation, replacing what is already attached.
    pub async fn load_references(&self, order: &mut Order) -> Result<(), ReferenceLoadError> {
        let requested = Relation::ORDER
            .iter()
            .filter_map(|relation| {
                order
                    .reference(*relation)
                    .map(|id| (*relation, id.to_string()))
            })
            .collect();

        self.load(order, requested).await
    }

    /// Fetch only enabled relations that are referenced and not attached yet.
    pub async fn load_references_with_config(
        &self,
        order: &mut Order,
        config: LoadConfig,
    ) -> Result<(), ReferenceLoadError> {
        let requested = Relation::ORDER
            .iter()
            .filter(|relation| config.enables(**relation) && !is_attached(order, **relation))
            .filter_map(|relation| {
                order
                    .reference(*relation)
                    .map(|id| (*relation, id.to_string()))
            })
            .collect();

        self.load(order, requested).await
    }

    async fn load(
        &self,
        order: &mut Order,
        requested: Vec<(Relation, String)>,
    ) -> Result<(), ReferenceLoadError> {
        let mut failures = Vec::new();

        for (relation, id) in requested {
            match relation {
                Relation::Address => {
                    let result = self.store.find_address(&id).await;
                    settle(&mut order.address, relation, &id, result, &mut failures);
                }
                Relation::Payment => {
                    let result = self.store.find_payment(&id).await;
                    settle(&mut order.payment, relation, &id, result, &mut failures);
                }
                Relation::OriginPharmacy => {
                    let result = self.store.find_pharmacy(&id).await;
                    settle(&mut order.origin_pharmacy, relation, &id, result, &mut failures);
                }
                Relation::PartnerPharmacy => {
                    let result = self.store.find_pharmacy(&id).await;
                    settle(&mut order.partner_pharmacy, relation, &id, result, &mut failures);
                }
                Relation::CurrentOrder | Relation::Insurance => {}
            }
        }

        match ReferenceLoadError::from_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn is_attached(order: &Order, relation: Relation) -> bool {
    match relation {
        Relation::Address => order.address.is_some(),
        Relation::Payment => order.payment.is_some(),
        Relation::OriginPharmacy => order.origin_pharmacy.is_some(),
        Relation::PartnerPharmacy => order.partner_pharmacy.is_some(),
        Relation::CurrentOrder | Relation::Insurance => false,
    }
}

pub(crate) fn settle<T>(
    slot: &mut Option<T>,
    relation: Relation,
    id: &str,
    result: Result<T, StoreError>,
    failures: &mut Vec<ReferenceFailure>,
) {
    match result {
        Ok(value) => *slot = Some(value),
        Err(err) if err.is_not_found() => {
            tracing::debug!("No {} {}, leaving it unset", relation, id);
            *slot = None;
        }
        Err(source) => {
            tracing::warn!("Failed to load {} {}: {}", relation, id, source);
            failures.push(ReferenceFailure { relation, source });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::{Address, Payment, Pharmacy};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::vocabulary::OriginType;

    #[derive(Default)]
    struct InMemoryStore {
        addresses: HashMap<String, Address>,
        payments: HashMap<String, Payment>,
        pharmacies: HashMap<String, Pharmacy>,
        broken: Vec<String>,
        calls: AtomicUsize,
    }

    impl InMemoryStore {
        fn lookup<T: Clone>(
            &self,
            collection: &str,
            items: &HashMap<String, T>,
            id: &str,
        ) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.iter().any(|broken| broken == id) {
                return Err(StoreError::Backend(format!("{collection} shard unavailable")));
            }
            items
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(collection, id))
        }
    }

    #[async_trait]
    impl ReferenceStore for InMemoryStore {
        async fn find_address(&self, id: &str) -> Result<Address, StoreError> {
            self.lookup("address", &self.addresses, id)
        }

        async fn find_payment(&self, id: &str) -> Result<Payment, StoreError> {
            self.lookup("paymentInfo", &self.payments, id)
        }

        async fn find_pharmacy(&self, id: &str) -> Result<Pharmacy, StoreError> {
            self.lookup("pharmacy", &self.pharmacies, id)
        }
    }

    fn store() -> InMemoryStore {
        InMemoryStore {
            addresses: HashMap::from([(
                "addr-1".to_string(),
                Address {
                    id: "addr-1".to_string(),
                    city: "Boston".to_string(),
                    ..Default::default()
                },
            )]),
            pharmacies: HashMap::from([(
                "ph-1".to_string(),
                Pharmacy {
                    id: "ph-1".to_string(),
                    name: "Main Street Pharmacy".to_string(),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        }
    }

    fn order() -> Order {
        Order::initialize("o-1", "1234-5678-9012", OriginType::Transfer, Utc::now())
    }

    #[tokio::test]
    async fn test_partial_success_reports_only_failed_relation() {
        let mut store = store();
        store.broken.push("pay-bad".to_string());
        let resolver = ReferenceResolver::new(store);

        let mut order = order();
        order.attach_reference(Relation::Address, "addr-1".to_string());
        order.attach_reference(Relation::Payment, "pay-bad".to_string());

        let err = resolver.load_references(&mut order).await.unwrap_err();

        assert_eq!(order.address.as_ref().unwrap().city, "Boston");
        assert!(order.payment.is_none());
        assert_eq!(err.relations().collect::<Vec<_>>(), vec![Relation::Payment]);
        assert!(err.to_string().contains("paymentInfo"));
        assert!(!err.to_string().contains("deliveryAddress"));
    }

    #[tokio::test]
    async fn test_not_found_is_swallowed() {
        let resolver = ReferenceResolver::new(store());
        let mut order = order();
        order.attach_reference(Relation::Payment, "pay-missing".to_string());
        order.attach_reference(Relation::OriginPharmacy, "ph-1".to_string());

        resolver.load_references(&mut order).await.unwrap();

        assert!(order.payment.is_none());
        assert_eq!(order.origin_pharmacy.as_ref().unwrap().name, "Main Street Pharmacy");
    }

    #[tokio::test]
    async fn test_every_relation_is_attempted() {
        let mut store = store();
        store.broken.extend(["addr-1".to_string(), "ph-1".to_string()]);
        let resolver = ReferenceResolver::new(store);

        let mut order = order();
        order.attach_reference(Relation::Address, "addr-1".to_string());
        order.attach_reference(Relation::OriginPharmacy, "ph-1".to_string());
        order.attach_reference(Relation::PartnerPharmacy, "ph-1".to_string());

        let err = resolver.load_references(&mut order).await.unwrap_err();

        assert_eq!(
            err.relations().collect::<Vec<_>>(),
            vec![Relation::Address, Relation::OriginPharmacy, Relation::PartnerPharmacy]
        );
        assert_eq!(resolver.store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_config_skips_disabled_and_attached() {
        let resolver = ReferenceResolver::new(store());
        let mut order = order();
        order.attach_reference(Relation::Address, "addr-1".to_string());
        order.attach_reference(Relation::OriginPharmacy, "ph-1".to_string());
        order.attach_reference(Relation::PartnerPharmacy, "ph-1".to_string());

        resolver
            .load_references_with_config(
                &mut order,
                LoadConfig::only([Relation::Address, Relation::OriginPharmacy]),
            )
            .await
            .unwrap();
        assert!(order.address.is_some());
        assert!(order.origin_pharmacy.is_some());
        assert!(order.partner_pharmacy.is_none());
        assert_eq!(resolver.store.calls.load(Ordering::SeqCst), 2);

        resolver
            .load_references_with_config(&mut order, LoadConfig::all())
            .await
            .unwrap();
        assert!(order.partner_pharmacy.is_some());
        assert_eq!(resolver.store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unreferenced_relations_are_not_fetched() {
        let resolver = ReferenceResolver::new(store());
        let mut order = order();

        resolver.load_references(&mut order).await.unwrap();

        assert_eq!(resolver.store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_config_builders() {
        let config = LoadConfig::default().with(Relation::Payment);
        assert!(config.enables(Relation::Payment));
        assert!(!config.enables(Relation::Address));
        assert!(Relation::ORDER.iter().all(|relation| LoadConfig::all().enables(*relation)));
        assert!(!LoadConfig::all().enables(Relation::CurrentOrder));
    }
}
