use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use cqrs_es::persist::ViewRepository;
use dynamo_es::DynamoViewRepository;
use serde::de::DeserializeOwned;

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::order_number::{OrderNumber, OrderNumberLookup, OrderNumberRegistry};
use crate::orders::{Order, View};
use crate::prescriptions::{Insurance, PrescriptionStore};
use crate::references::{Address, Payment, Pharmacy, ReferenceStore};

/// DynamoDB-backed lookups for order relations and order numbers.
#[derive(Clone)]
pub struct DynamoStore {
    client: aws_sdk_dynamodb::Client,
    config: StoreConfig,
}

impl DynamoStore {
    pub fn new(client: aws_sdk_dynamodb::Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        key: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(key, AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("{table}: {err}")))?;

        let item = output.item.ok_or_else(|| StoreError::not_found(table, id))?;

        serde_dynamo::from_item(item)
            .map_err(|err| StoreError::Decode(format!("{table} {id}: {err}")))
    }
}

#[async_trait]
impl ReferenceStore for DynamoStore {
    async fn find_address(&self, id: &str) -> Result<Address, StoreError> {
        self.get(&self.config.addresses_table, "id", id).await
    }

    async fn find_payment(&self, id: &str) -> Result<Payment, StoreError> {
        self.get(&self.config.payments_table, "id", id).await
    }

    async fn find_pharmacy(&self, id: &str) -> Result<Pharmacy, StoreError> {
        self.get(&self.config.pharmacies_table, "id", id).await
    }
}

#[async_trait]
impl PrescriptionStore for DynamoStore {
    /// Reads the order's projected view.
    async fn find_order(&self, id: &str) -> Result<Order, StoreError> {
        let table = &self.config.orders_view_table;
        let repo: DynamoViewRepository<View, Order> =
            DynamoViewRepository::new(table, self.client.clone());

        match repo.load(id).await {
            Ok(Some(view)) => Ok(view.order),
            Ok(None) => Err(StoreError::not_found(table, id)),
            Err(err) => Err(StoreError::Backend(format!("{table}: {err}"))),
        }
    }

    async fn find_insurance(&self, id: &str) -> Result<Insurance, StoreError> {
        self.get(&self.config.insurances_table, "id", id).await
    }
}

#[async_trait]
impl OrderNumberLookup for DynamoStore {
    async fn is_taken(&self, number: &OrderNumber) -> Result<bool, StoreError> {
        let table = &self.config.order_numbers_table;
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key("orderNumber", AttributeValue::S(number.to_string()))
            .projection_expression("orderNumber")
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("{table}: {err}")))?;

        Ok(output.item.is_some())
    }
}

#[async_trait]
impl OrderNumberRegistry for DynamoStore {
    async fn register(&self, number: &OrderNumber, order_id: &str) -> Result<(), StoreError> {
        let table = &self.config.order_numbers_table;
        self.client
            .put_item()
            .table_name(table)
            .item("orderNumber", AttributeValue::S(number.to_string()))
            .item("orderId", AttributeValue::S(order_id.to_string()))
            .condition_expression("attribute_not_exists(orderNumber)")
            .send()
            .await
            .map_err(|err| {
                let taken = err
                    .as_service_error()
                    .is_some_and(|service| service.is_conditional_check_failed_exception());
                if taken {
                    StoreError::AlreadyExists {
                        collection: table.to_string(),
                        id: number.to_string(),
                    }
                } else {
                    StoreError::Backend(format!("{table}: {err}"))
                }
            })?;

        Ok(())
    }
}
