use std::sync::Arc;
use async_trait::async_trait;
use cqrs_es::EventEnvelope;

use super::{Event, Order};
use crate::errors::Error;
use crate::order_number::{OrderNumber, OrderNumberRegistry};

/// Registers the order number of every newly initialized order, so the
/// generator sees it as taken.
pub struct RegistryQuery {
    registry: Arc<dyn OrderNumberRegistry>,
}

impl RegistryQuery {
    pub fn new(registry: Arc<dyn OrderNumberRegistry>) -> Self {
        Self { registry }
    }

    async fn register(&self, order_id: &str, order_number: &str) -> Result<(), Error> {
        let number = OrderNumber::parse(order_number)?;
        self.registry.register(&number, order_id).await?;
        tracing::debug!("Registered order number {} for {}", number, order_id);
        Ok(())
    }
}

#[async_trait]
impl cqrs_es::Query<Order> for RegistryQuery {
    async fn dispatch(&self, order_id: &str, events: &[EventEnvelope<Order>]) {
        for envelope in events {
            if let Event::OrderInitialized { order_number, .. } = &envelope.payload {
                if let Err(err) = self.register(order_id, order_number).await {
                    tracing::error!("RegistryQuery error for {}: {}", order_id, err);
                }
            }
        }
    }
}
