use std::sync::Arc;
use async_trait::async_trait;
use cqrs_es::EventEnvelope;

use super::Order;
use crate::errors::Error;
use crate::event::DomainEvent;

/// Outbound port of the notification/event dispatcher.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: DomainEvent) -> Result<(), Error>;
}

/// Forwards committed order events to an [`EventDispatcher`].
pub struct DispatchQuery {
    dispatcher: Arc<dyn EventDispatcher>,
}

impl DispatchQuery {
    pub fn new(dispatcher: Arc<dyn EventDispatcher>) -> Self {
        Self { dispatcher }
    }

    async fn forward(&self, envelope: &EventEnvelope<Order>) -> Result<(), Error> {
        let event = DomainEvent::from_envelope(envelope)?;
        tracing::debug!("Dispatching {} for {}", event.event_type, event.id);
        self.dispatcher.dispatch(event).await
    }
}

#[async_trait]
impl cqrs_es::Query<Order> for DispatchQuery {
    async fn dispatch(&self, order_id: &str, events: &[EventEnvelope<Order>]) {
        for envelope in events {
            if let Err(err) = self.forward(envelope).await {
                tracing::error!(
                    "DispatchQuery error for {} (sequence {}): {}",
                    order_id,
                    envelope.sequence,
                    err
                );
            }
        }
    }
}
