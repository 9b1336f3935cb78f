use cqrs_es::{Aggregate, DomainEvent as _, EventEnvelope};
use derive_new::new;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::errors::Error;

/// Committed event as handed to the notification/event dispatcher.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct DomainEvent {
    pub id: String,
    pub aggregate_type: String,
    pub sequence: usize,
    pub event_type: String,
    pub event_version: String,
    pub payload: String,
    pub metadata: String,
}

impl DomainEvent {
    pub fn from_envelope<A: Aggregate>(envelope: &EventEnvelope<A>) -> Result<Self, Error> {
        Ok(Self::new(
            envelope.aggregate_id.clone(),
            A::aggregate_type(),
            envelope.sequence,
            envelope.payload.event_type(),
            envelope.payload.event_version(),
            serde_json::to_string(&envelope.payload)?,
            serde_json::to_string(&envelope.metadata)?,
        ))
    }

    /// Decode the payload back into the aggregate's event type.
    pub fn decode<E: DeserializeOwned>(&self) -> Result<E, Error> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{Event, Order};
    use crate::orders::sleep::SleepState;
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn test_envelope_conversion() {
        let payload = Event::SleepScheduled {
            state: SleepState::CheckFax,
            start_date: Some(Utc::now()),
            stop_date: None,
            updated_at: Utc::now(),
        };
        let envelope = EventEnvelope::<Order> {
            aggregate_id: "order-7".to_string(),
            sequence: 4,
            payload: payload.clone(),
            metadata: HashMap::from([("command_id".to_string(), "c-1".to_string())]),
        };

        let event = DomainEvent::from_envelope(&envelope).unwrap();

        assert_eq!(event.id, "order-7");
        assert_eq!(event.aggregate_type, "Order");
        assert_eq!(event.sequence, 4);
        assert_eq!(event.event_type, "Order:SleepScheduled");
        assert_eq!(event.event_version, "1.0");
        assert!(event.payload.contains("\"state\":\"CheckFax\""));
        assert_eq!(event.decode::<Event>().unwrap(), payload);
    }
}
