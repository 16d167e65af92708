//! Best-effort publishing of domain events.

use std::sync::{Arc, Mutex};

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    sink: Sink,
}

#[derive(Clone, Default)]
enum Sink {
    #[default]
    Disabled,
    Nats(async_nats::Client),
    Recording(Arc<Mutex<Vec<DomainEvent>>>),
}

impl EventPublisher {
    pub fn disabled() -> Self { Self::default() }

    pub fn nats(client: async_nats::Client) -> Self { Self { sink: Sink::Nats(client) } }

    /// Keeps events in memory; the returned handle sees every publish.
    pub fn recording() -> (Self, Arc<Mutex<Vec<DomainEvent>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Self { sink: Sink::Recording(log.clone()) }, log)
    }

    /// Never fails the caller; delivery problems are only logged.
    pub async fn publish(&self, event: impl Into<DomainEvent>) {
        let event = event.into();
        match &self.sink {
            Sink::Disabled => {}
            Sink::Recording(log) => {
                if let Ok(mut log) = log.lock() {
                    log.push(event);
                }
            }
            Sink::Nats(client) => {
                let payload = match serde_json::to_vec(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(subject = event.subject(), error = %e, "failed to encode event");
                        return;
                    }
                };
                if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
                    tracing::warn!(subject = event.subject(), error = %e, "failed to publish event");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::AddressEvent;

    #[tokio::test]
    async fn test_recording_sink() {
        let (publisher, log) = EventPublisher::recording();
        publisher.publish(AddressEvent::Deleted { user_id: 1, address_id: 2 }).await;
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_sink_is_silent() {
        EventPublisher::disabled().publish(AddressEvent::Deleted { user_id: 1, address_id: 2 }).await;
    }
}
