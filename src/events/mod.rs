use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted after a successful state change. Consumers are advisory;
/// failure to deliver never rolls back the change that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Drug catalog events
    DrugCreated(Uuid),
    DrugUpdated(Uuid),
    DrugDeleted(Uuid),

    // Inventory events
    StockAdjusted {
        product_id: Uuid,
        previous_quantity: i32,
        new_quantity: i32,
        reason: String,
    },

    // Prescription events
    PrescriptionCreated(Uuid),
    PrescriptionDispensed {
        prescription_id: Uuid,
        dispensal_id: Uuid,
        fully_dispensed: bool,
    },

    // Account events
    UserCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::PrescriptionDispensed {
                prescription_id,
                dispensal_id,
                fully_dispensed,
            } => {
                info!(
                    prescription_id = %prescription_id,
                    dispensal_id = %dispensal_id,
                    fully_dispensed = fully_dispensed,
                    "Prescription dispensed"
                );
            }
            Event::StockAdjusted {
                product_id,
                previous_quantity,
                new_quantity,
                ..
            } => {
                info!(
                    product_id = %product_id,
                    previous_quantity = previous_quantity,
                    new_quantity = new_quantity,
                    "Stock adjusted"
                );
            }
            other => info!(event = ?other, "Event processed"),
        }
    }
    info!("Event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::DrugCreated(id)).await.unwrap();
        sender.send(Event::DrugDeleted(id)).await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::DrugCreated(got)) if got == id));
        assert!(matches!(rx.recv().await, Some(Event::DrugDeleted(got)) if got == id));
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::DrugCreated(Uuid::new_v4())).await.is_err());
    }
}
