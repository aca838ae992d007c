use crate::entities::OrderStatus;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events published after a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        user_id: Uuid,
        total: i64,
    },
    OrderCancelled {
        order_id: Uuid,
        restocked_units: i64,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    StockAdjusted {
        product_id: Uuid,
        old_stock: i32,
        new_stock: i32,
    },
    /// A checkout left a product with no units on hand.
    StockDepleted(Uuid),
    ProductCreated(Uuid),
    ProductDeleted(Uuid),
    UserRegistered(Uuid),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::OrderCancelled { .. } => "order_cancelled",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::StockDepleted(_) => "stock_depleted",
            Event::ProductCreated(_) => "product_created",
            Event::ProductDeleted(_) => "product_deleted",
            Event::UserRegistered(_) => "user_registered",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget publish. Failures are logged, never returned.
    pub async fn publish(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Dropping domain event");
        }
    }
}

/// Consumes events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("flyshop_events.processed", 1, "event" => event.name());

        match event {
            Event::OrderCreated {
                order_id,
                user_id,
                total,
            } => {
                info!(order_id = %order_id, user_id = %user_id, total, "Order placed");
            }
            Event::OrderCancelled {
                order_id,
                restocked_units,
            } => {
                info!(order_id = %order_id, restocked_units, "Order cancelled and restocked");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            Event::StockAdjusted {
                product_id,
                old_stock,
                new_stock,
            } => {
                info!(product_id = %product_id, old_stock, new_stock, "Stock adjusted");
            }
            Event::StockDepleted(product_id) => {
                warn!(product_id = %product_id, "Product is out of stock");
            }
            Event::ProductCreated(product_id) => {
                info!(product_id = %product_id, "Product created");
            }
            Event::ProductDeleted(product_id) => {
                info!(product_id = %product_id, "Product deleted");
            }
            Event::UserRegistered(user_id) => {
                info!(user_id = %user_id, "User registered");
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.publish(Event::ProductCreated(id)).await;

        assert_eq!(rx.recv().await, Some(Event::ProductCreated(id)));
    }

    #[tokio::test]
    async fn publish_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::StockDepleted(Uuid::new_v4())).await.is_err());
        sender.publish(Event::StockDepleted(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn processing_loop_ends_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(process_events(rx));
        tx.send(Event::UserRegistered(Uuid::new_v4())).await.unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
