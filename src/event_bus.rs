use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::world::EntityId;

/// Side effects performed on the world while actions run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorldEvent {
    ItemCreated { item: EntityId, source: String },
    ItemGiven { item: EntityId, receiver: EntityId },
    ChatMessage {
        client: EntityId,
        sender: EntityId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error_type: String,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("Failed to send event: {message}")]
    SendFailed { message: String },
    #[error("Failed to receive event: {message}")]
    ReceiveFailed { message: String },
    #[error("Receiver lagged behind by {count} events")]
    Lagged { count: u64 },
}

pub type EventResult<T> = Result<T, EventError>;

pub struct EventBus {
    event_sender: broadcast::Sender<WorldEvent>,
    error_sender: broadcast::Sender<ErrorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (event_sender, _) = broadcast::channel(capacity);
        let (error_sender, _) = broadcast::channel(capacity);
        Self {
            event_sender,
            error_sender,
        }
    }

    pub fn subscribe(&self) -> (EventReceiver, ErrorReceiver) {
        let event_rx = self.event_sender.subscribe();
        let error_rx = self.error_sender.subscribe();
        (EventReceiver::new(event_rx), ErrorReceiver::new(error_rx))
    }

    /// Fails only when nobody is subscribed.
    pub fn publish(&self, event: WorldEvent) -> EventResult<()> {
        self.event_sender
            .send(event)
            .map_err(|e| EventError::SendFailed {
                message: e.to_string(),
            })?;
        Ok(())
    }

    pub fn publish_error(&self, error: ErrorEvent) -> EventResult<()> {
        self.error_sender
            .send(error)
            .map_err(|e| EventError::SendFailed {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<WorldEvent>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<WorldEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event. After a lag the receiver is resubscribed
    /// and the skipped count is returned as an error.
    pub async fn recv(&mut self) -> EventResult<WorldEvent> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                self.receiver = self.receiver.resubscribe();
                Err(EventError::Lagged { count: n })
            }
            Err(e) => Err(EventError::ReceiveFailed {
                message: e.to_string(),
            }),
        }
    }

    /// Next buffered event, if any.
    pub fn try_recv(&mut self) -> Option<WorldEvent> {
        self.receiver.try_recv().ok()
    }
}

pub struct ErrorReceiver {
    receiver: broadcast::Receiver<ErrorEvent>,
}

impl ErrorReceiver {
    fn new(receiver: broadcast::Receiver<ErrorEvent>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> EventResult<ErrorEvent> {
        self.receiver
            .recv()
            .await
            .map_err(|e| EventError::ReceiveFailed {
                message: e.to_string(),
            })
    }

    pub fn try_recv(&mut self) -> Option<ErrorEvent> {
        self.receiver.try_recv().ok()
    }
}
