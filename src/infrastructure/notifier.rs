use crate::domain::ports::{Notification, Notifier};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        match notification {
            Notification::GameCreated { game } => info!(%game, "Game created"),
            Notification::AssignmentsChanged { game, participants } => {
                info!(%game, affected = participants.len(), "Assignments changed")
            }
            Notification::ReassignmentRequested { game, participant } => {
                info!(%game, %participant, "Reassignment requested")
            }
            Notification::ParticipantRemoved { game, participant } => {
                info!(%game, %participant, "Participant removed")
            }
        }
        Ok(())
    }
}

/// Keeps every notification in memory. Clones share the same outbox.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}
