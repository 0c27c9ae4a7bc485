//! "User registered" notifications for external subscribers such as a welcome
//! mailer.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRegistered {
    pub user_id: i32,
    pub username: String,
    pub provider: ProviderKind,
}

#[derive(Debug, Clone)]
pub struct RegistrationEvents {
    sender: broadcast::Sender<UserRegistered>,
}

impl RegistrationEvents {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UserRegistered> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns how many subscribers saw it; none is fine.
    pub fn publish(&self, event: UserRegistered) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for RegistrationEvents {
    fn default() -> Self {
        Self::new(64)
    }
}
