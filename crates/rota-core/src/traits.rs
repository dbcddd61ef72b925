//! Collaborator traits: the services the core calls but does not own.
//!
//! Concrete HTTP implementations live in `rota-clients`; tests substitute doubles.

use async_trait::async_trait;

use crate::error::RotaResult;
use crate::types::{Classification, DirectoryUser};

/// Natural-language classifier turning free text into an intent plus entities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a message. Fails with `RotaError::Classification`.
    async fn classify(&self, text: &str) -> RotaResult<Classification>;
}

/// Directory of chat users, used to resolve real names to ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All known users. Fails with `RotaError::DirectoryUnavailable`.
    async fn list_users(&self) -> RotaResult<Vec<DirectoryUser>>;
}

/// Outbound half of the chat transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Post text to a channel. Fails with `RotaError::Transport`.
    async fn send_text(&self, channel: &str, text: &str) -> RotaResult<()>;
}
