//! rota-clients - HTTP collaborators for rota.
//!
//! Implementations of the `rota-core` collaborator traits against real services.
//!
//! # Supported Services
//!
//! - **Wit.ai** - intent, datetime, and contact extraction (`Classifier`)
//! - **Slack** - `users.list` (`UserDirectory`) and `chat.postMessage` (`MessageSender`)
//!
//! # Example
//!
//! ```ignore
//! use rota_clients::ClientFactory;
//! use rota_core::RotaConfig;
//!
//! let config = RotaConfig::load()?;
//! let clients = ClientFactory::create(&config)?;
//! let classification = clients.classifier.classify("<@UBOT> who's on next?").await?;
//! ```

mod factory;
mod slack;
mod wit;

pub use factory::{ClientFactory, Collaborators};
pub use slack::{SlackDirectory, SlackSender};
pub use wit::WitClassifier;

// Re-export core traits for convenience
pub use rota_core::traits::{Classifier, MessageSender, UserDirectory};
