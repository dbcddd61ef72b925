//! Factory for building the HTTP collaborators from configuration.

use std::sync::Arc;

use rota_core::config::RotaConfig;
use rota_core::error::RotaResult;
use rota_core::traits::{Classifier, MessageSender, UserDirectory};

use crate::slack::{SlackDirectory, SlackSender};
use crate::wit::WitClassifier;

/// The three collaborators the core needs, behind their traits.
pub struct Collaborators {
    pub classifier: Arc<dyn Classifier>,
    pub directory: Arc<dyn UserDirectory>,
    pub sender: Arc<dyn MessageSender>,
}

/// Factory for creating collaborator clients.
pub struct ClientFactory;

impl ClientFactory {
    /// Create the Wit.ai classifier.
    pub fn classifier(config: &RotaConfig) -> RotaResult<Arc<dyn Classifier>> {
        Ok(Arc::new(WitClassifier::new(&config.classifier)?))
    }

    /// Create the Slack user directory.
    pub fn directory(config: &RotaConfig) -> RotaResult<Arc<dyn UserDirectory>> {
        Ok(Arc::new(SlackDirectory::new(&config.slack)?))
    }

    /// Create the Slack message sender.
    pub fn sender(config: &RotaConfig) -> RotaResult<Arc<dyn MessageSender>> {
        Ok(Arc::new(SlackSender::new(&config.slack)?))
    }

    /// Create all collaborators, failing on the first missing credential.
    pub fn create(config: &RotaConfig) -> RotaResult<Collaborators> {
        Ok(Collaborators {
            classifier: Self::classifier(config)?,
            directory: Self::directory(config)?,
            sender: Self::sender(config)?,
        })
    }
}
