//! Inbound message front door: mention filter, help, classification, routing.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::router::{IntentRouter, NOT_UNDERSTOOD};
use crate::traits::Classifier;
use crate::types::{mention, InboundMessage, IntentRequest};

pub const HELP_TEXT: &str = "Mention me and ask things like:\n\
    • \"who's on dinner next?\"\n\
    • \"who's on dinner June 12th?\"\n\
    • \"when am I on dinner?\" or \"when is Alice on dinner?\"\n\
    • \"skip dinner next week\"";

static HELP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bhelp\b").expect("static help pattern is valid"));

/// Handles one chat message addressed to the bot.
pub struct MessageHandler {
    classifier: Arc<dyn Classifier>,
    router: Arc<IntentRouter>,
    bot_mention: String,
}

impl MessageHandler {
    pub fn new(classifier: Arc<dyn Classifier>, router: Arc<IntentRouter>, bot_user_id: &str) -> Self {
        Self {
            classifier,
            router,
            bot_mention: mention(bot_user_id),
        }
    }

    /// Whether the message is addressed to the bot at all.
    pub fn is_addressed(&self, message: &InboundMessage) -> bool {
        message.text.contains(&self.bot_mention)
    }

    /// Produce the reply, or `None` when the message is not for the bot.
    pub async fn handle(&self, message: &InboundMessage) -> Option<String> {
        if !self.is_addressed(message) {
            debug!(channel = %message.channel, "Ignoring message without mention");
            return None;
        }

        if HELP_PATTERN.is_match(&message.text) {
            info!(sender = %message.sender, "Help requested");
            return Some(HELP_TEXT.to_string());
        }

        let classification = match self.classifier.classify(&message.text).await {
            Ok(classification) => classification,
            Err(err) => {
                warn!(error = %err, "Classification failed, treating as unknown intent");
                return Some(NOT_UNDERSTOOD.to_string());
            }
        };

        info!(
            sender = %message.sender,
            intent = %classification.intent,
            has_datetime = classification.datetime.is_some(),
            contacts = classification.contacts.len(),
            "Routing request"
        );

        let request = IntentRequest::from_classification(classification, message.sender.clone());
        Some(self.router.route(&request).await)
    }
}
