//! Core data types: assignments, intents, and the shapes exchanged with collaborators.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Wrap a raw user id in the canonical mention form, `<@U123>`.
pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// A pair of users on duty together.
///
/// Equality ignores order; display order is the order the pair was created with.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct UserPair {
    pub first: String,
    pub second: String,
}

impl UserPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Check whether the user is one half of this pair.
    pub fn contains(&self, user: &str) -> bool {
        self.first == user || self.second == user
    }
}

impl PartialEq for UserPair {
    fn eq(&self, other: &Self) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl fmt::Display for UserPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.first, self.second)
    }
}

/// One rotation slot: a pair and the Monday of the week they are on duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub users: UserPair,
    pub due_date: NaiveDate,
}

impl Assignment {
    pub fn new(users: UserPair, due_date: NaiveDate) -> Self {
        Self { users, due_date }
    }
}

/// Closed set of intents the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IntentKind {
    Get,
    Skip,
    Swap,
    Unknown,
}

impl IntentKind {
    /// Parse a classifier label, mapping anything unrecognised to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or(Self::Unknown)
    }
}

/// Structured output of the NLU classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: IntentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl Classification {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            datetime: None,
            contacts: Vec::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(IntentKind::Unknown)
    }

    pub fn with_datetime(mut self, datetime: DateTime<FixedOffset>) -> Self {
        self.datetime = Some(datetime);
        self
    }

    pub fn with_contacts<I, S>(mut self, contacts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contacts = contacts.into_iter().map(Into::into).collect();
        self
    }
}

/// Normalized input to the intent router.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    pub kind: IntentKind,
    pub datetime: Option<DateTime<FixedOffset>>,
    pub contacts: Vec<String>,
    /// Canonical id of the human who sent the request.
    pub requesting_user: String,
}

impl IntentRequest {
    pub fn from_classification(classification: Classification, requesting_user: impl Into<String>) -> Self {
        Self {
            kind: classification.intent,
            datetime: classification.datetime,
            contacts: classification.contacts,
            requesting_user: requesting_user.into(),
        }
    }
}

/// A user known to the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: String,
}

impl DirectoryUser {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A chat message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    #[serde(alias = "user")]
    pub sender: String,
    pub channel: String,
}
