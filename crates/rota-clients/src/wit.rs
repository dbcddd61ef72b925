//! Wit.ai intent classifier.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use rota_core::config::ClassifierConfig;
use rota_core::error::{RotaError, RotaResult};
use rota_core::traits::Classifier;
use rota_core::types::{Classification, IntentKind};

/// Classifier backed by the Wit.ai `/message` endpoint.
pub struct WitClassifier {
    client: Client,
    access_token: SecretString,
    base_url: String,
    api_version: String,
}

#[derive(Debug, Default, Deserialize)]
struct WitResponse {
    #[serde(default)]
    entities: WitEntities,
}

#[derive(Debug, Default, Deserialize)]
struct WitEntities {
    #[serde(default)]
    intent: Vec<WitValue>,
    #[serde(default)]
    datetime: Vec<WitDatetime>,
    #[serde(default)]
    contact: Vec<WitValue>,
}

#[derive(Debug, Deserialize)]
struct WitValue {
    value: String,
}

/// A datetime entity is either a single value or an interval with a `from` bound.
#[derive(Debug, Deserialize)]
struct WitDatetime {
    value: Option<String>,
    from: Option<WitValue>,
}

#[derive(Debug, Deserialize)]
struct WitError {
    error: String,
}

impl WitClassifier {
    /// Create a new classifier.
    pub fn new(config: &ClassifierConfig) -> RotaResult<Self> {
        let access_token = config
            .access_token
            .clone()
            .or_else(|| std::env::var("WIT_ACCESS_TOKEN").ok())
            .ok_or_else(|| {
                RotaError::Configuration(
                    "Wit access token not found. Set WIT_ACCESS_TOKEN or classifier.access_token."
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RotaError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            access_token: SecretString::new(access_token),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    fn message_url(&self, text: &str) -> RotaResult<Url> {
        Url::parse_with_params(
            &format!("{}/message", self.base_url),
            &[("v", self.api_version.as_str()), ("q", text)],
        )
        .map_err(|e| RotaError::Configuration(format!("Invalid classifier URL: {}", e)))
    }
}

#[async_trait]
impl Classifier for WitClassifier {
    async fn classify(&self, text: &str) -> RotaResult<Classification> {
        let url = self.message_url(text)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| RotaError::classification(format!("Wit request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RotaError::classification(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<WitError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(RotaError::classification(format!(
                "Wit API error ({}): {}",
                status, message
            )));
        }

        let classification = parse_response(&body)?;
        debug!(
            intent = %classification.intent,
            contacts = classification.contacts.len(),
            "Message classified"
        );
        Ok(classification)
    }
}

/// Turn a `/message` response body into a [`Classification`].
fn parse_response(body: &str) -> RotaResult<Classification> {
    let response: WitResponse = serde_json::from_str(body)
        .map_err(|e| RotaError::classification(format!("Failed to parse response: {}", e)))?;
    let entities = response.entities;

    let intent = entities
        .intent
        .first()
        .map(|i| IntentKind::from_label(&i.value))
        .unwrap_or(IntentKind::Unknown);

    let mut classification = Classification::new(intent)
        .with_contacts(entities.contact.into_iter().map(|c| c.value));

    let raw = entities
        .datetime
        .into_iter()
        .next()
        .and_then(|d| d.value.or(d.from.map(|f| f.value)));
    if let Some(raw) = raw {
        classification = classification.with_datetime(parse_datetime(&raw)?);
    }

    Ok(classification)
}

fn parse_datetime(raw: &str) -> RotaResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| RotaError::classification(format!("Bad datetime '{}': {}", raw, e)))
}
