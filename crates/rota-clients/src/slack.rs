//! Slack Web API: the workspace user directory and outbound chat messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rota_core::config::SlackConfig;
use rota_core::error::{RotaError, RotaResult};
use rota_core::traits::{MessageSender, UserDirectory};
use rota_core::types::DirectoryUser;

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    members: Vec<SlackMember>,
}

#[derive(Debug, Deserialize)]
struct SlackMember {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
}

impl From<SlackMember> for DirectoryUser {
    fn from(member: SlackMember) -> Self {
        let display_name = member
            .real_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(member.name);
        DirectoryUser::new(member.id, display_name)
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn build_client(config: &SlackConfig) -> RotaResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| RotaError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

fn token_from(value: Option<&String>, env_var: &str) -> RotaResult<SecretString> {
    value
        .cloned()
        .or_else(|| std::env::var(env_var).ok())
        .map(SecretString::new)
        .ok_or_else(|| {
            RotaError::Configuration(format!("Slack token not found. Set {}.", env_var))
        })
}

/// User directory backed by `users.list`.
pub struct SlackDirectory {
    client: Client,
    token: SecretString,
    base_url: String,
}

impl SlackDirectory {
    pub fn new(config: &SlackConfig) -> RotaResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            token: token_from(config.api_token.as_ref(), "SLACK_API_TOKEN")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for SlackDirectory {
    async fn list_users(&self) -> RotaResult<Vec<DirectoryUser>> {
        let response = self
            .client
            .get(format!("{}/users.list", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| RotaError::directory(format!("users.list request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RotaError::directory(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(RotaError::directory(format!(
                "users.list error ({}): {}",
                status, body
            )));
        }

        let users = parse_users(&body)?;
        debug!(count = users.len(), "Fetched user directory");
        Ok(users)
    }
}

fn parse_users(body: &str) -> RotaResult<Vec<DirectoryUser>> {
    let response: UsersListResponse = serde_json::from_str(body)
        .map_err(|e| RotaError::directory(format!("Failed to parse users.list: {}", e)))?;
    if !response.ok {
        return Err(RotaError::directory(format!(
            "users.list returned error: {}",
            response.error.unwrap_or_else(|| "unknown".to_string())
        )));
    }
    Ok(response.members.into_iter().map(DirectoryUser::from).collect())
}

/// Posts messages as the bot with `chat.postMessage`.
pub struct SlackSender {
    client: Client,
    token: SecretString,
    base_url: String,
}

impl SlackSender {
    pub fn new(config: &SlackConfig) -> RotaResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            token: token_from(config.bot_token.as_ref(), "SLACK_BOT_TOKEN")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl MessageSender for SlackSender {
    async fn send_text(&self, channel: &str, text: &str) -> RotaResult<()> {
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|e| RotaError::transport(format!("chat.postMessage request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RotaError::transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(RotaError::transport(format!(
                "chat.postMessage error ({}): {}",
                status, body
            )));
        }

        check_post_response(&body)?;
        info!(channel, "Message sent");
        Ok(())
    }
}

fn check_post_response(body: &str) -> RotaResult<()> {
    let response: PostMessageResponse = serde_json::from_str(body)
        .map_err(|e| RotaError::transport(format!("Failed to parse chat.postMessage: {}", e)))?;
    if response.ok {
        Ok(())
    } else {
        Err(RotaError::transport(format!(
            "chat.postMessage returned error: {}",
            response.error.unwrap_or_else(|| "unknown".to_string())
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users_prefers_real_name() {
        let body = r#"{
            "ok": true,
            "members": [
                {"id": "U1", "name": "alice", "real_name": "Alice Smith"},
                {"id": "U2", "name": "bob"},
                {"id": "U3", "name": "carol", "real_name": ""}
            ]
        }"#;
        let users = parse_users(body).unwrap();
        assert_eq!(
            users,
            vec![
                DirectoryUser::new("U1", "Alice Smith"),
                DirectoryUser::new("U2", "bob"),
                DirectoryUser::new("U3", "carol"),
            ]
        );
    }

    #[test]
    fn test_parse_users_not_ok() {
        let err = parse_users(r#"{"ok": false, "error": "invalid_auth"}"#).unwrap_err();
        assert!(matches!(err, RotaError::DirectoryUnavailable { .. }));
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[test]
    fn test_post_response() {
        assert!(check_post_response(r#"{"ok": true, "ts": "1.0"}"#).is_ok());
        let err = check_post_response(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap_err();
        assert!(matches!(err, RotaError::Transport { .. }));
    }

    #[test]
    fn test_post_request_shape() {
        let json = serde_json::to_value(PostMessageRequest {
            channel: "C1",
            text: "hi",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"channel": "C1", "text": "hi"}));
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_unavailable() {
        let config = SlackConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: Some("xoxp".to_string()),
            timeout_secs: 2,
            ..Default::default()
        };
        let directory = SlackDirectory::new(&config).unwrap();
        let err = directory.list_users().await.unwrap_err();
        assert!(matches!(err, RotaError::DirectoryUnavailable { .. }));
    }
}
