// Copyright 2025 Cowboy AI, LLC.

//! NATS notification bus

use crate::notifications::Notification;
use crate::ports::Notifier;
use anyhow::Context;
use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur when working with NATS
#[derive(Debug, Error)]
pub enum NatsError {
    /// Failed to establish connection to NATS server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Configuration for NATS client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL (e.g., "nats://localhost:4222")
    pub url: String,

    /// Optional username for authentication
    pub user: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,

    /// Whether TLS is required
    pub tls_required: bool,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Reconnect interval in seconds
    pub reconnect_interval_secs: u64,

    /// Maximum reconnect attempts (0 = infinite)
    pub max_reconnects: usize,

    /// Prefix of every notification subject
    pub subject_prefix: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            user: None,
            password: None,
            tls_required: false,
            connection_timeout_secs: 10,
            reconnect_interval_secs: 5,
            max_reconnects: 0,
            subject_prefix: "assignments".to_string(),
        }
    }
}

impl NatsConfig {
    /// Defaults overlaid with `ASSIGNMENTS_NATS_*` environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("ASSIGNMENTS_NATS_URL") {
            config.url = url;
        }
        if let Some(user) = lookup("ASSIGNMENTS_NATS_USER") {
            config.user = Some(user);
        }
        if let Some(password) = lookup("ASSIGNMENTS_NATS_PASSWORD") {
            config.password = Some(password);
        }
        if let Some(prefix) = lookup("ASSIGNMENTS_NATS_SUBJECT_PREFIX") {
            config.subject_prefix = prefix;
        }
        if let Some(tls) = lookup("ASSIGNMENTS_NATS_TLS") {
            config.tls_required = tls
                .parse()
                .with_context(|| format!("ASSIGNMENTS_NATS_TLS must be true or false, got {tls:?}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot connect
    pub fn validate(&self) -> Result<(), NatsError> {
        if self.url.is_empty() {
            return Err(NatsError::ConfigurationError("url is empty".to_string()));
        }
        if self.user.is_some() != self.password.is_some() {
            return Err(NatsError::ConfigurationError(
                "user and password must be set together".to_string(),
            ));
        }
        Ok(())
    }

    /// Subject a notification event is published on
    pub fn subject_for(&self, event_name: &str) -> String {
        format!("{}.{}", self.subject_prefix, event_name.replace(':', "."))
    }
}

/// Connect to NATS with the provided configuration
pub async fn connect(config: &NatsConfig) -> Result<Client, NatsError> {
    let reconnect_interval = config.reconnect_interval_secs;
    let max_reconnects = config.max_reconnects;

    let mut options = ConnectOptions::new()
        .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
        .reconnect_delay_callback(move |attempts| {
            if max_reconnects > 0 && attempts >= max_reconnects {
                Duration::from_secs(0)
            } else {
                Duration::from_secs(reconnect_interval)
            }
        })
        .event_callback(|event| async move {
            match event {
                async_nats::Event::Disconnected => warn!("NATS disconnected"),
                async_nats::Event::Connected => info!("NATS connected"),
                async_nats::Event::ClientError(err) => warn!(error = %err, "NATS client error"),
                _ => {}
            }
        });

    if let (Some(user), Some(password)) = (&config.user, &config.password) {
        options = options.user_and_password(user.clone(), password.clone());
    }

    if config.tls_required {
        options = options.require_tls(true);
    }

    options
        .connect(&config.url)
        .await
        .map_err(|e| NatsError::ConnectionFailed(format!("Failed to connect to {}: {}", config.url, e)))
}

/// Publishes workflow notifications as JSON on NATS subjects
#[derive(Debug, Clone)]
pub struct NatsNotifier {
    client: Client,
    config: NatsConfig,
}

impl NatsNotifier {
    /// Wrap an existing client
    pub fn new(client: Client, config: NatsConfig) -> Self {
        Self { client, config }
    }

    /// Connect and wrap the client
    pub async fn connect(config: NatsConfig) -> Result<Self, NatsError> {
        config.validate()?;
        let client = connect(&config).await?;
        Ok(Self::new(client, config))
    }

    /// Get the configuration
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn publish(&self, notification: Notification) {
        let subject = self.config.subject_for(notification.event_name());
        let payload = match serde_json::to_vec(&notification.payload()) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                warn!(subject = %subject, error = %err, "notification not serializable, dropped");
                return;
            }
        };

        match self.client.publish(subject.clone(), payload).await {
            Ok(()) => debug!(subject = %subject, "notification published"),
            Err(err) => warn!(subject = %subject, error = %err, "notification publish failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.url, "nats://localhost:4222");
        assert_eq!(config.connection_timeout_secs, 10);
        assert_eq!(config.max_reconnects, 0);
        assert_eq!(config.subject_prefix, "assignments");
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            ("ASSIGNMENTS_NATS_URL", "nats://bus:4222"),
            ("ASSIGNMENTS_NATS_USER", "planner"),
            ("ASSIGNMENTS_NATS_PASSWORD", "secret"),
            ("ASSIGNMENTS_NATS_SUBJECT_PREFIX", "newsroom"),
            ("ASSIGNMENTS_NATS_TLS", "true"),
        ]
        .into_iter()
        .collect();

        let config = NatsConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.url, "nats://bus:4222");
        assert_eq!(config.user.as_deref(), Some("planner"));
        assert_eq!(config.subject_prefix, "newsroom");
        assert!(config.tls_required);
    }

    #[test]
    fn test_env_rejects_bad_tls_flag() {
        let err = NatsConfig::from_lookup(|k| {
            (k == "ASSIGNMENTS_NATS_TLS").then(|| "sometimes".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("ASSIGNMENTS_NATS_TLS"));
    }

    #[test]
    fn test_user_without_password_is_invalid() {
        let config = NatsConfig {
            user: Some("planner".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(NatsError::ConfigurationError(_))));
    }

    #[test]
    fn test_subject_mapping() {
        let config = NatsConfig::default();
        assert_eq!(config.subject_for("assignments:updated"), "assignments.assignments.updated");
        assert_eq!(config.subject_for("content:link"), "assignments.content.link");
    }

    #[tokio::test]
    #[ignore] // Requires running NATS server
    async fn test_publish_against_live_server() {
        let notifier = NatsNotifier::connect(NatsConfig::default()).await.unwrap();
        notifier
            .publish(Notification::ContentUpdated { items: vec![] })
            .await;
    }
}
