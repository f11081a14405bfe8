//! Delivery of contact messages through a hosted mail relay.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{ContactPayload, RelaySendRequest};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";
/// Upper bound on one delivery attempt, connect included.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Identifiers the relay needs to pick the outgoing service and template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayCredentials {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay endpoint is not a valid url: {0}")]
    InvalidEndpoint(String),
    #[error("relay credentials are incomplete: missing {0}")]
    MissingCredential(&'static str),
    #[error("relay timeout must be greater than zero")]
    ZeroTimeout,
    #[error("failed to build relay http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn deliver(&self, payload: &ContactPayload) -> anyhow::Result<()>;
}

pub struct HttpMailRelay {
    http: Client,
    endpoint: Url,
    credentials: RelayCredentials,
}

impl HttpMailRelay {
    pub fn new(credentials: RelayCredentials) -> Result<Self, RelayError> {
        Self::with_endpoint(DEFAULT_RELAY_ENDPOINT, credentials)
    }

    pub fn with_endpoint(endpoint: &str, credentials: RelayCredentials) -> Result<Self, RelayError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| RelayError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RelayError::InvalidEndpoint(endpoint.to_string()));
        }
        for (name, value) in [
            ("service_id", &credentials.service_id),
            ("template_id", &credentials.template_id),
            ("user_id", &credentials.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(RelayError::MissingCredential(name));
            }
        }
        Ok(Self {
            http: build_client(DEFAULT_RELAY_TIMEOUT)?,
            endpoint,
            credentials,
        })
    }

    /// Replaces the per-request timeout. A relay that accepts the connection
    /// but never answers fails the delivery once it elapses.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, RelayError> {
        self.http = build_client(timeout)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn build_client(timeout: Duration) -> Result<Client, RelayError> {
    if timeout.is_zero() {
        return Err(RelayError::ZeroTimeout);
    }
    let client = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .build()?;
    Ok(client)
}

#[async_trait]
impl MailRelay for HttpMailRelay {
    async fn deliver(&self, payload: &ContactPayload) -> anyhow::Result<()> {
        let request = RelaySendRequest::new(
            &self.credentials.service_id,
            &self.credentials.template_id,
            &self.credentials.user_id,
            payload,
        );
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("failed to reach mail relay at {}", self.endpoint))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "relay: message rejected");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        info!(
            service_id = %self.credentials.service_id,
            template_id = %self.credentials.template_id,
            "relay: message accepted"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
