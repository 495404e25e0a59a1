//! Identity provider clients.
//!
//! Vendor credentials are resolved to a [`CustomerId`] by one of two
//! interchangeable strategies, picked once per deployment:
//!
//! - [`report::ReportClient`]: REST lookup of the current volume report.
//! - [`rpc::RpcClient`]: `getCustomer` call encoded as a positional JSON frame.

pub mod report;
pub mod rpc;

use crate::{credential::Credential, pipeline::PipelineError};
use serde_json::Value;
use std::fmt;
use url::Url;

/// Opaque, non-empty customer key shared by the identity provider and the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId(String);

impl CustomerId {
    /// Returns `None` for empty or whitespace-only identifiers.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Accept both numeric and string ids; numbers are stringified as-is.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) => Self::new(id.as_str()),
            Value::Number(id) => Self::new(id.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment-time choice of identity resolution protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityStrategy {
    Report { url: Url },
    Rpc { url: Url, version: u32 },
}

impl IdentityStrategy {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Report { .. } => "report",
            Self::Rpc { .. } => "rpc",
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            Self::Report { url } | Self::Rpc { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IdentityProvider {
    Report(report::ReportClient),
    Rpc(rpc::RpcClient),
}

impl IdentityProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, strategy: IdentityStrategy) -> Self {
        match strategy {
            IdentityStrategy::Report { url } => Self::Report(report::ReportClient::new(client, url)),
            IdentityStrategy::Rpc { url, version } => {
                Self::Rpc(rpc::RpcClient::new(client, url, version))
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::Rpc(_) => "rpc",
        }
    }

    /// Resolve the credential to a customer id.
    ///
    /// # Errors
    /// `TransportUnreachable` when the provider gave no response,
    /// `IdentityResolutionFailed` for any other failure.
    pub async fn resolve(&self, credential: &Credential) -> Result<CustomerId, PipelineError> {
        match self {
            Self::Report(client) => client.resolve(credential).await,
            Self::Rpc(client) => client.resolve(credential).await,
        }
    }
}
