//! Inbound credential validation.
//!
//! Both headers must be present and non-blank before any upstream call is made.
//! Validation stops at the first missing header, `Authorization` first.

use crate::pipeline::PipelineError;
use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

pub const AUTHORIZATION: &str = "Authorization";
pub const SECURE_TOKEN: &str = "SecureToken";

/// Vendor credentials for a single request.
#[derive(Clone)]
pub struct Credential {
    authorization: SecretString,
    secure_token: SecretString,
}

impl Credential {
    #[must_use]
    pub fn new(authorization: impl Into<String>, secure_token: impl Into<String>) -> Self {
        Self {
            authorization: SecretString::from(authorization.into()),
            secure_token: SecretString::from(secure_token.into()),
        }
    }

    /// Extract the credential from inbound request headers.
    ///
    /// # Errors
    /// Returns `PipelineError::MissingCredential` naming the first header that
    /// is missing, blank, or not valid visible ASCII.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, PipelineError> {
        let authorization = required_header(headers, AUTHORIZATION)?;
        let secure_token = required_header(headers, SECURE_TOKEN)?;

        Ok(Self::new(authorization, secure_token))
    }

    #[must_use]
    pub fn authorization(&self) -> &str {
        self.authorization.expose_secret()
    }

    #[must_use]
    pub fn secure_token(&self) -> &str {
        self.secure_token.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("authorization", &"***")
            .field("secure_token", &"***")
            .finish()
    }
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, PipelineError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or(PipelineError::MissingCredential { header: name })
}
