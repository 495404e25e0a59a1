use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

/// Terminal value of a failed pipeline run.
///
/// `Display` is the caller-visible message and [`PipelineError::status`] the
/// caller-visible status code.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{header} header is required")]
    MissingCredential { header: &'static str },

    #[error("Invalid database name: {name}")]
    InvalidStoreName { name: String },

    #[error("The database {name} does not exist")]
    StoreNotFound { name: String },

    #[error("{message}")]
    IdentityResolutionFailed { status: StatusCode, message: String },

    #[error("Checking for existence of user {customer_id} failed with {status}")]
    UserLookupFailed {
        status: StatusCode,
        customer_id: String,
    },

    #[error("{body}")]
    UserProvisioningFailed { status: StatusCode, body: String },

    // upstream detail is dropped on purpose, the gateway error may describe store internals
    #[error("Creating session was not successful")]
    SessionCreationFailed { status: StatusCode },

    #[error("{context}")]
    TransportUnreachable { context: String },
}

impl PipelineError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential { .. }
            | Self::InvalidStoreName { .. }
            | Self::TransportUnreachable { .. } => StatusCode::BAD_REQUEST,
            Self::StoreNotFound { .. } => StatusCode::NOT_FOUND,
            Self::IdentityResolutionFailed { status, .. }
            | Self::UserLookupFailed { status, .. }
            | Self::UserProvisioningFailed { status, .. }
            | Self::SessionCreationFailed { status } => mirror_status(*status),
        }
    }

    /// No response at all: connection refused, timeout, or a body that could not be read.
    pub fn transport(context: impl Into<String>, err: &reqwest::Error) -> Self {
        let context = context.into();
        debug!(timeout = err.is_timeout(), "{context}: {err}");
        Self::TransportUnreachable { context }
    }

    /// The identity provider answered with a non-success status.
    #[must_use]
    pub fn identity_rejected(status: StatusCode, body: &str) -> Self {
        Self::IdentityResolutionFailed {
            status,
            message: format!("Identity provider responded {status}: {body}"),
        }
    }

    /// The identity provider answered, but the body did not carry a customer id.
    #[must_use]
    pub fn identity_malformed(body: &str) -> Self {
        Self::IdentityResolutionFailed {
            status: StatusCode::BAD_REQUEST,
            message: format!("Data: {body}"),
        }
    }

    #[must_use]
    pub fn user_provisioning(status: StatusCode, body: String) -> Self {
        let body = if body.trim().is_empty() {
            "Creating user was not successful".to_string()
        } else {
            body
        };
        Self::UserProvisioningFailed { status, body }
    }
}

/// Mirror upstream error statuses; anything else that still counts as a
/// failure collapses to `400 Bad Request`.
#[must_use]
pub fn mirror_status(upstream: StatusCode) -> StatusCode {
    if upstream.is_client_error() || upstream.is_server_error() {
        upstream
    } else {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
