//! Bucket flush proxy for operational maintenance.

use crate::{gateway::valid_store_name, pipeline::mirror_status};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct BucketAdminConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("Invalid bucket name: {name}")]
    InvalidBucketName { name: String },

    #[error("{body}")]
    Rejected { status: StatusCode, body: String },

    #[error("No response flushing bucket {bucket}")]
    Unreachable { bucket: String },
}

impl FlushError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBucketName { .. } | Self::Unreachable { .. } => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => mirror_status(*status),
        }
    }
}

impl IntoResponse for FlushError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct BucketAdmin {
    client: reqwest::Client,
    config: BucketAdminConfig,
}

impl BucketAdmin {
    #[must_use]
    pub fn new(client: reqwest::Client, config: BucketAdminConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn flush_url(&self, bucket: &str) -> Url {
        let mut url = self.config.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "pools",
                "default",
                "buckets",
                bucket,
                "controller",
                "doFlush",
            ]);
        }
        url
    }

    /// `POST <admin>/pools/default/buckets/<bucket>/controller/doFlush`
    ///
    /// # Errors
    /// Returns `FlushError` for invalid names, missing responses, or non-success statuses.
    #[instrument(skip(self))]
    pub async fn flush(&self, bucket: &str) -> Result<(), FlushError> {
        if !valid_store_name(bucket) {
            return Err(FlushError::InvalidBucketName {
                name: bucket.to_string(),
            });
        }

        let mut request = self.client.post(self.flush_url(bucket));
        if let Some(username) = &self.config.username {
            request = request.basic_auth(
                username,
                self.config
                    .password
                    .as_ref()
                    .map(|password| password.expose_secret().to_string()),
            );
        }

        let unreachable = |err: reqwest::Error| {
            debug!(timeout = err.is_timeout(), "flush request failed: {err}");
            FlushError::Unreachable {
                bucket: bucket.to_string(),
            }
        };

        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let body = response.text().await.map_err(unreachable)?;

        if status.is_success() {
            info!("Bucket {bucket} flushed");
            Ok(())
        } else {
            warn!(%status, "Flushing bucket {bucket} failed");
            Err(FlushError::Rejected { status, body })
        }
    }
}
