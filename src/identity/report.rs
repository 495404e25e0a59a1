use super::CustomerId;
use crate::{
    credential::{AUTHORIZATION, Credential, SECURE_TOKEN},
    pipeline::PipelineError,
};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VolumeReport {
    customer_id: Option<Value>,
}

/// Resolves customers through the volume report endpoint.
#[derive(Debug, Clone)]
pub struct ReportClient {
    client: reqwest::Client,
    url: Url,
}

impl ReportClient {
    #[must_use]
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// `GET <report url>` with both credential headers.
    ///
    /// # Errors
    /// Returns `TransportUnreachable` without a response, `IdentityResolutionFailed`
    /// with the upstream status for non-success responses, or with `400` and the
    /// raw body when the report carries no `customerId`.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn resolve(&self, credential: &Credential) -> Result<CustomerId, PipelineError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(AUTHORIZATION, credential.authorization())
            .header(SECURE_TOKEN, credential.secure_token())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| PipelineError::transport("No response resolving customer identity", &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| PipelineError::transport("No response resolving customer identity", &err))?;

        debug!(%status, "volume report response");

        if !status.is_success() {
            return Err(PipelineError::identity_rejected(status, &body));
        }

        customer_id_from_report(&body).ok_or_else(|| PipelineError::identity_malformed(&body))
    }
}

fn customer_id_from_report(body: &str) -> Option<CustomerId> {
    let report: VolumeReport = serde_json::from_str(body).ok()?;
    CustomerId::from_json(&report.customer_id?)
}
