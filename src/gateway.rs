//! Datastore gateway client.
//!
//! Thin transport over the gateway admin API. Every call returns the raw
//! [`Reply`]; deciding what a status means is left to the pipeline.
//!
//! All endpoints hang off `<scheme>://<host>:<port>/<db>/`.

use anyhow::{Result, anyhow};
use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use bytes::Bytes;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

/// Channel granted to every provisioned user, suffixed with the customer id.
pub const USER_CHANNEL_PREFIX: &str = "user-";

const MAX_STORE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    /// Base URL of the gateway admin API, always ending in `/`.
    ///
    /// # Errors
    /// Returns an error if the scheme is not http(s) or the host is not valid.
    pub fn base_url(&self) -> Result<Url> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(anyhow!(
                "invalid gateway scheme {}: expected http or https",
                self.scheme
            ));
        }

        let url = Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("invalid gateway host: {}", self.host));
        }

        Ok(url)
    }
}

/// Database and bucket names accepted before anything is sent upstream.
pub fn valid_store_name(name: &str) -> bool {
    name.len() <= MAX_STORE_NAME_LEN
        && Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.%$()+-]*$").is_ok_and(|re| re.is_match(name))
}

/// Status, content type and body of a gateway response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl Reply {
    async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        debug!(%status, bytes = body.len(), "gateway reply");

        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Body of the user provisioning `PUT`.
#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub admin_channels: Vec<String>,
}

impl<'a> NewUser<'a> {
    #[must_use]
    pub fn for_customer(customer_id: &'a str) -> Self {
        Self {
            name: customer_id,
            admin_channels: vec![format!("{USER_CHANNEL_PREFIX}{customer_id}")],
        }
    }
}

#[derive(Serialize, Debug)]
struct SessionRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    /// # Errors
    /// Returns an error if the configuration does not yield a usable base URL.
    pub fn new(client: reqwest::Client, config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            client,
            base_url: config.base_url()?,
        })
    }

    /// `<base>/<db>/` followed by `tail`, each pushed as an escaped path segment.
    #[must_use]
    pub fn endpoint(&self, db: &str, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // base_url is validated as http(s), so it always has path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(db).extend(tail);
        }
        url
    }

    /// `GET <base>/<db>/`
    ///
    /// # Errors
    /// Returns the transport error when no response was received.
    #[instrument(skip(self))]
    pub async fn probe_database(&self, db: &str) -> reqwest::Result<Reply> {
        let response = self.client.get(self.endpoint(db, &[""])).send().await?;
        Reply::read(response).await
    }

    /// `GET <base>/<db>/_user/<customer_id>`
    ///
    /// # Errors
    /// Returns the transport error when no response was received.
    #[instrument(skip(self))]
    pub async fn get_user(&self, db: &str, customer_id: &str) -> reqwest::Result<Reply> {
        let response = self
            .client
            .get(self.endpoint(db, &["_user", customer_id]))
            .send()
            .await?;
        Reply::read(response).await
    }

    /// `PUT <base>/<db>/_user/<customer_id>`
    ///
    /// # Errors
    /// Returns the transport error when no response was received.
    #[instrument(skip(self))]
    pub async fn put_user(&self, db: &str, customer_id: &str) -> reqwest::Result<Reply> {
        let response = self
            .client
            .put(self.endpoint(db, &["_user", customer_id]))
            .json(&NewUser::for_customer(customer_id))
            .send()
            .await?;
        Reply::read(response).await
    }

    /// `POST <base>/<db>/_session`
    ///
    /// # Errors
    /// Returns the transport error when no response was received.
    #[instrument(skip(self))]
    pub async fn create_session(&self, db: &str, customer_id: &str) -> reqwest::Result<Reply> {
        let response = self
            .client
            .post(self.endpoint(db, &["_session"]))
            .json(&SessionRequest { name: customer_id })
            .send()
            .await?;
        Reply::read(response).await
    }
}
