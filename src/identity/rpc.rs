//! `getCustomer` over a JSON-encoded RPC envelope.
//!
//! Request frame: `[version, "getCustomer", seq, seq, {"1":{"rec":{"1":{"string": <secure token>}}}}]`,
//! field `1` of the argument struct is a record whose field `1` is the token.
//!
//! Reply frame: `[version, "getCustomer", type, seq, <result>]` where `<result>`
//! is either the result struct itself or a single numeric field id wrapping it:
//!
//! ```text
//! {"success": {"customer": {"id": 78867}}}
//! {"1": {"success": {"customer": {"id": 78867}}}}
//! ```
//!
//! Anything without `success` is a failure reply.

use super::CustomerId;
use crate::{
    credential::{AUTHORIZATION, Credential},
    pipeline::PipelineError,
};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, de::IgnoredAny};
use serde_json::{Map, Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

pub const GET_CUSTOMER: &str = "getCustomer";
const SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcReply {
    Success { customer: CustomerId },
    Failure { message: String },
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("reply is not a five element call frame: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("reply answers {0}, expected getCustomer")]
    Method(String),
    #[error("reply result is not a struct")]
    NotAStruct,
    #[error("success reply carries no success.customer.id")]
    MissingCustomer,
}

#[derive(Deserialize)]
struct ReplyFrame(IgnoredAny, String, IgnoredAny, IgnoredAny, Value);

/// Encode a `getCustomer` call frame.
#[must_use]
pub fn call_frame(version: u32, seq: u32, secure_token: &str) -> Value {
    json!([
        version,
        GET_CUSTOMER,
        seq,
        seq,
        {"1": {"rec": {"1": {"string": secure_token}}}}
    ])
}

/// Decode a `getCustomer` reply frame.
///
/// # Errors
/// Returns `FrameError` when the body is not a five element frame for
/// `getCustomer`, the result is not a struct, or a success reply has no
/// customer id.
pub fn decode_reply(body: &str) -> Result<RpcReply, FrameError> {
    let ReplyFrame(_, method, _, _, result) = serde_json::from_str(body)?;
    if method != GET_CUSTOMER {
        return Err(FrameError::Method(method));
    }

    let Value::Object(fields) = result else {
        return Err(FrameError::NotAStruct);
    };
    let fields = unwrap_field_id(fields);

    match fields.get(SUCCESS) {
        Some(success) => success
            .get("customer")
            .and_then(|customer| customer.get("id"))
            .and_then(CustomerId::from_json)
            .map(|customer| RpcReply::Success { customer })
            .ok_or(FrameError::MissingCustomer),
        None => Ok(RpcReply::Failure {
            message: Value::Object(fields).to_string(),
        }),
    }
}

fn unwrap_field_id(fields: Map<String, Value>) -> Map<String, Value> {
    let wrapped = fields.len() == 1
        && fields
            .iter()
            .all(|(key, value)| key.parse::<u16>().is_ok() && value.is_object());
    if !wrapped {
        return fields;
    }

    match fields.into_iter().next() {
        Some((_, Value::Object(inner))) => inner,
        _ => Map::new(),
    }
}

/// Resolves customers through the RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
    version: u32,
    seq: Arc<AtomicU32>,
}

impl RpcClient {
    #[must_use]
    pub fn new(client: reqwest::Client, url: Url, version: u32) -> Self {
        Self {
            client,
            url,
            version,
            seq: Arc::new(AtomicU32::new(1)),
        }
    }

    fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// `POST <rpc url>` with a `getCustomer` frame, authenticated by `Authorization` only.
    ///
    /// # Errors
    /// Returns `TransportUnreachable` without a response, `IdentityResolutionFailed`
    /// with the upstream status for non-success responses, or with `400` and the
    /// raw body for any frame that is not a successful customer reply.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn resolve(&self, credential: &Credential) -> Result<CustomerId, PipelineError> {
        let seq = self.next_seq();
        let frame = call_frame(self.version, seq, credential.secure_token());

        let response = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, credential.authorization())
            .header(CONTENT_TYPE, "application/json")
            .body(frame.to_string())
            .send()
            .await
            .map_err(|err| PipelineError::transport("No response resolving customer identity", &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| PipelineError::transport("No response resolving customer identity", &err))?;

        debug!(%status, seq, "getCustomer response");

        if !status.is_success() {
            return Err(PipelineError::identity_rejected(status, &body));
        }

        match decode_reply(&body) {
            Ok(RpcReply::Success { customer }) => Ok(customer),
            Ok(RpcReply::Failure { message }) => {
                warn!("getCustomer failed: {message}");
                Err(PipelineError::identity_malformed(&body))
            }
            Err(err) => {
                warn!("getCustomer reply rejected: {err}");
                Err(PipelineError::identity_malformed(&body))
            }
        }
    }
}
