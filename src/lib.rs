//! # Portero (Session Bridge)
//!
//! `portero` turns vendor credentials into datastore gateway sessions. A client
//! calls `POST /session/{db}` with an `Authorization` token and a `SecureToken`;
//! the service resolves them to a stable customer identifier through the
//! identity provider, makes sure the datastore gateway knows a user with that
//! identifier and returns a freshly minted gateway session.
//!
//! ## Session Provisioning Pipeline
//!
//! The pipeline is a strict linear state machine, every step consuming the
//! previous step's output:
//!
//! 1. **Verify store exists:** `GET /{db}/` on the gateway.
//! 2. **Resolve customer identity:** report lookup or RPC envelope, chosen per deployment.
//! 3. **Check user exists:** `GET /{db}/_user/{id}`. A `404` is a branch, not a failure.
//! 4. **Provision user if absent:** `PUT /{db}/_user/{id}` with a personal `user-{id}` channel.
//! 5. **Create session:** `POST /{db}/_session`, payload forwarded verbatim.
//!
//! The first failing step terminates the run with a [`pipeline::PipelineError`]
//! whose status mirrors the upstream status where one exists.
//!
//! ## Known limitation
//!
//! Steps 3 and 4 are not protected against a concurrent run for the same
//! customer identifier. Two simultaneous first logins may both observe "absent"
//! and both issue the `PUT`; the gateway's own conflict semantics decide the
//! outcome.

pub mod api;
pub mod bucket;
pub mod cli;
pub mod credential;
pub mod gateway;
pub mod identity;
pub mod pipeline;
pub mod upstream;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
