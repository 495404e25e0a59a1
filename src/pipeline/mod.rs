//! Session provisioning pipeline.
//!
//! A run walks a fixed sequence of stages, each consuming the previous stage's
//! output. The first failing stage ends the run with its [`PipelineError`];
//! nothing is retried.
//!
//! ```text
//! VerifyStoreExists -> ResolveCustomerIdentity -> CheckUserExists
//!     -> ProvisionUserIfAbsent -> CreateSession -> Session
//! ```

mod error;

pub use self::error::{PipelineError, mirror_status};

use crate::{
    credential::Credential,
    gateway::{GatewayClient, valid_store_name},
    identity::{CustomerId, IdentityProvider},
};
use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

/// Gateway session payload, passed to the caller untouched.
#[derive(Debug, Clone)]
pub struct Session {
    content_type: Option<HeaderValue>,
    body: Bytes,
}

impl Session {
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }
}

impl IntoResponse for Session {
    fn into_response(self) -> Response {
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        (StatusCode::OK, [(CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

/// Outcome of the user lookup; a `404` is `Absent`, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserExistence {
    Present,
    Absent,
}

#[derive(Debug)]
enum Stage {
    VerifyStoreExists,
    ResolveCustomerIdentity,
    CheckUserExists(CustomerId),
    ProvisionUserIfAbsent(CustomerId, UserExistence),
    CreateSession(CustomerId),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Self::VerifyStoreExists => "verify_store_exists",
            Self::ResolveCustomerIdentity => "resolve_customer_identity",
            Self::CheckUserExists(_) => "check_user_exists",
            Self::ProvisionUserIfAbsent(..) => "provision_user_if_absent",
            Self::CreateSession(_) => "create_session",
        }
    }
}

enum Transition {
    Next(Stage),
    Done(Session),
}

#[derive(Debug, Clone)]
pub struct SessionPipeline {
    gateway: GatewayClient,
    identity: IdentityProvider,
}

impl SessionPipeline {
    #[must_use]
    pub fn new(gateway: GatewayClient, identity: IdentityProvider) -> Self {
        Self { gateway, identity }
    }

    /// Turn a validated credential into a gateway session for database `db`.
    ///
    /// # Errors
    /// Returns the `PipelineError` of the first stage that fails.
    #[instrument(skip(self, credential), fields(identity = self.identity.name()))]
    pub async fn run(&self, db: &str, credential: &Credential) -> Result<Session, PipelineError> {
        if !valid_store_name(db) {
            return Err(PipelineError::InvalidStoreName {
                name: db.to_string(),
            });
        }

        let mut stage = Stage::VerifyStoreExists;
        loop {
            let name = stage.name();
            debug!(stage = name, "pipeline stage");

            let transition = self
                .advance(db, credential, stage)
                .await
                .inspect_err(|err| warn!(stage = name, status = %err.status(), "{err}"))?;

            stage = match transition {
                Transition::Next(next) => next,
                Transition::Done(session) => return Ok(session),
            };
        }
    }

    async fn advance(
        &self,
        db: &str,
        credential: &Credential,
        stage: Stage,
    ) -> Result<Transition, PipelineError> {
        match stage {
            Stage::VerifyStoreExists => {
                self.verify_store_exists(db).await?;
                Ok(Transition::Next(Stage::ResolveCustomerIdentity))
            }
            Stage::ResolveCustomerIdentity => {
                let customer_id = self.identity.resolve(credential).await?;
                Ok(Transition::Next(Stage::CheckUserExists(customer_id)))
            }
            Stage::CheckUserExists(customer_id) => {
                let existence = self.check_user_exists(db, &customer_id).await?;
                Ok(Transition::Next(Stage::ProvisionUserIfAbsent(
                    customer_id,
                    existence,
                )))
            }
            Stage::ProvisionUserIfAbsent(customer_id, existence) => {
                if existence == UserExistence::Absent {
                    self.provision_user(db, &customer_id).await?;
                }
                Ok(Transition::Next(Stage::CreateSession(customer_id)))
            }
            Stage::CreateSession(customer_id) => self
                .create_session(db, &customer_id)
                .await
                .map(Transition::Done),
        }
    }

    async fn verify_store_exists(&self, db: &str) -> Result<(), PipelineError> {
        let reply = self.gateway.probe_database(db).await.map_err(|err| {
            PipelineError::transport("No response checking for database existence", &err)
        })?;

        if reply.status.is_success() {
            Ok(())
        } else {
            Err(PipelineError::StoreNotFound {
                name: db.to_string(),
            })
        }
    }

    async fn check_user_exists(
        &self,
        db: &str,
        customer_id: &CustomerId,
    ) -> Result<UserExistence, PipelineError> {
        let reply = self
            .gateway
            .get_user(db, customer_id.as_str())
            .await
            .map_err(|err| {
                PipelineError::transport(
                    format!("Got no response checking for existence of user {customer_id}"),
                    &err,
                )
            })?;

        if reply.status.is_success() {
            Ok(UserExistence::Present)
        } else if reply.status == StatusCode::NOT_FOUND {
            Ok(UserExistence::Absent)
        } else {
            Err(PipelineError::UserLookupFailed {
                status: reply.status,
                customer_id: customer_id.to_string(),
            })
        }
    }

    async fn provision_user(&self, db: &str, customer_id: &CustomerId) -> Result<(), PipelineError> {
        info!("{customer_id} does not exist, trying to create");

        let reply = self
            .gateway
            .put_user(db, customer_id.as_str())
            .await
            .map_err(|err| PipelineError::transport("Got no response trying to create user", &err))?;

        info!(status = %reply.status, "Create user {customer_id}");

        if reply.status.is_success() {
            Ok(())
        } else {
            Err(PipelineError::user_provisioning(reply.status, reply.text()))
        }
    }

    async fn create_session(
        &self,
        db: &str,
        customer_id: &CustomerId,
    ) -> Result<Session, PipelineError> {
        let reply = self
            .gateway
            .create_session(db, customer_id.as_str())
            .await
            .map_err(|err| {
                PipelineError::transport("Got no response trying to create session", &err)
            })?;

        if reply.status.is_success() {
            Ok(Session {
                content_type: reply.content_type,
                body: reply.body,
            })
        } else {
            Err(PipelineError::SessionCreationFailed {
                status: reply.status,
            })
        }
    }
}

#[cfg(test)]
mod tests;
