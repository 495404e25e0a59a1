use crate::{
    credential::Credential,
    pipeline::{PipelineError, Session, SessionPipeline},
};
use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/session/{db}",
    params(
        ("db" = String, Path, description = "Gateway database name"),
        ("Authorization" = String, Header, description = "Vendor authorization token"),
        ("SecureToken" = String, Header, description = "Vendor secure token"),
    ),
    responses (
        (status = 200, description = "Gateway session payload, forwarded verbatim"),
        (status = 400, description = "Missing credential header, invalid database name, or identity resolution failure", body = String),
        (status = 404, description = "Database does not exist", body = String),
    ),
    tag = "session",
)]
/// Exchange vendor credentials for a gateway session on database `db`.
#[instrument(skip_all, fields(db = %db))]
pub async fn session(
    Path(db): Path<String>,
    headers: HeaderMap,
    pipeline: Extension<Arc<SessionPipeline>>,
) -> Result<Session, PipelineError> {
    // credentials are checked before anything leaves the process
    let credential = Credential::from_headers(&headers)?;

    pipeline.run(&db, &credential).await
}
