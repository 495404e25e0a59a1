use crate::bucket::{BucketAdmin, FlushError};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/flush/{bucket}",
    params(
        ("bucket" = String, Path, description = "Bucket to flush"),
    ),
    responses (
        (status = 200, description = "Bucket flushed", body = String),
        (status = 400, description = "Invalid bucket name or no response from the bucket admin API", body = String),
    ),
    tag = "maintenance",
)]
/// Flush every document in `bucket`.
#[instrument(skip_all, fields(bucket = %bucket))]
pub async fn flush(
    Path(bucket): Path<String>,
    bucket_admin: Extension<Arc<BucketAdmin>>,
) -> Result<impl IntoResponse, FlushError> {
    bucket_admin.flush(&bucket).await?;

    Ok((StatusCode::OK, format!("Bucket {bucket} flushed")))
}
