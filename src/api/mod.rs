use crate::{bucket::BucketAdmin, pipeline::SessionPipeline};
use anyhow::Result;
use axum::{
    Extension,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, debug_span, info};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

mod handlers;
mod openapi;

pub use self::openapi::openapi;

const REQUEST_ID: &str = "x-request-id";

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Wire the documented routes with request-id, tracing and the shared clients.
#[must_use]
pub fn app(pipeline: Arc<SessionPipeline>, bucket_admin: Arc<BucketAdmin>) -> axum::Router {
    let (router, _openapi) = router().split_for_parts();

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(pipeline))
            .layer(Extension(bucket_admin)),
    )
}

/// Serve the API on `[::]:port` until SIGINT or SIGTERM.
/// # Errors
/// Returns an error if the listener cannot be bound or the server fails
pub async fn new(
    port: u16,
    pipeline: Arc<SessionPipeline>,
    bucket_admin: Arc<BucketAdmin>,
) -> Result<()> {
    let app = app(pipeline, bucket_admin);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            info!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                info!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

// span, credential headers stay out of it
fn make_span(request: &Request<Body>) -> Span {
    let method = request.method().as_str();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, uri = %request.uri(), request_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        bucket::BucketAdminConfig,
        gateway::{GatewayClient, GatewayConfig},
        identity::{IdentityProvider, IdentityStrategy},
    };
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use url::Url;

    fn offline_app() -> axum::Router {
        let client = reqwest::Client::new();
        let config = GatewayConfig {
            scheme: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: 4985,
        };
        let pipeline = SessionPipeline::new(
            GatewayClient::new(client.clone(), &config).unwrap(),
            IdentityProvider::new(
                client.clone(),
                IdentityStrategy::Report {
                    url: Url::parse("http://127.0.0.1:9/report").unwrap(),
                },
            ),
        );
        let bucket_admin = BucketAdmin::new(
            client,
            BucketAdminConfig {
                url: Url::parse("http://127.0.0.1:8091").unwrap(),
                username: None,
                password: None,
            },
        );
        app(Arc::new(pipeline), Arc::new(bucket_admin))
    }

    #[tokio::test]
    async fn request_id_is_kept_when_present() {
        let response = offline_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID, "01HZZZZZZZZZZZZZZZZZZZZZZZ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID)
                .and_then(|v| v.to_str().ok()),
            Some("01HZZZZZZZZZZZZZZZZZZZZZZZ")
        );
    }

    #[tokio::test]
    async fn request_id_is_generated() {
        let response = offline_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let request_id = response
            .headers()
            .get(REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(Ulid::from_string(request_id).is_ok());
    }

    #[tokio::test]
    async fn session_requires_post() {
        let response = offline_app()
            .oneshot(
                Request::builder()
                    .uri("/session/catalog")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
