#![allow(clippy::unwrap_used)]

use super::*;
use crate::{
    gateway::GatewayConfig,
    identity::IdentityStrategy,
};
use serde_json::json;
use std::{net::TcpListener, time::Duration};
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PAYLOAD: &str =
    r#"{"session_id":"2c9d2a0e","expires":"2026-10-19T10:00:00Z","cookie_name":"SyncGatewaySession"}"#;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn gateway_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        scheme: "http".to_string(),
        host: server.address().ip().to_string(),
        port: server.address().port(),
    }
}

fn report_strategy(server: &MockServer) -> IdentityStrategy {
    IdentityStrategy::Report {
        url: Url::parse(&format!("{}/rest/volumeReport/current", server.uri())).unwrap(),
    }
}

fn pipeline(gateway: &GatewayConfig, identity: IdentityStrategy) -> SessionPipeline {
    pipeline_with_client(reqwest::Client::new(), gateway, identity)
}

fn pipeline_with_client(
    client: reqwest::Client,
    gateway: &GatewayConfig,
    identity: IdentityStrategy,
) -> SessionPipeline {
    SessionPipeline::new(
        GatewayClient::new(client.clone(), gateway).unwrap(),
        IdentityProvider::new(client, identity),
    )
}

fn credential() -> Credential {
    Credential::new("Bearer abc", "s3cr3t")
}

async fn mount_store(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_report(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/rest/volumeReport/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"customerId": 78867})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_user_lookup(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/catalog/_user/78867"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_provisioning(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("PUT"))
        .and(path("/catalog/_user/78867"))
        .and(body_json(
            json!({"name": "78867", "admin_channels": ["user-78867"]}),
        ))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/catalog/_session"))
        .and(body_json(json!({"name": "78867"})))
        .respond_with(ResponseTemplate::new(status).set_body_raw(SESSION_PAYLOAD, "application/json"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn absent_user_is_provisioned_then_session_created() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 1).await;
    mount_user_lookup(&gateway, 404).await;
    mount_provisioning(&gateway, 201, 1).await;
    mount_session(&gateway, 200, 1).await;

    let session = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap();

    assert_eq!(session.body().as_ref(), SESSION_PAYLOAD.as_bytes());
    assert_eq!(
        session.content_type(),
        Some(&HeaderValue::from_static("application/json"))
    );
}

#[tokio::test]
async fn present_user_skips_provisioning() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 1).await;
    mount_user_lookup(&gateway, 200).await;
    mount_provisioning(&gateway, 201, 0).await;
    mount_session(&gateway, 200, 1).await;

    let result = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn repeated_runs_create_independent_sessions() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 2).await;
    mount_user_lookup(&gateway, 200).await;
    mount_provisioning(&gateway, 201, 0).await;
    mount_session(&gateway, 200, 2).await;

    let pipeline = pipeline(&gateway_config(&gateway), report_strategy(&identity));
    assert!(pipeline.run("catalog", &credential()).await.is_ok());
    assert!(pipeline.run("catalog", &credential()).await.is_ok());
}

#[tokio::test]
async fn missing_store_stops_before_identity() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 404).await;
    mount_report(&identity, 0).await;

    let err = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::StoreNotFound { .. }));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "The database catalog does not exist");
}

#[tokio::test]
async fn invalid_store_name_issues_no_calls() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gateway)
        .await;
    mount_report(&identity, 0).await;

    let err = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("not a name", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidStoreName { .. }));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_lookup_failure_is_not_treated_as_absent() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 1).await;
    mount_user_lookup(&gateway, 500).await;
    mount_provisioning(&gateway, 201, 0).await;
    mount_session(&gateway, 200, 0).await;

    let err = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UserLookupFailed { .. }));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.to_string().contains("78867"));
}

#[tokio::test]
async fn provisioning_failure_surfaces_upstream_body() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 1).await;
    mount_user_lookup(&gateway, 404).await;
    Mock::given(method("PUT"))
        .and(path("/catalog/_user/78867"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_raw(r#"{"error":"conflict","reason":"User exists"}"#, "application/json"),
        )
        .expect(1)
        .mount(&gateway)
        .await;
    mount_session(&gateway, 200, 0).await;

    let err = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::CONFLICT);
    assert_eq!(
        err.to_string(),
        r#"{"error":"conflict","reason":"User exists"}"#
    );
}

#[tokio::test]
async fn session_failure_hides_upstream_detail() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    mount_report(&identity, 1).await;
    mount_user_lookup(&gateway, 200).await;
    mount_session(&gateway, 503, 1).await;

    let err = pipeline(&gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::SessionCreationFailed { .. }));
    assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.to_string(), "Creating session was not successful");
}

#[tokio::test]
async fn rpc_strategy_resolves_numeric_id() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    Mock::given(method("POST"))
        .and(path("/rpc/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[1,"getCustomer",2,1,{"1":{"success":{"customer":{"id":78867}}}}]"#,
        ))
        .expect(1)
        .mount(&identity)
        .await;
    mount_user_lookup(&gateway, 404).await;
    mount_provisioning(&gateway, 201, 1).await;
    mount_session(&gateway, 200, 1).await;

    let strategy = IdentityStrategy::Rpc {
        url: Url::parse(&format!("{}/rpc/customer", identity.uri())).unwrap(),
        version: 1,
    };
    let result = pipeline(&gateway_config(&gateway), strategy)
        .run("catalog", &credential())
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_failure() {
    if !can_bind_localhost() {
        return;
    }
    let identity = MockServer::start().await;
    mount_report(&identity, 0).await;

    let gateway = GatewayConfig {
        scheme: "http".to_string(),
        host: "127.0.0.1".to_string(),
        port: closed_port(),
    };
    let err = pipeline(&gateway, report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TransportUnreachable { .. }));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        err.to_string(),
        "No response checking for database existence"
    );
}

#[tokio::test]
async fn unreachable_identity_provider_is_a_transport_failure() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    mount_store(&gateway, 200).await;
    mount_session(&gateway, 200, 0).await;

    let strategy = IdentityStrategy::Report {
        url: Url::parse(&format!("http://127.0.0.1:{}/report", closed_port())).unwrap(),
    };
    let err = pipeline(&gateway_config(&gateway), strategy)
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TransportUnreachable { .. }));
}

#[tokio::test]
async fn slow_upstream_times_out_as_transport_failure() {
    if !can_bind_localhost() {
        return;
    }
    let gateway = MockServer::start().await;
    let identity = MockServer::start().await;

    mount_store(&gateway, 200).await;
    Mock::given(method("GET"))
        .and(path("/rest/volumeReport/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"customerId": 78867}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&identity)
        .await;
    mount_session(&gateway, 200, 0).await;

    let client = crate::upstream::http_client(Duration::from_millis(200)).unwrap();
    let err = pipeline_with_client(client, &gateway_config(&gateway), report_strategy(&identity))
        .run("catalog", &credential())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TransportUnreachable { .. }));
}
