use crate::{
    api,
    bucket::{BucketAdmin, BucketAdminConfig},
    cli::telemetry,
    gateway::{GatewayClient, GatewayConfig},
    identity::{IdentityProvider, IdentityStrategy},
    pipeline::SessionPipeline,
    upstream,
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub gateway: GatewayConfig,
    pub identity: IdentityStrategy,
    pub bucket_admin: BucketAdminConfig,
    pub upstream_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the upstream client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let client = upstream::http_client(args.upstream_timeout)?;

    let pipeline = SessionPipeline::new(
        GatewayClient::new(client.clone(), &args.gateway)?,
        IdentityProvider::new(client.clone(), args.identity),
    );
    let bucket_admin = BucketAdmin::new(client, args.bucket_admin);

    let result = api::new(args.port, Arc::new(pipeline), Arc::new(bucket_admin)).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let gateway = args
        .gateway
        .base_url()
        .map_or_else(|_| "invalid".to_string(), |url| url.to_string());
    let rpc_version = match &args.identity {
        IdentityStrategy::Rpc { version, .. } => version.to_string(),
        IdentityStrategy::Report { .. } => "n/a".to_string(),
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("gateway", gateway),
        ("identity_strategy", args.identity.name().to_string()),
        ("identity_url", redact_url(args.identity.url())),
        ("identity_rpc_version", rpc_version),
        ("bucket_admin_url", redact_url(&args.bucket_admin.url)),
        (
            "bucket_admin_username",
            args.bucket_admin
                .username
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
        (
            "bucket_admin_password_set",
            args.bucket_admin.password.is_some().to_string(),
        ),
        (
            "upstream_timeout",
            format!("{}s", args.upstream_timeout.as_secs()),
        ),
    ];
    info!("{}", startup_message("Startup configuration", &entries));
}

fn redact_url(url: &Url) -> String {
    let mut url = url.clone();
    if url.password().is_some() {
        let _ = url.set_password(Some("REDACTED"));
    }
    url.to_string()
}

fn startup_message(title: &str, entries: &[(&str, String)]) -> String {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", portero_banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    message
}

fn portero_banner() -> String {
    let short_hash = crate::GIT_COMMIT_HASH.trim().get(..7).unwrap_or(crate::GIT_COMMIT_HASH);
    PORTERO_BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

const PORTERO_BANNER: &str = r"
   _______
  |  ___  |
  | |   | |
  | |  o| |   P O R T E R O {VERSION}
  | |   | |
  |_|___|_|";
