use crate::cli::{
    actions::{Action, server::Args},
    commands,
};
use anyhow::{Result, anyhow};
use std::time::Duration;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    commands::validate(matches).map_err(|e| anyhow!(e))?;

    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);

    let upstream_timeout = matches
        .get_one::<u64>(commands::ARG_UPSTREAM_TIMEOUT)
        .copied()
        .map_or(crate::upstream::DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

    Ok(Action::Server(Args {
        port,
        gateway: commands::gateway::parse(matches)?,
        identity: commands::identity::parse(matches)?,
        bucket_admin: commands::bucket::parse(matches)?,
        upstream_timeout,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::IdentityStrategy;

    const ENV: [(&str, Option<&str>); 9] = [
        ("PORTERO_PORT", None),
        ("PORTERO_GATEWAY_SCHEME", None),
        ("PORTERO_GATEWAY_HOST", None),
        ("PORTERO_GATEWAY_PORT", None),
        ("PORTERO_IDENTITY_STRATEGY", None),
        ("PORTERO_IDENTITY_REPORT_URL", None),
        ("PORTERO_IDENTITY_RPC_URL", None),
        ("PORTERO_BUCKET_ADMIN_USERNAME", None),
        ("PORTERO_BUCKET_ADMIN_PASSWORD", None),
    ];

    fn action(args: &[&str]) -> Result<Action> {
        temp_env::with_vars(ENV, || {
            let matches = commands::new().get_matches_from(args);
            handler(&matches)
        })
    }

    #[test]
    fn report_strategy() {
        let Action::Server(args) = action(&[
            "portero",
            "--port",
            "9000",
            "--identity-report-url",
            "https://vendor.tld/report",
            "--upstream-timeout-seconds",
            "3",
        ])
        .unwrap();

        assert_eq!(args.port, 9000);
        assert_eq!(args.gateway.host, "127.0.0.1");
        assert_eq!(args.gateway.port, 4985);
        assert_eq!(args.upstream_timeout, Duration::from_secs(3));
        assert_eq!(
            args.identity,
            IdentityStrategy::Report {
                url: "https://vendor.tld/report".parse().unwrap()
            }
        );
        assert!(args.bucket_admin.username.is_none());
    }

    #[test]
    fn rpc_strategy() {
        let Action::Server(args) = action(&[
            "portero",
            "--identity-strategy",
            "rpc",
            "--identity-rpc-url",
            "https://vendor.tld/rpc",
            "--identity-rpc-version",
            "2",
            "--bucket-admin-username",
            "admin",
            "--bucket-admin-password",
            "password",
        ])
        .unwrap();

        assert_eq!(
            args.identity,
            IdentityStrategy::Rpc {
                url: "https://vendor.tld/rpc".parse().unwrap(),
                version: 2
            }
        );
        assert_eq!(args.bucket_admin.username.as_deref(), Some("admin"));
        assert!(args.bucket_admin.password.is_some());
    }

    #[test]
    fn missing_strategy_url() {
        let err = action(&["portero", "--identity-strategy", "rpc"]).unwrap_err();
        assert!(err.to_string().contains("--identity-rpc-url"));
    }

    #[test]
    fn invalid_identity_url() {
        let err = action(&["portero", "--identity-report-url", "not a url"]).unwrap_err();
        assert!(err.to_string().contains("invalid --identity-report-url"));
    }
}
