use crate::identity::IdentityStrategy;
use anyhow::{Context, anyhow};
use clap::{Arg, ArgMatches, Command};
use url::Url;

pub const ARG_IDENTITY_STRATEGY: &str = "identity-strategy";
pub const ARG_IDENTITY_REPORT_URL: &str = "identity-report-url";
pub const ARG_IDENTITY_RPC_URL: &str = "identity-rpc-url";
pub const ARG_IDENTITY_RPC_VERSION: &str = "identity-rpc-version";

pub const STRATEGY_REPORT: &str = "report";
pub const STRATEGY_RPC: &str = "rpc";

/// Build the identity strategy selected for this deployment.
///
/// # Errors
/// Returns an error if the URL for the selected strategy is missing or invalid.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<IdentityStrategy> {
    let strategy = matches
        .get_one::<String>(ARG_IDENTITY_STRATEGY)
        .map_or(STRATEGY_REPORT, String::as_str);

    let read_url = |id: &str| -> anyhow::Result<Url> {
        let raw = matches
            .get_one::<String>(id)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("missing required argument: --{id}"))?;
        Url::parse(raw).with_context(|| format!("invalid --{id}: {raw}"))
    };

    match strategy {
        STRATEGY_REPORT => Ok(IdentityStrategy::Report {
            url: read_url(ARG_IDENTITY_REPORT_URL)?,
        }),
        STRATEGY_RPC => Ok(IdentityStrategy::Rpc {
            url: read_url(ARG_IDENTITY_RPC_URL)?,
            version: matches
                .get_one::<u32>(ARG_IDENTITY_RPC_VERSION)
                .copied()
                .unwrap_or(1),
        }),
        other => Err(anyhow!("unknown identity strategy: {other}")),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_STRATEGY)
                .long(ARG_IDENTITY_STRATEGY)
                .help("How credentials are resolved to a customer id")
                .env("PORTERO_IDENTITY_STRATEGY")
                .default_value(STRATEGY_REPORT)
                .value_parser([STRATEGY_REPORT, STRATEGY_RPC]),
        )
        .arg(
            Arg::new(ARG_IDENTITY_REPORT_URL)
                .long(ARG_IDENTITY_REPORT_URL)
                .help("Customer report endpoint, required for the report strategy")
                .env("PORTERO_IDENTITY_REPORT_URL"),
        )
        .arg(
            Arg::new(ARG_IDENTITY_RPC_URL)
                .long(ARG_IDENTITY_RPC_URL)
                .help("RPC endpoint, required for the rpc strategy")
                .env("PORTERO_IDENTITY_RPC_URL"),
        )
        .arg(
            Arg::new(ARG_IDENTITY_RPC_VERSION)
                .long(ARG_IDENTITY_RPC_VERSION)
                .help("Protocol version sent in the RPC call frame")
                .env("PORTERO_IDENTITY_RPC_VERSION")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}
