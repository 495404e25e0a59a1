use crate::gateway::GatewayConfig;
use clap::{Arg, ArgMatches, Command};

pub const ARG_GATEWAY_SCHEME: &str = "gateway-scheme";
pub const ARG_GATEWAY_HOST: &str = "gateway-host";
pub const ARG_GATEWAY_PORT: &str = "gateway-port";

/// Read the gateway location from matches; clap supplies the defaults.
///
/// # Errors
/// Returns an error if the resulting base URL is not usable.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<GatewayConfig> {
    let config = GatewayConfig {
        scheme: matches
            .get_one::<String>(ARG_GATEWAY_SCHEME)
            .cloned()
            .unwrap_or_else(|| "http".to_string()),
        host: matches
            .get_one::<String>(ARG_GATEWAY_HOST)
            .cloned()
            .unwrap_or_else(|| "127.0.0.1".to_string()),
        port: matches
            .get_one::<u16>(ARG_GATEWAY_PORT)
            .copied()
            .unwrap_or(4985),
    };

    config.base_url()?;

    Ok(config)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GATEWAY_SCHEME)
                .long(ARG_GATEWAY_SCHEME)
                .help("Scheme of the datastore gateway admin API")
                .env("PORTERO_GATEWAY_SCHEME")
                .default_value("http")
                .value_parser(["http", "https"]),
        )
        .arg(
            Arg::new(ARG_GATEWAY_HOST)
                .long(ARG_GATEWAY_HOST)
                .help("Host of the datastore gateway admin API")
                .env("PORTERO_GATEWAY_HOST")
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::new(ARG_GATEWAY_PORT)
                .long(ARG_GATEWAY_PORT)
                .help("Port of the datastore gateway admin API")
                .env("PORTERO_GATEWAY_PORT")
                .default_value("4985")
                .value_parser(clap::value_parser!(u16)),
        )
}
