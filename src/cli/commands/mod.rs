pub mod bucket;
pub mod gateway;
pub mod identity;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout-seconds";

/// Check arguments that depend on each other.
///
/// # Errors
/// Returns an error string if the selected identity strategy has no URL, or a
/// bucket admin password is given without a username.
pub fn validate(matches: &clap::ArgMatches) -> Result<(), String> {
    let strategy = matches
        .get_one::<String>(identity::ARG_IDENTITY_STRATEGY)
        .map_or(identity::STRATEGY_REPORT, String::as_str);

    let required_url = if strategy == identity::STRATEGY_RPC {
        identity::ARG_IDENTITY_RPC_URL
    } else {
        identity::ARG_IDENTITY_REPORT_URL
    };

    if !matches.contains_id(required_url) {
        return Err(format!(
            "Missing required argument: --{required_url} (required for the {strategy} identity strategy)"
        ));
    }

    if matches.contains_id(bucket::ARG_BUCKET_ADMIN_PASSWORD)
        && !matches.contains_id(bucket::ARG_BUCKET_ADMIN_USERNAME)
    {
        return Err(format!(
            "Missing required argument: --{} (required with --{})",
            bucket::ARG_BUCKET_ADMIN_USERNAME,
            bucket::ARG_BUCKET_ADMIN_PASSWORD
        ));
    }

    Ok(())
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("portero")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("PORTERO_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Per-request timeout for gateway, identity and bucket admin calls")
                .default_value("10")
                .env("PORTERO_UPSTREAM_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    let command = gateway::with_args(command);
    let command = identity::with_args(command);
    let command = bucket::with_args(command);
    logging::with_args(command)
}
