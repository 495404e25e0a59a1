use crate::bucket::BucketAdminConfig;
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_BUCKET_ADMIN_URL: &str = "bucket-admin-url";
pub const ARG_BUCKET_ADMIN_USERNAME: &str = "bucket-admin-username";
pub const ARG_BUCKET_ADMIN_PASSWORD: &str = "bucket-admin-password";

/// # Errors
/// Returns an error if the admin URL is not a valid URL.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<BucketAdminConfig> {
    let raw = matches
        .get_one::<String>(ARG_BUCKET_ADMIN_URL)
        .map_or("http://127.0.0.1:8091", String::as_str);

    Ok(BucketAdminConfig {
        url: Url::parse(raw).with_context(|| format!("invalid --{ARG_BUCKET_ADMIN_URL}: {raw}"))?,
        username: matches
            .get_one::<String>(ARG_BUCKET_ADMIN_USERNAME)
            .cloned(),
        password: matches
            .get_one::<String>(ARG_BUCKET_ADMIN_PASSWORD)
            .map(|password| SecretString::from(password.clone())),
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BUCKET_ADMIN_URL)
                .long(ARG_BUCKET_ADMIN_URL)
                .help("Base URL of the bucket admin API used by /flush")
                .env("PORTERO_BUCKET_ADMIN_URL")
                .default_value("http://127.0.0.1:8091"),
        )
        .arg(
            Arg::new(ARG_BUCKET_ADMIN_USERNAME)
                .long(ARG_BUCKET_ADMIN_USERNAME)
                .help("Basic auth username for the bucket admin API")
                .env("PORTERO_BUCKET_ADMIN_USERNAME"),
        )
        .arg(
            Arg::new(ARG_BUCKET_ADMIN_PASSWORD)
                .long(ARG_BUCKET_ADMIN_PASSWORD)
                .help("Basic auth password for the bucket admin API")
                .env("PORTERO_BUCKET_ADMIN_PASSWORD")
                .hide_env_values(true),
        )
}
