use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name (`info`) or its numeric rank (`2`); `PORTERO_LOG_LEVEL`
/// goes through here while `-v` flags are counted.
fn parse_log_level(level: &str) -> Result<u8, String> {
    if let Ok(rank) = level.parse::<u8>() {
        return if usize::from(rank) < LEVELS.len() {
            Ok(rank)
        } else {
            Err(format!("log level out of range: {rank}"))
        };
    }

    let level = level.to_ascii_lowercase();
    LEVELS
        .iter()
        .position(|name| *name == level)
        .and_then(|rank| u8::try_from(rank).ok())
        .ok_or_else(|| format!("invalid log level: {level}"))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("PORTERO_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_log_level)),
    )
}
