use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Highest count accepted from `EMPRESAS_LOG_LEVEL` as a number.
const MAX_NUMERIC_LEVEL: u8 = 5;

/// Level names accepted from the environment, in verbosity order.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Turn an `EMPRESAS_LOG_LEVEL` value into a verbosity count.
///
/// Accepts a count (`0` to `5`) or a level name, case-insensitively.
fn parse_log_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    if let Ok(count) = value.parse::<u8>() {
        return if count <= MAX_NUMERIC_LEVEL {
            Ok(count)
        } else {
            Err(format!("log level must be at most {MAX_NUMERIC_LEVEL}"))
        };
    }

    LEVEL_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level '{value}', expected one of {LEVEL_NAMES:?}"))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Repeat to raise verbosity, or set EMPRESAS_LOG_LEVEL to a level name")
            .env("EMPRESAS_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::new(parse_log_level)),
    )
}
