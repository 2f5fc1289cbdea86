use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("ensaluti")
        .about("Identity platform login")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("identity-url")
                .short('i')
                .long("identity-url")
                .help("Identity provider URL, example: https://tenant.id.example.cloud")
                .env("ENSALUTI_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .help("Username to authenticate")
                .env("ENSALUTI_USER")
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .help("Password for the user")
                .env("ENSALUTI_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("otp-secret")
                .long("otp-secret")
                .help("Base32 shared secret for the time-based one-time-password")
                .env("ENSALUTI_OTP_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("service")
                .short('s')
                .long("service")
                .help("Service name appended to the tenant subdomain, empty for the bare tenant URL")
                .env("ENSALUTI_SERVICE")
                .default_value(""),
        )
        .arg(
            Arg::new("separator")
                .long("separator")
                .help("Separator between the tenant subdomain and the service name")
                .env("ENSALUTI_SEPARATOR")
                .default_value("."),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ENSALUTI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
