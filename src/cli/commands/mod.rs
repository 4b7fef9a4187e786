pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("waitlistd")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3000")
                .env("WAITLIST_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("store")
                .short('s')
                .long("store")
                .help("Path to the store database file")
                .default_value("waitlist.redb")
                .env("WAITLIST_STORE"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .help("Keep all records in memory; nothing survives a restart")
                .action(ArgAction::SetTrue)
                .conflicts_with("store"),
        )
        .arg(
            Arg::new("referral-base-url")
                .long("referral-base-url")
                .help("Base URL embedded in referral links, the code is appended as ?ref=")
                .default_value("http://localhost:3000/")
                .env("WAITLIST_REFERRAL_BASE_URL"),
        )
        .arg(
            Arg::new("notify-backoff")
                .long("notify-backoff")
                .help("Base delay in seconds between delivery retries")
                .default_value("1")
                .env("WAITLIST_NOTIFY_BACKOFF")
                .value_parser(clap::value_parser!(u64)),
        );

    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "waitlistd");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("WAITLIST_PORT", None::<String>),
                ("WAITLIST_STORE", None),
                ("WAITLIST_REFERRAL_BASE_URL", None),
                ("WAITLIST_NOTIFY_BACKOFF", None),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["waitlistd"]);

                assert_eq!(matches.get_one::<u16>("port").copied(), Some(3000));
                assert_eq!(
                    matches.get_one::<String>("store").cloned(),
                    Some("waitlist.redb".to_string())
                );
                assert!(!matches.get_flag("ephemeral"));
                assert_eq!(
                    matches.get_one::<String>("referral-base-url").cloned(),
                    Some("http://localhost:3000/".to_string())
                );
                assert_eq!(matches.get_one::<u64>("notify-backoff").copied(), Some(1));
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("WAITLIST_PORT", Some("8080")),
                ("WAITLIST_STORE", Some("/var/lib/waitlist/records.redb")),
                (
                    "WAITLIST_REFERRAL_BASE_URL",
                    Some("https://waitlist.example/"),
                ),
                ("WAITLIST_NOTIFY_BACKOFF", Some("5")),
                ("WAITLIST_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["waitlistd"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(8080));
                assert_eq!(
                    matches.get_one::<String>("store").cloned(),
                    Some("/var/lib/waitlist/records.redb".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>("referral-base-url").cloned(),
                    Some("https://waitlist.example/".to_string())
                );
                assert_eq!(matches.get_one::<u64>("notify-backoff").copied(), Some(5));
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("WAITLIST_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["waitlistd".to_string()];
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_ephemeral_conflicts_with_store() {
        let command = new();
        let result = command.try_get_matches_from(vec![
            "waitlistd",
            "--ephemeral",
            "--store",
            "/tmp/records.redb",
        ]);
        assert_eq!(
            result.map_err(|e| e.kind()),
            Err(clap::error::ErrorKind::ArgumentConflict)
        );
    }
}
