use crate::cli::actions::{server::Args, Action};
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(3000);
    let ephemeral = matches.get_flag("ephemeral");
    let store_path = matches
        .get_one::<String>("store")
        .cloned()
        .context("missing required argument: --store")?;

    let referral_base_url = matches
        .get_one::<String>("referral-base-url")
        .cloned()
        .context("missing required argument: --referral-base-url")?;
    let referral_base_url =
        Url::parse(&referral_base_url).context("invalid WAITLIST_REFERRAL_BASE_URL")?;

    let backoff_base = matches
        .get_one::<u64>("notify-backoff")
        .copied()
        .map_or(Duration::from_secs(1), Duration::from_secs);

    Ok(Action::Server(Args {
        port,
        store_path,
        ephemeral,
        referral_base_url,
        backoff_base,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn unset_env<T>(test: impl FnOnce() -> T) -> T {
        temp_env::with_vars(
            [
                ("WAITLIST_PORT", None::<String>),
                ("WAITLIST_STORE", None),
                ("WAITLIST_REFERRAL_BASE_URL", None),
                ("WAITLIST_NOTIFY_BACKOFF", None),
            ],
            test,
        )
    }

    #[test]
    fn dispatches_server_action_with_parsed_url() {
        unset_env(|| {
            let matches = commands::new().get_matches_from(vec![
                "waitlistd",
                "--port",
                "8080",
                "--referral-base-url",
                "https://waitlist.example/join",
            ]);

            let Action::Server(args) = handler(&matches).unwrap();
            assert_eq!(args.port, 8080);
            assert_eq!(args.store_path, "waitlist.redb");
            assert!(!args.ephemeral);
            assert_eq!(args.referral_base_url.host_str(), Some("waitlist.example"));
            assert_eq!(args.backoff_base, Duration::from_secs(1));
        });
    }

    #[test]
    fn rejects_unparseable_referral_base() {
        unset_env(|| {
            let matches = commands::new().get_matches_from(vec![
                "waitlistd",
                "--referral-base-url",
                "not a url",
            ]);
            assert!(handler(&matches).is_err());
        });
    }
}
