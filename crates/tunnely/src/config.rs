//! Flag-aware profile resolution.
//!
//! The shared `tunnely-config` crate knows the file and the token chain;
//! this module layers the global CLI flags on top and produces the
//! `ServiceConfig` handed to core.

use std::time::Duration;

use secrecy::SecretString;

use tunnely_config::{Config, Profile};
use tunnely_core::ServiceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use tunnely_config::{config_path, load_config, save_config};

/// Resolve the active profile name: `--profile` > `default_profile` > "default".
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build the `ServiceConfig` for this invocation.
///
/// A missing profile is not an error: flags (or the built-in defaults)
/// can describe everything except the token.
pub fn resolve_service_config(
    global: &GlobalOpts,
    config: &Config,
) -> Result<ServiceConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let fallback = Profile::default();
    let profile = config.profiles.get(&profile_name).unwrap_or(&fallback);

    // 1. API URL (flag/env > profile)
    let api_url = tunnely_config::parse_api_url(global.api_url.as_deref().unwrap_or(&profile.api_url))?;

    // 2. Account token (flag/env > profile env > keyring > plaintext)
    let account_token = match global.account_token {
        Some(ref token) if !token.is_empty() => SecretString::from(token.clone()),
        _ => tunnely_config::resolve_account_token(profile, &profile_name)?,
    };

    // 3. Timeout (flag/env > profile > defaults)
    let timeout_secs = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(config.defaults.timeout);

    Ok(ServiceConfig {
        api_url,
        account_token,
        ca_cert: profile.ca_cert.clone(),
        timeout: Duration::from_secs(timeout_secs),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["tunnely"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["redeem", "X"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_profile(name: &str, profile: Profile) -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(name.into(), profile);
        cfg
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_profile(
            "default",
            Profile {
                api_url: "https://profile.example.net".into(),
                account_token: Some("from-profile".into()),
                timeout: Some(5),
                ..Profile::default()
            },
        );
        let opts = global(&[
            "--api-url",
            "https://flag.example.net",
            "--account-token",
            "from-flag",
            "--timeout",
            "9",
        ]);

        let resolved = resolve_service_config(&opts, &cfg).unwrap();
        assert_eq!(resolved.api_url.as_str(), "https://flag.example.net/");
        assert_eq!(resolved.account_token.expose_secret(), "from-flag");
        assert_eq!(resolved.timeout, Duration::from_secs(9));
    }

    #[test]
    fn profile_values_used_without_flags() {
        let cfg = config_with_profile(
            "work",
            Profile {
                api_url: "https://work.example.net".into(),
                account_token: Some("work-token".into()),
                ..Profile::default()
            },
        );
        let opts = global(&["--profile", "work"]);

        let resolved = resolve_service_config(&opts, &cfg).unwrap();
        assert_eq!(resolved.api_url.host_str(), Some("work.example.net"));
        assert_eq!(resolved.account_token.expose_secret(), "work-token");
        assert_eq!(resolved.timeout, Duration::from_secs(cfg.defaults.timeout));
    }

    #[test]
    fn bad_api_url_flag_is_a_usage_error() {
        let opts = global(&["--api-url", "ftp://example.net", "--account-token", "t"]);
        let err = resolve_service_config(&opts, &Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
