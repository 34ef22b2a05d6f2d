//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};

use tunnely_config::{Config, Profile};
use tunnely_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking account tokens.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if p.account_token.is_some() {
            let _ = writeln!(out, "account_token = \"****\"");
        }
        if let Some(ref env) = p.account_token_env {
            let _ = writeln!(out, "account_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    if !cfg.messages.is_empty() {
        let mut kinds: Vec<_> = cfg.messages.iter().collect();
        kinds.sort();
        let _ = writeln!(out);
        let _ = writeln!(out, "[messages]");
        for (kind, text) in kinds {
            let _ = writeln!(out, "{kind} = {text:?}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("Account token: ").map_err(prompt_err)?;
    if token.trim().is_empty() {
        return Err(CliError::Validation {
            field: "account_token".into(),
            reason: "account token cannot be empty".into(),
        });
    }
    Ok(token.trim().to_owned())
}

/// Offer keyring or plaintext storage for `token`.
///
/// Returns `Some(token)` if the user chose plaintext, `None` if it went to the keyring.
fn prompt_token_storage(token: String, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the account token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        tunnely_config::store_account_token(profile_name, &token)?;
        eprintln!("   ✓ Account token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("tunnely configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config()?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(config::active_profile_name(global, &cfg))
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Account service URL")
                .default(DEFAULT_API_URL.into())
                .interact_text()
                .map_err(prompt_err)?;
            tunnely_config::parse_api_url(&api_url)?;

            let token = prompt_token()?;
            let account_token = prompt_token_storage(token, &profile_name)?;

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    api_url,
                    account_token,
                    ..Profile::default()
                },
            );
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;
            tunnely_config::extract_bundled_assets()?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Redeem a voucher: tunnely redeem <VOUCHER>");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let token = prompt_token()?;
            tunnely_config::store_account_token(&profile_name, &token)?;
            eprintln!("✓ Account token for '{profile_name}' stored in system keyring");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_view_masks_token_but_keeps_env_name() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                account_token: Some("super-secret".into()),
                account_token_env: Some("HOME_TOKEN".into()),
                timeout: Some(12),
                ..Profile::default()
            },
        );
        cfg.messages
            .insert("invalid-voucher".into(), "Nope.".into());

        let out = format_config_redacted(&cfg);
        assert!(!out.contains("super-secret"));
        assert!(out.contains("account_token = \"****\""));
        assert!(out.contains("account_token_env = \"HOME_TOKEN\""));
        assert!(out.contains("[profiles.home]"));
        assert!(out.contains("timeout = 12"));
        assert!(out.contains("invalid-voucher = \"Nope.\""));
    }
}
