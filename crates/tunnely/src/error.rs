//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` / `ConfigError` into user-facing errors with actionable
//! help text and a documented exit code.

use miette::Diagnostic;
use thiserror::Error;

use tunnely_config::ConfigError;
use tunnely_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const VOUCHER_REJECTED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the account service at {url}")]
    #[diagnostic(
        code(tunnely::connection_failed),
        help(
            "Check your network connection and the profile's api_url.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to the account service timed out")]
    #[diagnostic(
        code(tunnely::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tunnely::auth_failed),
        help("Store a fresh account token with: tunnely config set-token")
    )]
    AuthFailed { message: String },

    #[error("No account token configured for profile '{profile}'")]
    #[diagnostic(
        code(tunnely::no_credentials),
        help(
            "Configure a token with: tunnely config init\n\
             Or set the TUNNELY_ACCOUNT_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Voucher ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(tunnely::voucher_rejected))]
    VoucherRejected { message: String },

    #[error("{message}")]
    #[diagnostic(code(tunnely::redeem_failed))]
    RedeemFailed { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Account service error: {message}")]
    #[diagnostic(code(tunnely::api_error))]
    Api { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tunnely::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(tunnely::config),
        help("Inspect the file printed by: tunnely config path")
    )]
    Config(ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::VoucherRejected { .. } => exit_code::VOUCHER_REJECTED,
            Self::Validation { .. } => exit_code::USAGE,
            Self::RedeemFailed { .. } | Self::Api { .. } | Self::Config(_) | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api { message, .. } | CoreError::Internal(message) => Self::Api { message },
        }
    }
}
