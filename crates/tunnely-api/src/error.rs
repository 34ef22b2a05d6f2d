use thiserror::Error;

/// Top-level error type for the `tunnely-api` crate.
///
/// Covers every failure mode of the account service surface:
/// authentication, transport, structured API rejections, and payload
/// decoding. `tunnely-core` maps these into voucher error kinds and
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Account token missing, expired, or rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Account service ─────────────────────────────────────────────
    /// Structured rejection from the account service.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        /// Machine-readable error code (e.g. `"INVALID_VOUCHER"`).
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The service's machine-readable error code, if the failure carried one.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the request never produced an answer from the service
    /// (connection failure, timeout). Such failures are worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
