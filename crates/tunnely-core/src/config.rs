// ── Runtime service configuration ──
//
// Describes *how* to reach the account service. Carries the account
// token and connection tuning, but never touches disk: the CLI/TUI
// builds a `ServiceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default account service root.
pub const DEFAULT_API_URL: &str = "https://api.tunnely.net";

/// Configuration for talking to the account service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service root URL (e.g., `https://api.tunnely.net`).
    pub api_url: Url,
    /// Bearer token identifying the account vouchers are credited to.
    pub account_token: SecretString,
    /// Extra CA certificate to trust (self-hosted or test deployments).
    pub ca_cert: Option<PathBuf>,
    /// Request timeout.
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Config against `api_url` with default timeout and system TLS roots.
    pub fn new(api_url: Url, account_token: SecretString) -> Self {
        Self {
            api_url,
            account_token,
            ca_cert: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> tunnely_api::TransportConfig {
        tunnely_api::TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(tunnely_api::TlsMode::System, tunnely_api::TlsMode::CustomCa),
            timeout: self.timeout,
        }
    }
}
