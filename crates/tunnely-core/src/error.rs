// ── Core error types ──
//
// User-facing errors from tunnely-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<tunnely_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants.
//
// Voucher rejections are NOT errors at this layer: they are values
// (`VoucherSubmissionError`) folded into the dialog's UI state.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach account service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The transport's configured request timeout elapsed.
    #[error("Request to the account service timed out")]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tunnely_api::Error> for CoreError {
    fn from(err: tunnely_api::Error) -> Self {
        match err {
            tunnely_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            tunnely_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tunnely_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tunnely_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tunnely_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            tunnely_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn elapsed_request_timeout_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = tunnely_api::TransportConfig {
            timeout: Duration::from_millis(50),
            ..tunnely_api::TransportConfig::default()
        };
        let client =
            tunnely_api::AccountsClient::new(Url::parse(&server.uri()).unwrap(), &transport)
                .unwrap();
        let err = client
            .submit_voucher(&SecretString::from("token".to_string()), "CODE")
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert!(matches!(CoreError::from(err), CoreError::Timeout));
    }

    #[test]
    fn api_rejection_keeps_code_and_status() {
        let core: CoreError = tunnely_api::Error::Api {
            message: "nope".into(),
            code: Some("VOUCHER_USED".into()),
            status: 400,
        }
        .into();

        match core {
            CoreError::Api { code, status, .. } => {
                assert_eq!(code.as_deref(), Some("VOUCHER_USED"));
                assert_eq!(status, Some(400));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn tls_failure_is_connection_failure() {
        let core: CoreError = tunnely_api::Error::Tls("bad pem".into()).into();
        assert!(matches!(core, CoreError::ConnectionFailed { .. }));
    }
}
