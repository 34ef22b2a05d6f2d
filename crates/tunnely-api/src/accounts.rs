// Account service HTTP client
//
// Wraps `reqwest::Client` with URL construction, bearer authentication,
// and error-body decoding for the account endpoints.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error code returned when the voucher does not exist.
pub const INVALID_VOUCHER: &str = "INVALID_VOUCHER";
/// Error code returned when the voucher has already been redeemed.
pub const VOUCHER_USED: &str = "VOUCHER_USED";

#[derive(Debug, Serialize)]
struct SubmitVoucherRequest<'a> {
    voucher_code: &'a str,
}

/// Successful voucher submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitVoucherResponse {
    /// Seconds of service time added to the account.
    pub time_added: u64,
    /// The account's expiry after the voucher was applied.
    pub new_expiry: DateTime<Utc>,
}

/// Error body shape: `{"code": "INVALID_VOUCHER", "error": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    error: Option<String>,
}

/// Raw HTTP client for the account service.
pub struct AccountsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AccountsClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the service root (e.g. `https://api.tunnely.net`);
    /// endpoint paths are appended to it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Redeem `voucher_code` against the account identified by `account_token`.
    pub async fn submit_voucher(
        &self,
        account_token: &SecretString,
        voucher_code: &str,
    ) -> Result<SubmitVoucherResponse, Error> {
        let url = self.endpoint("accounts/v1/submit-voucher")?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .bearer_auth(account_token.expose_secret())
            .json(&SubmitVoucherRequest { voucher_code })
            .send()
            .await?;

        parse_response(resp).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

/// Decode a JSON body on success, or a structured `Error` otherwise.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    trace!(%status, body_len = body.len(), "account service response");

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: error_message(&body).unwrap_or_else(|| "invalid account token".into()),
        });
    }

    if !status.is_success() {
        let parsed = serde_json::from_str::<ErrorBody>(&body).ok();
        let code = parsed.as_ref().and_then(|b| b.code.clone());
        let message = parsed
            .and_then(|b| b.error)
            .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body)));
        return Err(Error::Api {
            message,
            code,
            status: status.as_u16(),
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok()?.error
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> AccountsClient {
        AccountsClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let c = client("https://api.example.net/");
        assert_eq!(
            c.endpoint("accounts/v1/submit-voucher").unwrap().as_str(),
            "https://api.example.net/accounts/v1/submit-voucher"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client("https://example.net/api");
        assert_eq!(
            c.endpoint("accounts/v1/submit-voucher").unwrap().as_str(),
            "https://example.net/api/accounts/v1/submit-voucher"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let p = preview(&body);
        assert!(p.len() <= 200);
        assert!(p.chars().all(|c| c == 'é'));
    }
}
