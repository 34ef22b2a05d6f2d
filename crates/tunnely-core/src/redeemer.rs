// ── Voucher redeemer capability ──
//
// The seam between the dialog view-model and whatever validates vouchers.
// Production code goes through the account service; tests substitute
// their own implementation.

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, warn};

use tunnely_api::{AccountsClient, INVALID_VOUCHER, VOUCHER_USED};

use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::model::{VoucherSubmission, VoucherSubmissionError, VoucherSubmissionResult};

/// Something that can redeem a voucher code.
///
/// Implementations enforce their own timeouts and never retry.
#[async_trait]
pub trait VoucherRedeemer: Send + Sync {
    async fn submit(&self, voucher: &str) -> VoucherSubmissionResult;
}

/// Redeemer backed by the account service HTTP API.
pub struct ApiVoucherRedeemer {
    client: AccountsClient,
    account_token: SecretString,
}

impl ApiVoucherRedeemer {
    pub fn new(client: AccountsClient, account_token: SecretString) -> Self {
        Self {
            client,
            account_token,
        }
    }

    /// Build the HTTP client described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CoreError> {
        let client = AccountsClient::new(config.api_url.clone(), &config.transport())?;
        Ok(Self::new(client, config.account_token.clone()))
    }
}

#[async_trait]
impl VoucherRedeemer for ApiVoucherRedeemer {
    async fn submit(&self, voucher: &str) -> VoucherSubmissionResult {
        match self.client.submit_voucher(&self.account_token, voucher).await {
            Ok(resp) => {
                debug!(time_added = resp.time_added, "voucher accepted");
                Ok(VoucherSubmission::from_time_added(
                    resp.time_added,
                    resp.new_expiry,
                ))
            }
            Err(e) => {
                let kind = classify(&e);
                warn!(error = %e, ?kind, "voucher submission failed");
                Err(kind)
            }
        }
    }
}

/// Map an account-service failure to the voucher error kind shown to users.
pub(crate) fn classify(err: &tunnely_api::Error) -> VoucherSubmissionError {
    match err.api_code() {
        Some(INVALID_VOUCHER) => VoucherSubmissionError::InvalidVoucher,
        Some(VOUCHER_USED) => VoucherSubmissionError::VoucherAlreadyUsed,
        _ if err.is_transient() => VoucherSubmissionError::RpcError,
        _ => VoucherSubmissionError::OtherError,
    }
}
