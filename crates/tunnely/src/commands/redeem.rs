//! `tunnely redeem <VOUCHER>`: one pass through the voucher dialog.
//!
//! The command drives the same `VoucherDialogViewModel` the TUI uses:
//! input formatting, a single submission, and the ordered state stream
//! until the attempt settles on `Success` or `Error`.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use tunnely_core::{
    ApiVoucherRedeemer, MessageResolver, ServiceConnectionContainer, ServiceConnectionManager,
    StateStream, VoucherDialogState, VoucherDialogUiState, VoucherDialogViewModel, VoucherRedeemer,
    VoucherSubmission, VoucherSubmissionError, VoucherSubmissionResult,
};

use crate::cli::{GlobalOpts, RedeemArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Outcome recording ───────────────────────────────────────────────

/// Wraps the production redeemer to remember the last rejection kind.
///
/// The dialog state only carries display text; the CLI also needs the
/// kind to pick an exit code.
struct OutcomeRecorder {
    inner: Arc<dyn VoucherRedeemer>,
    last_error: Mutex<Option<VoucherSubmissionError>>,
}

impl OutcomeRecorder {
    fn new(inner: Arc<dyn VoucherRedeemer>) -> Self {
        Self {
            inner,
            last_error: Mutex::new(None),
        }
    }

    fn last_error(&self) -> Option<VoucherSubmissionError> {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl VoucherRedeemer for OutcomeRecorder {
    async fn submit(&self, voucher: &str) -> VoucherSubmissionResult {
        let result = self.inner.submit(voucher).await;
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = result.as_ref().err().copied();
        result
    }
}

/// How one redemption attempt ended.
#[derive(Debug)]
struct Outcome {
    voucher: String,
    result: Result<VoucherSubmission, Failure>,
}

#[derive(Debug)]
struct Failure {
    kind: Option<VoucherSubmissionError>,
    message: String,
}

impl Failure {
    fn into_cli_error(self, api_url: &str) -> CliError {
        match self.kind {
            Some(VoucherSubmissionError::InvalidVoucher | VoucherSubmissionError::VoucherAlreadyUsed) => {
                CliError::VoucherRejected {
                    message: self.message,
                }
            }
            Some(VoucherSubmissionError::RpcError) => CliError::ConnectionFailed {
                url: api_url.to_owned(),
                reason: self.message,
            },
            Some(VoucherSubmissionError::OtherError) | None => CliError::RedeemFailed {
                message: self.message,
            },
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &RedeemArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let service = config::resolve_service_config(global, &cfg)?;
    let messages = cfg.message_catalog()?;
    let api_url = service.api_url.to_string();

    let redeemer = ApiVoucherRedeemer::from_config(&service)?;
    let color = output::should_color(global.color);
    let spinner = output::verifying_spinner(global.quiet || global.json);

    let outcome = tokio::select! {
        outcome = redeem_once(Arc::new(redeemer), Arc::new(messages), &args.voucher) => outcome,
        _ = tokio::signal::ctrl_c() => {
            spinner.finish_and_clear();
            return Err(CliError::RedeemFailed {
                message: "Redemption cancelled".into(),
            });
        }
    };
    spinner.finish_and_clear();
    let outcome = outcome?;

    match outcome.result {
        Ok(submission) => {
            let rendered = if global.json {
                output::render_success_json(&outcome.voucher, &submission)
            } else {
                output::render_success(&outcome.voucher, &submission, color)
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
        Err(failure) => {
            if global.json {
                output::print_output(
                    &output::render_failure_json(&outcome.voucher, &failure.message),
                    global.quiet,
                );
            }
            Err(failure.into_cli_error(&api_url))
        }
    }
}

/// Format `raw`, submit it once through the view-model, and wait for the
/// attempt to settle.
async fn redeem_once(
    redeemer: Arc<dyn VoucherRedeemer>,
    messages: Arc<dyn MessageResolver>,
    raw: &str,
) -> Result<Outcome, CliError> {
    let recorder = Arc::new(OutcomeRecorder::new(redeemer));
    let connection = ServiceConnectionManager::new();
    connection.on_connecting();
    connection.on_ready(ServiceConnectionContainer::new(
        Arc::clone(&recorder) as Arc<dyn VoucherRedeemer>
    ));

    let vm = VoucherDialogViewModel::new(connection, messages);
    let mut states = vm.subscribe();

    vm.on_voucher_input_change(raw);
    let voucher = vm.ui_state().voucher_input;
    if voucher.is_empty() {
        return Err(CliError::Validation {
            field: "voucher".into(),
            reason: "voucher code must contain letters or digits".into(),
        });
    }

    let Some(task) = vm.on_redeem(&voucher) else {
        return Err(CliError::Api {
            message: "account service connection is not ready".into(),
        });
    };

    let settled = tokio::select! {
        biased;
        settled = wait_until_settled(&mut states) => settled,
        joined = task => {
            joined.map_err(|e| CliError::Api {
                message: format!("redemption task failed: {e}"),
            })?;
            settled_state(&vm.ui_state())
        }
    };

    let result = settled.map_err(|message| Failure {
        kind: recorder.last_error(),
        message,
    });
    Ok(Outcome { voucher, result })
}

/// Follow transitions until the attempt reaches `Success` or `Error`.
async fn wait_until_settled(
    states: &mut StateStream<VoucherDialogUiState>,
) -> Result<VoucherSubmission, String> {
    while let Some(ui) = states.next().await {
        debug!(state = ?ui.voucher_state, "voucher dialog transition");
        if let Some(settled) = terminal(&ui.voucher_state) {
            return settled;
        }
    }
    Err("voucher dialog closed before the redemption finished".into())
}

fn settled_state(ui: &VoucherDialogUiState) -> Result<VoucherSubmission, String> {
    terminal(&ui.voucher_state)
        .unwrap_or_else(|| Err("redemption finished without a result".into()))
}

fn terminal(state: &VoucherDialogState) -> Option<Result<VoucherSubmission, String>> {
    match state {
        VoucherDialogState::Success(submission) => Some(Ok(submission.clone())),
        VoucherDialogState::Error(message) => Some(Err(message.clone())),
        VoucherDialogState::Default | VoucherDialogState::Verifying => None,
    }
}
