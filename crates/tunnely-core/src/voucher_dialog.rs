// ── Voucher dialog view-model ──
//
// Coordinates a single in-flight redemption and publishes the dialog's
// UI state. Every attempt moves the state Default -> Verifying ->
// (Success | Error); rejections become `Error(message)` values and never
// escape as `Err`.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::ServiceConnectionManager;
use crate::messages::MessageResolver;
use crate::model::{VoucherSubmission, format_voucher_input};
use crate::stream::{StateCell, StateStream};

/// Lifecycle of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VoucherDialogState {
    /// Nothing in flight, no result shown.
    #[default]
    Default,
    /// A submission is in flight.
    Verifying,
    /// The voucher was redeemed.
    Success(VoucherSubmission),
    /// The voucher was rejected; holds the display-ready message.
    Error(String),
}

impl VoucherDialogState {
    pub fn is_verifying(&self) -> bool {
        matches!(self, Self::Verifying)
    }
}

/// Everything the voucher dialog renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoucherDialogUiState {
    /// Formatted voucher text as typed by the user.
    pub voucher_input: String,
    pub voucher_state: VoucherDialogState,
}

/// State holder for the voucher redemption dialog.
///
/// Cheaply cloneable; clones share state. The view-model is the only
/// writer; presentation code observes through [`subscribe()`](Self::subscribe).
#[derive(Clone)]
pub struct VoucherDialogViewModel {
    inner: Arc<Inner>,
}

struct Inner {
    connection: ServiceConnectionManager,
    messages: Arc<dyn MessageResolver>,
    state: StateCell<VoucherDialogUiState>,
    /// Cancels the submission currently in flight (if any).
    in_flight: Mutex<CancellationToken>,
}

impl VoucherDialogViewModel {
    pub fn new(connection: ServiceConnectionManager, messages: Arc<dyn MessageResolver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection,
                messages,
                state: StateCell::new(VoucherDialogUiState::default()),
                in_flight: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// The current UI state.
    pub fn ui_state(&self) -> VoucherDialogUiState {
        self.inner.state.get()
    }

    /// Observe the UI state and every subsequent transition, in order.
    pub fn subscribe(&self) -> StateStream<VoucherDialogUiState> {
        self.inner.state.subscribe()
    }

    /// Submit `voucher` for redemption.
    ///
    /// No-op while the service connection is not ready, and while a
    /// previous submission is still verifying. Otherwise publishes
    /// `Verifying`, spawns exactly one redeemer call, and returns its
    /// task handle. Must be called from within a tokio runtime.
    pub fn on_redeem(&self, voucher: &str) -> Option<JoinHandle<()>> {
        let Some(redeemer) = self.inner.connection.voucher_redeemer() else {
            debug!("service connection not ready; ignoring redeem request");
            return None;
        };

        // Held across the Verifying publish and token install; a concurrent
        // `on_dismiss` therefore lands before this attempt or cancels it.
        let cancel = CancellationToken::new();
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started = self.inner.state.update(|ui| {
            if ui.voucher_state.is_verifying() {
                return None;
            }
            Some(VoucherDialogUiState {
                voucher_input: ui.voucher_input.clone(),
                voucher_state: VoucherDialogState::Verifying,
            })
        });
        if !started {
            debug!("redemption already in flight; ignoring redeem request");
            return None;
        }
        *in_flight = cancel.clone();
        drop(in_flight);

        let inner = Arc::clone(&self.inner);
        let voucher = voucher.to_owned();
        Some(tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => {
                    debug!("redemption cancelled");
                    return;
                }
                result = redeemer.submit(&voucher) => result,
            };

            let next = match result {
                Ok(submission) => {
                    info!(time_added = submission.time_added, "voucher redeemed");
                    VoucherDialogState::Success(submission)
                }
                Err(kind) => {
                    warn!(%kind, "voucher rejected");
                    VoucherDialogState::Error(inner.messages.resolve(kind))
                }
            };

            inner.state.update(|ui| {
                // A dismissal may land between the submit returning and
                // this publish; the dismissed attempt must stay silent.
                if cancel.is_cancelled() {
                    return None;
                }
                Some(VoucherDialogUiState {
                    voucher_input: ui.voucher_input.clone(),
                    voucher_state: next,
                })
            });
        }))
    }

    /// Record typed input. A stale error is cleared as soon as the user edits.
    pub fn on_voucher_input_change(&self, raw: &str) {
        let formatted = format_voucher_input(raw);
        self.inner.state.update(|ui| {
            let voucher_state = match &ui.voucher_state {
                VoucherDialogState::Error(_) => VoucherDialogState::Default,
                other => other.clone(),
            };
            let next = VoucherDialogUiState {
                voucher_input: formatted,
                voucher_state,
            };
            (next != *ui).then_some(next)
        });
    }

    /// Close the dialog: drop any in-flight result and reset to the initial state.
    pub fn on_dismiss(&self) {
        let in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.cancel();
        self.inner.state.publish(VoucherDialogUiState::default());
    }
}
