//! Voucher redemption logic and reactive state for tunnely front ends (CLI / TUI).
//!
//! - **[`VoucherDialogViewModel`]**: Coordinates one in-flight redemption
//!   and publishes [`VoucherDialogUiState`]. Each attempt moves through
//!   `Default → Verifying → Success | Error`; voucher rejections are folded
//!   into the state as display-ready messages.
//!
//! - **[`ServiceConnectionManager`]**: `watch`-backed connection state.
//!   Capabilities (the [`VoucherRedeemer`]) are only handed out while
//!   [`ServiceConnectionState::ConnectedReady`].
//!
//! - **[`StateStream<T>`]**: Subscription handle with `current()` /
//!   `latest()` / `next()`; transitions are delivered in publication order.
//!
//! - **[`MessageResolver`]**: Error-kind → text lookup, with the built-in
//!   English [`MessageCatalog`] and a generic fallback for unmapped kinds.

pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
pub mod model;
pub mod redeemer;
pub mod stream;
pub mod voucher_dialog;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_API_URL, ServiceConfig};
pub use connection::{ServiceConnectionContainer, ServiceConnectionManager, ServiceConnectionState};
pub use error::CoreError;
pub use messages::{GENERIC_ERROR_MESSAGE, MessageCatalog, MessageResolver};
pub use model::{
    VOUCHER_CODE_LENGTH, VoucherSubmission, VoucherSubmissionError, VoucherSubmissionResult,
    format_voucher_input,
};
pub use redeemer::{ApiVoucherRedeemer, VoucherRedeemer};
pub use stream::{StateStream, StateTransitionStream};
pub use voucher_dialog::{VoucherDialogState, VoucherDialogUiState, VoucherDialogViewModel};
