// ── User-facing message resolution ──
//
// Maps voucher error kinds to display text. The built-in English table
// covers every kind; catalogs assembled from configuration may cover
// only some, in which case callers fall back to the generic text.

use std::collections::HashMap;

use crate::model::VoucherSubmissionError;

/// Generic text used when no specific message exists for a kind.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";

const ENGLISH_VOUCHER_ERRORS: &[(VoucherSubmissionError, &str)] = &[
    (
        VoucherSubmissionError::InvalidVoucher,
        "Voucher code is invalid.",
    ),
    (
        VoucherSubmissionError::VoucherAlreadyUsed,
        "This voucher code has already been used.",
    ),
    (
        VoucherSubmissionError::RpcError,
        "Could not reach the server. Check your connection and try again.",
    ),
    (
        VoucherSubmissionError::OtherError,
        "Something went wrong while redeeming the voucher.",
    ),
];

/// Resolves voucher error kinds to display text.
pub trait MessageResolver: Send + Sync {
    /// Message for `kind`, or `None` if this resolver has no entry.
    fn voucher_error(&self, kind: VoucherSubmissionError) -> Option<String>;

    /// Fallback for kinds without an entry.
    fn generic_error(&self) -> String {
        GENERIC_ERROR_MESSAGE.into()
    }

    /// Message for `kind`, falling back to [`generic_error`](Self::generic_error).
    fn resolve(&self, kind: VoucherSubmissionError) -> String {
        self.voucher_error(kind)
            .unwrap_or_else(|| self.generic_error())
    }
}

/// Table-backed resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    voucher_errors: HashMap<VoucherSubmissionError, String>,
    generic: String,
}

impl MessageCatalog {
    /// The built-in English messages.
    pub fn english() -> Self {
        Self::from_entries(
            ENGLISH_VOUCHER_ERRORS
                .iter()
                .map(|&(kind, text)| (kind, text.to_owned())),
        )
    }

    /// A catalog holding exactly `entries`.
    pub fn from_entries(entries: impl IntoIterator<Item = (VoucherSubmissionError, String)>) -> Self {
        Self {
            voucher_errors: entries.into_iter().collect(),
            generic: GENERIC_ERROR_MESSAGE.into(),
        }
    }

    /// Replace or add entries on top of this catalog.
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (VoucherSubmissionError, String)>,
    ) -> Self {
        self.voucher_errors.extend(overrides);
        self
    }

    /// Replace the generic fallback text.
    pub fn with_generic(mut self, generic: impl Into<String>) -> Self {
        self.generic = generic.into();
        self
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageResolver for MessageCatalog {
    fn voucher_error(&self, kind: VoucherSubmissionError) -> Option<String> {
        self.voucher_errors.get(&kind).cloned()
    }

    fn generic_error(&self) -> String {
        self.generic.clone()
    }
}
