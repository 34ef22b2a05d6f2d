// ── Domain model ──

pub mod voucher;

pub use voucher::{
    VOUCHER_CODE_LENGTH, VoucherSubmission, VoucherSubmissionError, VoucherSubmissionResult,
    format_voucher_input,
};
