// ── Voucher domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Number of significant characters in a voucher code.
pub const VOUCHER_CODE_LENGTH: usize = 16;

const VOUCHER_GROUP_SIZE: usize = 4;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherSubmission {
    /// Seconds of service time credited to the account.
    pub time_added: u64,
    /// Human-readable summary shown to the user.
    pub description: String,
}

impl VoucherSubmission {
    /// Build a submission with a description derived from the credited time
    /// and the account's new expiry.
    pub fn from_time_added(time_added: u64, new_expiry: DateTime<Utc>) -> Self {
        let description = format!(
            "{}. Paid until {}.",
            time_added_phrase(time_added),
            new_expiry.format("%Y-%m-%d")
        );
        Self {
            time_added,
            description,
        }
    }
}

/// Why a voucher could not be redeemed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VoucherSubmissionError {
    /// The code does not exist.
    InvalidVoucher,
    /// The code was already redeemed.
    VoucherAlreadyUsed,
    /// The service could not be reached.
    RpcError,
    /// Anything else the service reported.
    OtherError,
}

/// Outcome reported by a voucher redeemer.
pub type VoucherSubmissionResult = Result<VoucherSubmission, VoucherSubmissionError>;

/// Normalise typed voucher input: ASCII alphanumerics only, uppercased,
/// at most [`VOUCHER_CODE_LENGTH`] characters, grouped by four with `-`.
pub fn format_voucher_input(raw: &str) -> String {
    let mut out = String::with_capacity(VOUCHER_CODE_LENGTH + VOUCHER_CODE_LENGTH / VOUCHER_GROUP_SIZE);
    let significant = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(VOUCHER_CODE_LENGTH);

    for (i, c) in significant.enumerate() {
        if i > 0 && i % VOUCHER_GROUP_SIZE == 0 {
            out.push('-');
        }
        out.push(c);
    }
    out
}

fn time_added_phrase(secs: u64) -> String {
    let days = secs / SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    match (days, hours) {
        (0, 0) => "Less than an hour was added to your account".into(),
        (0, 1) => "1 hour was added to your account".into(),
        (0, h) => format!("{h} hours were added to your account"),
        (1, _) => "1 day was added to your account".into(),
        (d, _) => format!("{d} days were added to your account"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn format_groups_and_uppercases() {
        assert_eq!(format_voucher_input("abcd1234efgh"), "ABCD-1234-EFGH");
        assert_eq!(format_voucher_input("ab"), "AB");
        assert_eq!(format_voucher_input(""), "");
    }

    #[test]
    fn format_strips_separators_and_truncates() {
        assert_eq!(
            format_voucher_input("abcd-1234 efgh_5678-XYZ"),
            "ABCD-1234-EFGH-5678"
        );
    }

    #[test]
    fn format_is_idempotent() {
        let once = format_voucher_input("qwer tyui opas dfgh");
        assert_eq!(format_voucher_input(&once), once);
    }

    #[test]
    fn format_drops_non_ascii() {
        assert_eq!(format_voucher_input("ÅÄÖabc"), "ABC");
    }

    #[test]
    fn description_for_thirty_days() {
        let expiry = Utc.with_ymd_and_hms(2026, 11, 18, 12, 0, 0).unwrap();
        let s = VoucherSubmission::from_time_added(30 * SECS_PER_DAY, expiry);
        assert_eq!(s.time_added, 2_592_000);
        assert_eq!(
            s.description,
            "30 days were added to your account. Paid until 2026-11-18."
        );
    }

    #[test]
    fn time_phrase_singular_and_sub_day() {
        assert_eq!(time_added_phrase(SECS_PER_DAY), "1 day was added to your account");
        assert_eq!(time_added_phrase(SECS_PER_HOUR), "1 hour was added to your account");
        assert_eq!(
            time_added_phrase(5 * SECS_PER_HOUR),
            "5 hours were added to your account"
        );
        assert_eq!(time_added_phrase(59), "Less than an hour was added to your account");
    }

    #[test]
    fn error_kinds_round_trip_through_names() {
        for kind in VoucherSubmissionError::iter() {
            let name: &'static str = kind.into();
            assert_eq!(VoucherSubmissionError::from_str(name).unwrap(), kind);
        }
        assert_eq!(VoucherSubmissionError::VoucherAlreadyUsed.to_string(), "voucher-already-used");
    }
}
