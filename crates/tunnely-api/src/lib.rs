// tunnely-api: Async Rust client for the tunnely account service

pub mod accounts;
pub mod error;
pub mod transport;

pub use accounts::{AccountsClient, INVALID_VOUCHER, SubmitVoucherResponse, VOUCHER_USED};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
