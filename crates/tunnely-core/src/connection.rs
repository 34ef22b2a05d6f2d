// ── Service connection ──
//
// Tracks whether the backend capabilities (currently just the voucher
// redeemer) are available. Consumers gate their actions on
// `ConnectedReady` and read capabilities out of the container.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::redeemer::{ApiVoucherRedeemer, VoucherRedeemer};

/// Capabilities handed out once the service connection is ready.
#[derive(Clone)]
pub struct ServiceConnectionContainer {
    voucher_redeemer: Arc<dyn VoucherRedeemer>,
}

impl ServiceConnectionContainer {
    pub fn new(voucher_redeemer: Arc<dyn VoucherRedeemer>) -> Self {
        Self { voucher_redeemer }
    }

    pub fn voucher_redeemer(&self) -> Arc<dyn VoucherRedeemer> {
        Arc::clone(&self.voucher_redeemer)
    }
}

impl fmt::Debug for ServiceConnectionContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConnectionContainer")
            .finish_non_exhaustive()
    }
}

/// Connection state observable by consumers.
#[derive(Debug, Clone, Default)]
pub enum ServiceConnectionState {
    #[default]
    Disconnected,
    Connecting,
    ConnectedReady(ServiceConnectionContainer),
}

impl ServiceConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::ConnectedReady(_))
    }

    /// Short label for status bars and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::ConnectedReady(_) => "ready",
        }
    }
}

/// Owner of the service connection state.
///
/// Cheaply cloneable; every clone observes and drives the same state.
#[derive(Clone)]
pub struct ServiceConnectionManager {
    state: Arc<watch::Sender<ServiceConnectionState>>,
}

impl ServiceConnectionManager {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ServiceConnectionState::Disconnected);
        Self {
            state: Arc::new(state),
        }
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ServiceConnectionState> {
        self.state.subscribe()
    }

    /// The current connection state.
    pub fn current_state(&self) -> ServiceConnectionState {
        self.state.borrow().clone()
    }

    /// The voucher redeemer, available only while `ConnectedReady`.
    pub fn voucher_redeemer(&self) -> Option<Arc<dyn VoucherRedeemer>> {
        match &*self.state.borrow() {
            ServiceConnectionState::ConnectedReady(container) => Some(container.voucher_redeemer()),
            _ => None,
        }
    }

    // ── State transitions ────────────────────────────────────────────

    pub fn on_connecting(&self) {
        debug!("service connection: connecting");
        self.state.send_replace(ServiceConnectionState::Connecting);
    }

    pub fn on_ready(&self, container: ServiceConnectionContainer) {
        info!("service connection ready");
        self.state
            .send_replace(ServiceConnectionState::ConnectedReady(container));
    }

    pub fn on_disconnected(&self) {
        debug!("service connection: disconnected");
        self.state.send_replace(ServiceConnectionState::Disconnected);
    }

    /// Build the production capabilities from `config` and become ready.
    ///
    /// On failure the state returns to `Disconnected`.
    pub fn connect(&self, config: &ServiceConfig) -> Result<(), CoreError> {
        self.on_connecting();
        match ApiVoucherRedeemer::from_config(config) {
            Ok(redeemer) => {
                info!(api_url = %config.api_url, "account service configured");
                self.on_ready(ServiceConnectionContainer::new(Arc::new(redeemer)));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to set up account service client");
                self.on_disconnected();
                Err(e)
            }
        }
    }
}

impl Default for ServiceConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
