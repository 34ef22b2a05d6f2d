//! All possible UI actions. Actions are the sole mechanism for state mutation.

use tunnely_core::{ServiceConnectionState, VoucherDialogUiState};

/// Account service connection as shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Ready,
    /// Setup failed; the message is shown to the user.
    Failed(String),
}

impl ConnectionStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "connected",
            Self::Failed(reason) => reason,
        }
    }
}

impl From<&ServiceConnectionState> for ConnectionStatus {
    fn from(state: &ServiceConnectionState) -> Self {
        match state {
            ServiceConnectionState::Disconnected => Self::Disconnected,
            ServiceConnectionState::Connecting => Self::Connecting,
            ServiceConnectionState::ConnectedReady(_) => Self::Ready,
        }
    }
}

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
}

/// A toast shown in the status bar until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Voucher dialog ─────────────────────────────────────────────
    OpenVoucherDialog,
    CloseVoucherDialog,
    VoucherStateChanged(VoucherDialogUiState),

    // ── Connection (from the connection bridge) ────────────────────
    ConnectionChanged(ConnectionStatus),

    // ── Settings ───────────────────────────────────────────────────
    AutoConnectChanged(bool),

    // ── Notifications ──────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
