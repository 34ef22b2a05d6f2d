//! Connection bridge: forwards core state into TUI actions.
//!
//! Runs as a background task: sets up the account service connection,
//! then forwards every connection-state change and every voucher dialog
//! transition as an [`Action`] through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tunnely_core::{ServiceConfig, ServiceConnectionManager, VoucherDialogViewModel};

use crate::action::{Action, ConnectionStatus};

/// Where the connection settings come from.
pub enum ServiceSetup {
    Configured(Box<ServiceConfig>),
    /// Configuration could not be resolved; the reason is shown to the user.
    Unavailable(String),
}

pub async fn spawn_connection_bridge(
    connection: ServiceConnectionManager,
    setup: ServiceSetup,
    vm: VoucherDialogViewModel,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut conn_state = connection.connection_state();
    let mut voucher = vm.subscribe();

    let _ = action_tx.send(Action::ConnectionChanged(ConnectionStatus::Connecting));

    let status = match setup {
        ServiceSetup::Configured(config) => match connection.connect(&config) {
            Ok(()) => ConnectionStatus::Ready,
            Err(e) => {
                warn!(error = %e, "failed to set up account service");
                ConnectionStatus::Failed(e.to_string())
            }
        },
        ServiceSetup::Unavailable(reason) => {
            warn!(%reason, "account service not configured");
            ConnectionStatus::Failed(reason)
        }
    };
    // The transitions made by connect() are summarised by `status`.
    conn_state.mark_unchanged();
    let _ = action_tx.send(Action::ConnectionChanged(status));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = conn_state.changed() => {
                let status = ConnectionStatus::from(&*conn_state.borrow_and_update());
                debug!(status = status.label(), "dispatching ConnectionChanged");
                let _ = action_tx.send(Action::ConnectionChanged(status));
            }
            Some(ui) = voucher.next() => {
                let _ = action_tx.send(Action::VoucherStateChanged(ui));
            }
        }
    }

    debug!("connection bridge shut down");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use tunnely_core::MessageCatalog;

    use super::*;

    fn vm(connection: &ServiceConnectionManager) -> VoucherDialogViewModel {
        VoucherDialogViewModel::new(connection.clone(), Arc::new(MessageCatalog::english()))
    }

    #[tokio::test]
    async fn configured_service_becomes_ready() {
        let connection = ServiceConnectionManager::new();
        let config = ServiceConfig::new(
            "https://api.example.net".parse().unwrap(),
            SecretString::from("token".to_string()),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let bridge = tokio::spawn(spawn_connection_bridge(
            connection.clone(),
            ServiceSetup::Configured(Box::new(config)),
            vm(&connection),
            tx,
            cancel.clone(),
        ));

        assert_eq!(
            rx.recv().await,
            Some(Action::ConnectionChanged(ConnectionStatus::Connecting))
        );
        assert_eq!(
            rx.recv().await,
            Some(Action::ConnectionChanged(ConnectionStatus::Ready))
        );
        assert!(connection.current_state().is_ready());

        cancel.cancel();
        bridge.await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_setup_reports_reason_and_forwards_input() {
        let connection = ServiceConnectionManager::new();
        let vm = vm(&connection);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let bridge = tokio::spawn(spawn_connection_bridge(
            connection.clone(),
            ServiceSetup::Unavailable("no account token".into()),
            vm.clone(),
            tx,
            cancel.clone(),
        ));

        rx.recv().await;
        assert_eq!(
            rx.recv().await,
            Some(Action::ConnectionChanged(ConnectionStatus::Failed(
                "no account token".into()
            )))
        );

        vm.on_voucher_input_change("abcd");
        match rx.recv().await {
            Some(Action::VoucherStateChanged(ui)) => assert_eq!(ui.voucher_input, "ABCD"),
            other => panic!("unexpected action: {other:?}"),
        }

        cancel.cancel();
        bridge.await.unwrap();
    }
}
