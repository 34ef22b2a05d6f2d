//! Application core: event loop, overlay management and action dispatch.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tunnely_core::{MessageResolver, ServiceConnectionManager, VoucherDialogViewModel};

use crate::action::{Action, ConnectionStatus, Notification, NotificationLevel};
use crate::component::Component;
use crate::connection_bridge::{ServiceSetup, spawn_connection_bridge};
use crate::event::{Event, EventReader};
use crate::screens::settings::SettingsScreen;
use crate::screens::voucher::VoucherDialog;
use crate::theme;
use crate::tui::Tui;

/// Ticks a notification stays visible (4 Hz tick).
const NOTIFICATION_TICKS: u16 = 16;

/// Top-level application state and event loop.
pub struct App {
    settings: SettingsScreen,
    voucher: VoucherDialog,
    voucher_open: bool,
    running: bool,
    connection_status: ConnectionStatus,
    notification: Option<(Notification, u16)>,
    connection: ServiceConnectionManager,
    vm: VoucherDialogViewModel,
    setup: Option<ServiceSetup>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(
        profile_name: String,
        setup: ServiceSetup,
        messages: std::sync::Arc<dyn MessageResolver>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let connection = ServiceConnectionManager::new();
        let vm = VoucherDialogViewModel::new(connection.clone(), messages);

        Self {
            settings: SettingsScreen::new(profile_name, false),
            voucher: VoucherDialog::new(vm.clone()),
            voucher_open: false,
            running: true,
            connection_status: ConnectionStatus::default(),
            notification: None,
            connection,
            vm,
            setup: Some(setup),
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        let (w, h) = tui.size().unwrap_or((80, 24));
        debug!(width = w, height = h, "terminal ready");

        self.settings.init(self.action_tx.clone())?;
        self.voucher.init(self.action_tx.clone())?;

        let cancel = CancellationToken::new();
        if let Some(setup) = self.setup.take() {
            tokio::spawn(spawn_connection_bridge(
                self.connection.clone(),
                setup,
                self.vm.clone(),
                self.action_tx.clone(),
                cancel.clone(),
            ));
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if action == Action::Render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        cancel.cancel();
        self.vm.on_dismiss();
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. The open overlay gets keys first.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.voucher_open {
            return self.voucher.handle_key_event(key);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Ok(Some(Action::Quit)),
            KeyCode::Char('r') => Ok(Some(Action::OpenVoucherDialog)),
            _ => self.settings.handle_key_event(key),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::OpenVoucherDialog => self.voucher_open = true,
            Action::CloseVoucherDialog => self.voucher_open = false,

            Action::ConnectionChanged(status) => {
                self.connection_status = status.clone();
                self.dispatch(action)?;
            }

            Action::VoucherStateChanged(ui) => {
                if let tunnely_core::VoucherDialogState::Success(submission) = &ui.voucher_state {
                    self.notification = Some((
                        Notification::success(submission.description.clone()),
                        NOTIFICATION_TICKS,
                    ));
                }
                self.dispatch(action)?;
            }

            Action::AutoConnectChanged(on) => {
                let state = if *on { "enabled" } else { "disabled" };
                self.notification = Some((
                    Notification::info(format!("Auto-connect {state}")),
                    NOTIFICATION_TICKS,
                ));
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), NOTIFICATION_TICKS));
            }
            Action::DismissNotification => self.notification = None,

            Action::Tick => {
                if let Some((_, ticks)) = &mut self.notification {
                    *ticks = ticks.saturating_sub(1);
                    if *ticks == 0 {
                        self.action_tx.send(Action::DismissNotification)?;
                    }
                }
                self.dispatch(action)?;
            }

            Action::Render | Action::Resize(..) => {}
        }
        Ok(())
    }

    /// Forward an action to both components, queueing any follow-ups.
    fn dispatch(&mut self, action: &Action) -> Result<()> {
        for follow_up in [self.settings.update(action)?, self.voucher.update(action)?]
            .into_iter()
            .flatten()
        {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content, status] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

        self.settings.render(frame, content);
        self.render_status_bar(frame, status);

        if self.voucher_open {
            self.voucher.render(frame, content);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match &self.connection_status {
            ConnectionStatus::Ready => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            ConnectionStatus::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionStatus::Failed(reason) => Span::styled(
                format!("○ {reason}"),
                Style::default().fg(theme::ERROR_RED),
            ),
        };

        let mut spans = vec![Span::raw(" "), indicator];
        if let Some((notification, _)) = &self.notification {
            let style = match notification.level {
                NotificationLevel::Success => theme::success_text(),
                NotificationLevel::Info => theme::row_title(),
            };
            spans.push(Span::styled(" │ ", theme::key_hint()));
            spans.push(Span::styled(notification.message.clone(), style));
        } else {
            spans.push(Span::styled(" │ ", theme::key_hint()));
            spans.push(Span::styled("↑/↓", theme::key_hint_key()));
            spans.push(Span::styled(" move  ", theme::key_hint()));
            spans.push(Span::styled("Enter", theme::key_hint_key()));
            spans.push(Span::styled(" select  ", theme::key_hint()));
            spans.push(Span::styled("r", theme::key_hint_key()));
            spans.push(Span::styled(" redeem  ", theme::key_hint()));
            spans.push(Span::styled("q", theme::key_hint_key()));
            spans.push(Span::styled(" quit", theme::key_hint()));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tunnely_core::MessageCatalog;

    use super::*;

    fn app() -> App {
        App::new(
            "default".into(),
            ServiceSetup::Unavailable("not configured".into()),
            Arc::new(MessageCatalog::english()),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn overlay_captures_keys_until_closed() {
        let mut app = app();
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('r'))).unwrap(),
            Some(Action::OpenVoucherDialog)
        );
        app.process_action(&Action::OpenVoucherDialog).unwrap();

        // 'q' is voucher input while the dialog is open.
        assert_eq!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap(), None);
        assert_eq!(app.vm.ui_state().voucher_input, "Q");

        let close = app.handle_key_event(key(KeyCode::Esc)).unwrap().unwrap();
        app.process_action(&close).unwrap();
        assert!(!app.voucher_open);
        assert_eq!(
            app.handle_key_event(key(KeyCode::Char('q'))).unwrap(),
            Some(Action::Quit)
        );
    }

    #[test]
    fn notifications_expire_after_ticks() {
        let mut app = app();
        app.process_action(&Action::Notify(Notification::info("hello")))
            .unwrap();

        for _ in 0..NOTIFICATION_TICKS {
            app.process_action(&Action::Tick).unwrap();
        }
        let queued = app.action_rx.try_recv().unwrap();
        assert_eq!(queued, Action::DismissNotification);
        app.process_action(&queued).unwrap();
        assert!(app.notification.is_none());
    }
}
