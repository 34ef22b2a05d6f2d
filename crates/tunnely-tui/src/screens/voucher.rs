//! Voucher redemption dialog, drawn as an overlay above the settings list.
//!
//! All redemption state lives in the [`VoucherDialogViewModel`]; this
//! component forwards keystrokes to it and renders whatever it publishes.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tracing::debug;
use tui_input::{Input, InputRequest};

use tunnely_core::{VoucherDialogState, VoucherDialogUiState, VoucherDialogViewModel};

use crate::action::{Action, ConnectionStatus};
use crate::component::Component;
use crate::theme;

const PLACEHOLDER: &str = "XXXX-XXXX-XXXX-XXXX";

pub struct VoucherDialog {
    vm: VoucherDialogViewModel,
    input: Input,
    ui: VoucherDialogUiState,
    connection: ConnectionStatus,
    throbber: ThrobberState,
}

impl VoucherDialog {
    pub fn new(vm: VoucherDialogViewModel) -> Self {
        let ui = vm.ui_state();
        Self {
            input: Input::new(ui.voucher_input.clone()),
            vm,
            ui,
            connection: ConnectionStatus::default(),
            throbber: ThrobberState::default(),
        }
    }

    /// Drop any in-flight attempt and clear the dialog.
    pub fn dismiss(&mut self) {
        self.vm.on_dismiss();
        self.sync_from_vm();
    }

    fn edit(&mut self, request: InputRequest) {
        self.input.handle(request);
        self.vm.on_voucher_input_change(self.input.value());
        self.sync_from_vm();
    }

    fn submit(&mut self) {
        if self.input.value().is_empty() {
            return;
        }
        if self.vm.on_redeem(self.input.value()).is_none() {
            debug!(connection = self.connection.label(), "redeem request not started");
        }
        self.sync_from_vm();
    }

    /// Adopt the view-model's latest state. Forwarded transitions may lag
    /// behind local edits, so the view-model is always read directly.
    fn sync_from_vm(&mut self) {
        let ui = self.vm.ui_state();
        if ui.voucher_input != self.input.value() {
            self.input = Input::new(ui.voucher_input.clone());
        }
        self.ui = ui;
    }

    fn status_lines(&self) -> Vec<Line<'_>> {
        match &self.ui.voucher_state {
            VoucherDialogState::Default if !self.connection.is_ready() => vec![Line::from(
                Span::styled(
                    format!("Account service {}", self.connection.label()),
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                ),
            )],
            VoucherDialogState::Default | VoucherDialogState::Verifying => Vec::new(),
            VoucherDialogState::Success(submission) => vec![
                Line::from(Span::styled("✓ Voucher redeemed", theme::success_text())),
                Line::from(Span::styled(submission.description.as_str(), theme::row_title())),
            ],
            VoucherDialogState::Error(message) => {
                vec![Line::from(Span::styled(message.as_str(), theme::error_text()))]
            }
        }
    }

    fn key_hints(&self) -> &'static str {
        match self.ui.voucher_state {
            VoucherDialogState::Verifying => "Esc cancel",
            VoucherDialogState::Success(_) => "Enter close",
            VoucherDialogState::Default | VoucherDialogState::Error(_) => {
                "Enter redeem  Ctrl+U clear  Esc cancel"
            }
        }
    }
}

impl Component for VoucherDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Esc {
            self.dismiss();
            return Ok(Some(Action::CloseVoucherDialog));
        }

        match self.ui.voucher_state {
            VoucherDialogState::Verifying => return Ok(None),
            VoucherDialogState::Success(_) => {
                if key.code != KeyCode::Enter {
                    return Ok(None);
                }
                self.dismiss();
                return Ok(Some(Action::CloseVoucherDialog));
            }
            VoucherDialogState::Default | VoucherDialogState::Error(_) => {}
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Char('u') if ctrl => self.edit(InputRequest::DeleteLine),
            KeyCode::Char(c) if !ctrl => self.edit(InputRequest::InsertChar(c)),
            KeyCode::Backspace => self.edit(InputRequest::DeletePrevChar),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::VoucherStateChanged(_) => self.sync_from_vm(),
            Action::ConnectionChanged(status) => self.connection = status.clone(),
            Action::Tick if self.ui.voucher_state.is_verifying() => self.throbber.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 52u16.min(area.width.saturating_sub(4));
        let height = 12u16.min(area.height.saturating_sub(2));
        let panel = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, panel);
        let block = Block::default()
            .title(" Redeem voucher ")
            .title_style(theme::title_style())
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let [label_area, input_area, status_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(" Enter voucher code", theme::row_title())),
            label_area,
        );

        let editing = !matches!(
            self.ui.voucher_state,
            VoucherDialogState::Verifying | VoucherDialogState::Success(_)
        );
        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if editing {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let input_inner = input_block.inner(input_area);
        let value = if self.input.value().is_empty() {
            Span::styled(PLACEHOLDER, theme::key_hint())
        } else {
            Span::styled(self.input.value(), theme::input_text())
        };
        frame.render_widget(Paragraph::new(value).block(input_block), input_area);
        if editing {
            let cursor = u16::try_from(self.input.visual_cursor()).unwrap_or(u16::MAX);
            frame.set_cursor_position(Position::new(
                input_inner.x.saturating_add(cursor).min(input_inner.right().saturating_sub(1)),
                input_inner.y,
            ));
        }

        if self.ui.voucher_state.is_verifying() {
            let throbber = Throbber::default()
                .label(" Verifying voucher...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ACCENT));
            frame.render_stateful_widget(throbber, status_area, &mut self.throbber.clone());
        } else {
            frame.render_widget(
                Paragraph::new(self.status_lines()).wrap(Wrap { trim: true }),
                status_area,
            );
        }

        frame.render_widget(
            Paragraph::new(Span::styled(self.key_hints(), theme::key_hint()))
                .alignment(Alignment::Center),
            hint_area,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use tunnely_core::{
        MessageCatalog, ServiceConnectionContainer, ServiceConnectionManager, VoucherRedeemer,
        VoucherSubmissionError, VoucherSubmissionResult,
    };

    use super::*;

    struct Rejecting;

    #[async_trait]
    impl VoucherRedeemer for Rejecting {
        async fn submit(&self, _voucher: &str) -> VoucherSubmissionResult {
            Err(VoucherSubmissionError::InvalidVoucher)
        }
    }

    fn dialog(ready: bool) -> VoucherDialog {
        let connection = ServiceConnectionManager::new();
        if ready {
            connection.on_ready(ServiceConnectionContainer::new(Arc::new(Rejecting)));
        }
        let vm = VoucherDialogViewModel::new(connection, Arc::new(MessageCatalog::english()));
        let mut dialog = VoucherDialog::new(vm);
        let status = if ready {
            ConnectionStatus::Ready
        } else {
            ConnectionStatus::Disconnected
        };
        dialog.update(&Action::ConnectionChanged(status)).unwrap();
        dialog
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(dialog: &mut VoucherDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn screen_text(dialog: &VoucherDialog) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal.draw(|f| dialog.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    async fn settle(dialog: &mut VoucherDialog) {
        let mut states = dialog.vm.subscribe();
        while states.current().voucher_state.is_verifying() {
            states.next().await.unwrap();
        }
        dialog
            .update(&Action::VoucherStateChanged(states.current().clone()))
            .unwrap();
    }

    #[test]
    fn typing_is_formatted_into_groups() {
        let mut dialog = dialog(true);
        type_str(&mut dialog, "abcd1234ef");
        assert_eq!(dialog.input.value(), "ABCD-1234-EF");

        dialog.handle_key_event(key(KeyCode::Backspace)).unwrap();
        dialog.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(dialog.input.value(), "ABCD-1234");
    }

    #[tokio::test]
    async fn rejected_voucher_shows_message_and_edit_clears_it() {
        let mut dialog = dialog(true);
        type_str(&mut dialog, "ABCD1234EFGH5678");
        dialog.handle_key_event(key(KeyCode::Enter)).unwrap();
        settle(&mut dialog).await;

        assert_eq!(
            dialog.ui.voucher_state,
            VoucherDialogState::Error("Voucher code is invalid.".into())
        );
        assert!(screen_text(&dialog).contains("Voucher code is invalid."));

        dialog.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert_eq!(dialog.ui.voucher_state, VoucherDialogState::Default);
    }

    #[test]
    fn enter_without_connection_does_nothing() {
        let mut dialog = dialog(false);
        type_str(&mut dialog, "ABCD");
        assert_eq!(dialog.handle_key_event(key(KeyCode::Enter)).unwrap(), None);
        assert_eq!(dialog.ui.voucher_state, VoucherDialogState::Default);
        assert!(screen_text(&dialog).contains("Account service disconnected"));
    }

    #[test]
    fn escape_closes_and_resets() {
        let mut dialog = dialog(true);
        type_str(&mut dialog, "ABCD");

        let action = dialog.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert_eq!(action, Some(Action::CloseVoucherDialog));
        assert_eq!(dialog.input.value(), "");
        assert_eq!(dialog.vm.ui_state(), VoucherDialogUiState::default());
    }

    #[test]
    fn empty_input_shows_placeholder() {
        let dialog = dialog(true);
        assert!(screen_text(&dialog).contains(PLACEHOLDER));
    }
}
