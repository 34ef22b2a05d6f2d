//! Settings list: account, voucher redemption, help, auto-connect and version.
//!
//! Rows are drawn with [`SettingsRow`]; each row's disclosure accessory
//! tells the user what activating it does (navigate, open a link, toggle).

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::{Block, BorderType, Borders};

use crate::action::{Action, ConnectionStatus, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::settings_row::{DisclosureKind, SettingsRow, SettingsRowStyle};

pub const FAQ_URL: &str = "https://tunnely.net/help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingsItem {
    Account,
    RedeemVoucher,
    FaqGuides,
    AutoConnect,
    AppVersion,
}

impl SettingsItem {
    const ALL: [SettingsItem; 5] = [
        Self::Account,
        Self::RedeemVoucher,
        Self::FaqGuides,
        Self::AutoConnect,
        Self::AppVersion,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::RedeemVoucher => "Redeem voucher",
            Self::FaqGuides => "FAQ & guides",
            Self::AutoConnect => "Auto-connect",
            Self::AppVersion => "App version",
        }
    }
}

pub struct SettingsScreen {
    profile_name: String,
    rows: Vec<(SettingsItem, SettingsRow<'static>)>,
    selected: usize,
    auto_connect: bool,
}

impl SettingsScreen {
    pub fn new(profile_name: impl Into<String>, auto_connect: bool) -> Self {
        let profile_name = profile_name.into();
        let rows = SettingsItem::ALL
            .iter()
            .map(|&item| {
                let row = SettingsRow::new(item.title());
                let row = match item {
                    SettingsItem::Account => row
                        .detail(format!("{profile_name} · disconnected"))
                        .disclosure(DisclosureKind::Chevron),
                    SettingsItem::RedeemVoucher => row.disclosure(DisclosureKind::Chevron),
                    SettingsItem::FaqGuides => row
                        .detail(FAQ_URL.trim_start_matches("https://"))
                        .style(SettingsRowStyle::Subtitle)
                        .disclosure(DisclosureKind::ExternalLink),
                    SettingsItem::AutoConnect => row.disclosure(tick_if(auto_connect)),
                    SettingsItem::AppVersion => row.detail(env!("CARGO_PKG_VERSION")),
                };
                (item, row)
            })
            .collect();

        let mut screen = Self {
            profile_name,
            rows,
            selected: 0,
            auto_connect,
        };
        screen.sync_selection();
        screen
    }

    fn selected_item(&self) -> SettingsItem {
        self.rows
            .get(self.selected)
            .map_or(SettingsItem::Account, |(item, _)| *item)
    }

    fn row_mut(&mut self, item: SettingsItem) -> Option<&mut SettingsRow<'static>> {
        self.rows
            .iter_mut()
            .find(|(i, _)| *i == item)
            .map(|(_, row)| row)
    }

    fn sync_selection(&mut self) {
        let selected = self.selected;
        for (idx, (_, row)) in self.rows.iter_mut().enumerate() {
            row.set_selected(idx == selected);
        }
    }

    fn move_selection(&mut self, down: bool) {
        let last = self.rows.len().saturating_sub(1);
        self.selected = if down {
            (self.selected + 1).min(last)
        } else {
            self.selected.saturating_sub(1)
        };
        self.sync_selection();
    }

    fn activate(&mut self) -> Option<Action> {
        match self.selected_item() {
            SettingsItem::Account => Some(Action::Notify(Notification::info(format!(
                "Profile '{}' (manage with: tunnely config set-token)",
                self.profile_name
            )))),
            SettingsItem::RedeemVoucher => Some(Action::OpenVoucherDialog),
            SettingsItem::FaqGuides => Some(Action::Notify(Notification::info(format!(
                "FAQ & guides: {FAQ_URL}"
            )))),
            SettingsItem::AutoConnect => {
                self.auto_connect = !self.auto_connect;
                let kind = tick_if(self.auto_connect);
                if let Some(row) = self.row_mut(SettingsItem::AutoConnect) {
                    row.set_disclosure(kind);
                }
                Some(Action::AutoConnectChanged(self.auto_connect))
            }
            SettingsItem::AppVersion => None,
        }
    }

    fn set_connection_status(&mut self, status: &ConnectionStatus) {
        let detail = format!("{} · {}", self.profile_name, status.label());
        if let Some(row) = self.row_mut(SettingsItem::Account) {
            row.set_detail(Some(detail));
        }
    }
}

fn tick_if(on: bool) -> DisclosureKind {
    if on {
        DisclosureKind::Tick
    } else {
        DisclosureKind::None
    }
}

impl Component for SettingsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(true);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(false);
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::ConnectionChanged(status) = action {
            self.set_connection_status(status);
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Settings ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Each row followed by a blank spacer line.
        let constraints = self
            .rows
            .iter()
            .flat_map(|(_, row)| [Constraint::Length(row.height()), Constraint::Length(1)])
            .chain(std::iter::once(Constraint::Min(0)));
        let chunks = Layout::vertical(constraints).split(inner);

        for (idx, (_, row)) in self.rows.iter().enumerate() {
            if let Some(&chunk) = chunks.get(idx * 2) {
                frame.render_widget(row, chunk);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn press(screen: &mut SettingsScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn select(screen: &mut SettingsScreen, item: SettingsItem) {
        while screen.selected_item() != item {
            press(screen, KeyCode::Down);
        }
    }

    fn disclosure_of(screen: &SettingsScreen, item: SettingsItem) -> DisclosureKind {
        screen
            .rows
            .iter()
            .find(|(i, _)| *i == item)
            .map(|(_, row)| row.disclosure_kind())
            .unwrap()
    }

    #[test]
    fn rows_carry_expected_disclosures() {
        let screen = SettingsScreen::new("default", false);
        let kinds: Vec<_> = SettingsItem::ALL
            .iter()
            .map(|&i| disclosure_of(&screen, i))
            .collect();
        assert_eq!(
            kinds,
            vec![
                DisclosureKind::Chevron,
                DisclosureKind::Chevron,
                DisclosureKind::ExternalLink,
                DisclosureKind::None,
                DisclosureKind::None,
            ]
        );
    }

    #[test]
    fn redeem_row_opens_voucher_dialog() {
        let mut screen = SettingsScreen::new("default", false);
        select(&mut screen, SettingsItem::RedeemVoucher);
        assert_eq!(press(&mut screen, KeyCode::Enter), Some(Action::OpenVoucherDialog));
    }

    #[test]
    fn auto_connect_toggles_tick() {
        let mut screen = SettingsScreen::new("default", false);
        select(&mut screen, SettingsItem::AutoConnect);

        assert_eq!(press(&mut screen, KeyCode::Enter), Some(Action::AutoConnectChanged(true)));
        assert_eq!(disclosure_of(&screen, SettingsItem::AutoConnect), DisclosureKind::Tick);

        assert_eq!(press(&mut screen, KeyCode::Char(' ')), Some(Action::AutoConnectChanged(false)));
        assert_eq!(disclosure_of(&screen, SettingsItem::AutoConnect), DisclosureKind::None);
    }

    #[test]
    fn selection_stops_at_edges() {
        let mut screen = SettingsScreen::new("default", false);
        press(&mut screen, KeyCode::Up);
        assert_eq!(screen.selected_item(), SettingsItem::Account);

        for _ in 0..10 {
            press(&mut screen, KeyCode::Char('j'));
        }
        assert_eq!(screen.selected_item(), SettingsItem::AppVersion);
        assert_eq!(press(&mut screen, KeyCode::Enter), None);
    }

    #[test]
    fn connection_status_shows_in_account_row() {
        let mut screen = SettingsScreen::new("work", false);
        screen
            .update(&Action::ConnectionChanged(ConnectionStatus::Ready))
            .unwrap();

        let mut terminal = Terminal::new(TestBackend::new(40, 14)).unwrap();
        terminal.draw(|f| screen.render(f, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();

        assert!(text.contains("work · connected"), "{text}");
        assert!(text.contains("Redeem voucher"));
        assert!(text.contains('↗'));
        assert!(text.contains("tunnely.net/help"));
    }
}
