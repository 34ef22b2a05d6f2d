//! One row of the settings list: title, optional detail, trailing accessory.
//!
//! The detail either sits right-aligned on the title line
//! ([`SettingsRowStyle::Value`]) or on its own line beneath the title
//! ([`SettingsRowStyle::Subtitle`]).
//!
//! The accessory is picked from a static table keyed by [`DisclosureKind`]:
//!
//! | Kind           | Icon            | Glyph |
//! |----------------|-----------------|-------|
//! | `None`         | (none)          |       |
//! | `Chevron`      | `IconChevron`   | `›`   |
//! | `ExternalLink` | `IconExtlink`   | `↗`   |
//! | `Tick`         | `IconTickSml`   | `✓`   |

use std::borrow::Cow;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use strum::{Display, EnumIter};

use crate::theme;

/// Named accessory image with its terminal rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub name: &'static str,
    pub glyph: &'static str,
}

const ICON_CHEVRON: Icon = Icon {
    name: "IconChevron",
    glyph: "›",
};
const ICON_EXTLINK: Icon = Icon {
    name: "IconExtlink",
    glyph: "↗",
};
const ICON_TICK_SMALL: Icon = Icon {
    name: "IconTickSml",
    glyph: "✓",
};

/// Trailing visual cue on a settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum DisclosureKind {
    #[default]
    None,
    Chevron,
    ExternalLink,
    Tick,
}

impl DisclosureKind {
    /// The accessory icon for this kind; `None` has no accessory.
    pub const fn icon(self) -> Option<Icon> {
        match self {
            Self::None => None,
            Self::Chevron => Some(ICON_CHEVRON),
            Self::ExternalLink => Some(ICON_EXTLINK),
            Self::Tick => Some(ICON_TICK_SMALL),
        }
    }
}

/// Where a row's detail text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsRowStyle {
    /// Right-aligned on the title line.
    #[default]
    Value,
    /// Dimmed on the line below the title.
    Subtitle,
}

/// Settings list row widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRow<'a> {
    title: Cow<'a, str>,
    detail: Option<Cow<'a, str>>,
    style: SettingsRowStyle,
    disclosure: DisclosureKind,
    accessory: Option<Icon>,
    selected: bool,
}

impl<'a> SettingsRow<'a> {
    pub fn new(title: impl Into<Cow<'a, str>>) -> Self {
        Self {
            title: title.into(),
            detail: None,
            style: SettingsRowStyle::Value,
            disclosure: DisclosureKind::None,
            accessory: None,
            selected: false,
        }
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<Cow<'a, str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn style(mut self, style: SettingsRowStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn disclosure(mut self, kind: DisclosureKind) -> Self {
        self.set_disclosure(kind);
        self
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Change the disclosure kind. The accessory is replaced (or cleared)
    /// immediately; setting the same kind twice leaves the row unchanged.
    pub fn set_disclosure(&mut self, kind: DisclosureKind) {
        self.disclosure = kind;
        self.accessory = kind.icon();
    }

    pub fn set_detail(&mut self, detail: Option<impl Into<Cow<'a, str>>>) {
        self.detail = detail.map(Into::into);
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn disclosure_kind(&self) -> DisclosureKind {
        self.disclosure
    }

    /// The accessory currently shown, if any.
    pub fn accessory(&self) -> Option<Icon> {
        self.accessory
    }

    /// Lines this row occupies.
    pub fn height(&self) -> u16 {
        match (self.style, &self.detail) {
            (SettingsRowStyle::Subtitle, Some(_)) => 2,
            _ => 1,
        }
    }
}

impl Widget for &SettingsRow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        let (base, title_style, detail_style) = if self.selected {
            (
                theme::row_selected(),
                theme::row_selected(),
                theme::row_detail().bg(theme::BG_HIGHLIGHT),
            )
        } else {
            (Style::default(), theme::row_title(), theme::row_detail())
        };
        buf.set_style(area, base);

        let left = area.x.saturating_add(1);
        let mut right = area.right().saturating_sub(1);

        // Accessory sits flush with the right margin.
        if let Some(icon) = self.accessory() {
            let x = right.saturating_sub(1);
            if x >= left {
                buf.set_span(x, area.y, &Span::styled(icon.glyph, theme::disclosure_icon()), 1);
                right = x.saturating_sub(1);
            }
        }

        let title_width = right.saturating_sub(left);
        let (title_end, _) = buf.set_stringn(left, area.y, &self.title, usize::from(title_width), title_style);

        let Some(ref detail) = self.detail else {
            return;
        };
        match self.style {
            // Right-aligned, dropped rather than overlapping the title.
            SettingsRowStyle::Value => {
                let detail_width =
                    u16::try_from(Span::raw(detail.as_ref()).width()).unwrap_or(u16::MAX);
                let start = right.saturating_sub(detail_width);
                if start > title_end {
                    buf.set_stringn(start, area.y, detail, usize::from(detail_width), detail_style);
                }
            }
            // Needs a second line; a one-line area shows the title only.
            SettingsRowStyle::Subtitle => {
                if area.height >= 2 {
                    buf.set_stringn(left, area.y + 1, detail, usize::from(title_width), detail_style);
                }
            }
        }
    }
}

impl Widget for SettingsRow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        (&self).render(area, buf);
    }
}
