//! Tag chips: an item's tags rendered inline as `[tag]` spans.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::theme::LauludTheme;

pub struct TagChips<'a> {
    pub tags: &'a [String],
    /// Chip drawn reversed, if any.
    pub selected: Option<usize>,
    pub theme: &'a LauludTheme,
}

impl<'a> TagChips<'a> {
    pub fn new(tags: &'a [String], theme: &'a LauludTheme) -> Self {
        Self {
            tags,
            selected: None,
            theme,
        }
    }

    pub fn with_selected(mut self, selected: usize) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn line(&self) -> Line<'static> {
        if self.tags.is_empty() {
            return Line::from(Span::styled(
                "no tags",
                Style::default().fg(self.theme.text_dim),
            ));
        }
        let chip = Style::default().fg(self.theme.tag);
        let mut spans = Vec::with_capacity(self.tags.len() * 2);
        for (index, tag) in self.tags.iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" "));
            }
            let style = if self.selected == Some(index) {
                chip.add_modifier(Modifier::REVERSED)
            } else {
                chip
            };
            spans.push(Span::styled(format!("[{}]", tag), style));
        }
        Line::from(spans)
    }
}
