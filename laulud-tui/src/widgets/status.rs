//! Placeholder shown in place of a list while its query has no data.

use laulud_cache::{QueryState, QueryStatus};
use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::theme::{query_status_color, LauludTheme};

pub struct QueryPlaceholder {
    pub title: String,
    pub message: String,
    pub style: Style,
}

impl QueryPlaceholder {
    /// `None` once there is data to show. Data kept through a failed
    /// refetch is still shown; the error goes to the footer.
    pub fn for_state<V>(
        title: impl Into<String>,
        state: &QueryState<V>,
        idle_hint: &str,
        theme: &LauludTheme,
    ) -> Option<Self> {
        if state.data.is_some() {
            return None;
        }
        let message = match state.status {
            QueryStatus::Idle => idle_hint.to_string(),
            QueryStatus::Loading => "Loading…".to_string(),
            QueryStatus::Error => state
                .error
                .as_ref()
                .map_or_else(|| "Request failed".to_string(), ToString::to_string),
            QueryStatus::Success => "Nothing here".to_string(),
        };
        Some(Self {
            title: title.into(),
            message,
            style: Style::default().fg(query_status_color(state.status, theme)),
        })
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let paragraph = Paragraph::new(self.message.clone())
            .style(self.style)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(self.title.as_str())
                    .borders(Borders::ALL),
            );
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laulud_core::LauludError;

    #[test]
    fn test_placeholder_messages() {
        let theme = LauludTheme::laulud();
        let idle: QueryState<u32> = QueryState::idle();
        let placeholder = QueryPlaceholder::for_state("Results", &idle, "Type to search", &theme);
        assert_eq!(placeholder.unwrap().message, "Type to search");

        let failed = QueryState::<u32> {
            status: QueryStatus::Error,
            error: Some(LauludError::Unauthenticated),
            ..QueryState::idle()
        };
        let placeholder = QueryPlaceholder::for_state("Results", &failed, "", &theme);
        assert_eq!(placeholder.unwrap().message, "Not authenticated");
    }

    #[test]
    fn test_no_placeholder_with_data() {
        let theme = LauludTheme::laulud();
        let state = QueryState {
            status: QueryStatus::Success,
            data: Some(1u32),
            ..QueryState::idle()
        };
        assert!(QueryPlaceholder::for_state("Results", &state, "", &theme).is_none());
    }
}
