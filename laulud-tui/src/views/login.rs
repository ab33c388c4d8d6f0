//! Login page.

use crate::state::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lines = vec![
        Line::from("Log in with Spotify in your browser:"),
        Line::default(),
        Line::from(Span::styled(
            app.login_url(),
            Style::default().fg(app.theme.primary),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Then copy the session cookie into auth.session_cookie and press Enter.",
            Style::default().fg(app.theme.text_dim),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Login").borders(Borders::ALL));
    f.render_widget(paragraph, area);
}
