//! View rendering dispatch.

pub mod item;
pub mod login;
pub mod search;
pub mod tags;

use crate::nav::{Route, View};
use crate::state::App;
use crate::theme::notification_color;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    if app.auth.is_checking() {
        render_loading(f, app, f.size());
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match &app.route {
        Route::Search { .. } => search::render(f, app, layout[1]),
        Route::Tags { .. } => tags::render(f, app, layout[1]),
        Route::Home | Route::Login { .. } => login::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

/// The session check blocks the whole screen.
fn render_loading(f: &mut Frame<'_>, app: &App, area: Rect) {
    let paragraph = Paragraph::new("Checking session…")
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.text_dim))
        .block(Block::default().borders(Borders::ALL).title("Laulud"));
    f.render_widget(paragraph, area);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let user = match app.current_user() {
        Some(user) => user.label().to_string(),
        None if app.auth.is_authenticated() => "…".to_string(),
        None => "not logged in".to_string(),
    };
    let titles: Vec<Line> = View::all()
        .iter()
        .map(|view| Line::from(view.title()))
        .collect();
    let mut tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    format!("Laulud | {}", user),
                    Style::default().fg(app.theme.primary),
                )),
        )
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    if let Some(view) = app.active_view() {
        tabs = tabs.select(view.index());
    }
    f.render_widget(tabs, area);
}

fn help_text(app: &App) -> &'static str {
    if app.editing.is_some() {
        return "Enter confirm • Esc cancel";
    }
    match app.active_view() {
        Some(View::Search) => {
            "/ search • j/k move • h/l tab • Enter open • a add tag • d delete tag • Tab tags • L log out • q quit"
        }
        Some(View::Tags) => {
            "j/k move • Enter open • Esc back • a add tag • d remove tag • Tab search • L log out • q quit"
        }
        None => "Enter check login • q quit",
    }
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (text, style) = match app.last_notification() {
        Some(note) => (
            format!("{}: {}  (x to dismiss)", note.label().to_uppercase(), note.message),
            Style::default().fg(notification_color(note.level, &app.theme)),
        ),
        None => (
            help_text(app).to_string(),
            Style::default().fg(app.theme.text_dim),
        ),
    };
    let mut block = Block::default().borders(Borders::ALL);
    if app.is_saving() {
        block = block.title(Span::styled("Saving…", Style::default().fg(app.theme.warning)));
    }
    let footer = Paragraph::new(text).block(block).style(style);
    f.render_widget(footer, area);
}

/// Border style for a pane, brighter when it has focus.
pub(crate) fn pane_border(app: &App, focused: bool) -> Style {
    if focused {
        Style::default().fg(app.theme.border_focus)
    } else {
        Style::default().fg(app.theme.border)
    }
}
