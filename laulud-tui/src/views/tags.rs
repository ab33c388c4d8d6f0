//! Tags view: tag summaries on the left, items of the open tag on the right.

use crate::state::{App, EditTarget};
use crate::tags::TagsFocus;
use crate::views::pane_border;
use crate::widgets::{QueryPlaceholder, TagChips};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_summaries(f, app, columns[0]);
    render_details(f, app, columns[1]);
}

fn render_summaries(f: &mut Frame<'_>, app: &App, area: Rect) {
    let state = app.tags.list_state();
    if let Some(placeholder) = QueryPlaceholder::for_state("Tags", &state, "", &app.theme) {
        placeholder.render(f, area);
        return;
    }

    let summaries = app.tags.summaries();
    let open = app.tags.tag();
    let items: Vec<ListItem> = summaries
        .iter()
        .map(|summary| {
            let style = if Some(summary.tag.as_str()) == open {
                Style::default().fg(app.theme.tag).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.tag)
            };
            ListItem::new(Text::from(vec![
                Line::from(Span::styled(summary.tag.clone(), style)),
                Line::from(Span::styled(
                    format!("  {}", summary.items_label()),
                    Style::default().fg(app.theme.text_dim),
                )),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    if !summaries.is_empty() {
        list_state.select(Some(app.tags.selected));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .title("Tags")
                .borders(Borders::ALL)
                .border_style(pane_border(app, app.tags.focus == TagsFocus::List)),
        )
        .highlight_style(Style::default().bg(app.theme.bg_highlight));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_details(f: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(tag) = app.tags.tag() else {
        let hint = QueryPlaceholder {
            title: "Items".to_string(),
            message: "Select a tag to see its items".to_string(),
            style: Style::default().fg(app.theme.text_dim),
        };
        hint.render(f, area);
        return;
    };
    let title = format!("Tagged \"{}\"", tag);
    let state = app.tags.details_state();
    if let Some(placeholder) = QueryPlaceholder::for_state(title.clone(), &state, "", &app.theme)
    {
        placeholder.render(f, area);
        return;
    }

    let focused = app.tags.focus == TagsFocus::Details;
    let entries = app.tags.items();
    let editing_uri = match &app.editing {
        Some(EditTarget::NewTag { uri, .. }) => Some(uri),
        _ => None,
    };
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(
                        format!("{:<7}", entry.item.kind().as_str()),
                        Style::default().fg(app.theme.text_dim),
                    ),
                    Span::styled(
                        entry.item.name().to_string(),
                        Style::default().fg(app.theme.text),
                    ),
                ]),
                TagChips::new(&entry.tags, &app.theme).line(),
            ];
            if editing_uri == Some(entry.uri()) {
                lines.push(Line::from(Span::styled(
                    format!("New tag: {}_", app.tag_input),
                    Style::default().fg(app.theme.tag),
                )));
            }
            ListItem::new(Text::from(lines))
        })
        .collect();

    let mut list_state = ListState::default();
    if focused && !entries.is_empty() {
        list_state.select(Some(app.tags.selected_item));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(pane_border(app, focused)),
        )
        .highlight_style(Style::default().bg(app.theme.bg_highlight));
    f.render_stateful_widget(list, area, &mut list_state);
}
