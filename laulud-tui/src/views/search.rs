//! Search view: query input, result tabs and results with their tags.

use crate::search::SearchFocus;
use crate::state::{App, EditTarget};
use crate::theme::item_kind_color;
use crate::views::{item, pane_border};
use crate::widgets::{QueryPlaceholder, TagChips};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = if app.search.selected_uri().is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(columns[0]);

    render_input(f, app, rows[0]);
    render_tabs(f, app, rows[1]);
    render_results(f, app, rows[2]);

    if columns.len() > 1 {
        item::render(f, app, columns[1], app.search.focus == SearchFocus::Item);
    }
}

fn render_input(f: &mut Frame<'_>, app: &App, area: Rect) {
    let editing = app.editing == Some(EditTarget::Search);
    let text = if editing {
        format!("{}_", app.search.input)
    } else if app.search.input.is_empty() {
        "Press / to search tracks, albums and artists".to_string()
    } else {
        app.search.input.clone()
    };
    let style = if editing || !app.search.input.is_empty() {
        Style::default().fg(app.theme.text)
    } else {
        Style::default().fg(app.theme.text_dim)
    };
    let title = if app.search.is_debouncing() {
        "Search …"
    } else {
        "Search"
    };
    let paragraph = Paragraph::new(text).style(style).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(pane_border(app, editing)),
    );
    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame<'_>, app: &App, area: Rect) {
    let counts = app.search.tab_counts();
    let titles: Vec<Line> = counts
        .iter()
        .map(|(kind, count)| Line::from(format!("{} ({})", kind.plural_label(), count)))
        .collect();
    let selected = counts
        .iter()
        .position(|(kind, _)| *kind == app.search.tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(app.theme.text_dim))
        .highlight_style(
            Style::default()
                .fg(item_kind_color(app.search.tab, &app.theme))
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_results(f: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = app.search.focus == SearchFocus::Results && app.editing.is_none();
    let state = app.search.results_state();
    if let Some(placeholder) =
        QueryPlaceholder::for_state("Results", &state, "Type to search", &app.theme)
    {
        placeholder.render(f, area);
        return;
    }

    let results = app.search.visible_items();
    let selected_uri = app.search.selected_uri();
    let items: Vec<ListItem> = results
        .iter()
        .map(|result| {
            let marker = if Some(result.uri()) == selected_uri { "▶ " } else { "  " };
            let mut title = vec![
                Span::raw(marker),
                Span::styled(
                    result.item.name().to_string(),
                    Style::default().fg(app.theme.text),
                ),
            ];
            let subtitle = result.item.subtitle();
            if !subtitle.is_empty() {
                title.push(Span::styled(
                    format!("  {}", subtitle),
                    Style::default().fg(app.theme.text_dim),
                ));
            }
            let mut chips = TagChips::new(&result.tags, &app.theme).line();
            chips.spans.insert(0, Span::raw("  "));
            ListItem::new(Text::from(vec![Line::from(title), chips]))
        })
        .collect();

    let mut list_state = ListState::default();
    if !results.is_empty() {
        list_state.select(Some(app.search.selected));
    }

    let title = if state.is_fetching {
        format!("Results for \"{}\" (refreshing)", app.search.query())
    } else {
        format!("Results for \"{}\"", app.search.query())
    };
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
