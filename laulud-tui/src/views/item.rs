//! Item details pane: metadata, tag chips and the new-tag input.

use crate::state::{App, EditTarget};
use crate::theme::item_kind_color;
use crate::views::pane_border;
use crate::widgets::{DetailPanel, QueryPlaceholder, TagChips};
use laulud_core::TaggedItem;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect, focused: bool) {
    let state = app.search.item_state();
    let Some(item) = app.search.item() else {
        if let Some(placeholder) = QueryPlaceholder::for_state("Item", &state, "", &app.theme) {
            placeholder.render(f, area);
        }
        return;
    };

    let detail = DetailPanel {
        title: item.item.name(),
        fields: fields(&item),
        extra: extra_lines(app, &item, focused),
        label_style: Style::default().fg(item_kind_color(item.item.kind(), &app.theme)),
        border_style: pane_border(app, focused),
    };
    detail.render(f, area);
}

fn fields(item: &TaggedItem) -> Vec<(&'static str, String)> {
    let mut fields = vec![("Type", item.item.kind().to_string())];
    let subtitle = item.item.subtitle();
    if !subtitle.is_empty() {
        fields.push(("By", subtitle));
    }
    fields.push(("URI", item.uri().to_string()));
    let url = item.item.external_url();
    if !url.is_empty() {
        fields.push(("Open", url.to_string()));
    }
    fields
}

fn extra_lines(app: &App, item: &TaggedItem, focused: bool) -> Vec<Line<'static>> {
    let mut chips = TagChips::new(&item.tags, &app.theme);
    if focused {
        chips = chips.with_selected(app.search.selected_tag);
    }
    let mut lines = vec![chips.line()];
    if let Some(EditTarget::NewTag { uri, .. }) = &app.editing {
        if uri == item.uri() {
            lines.push(Line::from(vec![
                Span::styled("New tag: ", Style::default().fg(app.theme.tag)),
                Span::styled(
                    format!("{}_", app.tag_input),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
        }
    }
    lines
}
