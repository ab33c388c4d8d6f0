//! Laulud theme and color utilities.

use crate::notifications::NotificationLevel;
use laulud_cache::QueryStatus;
use laulud_core::ItemKind;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct LauludTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub tag: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl LauludTheme {
    pub fn laulud() -> Self {
        Self {
            bg: Color::Rgb(18, 18, 18),
            bg_highlight: Color::Rgb(40, 40, 40),
            primary: Color::Rgb(30, 215, 96),
            primary_dim: Color::Rgb(20, 120, 60),
            secondary: Color::Rgb(80, 155, 245),
            tag: Color::Rgb(245, 155, 35),
            success: Color::Rgb(30, 215, 96),
            warning: Color::Rgb(255, 200, 0),
            error: Color::Rgb(230, 60, 60),
            info: Color::Rgb(80, 155, 245),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(170, 170, 170),
            border: Color::Rgb(83, 83, 83),
            border_focus: Color::Rgb(30, 215, 96),
        }
    }
}

pub fn query_status_color(status: QueryStatus, theme: &LauludTheme) -> Color {
    match status {
        QueryStatus::Idle => theme.text_dim,
        QueryStatus::Loading => theme.warning,
        QueryStatus::Success => theme.success,
        QueryStatus::Error => theme.error,
    }
}

pub fn item_kind_color(kind: ItemKind, theme: &LauludTheme) -> Color {
    match kind {
        ItemKind::Track => theme.primary,
        ItemKind::Album => theme.secondary,
        ItemKind::Artist => theme.tag,
    }
}

pub fn notification_color(level: NotificationLevel, theme: &LauludTheme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}
