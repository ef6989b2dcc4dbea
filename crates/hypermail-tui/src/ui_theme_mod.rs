use ratatui::style::{Color, Modifier, Style};

use super::{UiTheme, log_debug};

impl UiTheme {
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "default" => Self::default_theme(),
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            other => {
                log_debug(&format!("config warn unknown theme {:?}; using default", other));
                Self::default_theme()
            }
        }
    }

    pub(crate) fn default_theme() -> Self {
        Self {
            base: Style::default(),
            border: Style::default(),
            bar: Style::default(),
            show_bars: true,
            title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            focus_bg: Style::default().bg(Color::DarkGray),
            table_header: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            unread: Style::default().fg(Color::Yellow),
            label: Style::default().fg(Color::Gray),
            label_focus: Style::default().fg(Color::Yellow),
            muted: Style::default().fg(Color::DarkGray),
            hotkey: Style::default().fg(Color::Cyan),
            error: Style::default().fg(Color::LightRed),
            success: Style::default().fg(Color::Green),
            warn: Style::default().fg(Color::Yellow),
        }
    }

    pub(crate) fn nord() -> Self {
        let nord0 = Color::Rgb(46, 52, 64);
        let nord2 = Color::Rgb(67, 76, 94);
        let nord3 = Color::Rgb(76, 86, 106);
        let nord4 = Color::Rgb(216, 222, 233);
        let nord6 = Color::Rgb(236, 239, 244);
        let nord8 = Color::Rgb(136, 192, 208);
        let nord11 = Color::Rgb(191, 97, 106);
        let nord13 = Color::Rgb(235, 203, 139);
        let nord14 = Color::Rgb(163, 190, 140);
        Self {
            base: Style::default().fg(nord6).bg(nord0),
            border: Style::default().fg(nord4),
            bar: Style::default().fg(nord6).bg(nord2),
            show_bars: false,
            title: Style::default().fg(nord8).add_modifier(Modifier::BOLD),
            focus_bg: Style::default().bg(nord2),
            table_header: Style::default().fg(nord6).add_modifier(Modifier::BOLD),
            unread: Style::default().fg(nord13),
            label: Style::default().fg(nord4),
            label_focus: Style::default().fg(nord8),
            muted: Style::default().fg(nord3),
            hotkey: Style::default().fg(nord8),
            error: Style::default().fg(nord11),
            success: Style::default().fg(nord14),
            warn: Style::default().fg(nord13),
        }
    }

    pub(crate) fn gruvbox() -> Self {
        let bg = Color::Rgb(40, 40, 40);
        let bg_alt = Color::Rgb(60, 56, 54);
        let fg = Color::Rgb(235, 219, 178);
        let border = Color::Rgb(146, 131, 116);
        let accent = Color::Rgb(131, 165, 152);
        let warn = Color::Rgb(250, 189, 47);
        let err = Color::Rgb(204, 36, 29);
        let ok = Color::Rgb(184, 187, 38);
        Self {
            base: Style::default().fg(fg).bg(bg),
            border: Style::default().fg(border),
            bar: Style::default().fg(fg).bg(bg_alt),
            show_bars: false,
            title: Style::default().fg(warn).add_modifier(Modifier::BOLD),
            focus_bg: Style::default().bg(bg_alt),
            table_header: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            unread: Style::default().fg(warn),
            label: Style::default().fg(border),
            label_focus: Style::default().fg(accent),
            muted: Style::default().fg(border),
            hotkey: Style::default().fg(accent),
            error: Style::default().fg(err),
            success: Style::default().fg(ok),
            warn: Style::default().fg(warn),
        }
    }
}
