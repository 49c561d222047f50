use crate::bracket::Stroke;
use tui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeColor {
    Primary,
    Accent,
    Dim,
    Winner,
    Placeholder,
    Cursor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Theme {
    #[default]
    Dark,
}

pub fn resolve(color: ThemeColor, _theme: Theme) -> Style {
    match color {
        ThemeColor::Primary => Style::default().fg(Color::Gray),
        ThemeColor::Accent => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ThemeColor::Dim => Style::default().fg(Color::Indexed(240)),
        ThemeColor::Winner => Style::default().fg(Color::Rgb(117, 255, 122)).add_modifier(Modifier::BOLD),
        ThemeColor::Placeholder => Style::default().fg(Color::Indexed(240)).add_modifier(Modifier::ITALIC),
        ThemeColor::Cursor => Style::default().add_modifier(Modifier::REVERSED),
    }
}

/// Connector colour: bright for decided games, dim for undecided ones and
/// faint where no game row exists yet.
pub fn stroke_style(stroke: Stroke, _theme: Theme) -> Style {
    match stroke {
        Stroke::Decided => Style::default().fg(Color::Rgb(117, 255, 122)),
        Stroke::Undecided => Style::default().fg(Color::Rgb(39, 84, 40)),
        Stroke::Absent => Style::default().fg(Color::Rgb(23, 51, 24)),
    }
}
