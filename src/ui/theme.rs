use crate::config::ThemeName;
use ratatui::style::Color;

/// Colours for one view. Passed into every render function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub warning: Color,   // Yellow, dangling arrows
    pub keyword: Color,
    pub string: Color,
    pub number: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub search_hit_bg: Color,
    pub function: Color,
    pub type_name: Color,
    pub arrow: Color,
    pub selected: Color,
    /// Text drawn on the coloured status chips
    pub chip_fg: Color,
}

impl Theme {
    pub fn named(name: ThemeName) -> Self {
        match name {
            ThemeName::Mocha => Self::mocha(),
            ThemeName::Latte => Self::latte(),
        }
    }

    /// Dark palette
    pub fn mocha() -> Self {
        Theme {
            bg: Color::Rgb(30, 30, 46),
            fg: Color::Rgb(205, 214, 244),
            primary: Color::Rgb(137, 180, 250),
            secondary: Color::Rgb(250, 179, 135),
            comment: Color::Rgb(108, 112, 134),
            success: Color::Rgb(166, 227, 161),
            error: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(249, 226, 175),
            keyword: Color::Rgb(137, 180, 250),
            string: Color::Rgb(250, 179, 135),
            number: Color::Rgb(250, 179, 135),
            border_focused: Color::Rgb(249, 226, 175),
            border_normal: Color::Rgb(108, 112, 134),
            current_line_bg: Color::Rgb(50, 50, 70),
            search_hit_bg: Color::Rgb(69, 71, 90),
            function: Color::Rgb(249, 226, 175),
            type_name: Color::Rgb(148, 226, 213),
            arrow: Color::Rgb(203, 166, 247),
            selected: Color::Rgb(245, 194, 231),
            chip_fg: Color::Black,
        }
    }

    /// Light palette
    pub fn latte() -> Self {
        Theme {
            bg: Color::Rgb(239, 241, 245),
            fg: Color::Rgb(76, 79, 105),
            primary: Color::Rgb(30, 102, 245),
            secondary: Color::Rgb(254, 100, 11),
            comment: Color::Rgb(140, 143, 161),
            success: Color::Rgb(64, 160, 43),
            error: Color::Rgb(210, 15, 57),
            warning: Color::Rgb(223, 142, 29),
            keyword: Color::Rgb(136, 57, 239),
            string: Color::Rgb(64, 160, 43),
            number: Color::Rgb(254, 100, 11),
            border_focused: Color::Rgb(223, 142, 29),
            border_normal: Color::Rgb(156, 160, 176),
            current_line_bg: Color::Rgb(220, 224, 232),
            search_hit_bg: Color::Rgb(204, 208, 218),
            function: Color::Rgb(30, 102, 245),
            type_name: Color::Rgb(23, 146, 153),
            arrow: Color::Rgb(136, 57, 239),
            selected: Color::Rgb(234, 118, 203),
            chip_fg: Color::White,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}
