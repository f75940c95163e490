//! Search prompt line and its completion popup

use crate::ui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Draw the prompt over `area` (one row) and the popup just above it
pub fn render_search_prompt(
    frame: &mut Frame,
    area: Rect,
    input: &str,
    completions: &[&str],
    selected: usize,
    theme: &Theme,
) {
    let prompt = Line::from(vec![
        Span::styled(
            " / ",
            Style::default()
                .bg(theme.secondary)
                .fg(theme.chip_fg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", input), Style::default().fg(theme.fg)),
        Span::styled("█", Style::default().fg(theme.comment)),
    ]);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(prompt).style(Style::default().bg(theme.current_line_bg)),
        area,
    );

    if completions.is_empty() {
        return;
    }
    let widest = completions.iter().map(|w| w.chars().count()).max().unwrap_or(0);
    let height = (completions.len() as u16 + 2).min(area.y);
    if height < 3 {
        return;
    }
    let popup = Rect {
        x: area.x + 3,
        y: area.y - height,
        width: (widest as u16 + 4).min(area.width.saturating_sub(3)),
        height,
    };

    let items: Vec<ListItem> = completions
        .iter()
        .map(|word| ListItem::new(Span::styled(word.to_string(), Style::default().fg(theme.fg))))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border_focused)),
        )
        .highlight_style(
            Style::default()
                .bg(theme.primary)
                .fg(theme.chip_fg)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default().with_selected(Some(selected));

    frame.render_widget(Clear, popup);
    frame.render_stateful_widget(list, popup, &mut state);
}
