//! Status bar with keybindings and stepper state

use crate::stepper::{Direction, StepperState};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub struct StatusRenderData<'a> {
    pub message: &'a str,
    pub state: StepperState,
    /// Current statement index, `None` when not running
    pub position: Option<usize>,
    pub total_steps: Option<usize>,
    /// Direction a step was refused in, if the last step hit an end
    pub blocked: Option<Direction>,
    pub is_error: bool,
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, data: &StatusRenderData, theme: &Theme) {
    let halves = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let step_text = match (data.position, data.total_steps) {
        (Some(pos), Some(total)) => format!(" Step {}/{} ", pos + 1, total),
        (Some(pos), None) => format!(" Step {}/? ", pos + 1),
        (None, Some(total)) => format!(" {} steps ", total),
        (None, None) => " - ".to_string(),
    };
    let chip_bg = if data.is_error {
        theme.error
    } else {
        theme.primary
    };
    let bar_bg = theme.current_line_bg;

    let left = vec![
        Span::styled(
            step_text,
            Style::default()
                .bg(chip_bg)
                .fg(theme.chip_fg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().bg(bar_bg).fg(theme.comment)),
        Span::styled(
            format!(" {} ", data.message),
            Style::default()
                .bg(bar_bg)
                .fg(if data.is_error { theme.error } else { theme.fg }),
        ),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(left))
            .style(Style::default().bg(bar_bg))
            .alignment(Alignment::Left),
        halves[0],
    );

    let key_style = Style::default().bg(theme.comment).fg(theme.chip_fg);
    let desc_style = Style::default().bg(bar_bg).fg(theme.fg);
    let sep_style = Style::default().bg(bar_bg).fg(theme.comment);

    let mut right = Vec::new();
    for (key, desc) in [
        (" p ", " play "),
        (" ←/→ ", " step "),
        (" ⎵ ", " auto "),
        (" s ", " stop "),
        (" / ", " search "),
        (" +/- ", " zoom "),
        (" f ", " fit "),
        (" q ", " quit "),
    ] {
        right.push(Span::styled(key, key_style));
        right.push(Span::styled(desc, desc_style));
        right.push(Span::styled("│", sep_style));
    }

    let chip = |text: &'static str, bg: Color| {
        Span::styled(
            text,
            Style::default()
                .bg(bg)
                .fg(theme.chip_fg)
                .add_modifier(Modifier::BOLD),
        )
    };
    right.push(match (data.state, data.blocked) {
        (StepperState::Running, _) => chip(" ▶ PLAYING ", theme.secondary),
        (_, Some(Direction::Forward)) => chip(" END ", theme.warning),
        (_, Some(Direction::Backward)) => chip(" START ", theme.warning),
        (StepperState::Finished, None) => chip(" FINISHED ", theme.success),
        (StepperState::AtBreak, None) => chip(" PAUSED ", theme.primary),
        (StepperState::Idle, None) => chip(" IDLE ", theme.comment),
    });

    frame.render_widget(
        Paragraph::new(Line::from(right))
            .style(Style::default().bg(bar_bg))
            .alignment(Alignment::Right),
        halves[1],
    );
}
