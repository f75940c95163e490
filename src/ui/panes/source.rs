//! Source pane: the debugged program with the execution line marked
//!
//! Highlighting uses a character-by-character tokenizer, enough for C-like
//! keywords, strings, numbers and line comments without a real lexer.

use crate::editor::SourceView;
use crate::ui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn highlight_line<'a>(line: &'a str, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    let mut word = String::new();
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;

    let flush = |word: &mut String, spans: &mut Vec<Span<'a>>, is_call: bool| {
        if !word.is_empty() {
            let style = word_style(word, is_call, theme);
            spans.push(Span::styled(std::mem::take(word), style));
        }
    };

    while i < chars.len() {
        let (at, c) = chars[i];

        if c == '/' && chars.get(i + 1).is_some_and(|&(_, n)| n == '/') {
            flush(&mut word, &mut spans, false);
            spans.push(Span::styled(&line[at..], Style::default().fg(theme.comment)));
            break;
        }

        if c == '"' || c == '\'' {
            flush(&mut word, &mut spans, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end].1 != c {
                end += if chars[end].1 == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            let stop = chars.get(end).map_or(line.len(), |&(idx, _)| idx);
            spans.push(Span::styled(&line[at..stop], Style::default().fg(theme.string)));
            i = end;
            continue;
        }

        if !c.is_alphanumeric() && c != '_' {
            flush(&mut word, &mut spans, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(theme.primary),
                _ => Style::default().fg(theme.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        word.push(c);
        i += 1;
    }
    flush(&mut word, &mut spans, false);

    Line::from(spans)
}

fn word_style(word: &str, is_call: bool, theme: &Theme) -> Style {
    match word {
        "int" | "char" | "void" | "bool" | "float" | "double" | "long" | "short" | "unsigned"
        | "signed" | "size_t" => Style::default().fg(theme.type_name),
        "struct" | "return" | "if" | "else" | "while" | "for" | "do" | "switch" | "case"
        | "default" | "break" | "continue" | "goto" | "sizeof" | "typedef" => Style::default()
            .fg(theme.keyword)
            .add_modifier(Modifier::BOLD),
        "NULL" => Style::default().fg(theme.number),
        _ if word.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
            Style::default().fg(theme.number)
        }
        _ if is_call => Style::default().fg(theme.function),
        _ => Style::default().fg(theme.fg),
    }
}

/// Render the source pane. `search_hit` is a line to show without moving execution.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    view: &mut SourceView,
    search_hit: Option<usize>,
    is_focused: bool,
    theme: &Theme,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(theme.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border_normal)
    };

    let title = match view.current_line() {
        Some(line) => format!(" Source [line {}] ", line),
        None => " Source ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let offset = view.scroll_for(visible_height, search_hit);
    let current = view.current_line();
    let blocked = view.forward_blocked() || view.backward_blocked();

    let visible: Vec<Line> = view
        .lines()
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_height)
        .map(|(idx, text)| {
            let line_num = idx + 1;
            let is_current = Some(line_num) == current;
            let is_hit = Some(line_num) == search_hit;

            let (marker, num_style, background) = if is_current {
                let marker_color = if blocked { theme.warning } else { theme.secondary };
                (
                    Span::styled("▶", Style::default().fg(marker_color)),
                    Style::default()
                        .fg(theme.secondary)
                        .add_modifier(Modifier::BOLD),
                    Some(theme.current_line_bg),
                )
            } else if is_hit {
                (
                    Span::raw(" "),
                    Style::default().fg(theme.primary),
                    Some(theme.search_hit_bg),
                )
            } else {
                (Span::raw(" "), Style::default().fg(theme.comment), None)
            };

            let mut content = highlight_line(text, theme);
            if let Some(bg) = background {
                for span in &mut content.spans {
                    span.style = span.style.bg(bg);
                }
            }

            let mut spans = vec![marker, Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let theme = Theme::default();
        let src = "head->next = malloc(sizeof(struct node)); // grow";
        let line = highlight_line(src, &theme);
        assert_eq!(texts(&line).concat(), src);
    }

    #[test]
    fn test_highlight_styles_words() {
        let theme = Theme::default();
        let line = highlight_line("struct node *p = f(\"x\");", &theme);
        let struct_span = &line.spans[0];
        assert_eq!(struct_span.content, "struct");
        assert_eq!(struct_span.style.fg, Some(theme.keyword));
        let call = line.spans.iter().find(|s| s.content == "f").unwrap();
        assert_eq!(call.style.fg, Some(theme.function));
        let string = line.spans.iter().find(|s| s.content == "\"x\"").unwrap();
        assert_eq!(string.style.fg, Some(theme.string));
    }
}
