//! Editor side of stepping
//!
//! The stepper only talks to the editor through [`EditorSync`]: it reports the
//! new current line after a move, or that a move hit the start or end of the
//! program. [`SourceView`] is the implementation the TUI renders from.

pub mod completion;

use crate::stepper::Direction;
use tracing::warn;

/// Receives line changes and boundary signals from the stepper
pub trait EditorSync {
    /// Execution moved; `line` is 1-based
    fn line_changed(&mut self, line: usize);

    /// A Next/Previous could not move further; the current line is unchanged
    fn boundary_reached(&mut self, direction: Direction);

    /// Execution stopped; nothing is highlighted
    fn reset(&mut self);
}

/// Source text with the highlighted execution line
#[derive(Debug, Clone, Default)]
pub struct SourceView {
    lines: Vec<String>,
    current_line: Option<usize>,
    forward_blocked: bool,
    backward_blocked: bool,
    last_boundary: Option<Direction>,
    scroll: ScrollState,
}

/// Keeps the current line at a fixed visual row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollState {
    pub offset: usize,
    /// Row the current line sticks to; centred on first use
    pub target_row: Option<usize>,
}

impl SourceView {
    pub fn new(source: &str) -> Self {
        SourceView {
            lines: source.lines().map(str::to_string).collect(),
            ..Default::default()
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn current_line(&self) -> Option<usize> {
        self.current_line
    }

    /// Next is known to have nothing further to do
    pub fn forward_blocked(&self) -> bool {
        self.forward_blocked
    }

    /// Previous is known to have nothing further to do
    pub fn backward_blocked(&self) -> bool {
        self.backward_blocked
    }

    /// Take the latest boundary signal, for a one-shot warning
    pub fn take_boundary(&mut self) -> Option<Direction> {
        self.last_boundary.take()
    }

    /// First line at or after `from` (1-based, wrapping) containing `word` as a whole identifier
    pub fn find_identifier(&self, word: &str, from: usize) -> Option<usize> {
        if word.is_empty() || self.lines.is_empty() {
            return None;
        }
        let start = from.saturating_sub(1) % self.lines.len();
        (0..self.lines.len())
            .map(|i| (start + i) % self.lines.len())
            .find(|&idx| identifiers(&self.lines[idx]).any(|ident| ident == word))
            .map(|idx| idx + 1)
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    /// Pin the target row, e.g. after a search jump
    pub fn set_target_row(&mut self, row: usize) {
        self.scroll.target_row = Some(row);
    }

    /// Recompute the scroll offset for a viewport of `height` rows and return it.
    ///
    /// `focus` overrides the current line (search results are shown without
    /// moving execution).
    pub fn scroll_for(&mut self, height: usize, focus: Option<usize>) -> usize {
        let height = height.max(1);
        let target_row = self
            .scroll
            .target_row
            .unwrap_or(height / 2)
            .min(height - 1);
        self.scroll.target_row = Some(target_row);

        let total = self.lines.len();
        if let Some(line) = focus.or(self.current_line).filter(|&l| l >= 1 && l <= total) {
            let offset = (line - 1).saturating_sub(target_row);
            self.scroll.offset = if total > height {
                offset.min(total - height)
            } else {
                0
            };
        }
        self.scroll.offset
    }

    /// Every identifier in the source, in order of appearance
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().flat_map(|line| identifiers(line))
    }
}

impl EditorSync for SourceView {
    fn line_changed(&mut self, line: usize) {
        if line == 0 || line > self.lines.len() {
            warn!(line, total = self.lines.len(), "execution line outside the source");
        }
        self.current_line = Some(line);
        self.forward_blocked = false;
        self.backward_blocked = false;
        self.last_boundary = None;
    }

    fn boundary_reached(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.forward_blocked = true,
            Direction::Backward => self.backward_blocked = true,
        }
        self.last_boundary = Some(direction);
    }

    fn reset(&mut self) {
        self.current_line = None;
        self.forward_blocked = false;
        self.backward_blocked = false;
        self.last_boundary = None;
    }
}

fn identifiers(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_'))
}
