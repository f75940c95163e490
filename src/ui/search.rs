//! Symbol search prompt with word-list completion
//!
//! The popup lists completions for the identifier being typed. Tab or Enter
//! inserts the highlighted completion; Enter on a complete word runs the search.
//! Typing an end-of-word character closes the popup until the next word starts.

use crate::editor::completion::{ends_word, insert_completion, word_prefix, Completer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPrompt {
    input: String,
    selected: usize,
    popup_closed: bool,
}

/// What a key did to the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    Editing,
    /// Run the search for this word
    Submit(String),
    Cancel,
}

impl SearchPrompt {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Completions to show, empty when the popup is hidden
    pub fn completions<'c>(&self, completer: &'c Completer) -> Vec<&'c str> {
        if self.popup_closed {
            return Vec::new();
        }
        completer.complete(word_prefix(&self.input))
    }

    pub fn type_char(&mut self, c: char) {
        self.input.push(c);
        self.popup_closed = ends_word(c);
        self.selected = 0;
    }

    pub fn backspace(&mut self) {
        self.input.pop();
        self.popup_closed = false;
        self.selected = 0;
    }

    pub fn move_selection(&mut self, completer: &Completer, down: bool) {
        let count = self.completions(completer).len();
        if count == 0 {
            return;
        }
        // No wrap-around at either end
        self.selected = if down {
            (self.selected + 1).min(count - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }

    /// Insert the rest of the highlighted completion; `false` when there was nothing to add
    pub fn accept(&mut self, completer: &Completer) -> bool {
        let prefix = word_prefix(&self.input).to_string();
        let suffix = match self.completions(completer).get(self.selected) {
            Some(word) => insert_completion(word, &prefix).to_string(),
            None => return false,
        };
        if suffix.is_empty() {
            return false;
        }
        self.input.push_str(&suffix);
        self.selected = 0;
        true
    }

    pub fn enter(&mut self, completer: &Completer) -> PromptAction {
        if self.accept(completer) {
            return PromptAction::Editing;
        }
        let word = word_prefix(&self.input).to_string();
        if word.is_empty() {
            PromptAction::Cancel
        } else {
            PromptAction::Submit(word)
        }
    }
}
