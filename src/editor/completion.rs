//! Keyword autocompletion from a word list
//!
//! The word list is newline-delimited, one identifier per line. Order does not
//! matter and duplicates are dropped. Matching is a case-insensitive prefix match.

use rustc_hash::FxHashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Bundled C keywords and library names
pub const BUNDLED_WORDS: &str = include_str!("../../resources/complete.txt");

/// Typing one of these ends the word being completed
pub const END_OF_WORD: &str = "~!@#$%^&*()+{}|:\"<>?,./;'[]\\-= ";

/// Default number of suggestions shown at once
pub const MAX_VISIBLE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn parse(text: &str) -> Self {
        let mut list = WordList::default();
        list.extend(text.lines());
        list
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn bundled() -> Self {
        Self::parse(BUNDLED_WORDS)
    }

    /// Add words, skipping blanks and duplicates, keeping case-insensitive order
    pub fn extend<'a>(&mut self, words: impl IntoIterator<Item = &'a str>) {
        let mut seen: FxHashSet<String> = self.words.iter().cloned().collect();
        for word in words {
            let word = word.trim();
            if word.is_empty() || seen.contains(word) {
                continue;
            }
            seen.insert(word.to_string());
            self.words.push(word.to_string());
        }
        self.words
            .sort_by_cached_key(|w| (w.to_lowercase(), w.clone()));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct Completer {
    words: WordList,
    max_visible: usize,
}

impl Completer {
    pub fn new(words: WordList, max_visible: usize) -> Self {
        Completer {
            words,
            max_visible: max_visible.max(1),
        }
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    /// Suggestions for `prefix`, in list order, at most `max_visible`
    pub fn complete(&self, prefix: &str) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        self.words
            .iter()
            .filter(|w| w.to_lowercase().starts_with(&prefix))
            .take(self.max_visible)
            .collect()
    }
}

/// The identifier being typed at the end of `text`
pub fn word_prefix(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map_or(text.len(), |(i, _)| i);
    &text[start..]
}

/// What to append to `prefix` to complete it to `completion`
pub fn insert_completion<'a>(completion: &'a str, prefix: &str) -> &'a str {
    let typed = prefix.chars().count();
    match completion.char_indices().nth(typed) {
        Some((idx, _)) => &completion[idx..],
        None => "",
    }
}

/// Whether typing `c` closes the completion popup
pub fn ends_word(c: char) -> bool {
    END_OF_WORD.contains(c)
}
