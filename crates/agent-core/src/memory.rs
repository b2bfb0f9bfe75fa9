//! Memory Window
//!
//! Running transcript of (input, output) turns, bounded by a token budget
//! rather than a turn count.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Measures the size of rendered text in model tokens
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// Rough estimate of ~4 characters per token
#[derive(Clone, Copy, Debug, Default)]
pub struct CharEstimate;

impl TokenCounter for CharEstimate {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// One exchange in the transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub input: String,
    pub output: String,
}

impl Turn {
    /// Text form used both in prompts and for size accounting
    pub fn render(&self) -> String {
        format!("Human: {}\nAI: {}", self.input, self.output)
    }
}

/// Joins rendered turns in the transcript
const TURN_SEPARATOR: &str = "\n";

/// Token-bounded transcript; the newest turn is never evicted
pub struct MemoryWindow {
    turns: VecDeque<Turn>,
    sizes: VecDeque<usize>,
    total: usize,
    separator: usize,
    max_tokens: usize,
    counter: Arc<dyn TokenCounter>,
}

impl MemoryWindow {
    pub fn new(max_tokens: usize, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            turns: VecDeque::new(),
            sizes: VecDeque::new(),
            total: 0,
            separator: counter.count(TURN_SEPARATOR),
            max_tokens,
            counter,
        }
    }

    /// Append a turn, then evict the oldest turns until the window fits.
    pub fn append(&mut self, input: impl Into<String>, output: impl Into<String>) {
        let turn = Turn {
            input: input.into(),
            output: output.into(),
        };
        let size = self.counter.count(&turn.render());
        self.turns.push_back(turn);
        self.sizes.push_back(size);
        self.total += size;

        while self.token_count() > self.max_tokens && self.turns.len() > 1 {
            self.turns.pop_front();
            if let Some(evicted) = self.sizes.pop_front() {
                self.total -= evicted;
            }
            tracing::trace!(remaining = self.turns.len(), "Evicted oldest memory turn");
        }
    }

    /// Turns currently in the window, oldest first
    pub fn render(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Transcript as prompt text
    pub fn render_text(&self) -> String {
        self.turns
            .iter()
            .map(Turn::render)
            .collect::<Vec<_>>()
            .join(TURN_SEPARATOR)
    }

    /// Token count of the rendered transcript, separators included
    pub fn token_count(&self) -> usize {
        self.total + self.separator * self.turns.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per byte keeps the arithmetic obvious
    struct ByteCounter;

    impl TokenCounter for ByteCounter {
        fn count(&self, text: &str) -> usize {
            text.len()
        }
    }

    fn window(max: usize) -> MemoryWindow {
        MemoryWindow::new(max, Arc::new(ByteCounter))
    }

    #[test]
    fn test_keeps_everything_under_budget() {
        let mut memory = window(1000);
        memory.append("a", "b");
        memory.append("c", "d");
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.render_text(), "Human: a\nAI: b\nHuman: c\nAI: d");
    }

    #[test]
    fn test_evicts_oldest_first() {
        // each "xN"/"yN" turn renders to 16 bytes
        let mut memory = window(40);
        memory.append("x1", "y1");
        memory.append("x2", "y2");
        memory.append("x3", "y3");

        let turns = memory.render();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].input, "x2");
        assert_eq!(turns[1].input, "x3");
        assert!(memory.token_count() <= 40);
    }

    #[test]
    fn test_separators_count_against_budget() {
        // two 16-byte turns join to 33 bytes
        let mut memory = window(32);
        memory.append("x1", "y1");
        memory.append("x2", "y2");

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.render()[0].input, "x2");
        assert_eq!(memory.token_count(), memory.render_text().len());
        assert!(memory.render_text().len() <= 32);
    }

    #[test]
    fn test_token_count_matches_rendered_text() {
        let mut memory = window(1000);
        memory.append("a", "b");
        memory.append("c", "d");
        memory.append("e", "f");
        assert_eq!(memory.token_count(), memory.render_text().len());
    }

    #[test]
    fn test_oversized_newest_turn_is_kept() {
        let mut memory = window(20);
        memory.append("a", "b");
        memory.append("a very long response that alone blows the budget", "observation");

        let turns = memory.render();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].output, "observation");
        assert!(memory.token_count() > 20);
    }

    #[test]
    fn test_char_estimate() {
        assert_eq!(CharEstimate.count(""), 0);
        assert_eq!(CharEstimate.count("abcd"), 1);
        assert_eq!(CharEstimate.count("abcde"), 2);
        assert_eq!(CharEstimate.count("开始"), 1);
    }
}
