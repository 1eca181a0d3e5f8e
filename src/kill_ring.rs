use std::collections::VecDeque;

pub const DEFAULT_KILL_RING_MAX: usize = 30;

/// Bounded history of killed text, most recent entry last.
#[derive(Debug, Clone)]
pub struct KillRing {
    entries: VecDeque<String>,
    max_entries: usize,
}

impl Default for KillRing {
    fn default() -> Self {
        Self::new(DEFAULT_KILL_RING_MAX)
    }
}

impl KillRing {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Start a new entry. Empty text is ignored; the oldest entry is dropped
    /// once the ring is full.
    pub fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.entries.push_back(text.to_string());
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Concatenate onto the most recent entry. Returns false, changing
    /// nothing, when the ring is empty.
    pub fn append_to_top(&mut self, text: &str) -> bool {
        match self.entries.back_mut() {
            Some(top) => {
                top.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Most recent entry. Yanking does not consume it.
    pub fn top(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
