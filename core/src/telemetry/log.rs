use log::info;
use std::collections::VecDeque;

const DEFAULT_LIMIT: usize = 20;

/// Bounded log of operator-visible activity. Every entry is also emitted
/// through the `log` facade.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<String>,
    limit: usize,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// Entries from newest to oldest.
    pub fn newest_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
