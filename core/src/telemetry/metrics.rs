use std::fmt;

/// Counters describing metrics poll outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub issued: u64,
    pub applied: u64,
    /// Responses dropped because a later-issued response was already applied.
    pub superseded: u64,
    pub failed: u64,
}

impl PollStats {
    pub fn record_issued(&mut self) {
        self.issued += 1;
    }

    pub fn record_applied(&mut self) {
        self.applied += 1;
    }

    pub fn record_superseded(&mut self) {
        self.superseded += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }
}

impl fmt::Display for PollStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polls {} / applied {} / stale {} / failed {}",
            self.issued, self.applied, self.superseded, self.failed
        )
    }
}
