//! High score table
//!
//! Top 3 scores, persisted through the key-value gateway under `score0..score2`.
//! Each value is a decimal integer, or empty when the slot is unset.

use crate::persistence::ScoreStore;

/// Number of high scores kept
pub const MAX_HIGH_SCORES: usize = 3;

/// Gateway keys, best first
pub const STORAGE_KEYS: [&str; MAX_HIGH_SCORES] = ["score0", "score1", "score2"];

/// Top-3 table, sorted descending; `None` is an unset slot and ranks lowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScores {
    pub entries: [Option<u64>; MAX_HIGH_SCORES],
}

impl HighScores {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table from raw slots (sorted on the way in)
    pub fn from_entries(entries: [Option<u64>; MAX_HIGH_SCORES]) -> Self {
        let mut table = Self { entries };
        table.entries.sort_by(|a, b| b.cmp(a));
        table
    }

    /// Insert a finished run's score; returns the 1-indexed place it took, if any.
    ///
    /// A tie ranks below the scores already in the table.
    pub fn record(&mut self, score: u64) -> Option<usize> {
        // Option orders None below every Some, so unset slots are passed over
        let index = self
            .entries
            .iter()
            .take_while(|e| **e >= Some(score))
            .count();
        if index >= MAX_HIGH_SCORES {
            return None;
        }
        self.entries[index..].rotate_right(1);
        self.entries[index] = Some(score);
        Some(index + 1)
    }

    /// Best score so far
    pub fn top_score(&self) -> Option<u64> {
        self.entries[0]
    }

    /// True when no slot holds a score
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Load from the gateway; missing or malformed values become unset
    pub fn load(store: &dyn ScoreStore) -> Self {
        let mut entries = [None; MAX_HIGH_SCORES];
        for (slot, key) in entries.iter_mut().zip(STORAGE_KEYS) {
            *slot = parse_slot(&store.get(key));
        }
        let table = Self::from_entries(entries);
        if table.is_empty() {
            log::info!("No high scores found, starting fresh");
        } else {
            log::info!("Loaded high scores {:?}", table.entries);
        }
        table
    }

    /// Write every slot back to the gateway
    pub fn save(&self, store: &mut dyn ScoreStore) {
        for (entry, key) in self.entries.iter().zip(STORAGE_KEYS) {
            let value = entry.map(|s| s.to_string()).unwrap_or_default();
            store.set(key, &value);
        }
        log::info!("High scores saved {:?}", self.entries);
    }

    /// Panel line for a 0-indexed place, e.g. `1st: 150` or `2nd: -`
    pub fn label(&self, place: usize) -> String {
        let ordinal = match place {
            0 => "1st",
            1 => "2nd",
            _ => "3rd",
        };
        match self.entries.get(place).copied().flatten() {
            Some(score) => format!("{}: {}", ordinal, score),
            None => format!("{}: -", ordinal),
        }
    }
}

/// Negative numbers (older saves wrote -1 for unset), blanks and garbage are unset
fn parse_slot(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}
