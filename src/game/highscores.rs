use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HighscoreEntry {
    pub name: String,
    pub score: u64,
    pub date: DateTime<Utc>,
}

/// In-memory ranked list, best first.
#[derive(Debug, Clone)]
pub struct Highscores {
    entries: Vec<HighscoreEntry>,
    slots: usize,
}

impl Highscores {
    pub fn new(slots: usize) -> Self {
        Highscores {
            entries: Vec::with_capacity(slots + 1),
            slots,
        }
    }

    pub fn top(&self) -> &[HighscoreEntry] {
        &self.entries
    }

    /// Insert a result; returns whether it made the list. Ties rank below existing entries.
    pub fn record(&mut self, name: &str, score: u64, date: DateTime<Utc>) -> bool {
        let pos = self
            .entries
            .iter()
            .position(|e| e.score < score)
            .unwrap_or(self.entries.len());
        if pos >= self.slots {
            return false;
        }
        self.entries.insert(
            pos,
            HighscoreEntry {
                name: name.to_string(),
                score,
                date,
            },
        );
        self.entries.truncate(self.slots);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_best_ten_in_order() {
        let mut board = Highscores::new(10);
        let now = Utc::now();
        for score in [5, 50, 20, 1, 99, 7, 13, 42, 8, 3, 60, 2] {
            board.record(&format!("p{score}"), score, now);
        }
        let scores: Vec<u64> = board.top().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![99, 60, 50, 42, 20, 13, 8, 7, 5, 3]);
    }

    #[test]
    fn rejects_scores_below_a_full_board() {
        let mut board = Highscores::new(2);
        let now = Utc::now();
        assert!(board.record("a", 10, now));
        assert!(board.record("b", 10, now));
        assert!(!board.record("c", 10, now));
        assert!(board.record("d", 11, now));
        assert_eq!(board.top()[0].name, "d");
        assert_eq!(board.top()[1].name, "a");
    }
}
