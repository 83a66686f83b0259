//! Per-session counters: cards answered right and wrong, and time spent.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_cards: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub elapsed_seconds: u64,
}

impl SessionStats {
    pub fn new(total_cards: u32) -> Self {
        Self {
            total_cards,
            ..Self::default()
        }
    }

    pub fn record_correct(&mut self) {
        self.correct_count += 1;
    }

    pub fn record_incorrect(&mut self) {
        self.wrong_count += 1;
    }

    /// Advances the clock by one second.
    pub fn tick(&mut self) {
        self.elapsed_seconds += 1;
    }

    pub fn answered(&self) -> u32 {
        self.correct_count + self.wrong_count
    }

    /// Fraction of cards mastered, in `0.0..=1.0`.
    pub fn percent_complete(&self) -> f32 {
        if self.total_cards == 0 {
            return 0.0;
        }
        (self.correct_count as f32 / self.total_cards as f32).min(1.0)
    }

    /// Share of answers that were correct, `None` before the first answer.
    pub fn accuracy(&self) -> Option<f32> {
        match self.answered() {
            0 => None,
            n => Some(self.correct_count as f32 / n as f32),
        }
    }

    /// Elapsed time as "mm:ss", or "h:mm:ss" past the hour.
    pub fn elapsed_label(&self) -> String {
        let h = self.elapsed_seconds / 3600;
        let m = (self.elapsed_seconds % 3600) / 60;
        let s = self.elapsed_seconds % 60;
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{:02}:{:02}", m, s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = SessionStats::new(3);
        stats.record_correct();
        stats.record_incorrect();
        stats.record_incorrect();

        assert_eq!(stats.correct_count, 1);
        assert_eq!(stats.wrong_count, 2);
        assert_eq!(stats.answered(), 3);
    }

    #[test]
    fn test_percent_complete() {
        let mut stats = SessionStats::new(4);
        assert_eq!(stats.percent_complete(), 0.0);

        stats.record_correct();
        stats.record_incorrect();
        assert_eq!(stats.percent_complete(), 0.25);

        assert_eq!(SessionStats::new(0).percent_complete(), 0.0);
    }

    #[test]
    fn test_accuracy() {
        let mut stats = SessionStats::new(2);
        assert_eq!(stats.accuracy(), None);

        stats.record_incorrect();
        stats.record_correct();
        assert_eq!(stats.accuracy(), Some(0.5));
    }

    #[test]
    fn test_elapsed_label() {
        let mut stats = SessionStats::new(1);
        for _ in 0..75 {
            stats.tick();
        }
        assert_eq!(stats.elapsed_label(), "01:15");

        stats.elapsed_seconds = 3600 + 62;
        assert_eq!(stats.elapsed_label(), "1:01:02");
    }
}
