//! Append-only answer history per card.

use super::difficulty::{AnswerOutcome, Difficulty, classify};
use crate::error::Result;
use std::collections::HashMap;

/// History is kept per (subject, topic, card), so the same card studied under
/// another subject starts fresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CardKey {
    pub subject_id: i64,
    pub topic_id: i64,
    pub card_id: i64,
}

impl CardKey {
    pub fn new(subject_id: i64, topic_id: i64, card_id: i64) -> Self {
        Self {
            subject_id,
            topic_id,
            card_id,
        }
    }
}

pub trait CardHistoryStore {
    /// Outcomes for the card, oldest first.
    fn history(&self, key: &CardKey) -> Result<Vec<AnswerOutcome>>;

    fn append(&mut self, key: &CardKey, outcome: AnswerOutcome) -> Result<()>;

    fn difficulty(&self, key: &CardKey) -> Result<Difficulty> {
        Ok(classify(&self.history(key)?))
    }
}

/// History kept only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: HashMap<CardKey, Vec<AnswerOutcome>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CardHistoryStore for MemoryHistoryStore {
    fn history(&self, key: &CardKey) -> Result<Vec<AnswerOutcome>> {
        Ok(self.entries.get(key).cloned().unwrap_or_default())
    }

    fn append(&mut self, key: &CardKey, outcome: AnswerOutcome) -> Result<()> {
        self.entries.entry(*key).or_default().push(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut store = MemoryHistoryStore::new();
        let key = CardKey::new(1, 2, 3);

        store.append(&key, AnswerOutcome::Incorrect).unwrap();
        store.append(&key, AnswerOutcome::Correct).unwrap();

        assert_eq!(
            store.history(&key).unwrap(),
            vec![AnswerOutcome::Incorrect, AnswerOutcome::Correct]
        );
        assert_eq!(store.difficulty(&key).unwrap(), Difficulty::Medium);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = MemoryHistoryStore::new();
        store
            .append(&CardKey::new(1, 1, 5), AnswerOutcome::Incorrect)
            .unwrap();

        assert!(store.history(&CardKey::new(2, 1, 5)).unwrap().is_empty());
        assert_eq!(
            store.difficulty(&CardKey::new(1, 1, 5)).unwrap(),
            Difficulty::Hard
        );
    }
}
