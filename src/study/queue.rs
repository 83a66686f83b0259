//! Working set of cards not yet answered correctly in the current session.
//!
//! A correct answer removes the card for good; a wrong answer sends it to the
//! back of the line. The queue is empty exactly when every card has been
//! answered correctly once.

use super::StudyError;
use crate::models::Flashcard;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

/// How the initial sequence is ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOrder {
    /// Keep the order the cards were given in.
    AsGiven,
    /// Shuffle; a seed makes the shuffle reproducible.
    Shuffled(Option<u64>),
}

#[derive(Clone, Debug, Default)]
pub struct StudyQueue {
    cards: VecDeque<Flashcard>,
}

impl StudyQueue {
    /// Builds the queue from the given cards. Inactive cards are skipped and
    /// repeated ids keep only their first occurrence.
    pub fn initialize(cards: &[Flashcard], order: QueueOrder) -> Self {
        let mut seen = HashSet::new();
        let mut selected: Vec<Flashcard> = cards
            .iter()
            .filter(|card| card.active && seen.insert(card.id))
            .cloned()
            .collect();

        if let QueueOrder::Shuffled(seed) = order {
            match seed {
                Some(seed) => selected.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => selected.shuffle(&mut rand::thread_rng()),
            }
        }

        debug!("Study queue initialized with {} cards", selected.len());
        Self {
            cards: selected.into(),
        }
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.front()
    }

    pub fn get(&self, position: usize) -> Option<&Flashcard> {
        self.cards.get(position)
    }

    pub fn position_of(&self, card_id: i64) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flashcard> {
        self.cards.iter()
    }

    /// Removes the card permanently. Returns the removed card.
    pub fn on_correct(&mut self, card_id: i64) -> Result<Flashcard, StudyError> {
        let position = self
            .position_of(card_id)
            .ok_or(StudyError::CardNotQueued(card_id))?;
        let card = self
            .cards
            .remove(position)
            .ok_or(StudyError::CardNotQueued(card_id))?;
        debug!("Card {} mastered, {} left", card_id, self.cards.len());
        Ok(card)
    }

    /// Moves the card to the tail, keeping the relative order of the rest.
    pub fn on_incorrect(&mut self, card_id: i64) -> Result<(), StudyError> {
        let position = self
            .position_of(card_id)
            .ok_or(StudyError::CardNotQueued(card_id))?;
        if let Some(card) = self.cards.remove(position) {
            self.cards.push_back(card);
        }
        debug!("Card {} requeued at position {}", card_id, self.cards.len() - 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64) -> Flashcard {
        let mut card = Flashcard::new(1, &format!("front {}", id), &format!("back {}", id));
        card.id = id;
        card
    }

    fn ids(queue: &StudyQueue) -> Vec<i64> {
        queue.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_initialize_keeps_order() {
        let queue = StudyQueue::initialize(&[card(1), card(2), card(3)], QueueOrder::AsGiven);
        assert_eq!(ids(&queue), vec![1, 2, 3]);
        assert_eq!(queue.current().map(|c| c.id), Some(1));
    }

    #[test]
    fn test_initialize_skips_inactive_and_duplicates() {
        let mut hidden = card(2);
        hidden.active = false;
        let queue = StudyQueue::initialize(
            &[card(1), hidden, card(3), card(1)],
            QueueOrder::AsGiven,
        );
        assert_eq!(ids(&queue), vec![1, 3]);
    }

    #[test]
    fn test_empty_queue_has_no_current() {
        let queue = StudyQueue::initialize(&[], QueueOrder::AsGiven);
        assert!(queue.is_empty());
        assert!(queue.current().is_none());
    }

    #[test]
    fn test_all_correct_empties_in_n_steps() {
        let cards: Vec<Flashcard> = (1..=5).map(card).collect();
        let mut queue = StudyQueue::initialize(&cards, QueueOrder::AsGiven);

        let mut steps = 0;
        while let Some(id) = queue.current().map(|c| c.id) {
            let before = queue.len();
            queue.on_correct(id).unwrap();
            assert_eq!(queue.len(), before - 1);
            steps += 1;
        }
        assert_eq!(steps, 5);
    }

    #[test]
    fn test_incorrect_keeps_length_and_order() {
        let mut queue =
            StudyQueue::initialize(&[card(1), card(2), card(3), card(4)], QueueOrder::AsGiven);

        queue.on_incorrect(2).unwrap();
        assert_eq!(ids(&queue), vec![1, 3, 4, 2]);

        queue.on_incorrect(1).unwrap();
        assert_eq!(ids(&queue), vec![3, 4, 2, 1]);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_mixed_answers_progression() {
        let mut queue = StudyQueue::initialize(&[card(1), card(2), card(3)], QueueOrder::AsGiven);

        queue.on_correct(1).unwrap();
        assert_eq!(ids(&queue), vec![2, 3]);

        queue.on_incorrect(2).unwrap();
        assert_eq!(ids(&queue), vec![3, 2]);

        queue.on_correct(3).unwrap();
        assert_eq!(ids(&queue), vec![2]);

        queue.on_correct(2).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_single_card_incorrect_stays_current() {
        let mut queue = StudyQueue::initialize(&[card(9)], QueueOrder::AsGiven);
        queue.on_incorrect(9).unwrap();
        assert_eq!(queue.current().map(|c| c.id), Some(9));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_unknown_card_is_rejected() {
        let mut queue = StudyQueue::initialize(&[card(1)], QueueOrder::AsGiven);

        assert!(matches!(queue.on_correct(5), Err(StudyError::CardNotQueued(5))));
        assert!(matches!(queue.on_incorrect(5), Err(StudyError::CardNotQueued(5))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_mastered_card_never_returns() {
        let mut queue = StudyQueue::initialize(&[card(1), card(2)], QueueOrder::AsGiven);
        queue.on_correct(1).unwrap();
        queue.on_incorrect(2).unwrap();
        assert_eq!(queue.position_of(1), None);
        assert!(queue.on_correct(1).is_err());
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let cards: Vec<Flashcard> = (1..=20).map(card).collect();
        let a = StudyQueue::initialize(&cards, QueueOrder::Shuffled(Some(7)));
        let b = StudyQueue::initialize(&cards, QueueOrder::Shuffled(Some(7)));
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_unseeded_shuffle_keeps_all_cards() {
        let cards: Vec<Flashcard> = (1..=20).map(card).collect();
        let queue = StudyQueue::initialize(&cards, QueueOrder::Shuffled(None));

        let mut shuffled = ids(&queue);
        shuffled.sort();
        assert_eq!(shuffled, (1..=20).collect::<Vec<i64>>());
    }
}
