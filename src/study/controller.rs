//! Study session state machine.
//!
//! ```text
//! NotStarted --start--> InProgress(QuestionShown) --reveal--> InProgress(AnswerRevealed)
//!     InProgress(AnswerRevealed) --answer--> InProgress(QuestionShown) | Completed
//!     InProgress / Completed --restart--> InProgress(QuestionShown)
//!     InProgress --end--> Completed
//! ```
//!
//! Cards come from a `ContentStore`; every answer is appended to a
//! `CardHistoryStore`. When the queue runs dry (or the user ends the session)
//! the stats are frozen into a `StudySessionRecord` and handed to the store.

use super::difficulty::{AnswerOutcome, Difficulty, classify};
use super::history::{CardHistoryStore, CardKey};
use super::queue::{QueueOrder, StudyQueue};
use super::stats::SessionStats;
use super::StudyError;
use crate::database::{ContentStore, RetryPolicy, with_retry};
use crate::models::{Flashcard, StudyScope, StudySessionRecord};
use chrono::{DateTime, Utc};
use log::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardPhase {
    QuestionShown,
    AnswerRevealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress(CardPhase),
    Completed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress(CardPhase::QuestionShown) => "showing a question",
            Self::InProgress(CardPhase::AnswerRevealed) => "showing an answer",
            Self::Completed => "completed",
        }
    }
}

/// A finished session and whether it reached the store.
#[derive(Clone, Debug)]
pub struct SessionSummary {
    pub record: StudySessionRecord,
    /// Set when saving failed; the record is then only kept in memory.
    pub save_error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AnswerReport {
    pub card_id: i64,
    pub outcome: AnswerOutcome,
    /// Difficulty of the card including this answer.
    pub difficulty: Difficulty,
    /// Present when this answer emptied the queue.
    pub finished: Option<SessionSummary>,
}

pub struct SessionController<S: ContentStore, H: CardHistoryStore> {
    store: S,
    history: H,
    order: QueueOrder,
    retry: RetryPolicy,
    scope: StudyScope,
    cards: Vec<Flashcard>,
    queue: StudyQueue,
    stats: SessionStats,
    state: SessionState,
    position: usize,
    started_at: Option<DateTime<Utc>>,
    summary: Option<SessionSummary>,
}

impl<S: ContentStore, H: CardHistoryStore> SessionController<S, H> {
    pub fn new(store: S, history: H, order: QueueOrder) -> Self {
        Self {
            store,
            history,
            order,
            retry: RetryPolicy::default(),
            scope: StudyScope::default(),
            cards: Vec::new(),
            queue: StudyQueue::default(),
            stats: SessionStats::default(),
            state: SessionState::NotStarted,
            position: 0,
            started_at: None,
            summary: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn queue(&self) -> &StudyQueue {
        &self.queue
    }

    /// Scope of the running or last finished session.
    pub fn scope(&self) -> Option<&StudyScope> {
        match self.state {
            SessionState::NotStarted => None,
            _ => Some(&self.scope),
        }
    }

    /// Position of the presented card inside the queue.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_revealed(&self) -> bool {
        self.state == SessionState::InProgress(CardPhase::AnswerRevealed)
    }

    /// The card on screen, if a session is in progress.
    pub fn current_card(&self) -> Option<&Flashcard> {
        match self.state {
            SessionState::InProgress(_) => self.queue.get(self.position),
            _ => None,
        }
    }

    /// Summary of the last finished session.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    fn key_for(&self, card_id: i64) -> CardKey {
        CardKey::new(self.scope.subject_id, self.scope.topic_id, card_id)
    }

    /// Difficulty of the presented card from its answer history.
    pub fn current_difficulty(&self) -> Option<Difficulty> {
        let card = self.current_card()?;
        Some(self.difficulty_for(&self.key_for(card.id)))
    }

    fn difficulty_for(&self, key: &CardKey) -> Difficulty {
        match self.history.history(key) {
            Ok(history) => classify(&history),
            Err(e) => {
                warn!("Could not read history for card {}: {}", key.card_id, e);
                Difficulty::Medium
            }
        }
    }

    fn invalid(&self, action: &'static str) -> StudyError {
        StudyError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Loads the subtopic's cards and enters study mode. Returns the number
    /// of cards queued. With no active cards the controller stays where it was.
    pub fn start(&mut self, scope: StudyScope) -> Result<usize, StudyError> {
        if let SessionState::InProgress(_) = self.state {
            return Err(self.invalid("start a new session"));
        }

        let cards = self.store.fetch_flashcards(scope.subtopic_id)?;
        let queue = StudyQueue::initialize(&cards, self.order);
        if queue.is_empty() {
            info!("Subtopic {} has no cards to study", scope.subtopic_id);
            return Err(StudyError::NoCardsAvailable);
        }

        let total = queue.len();
        self.scope = scope;
        self.cards = cards;
        self.begin(queue);
        info!(
            "Study session started for subtopic {} with {} cards",
            scope.subtopic_id, total
        );
        Ok(total)
    }

    fn begin(&mut self, queue: StudyQueue) {
        self.stats = SessionStats::new(queue.len() as u32);
        self.queue = queue;
        self.position = 0;
        self.started_at = Some(Utc::now());
        self.summary = None;
        self.state = SessionState::InProgress(CardPhase::QuestionShown);
    }

    pub fn reveal(&mut self) -> Result<(), StudyError> {
        match self.state {
            SessionState::InProgress(CardPhase::QuestionShown) => {
                self.state = SessionState::InProgress(CardPhase::AnswerRevealed);
                Ok(())
            }
            _ => Err(self.invalid("reveal the answer")),
        }
    }

    /// Records the answer for the presented card and moves on.
    pub fn answer(&mut self, correct: bool) -> Result<AnswerReport, StudyError> {
        if self.state != SessionState::InProgress(CardPhase::AnswerRevealed) {
            return Err(self.invalid("answer"));
        }
        let card_id = self
            .current_card()
            .map(|card| card.id)
            .ok_or_else(|| self.invalid("answer"))?;
        let outcome = AnswerOutcome::from_correct(correct);

        match outcome {
            AnswerOutcome::Correct => {
                self.queue.on_correct(card_id)?;
                self.stats.record_correct();
            }
            AnswerOutcome::Incorrect => {
                self.queue.on_incorrect(card_id)?;
                self.stats.record_incorrect();
                // The card was already last; show the head rather than repeat it.
                if self.queue.len() > 1 && self.queue.position_of(card_id) == Some(self.position) {
                    self.position = 0;
                }
            }
        }
        if self.position >= self.queue.len() {
            self.position = 0;
        }

        // Difficulty includes this answer even when the append fails.
        let key = self.key_for(card_id);
        let prior = self.history.history(&key);
        if let Err(e) = self.history.append(&key, outcome) {
            warn!("Could not record answer for card {}: {}", card_id, e);
        }
        let difficulty = match prior {
            Ok(mut history) => {
                history.push(outcome);
                classify(&history)
            }
            Err(e) => {
                warn!("Could not read history for card {}: {}", card_id, e);
                Difficulty::Medium
            }
        };

        let finished = if self.queue.is_empty() {
            Some(self.finish(true))
        } else {
            self.state = SessionState::InProgress(CardPhase::QuestionShown);
            None
        };

        Ok(AnswerReport {
            card_id,
            outcome,
            difficulty,
            finished,
        })
    }

    /// Shows the next card in the queue without answering, wrapping around.
    pub fn next(&mut self) -> Result<(), StudyError> {
        self.step(1)
    }

    /// Shows the previous card in the queue without answering, wrapping around.
    pub fn previous(&mut self) -> Result<(), StudyError> {
        let len = self.queue.len();
        self.step(len.saturating_sub(1))
    }

    fn step(&mut self, by: usize) -> Result<(), StudyError> {
        if !matches!(self.state, SessionState::InProgress(_)) {
            return Err(self.invalid("navigate"));
        }
        let len = self.queue.len();
        if len > 0 {
            self.position = (self.position + by) % len;
        }
        self.state = SessionState::InProgress(CardPhase::QuestionShown);
        Ok(())
    }

    /// Starts over with the full card set of the current subtopic.
    pub fn restart(&mut self) -> Result<(), StudyError> {
        match self.state {
            SessionState::InProgress(_) | SessionState::Completed if !self.cards.is_empty() => {}
            _ => return Err(self.invalid("restart")),
        }
        if let SessionState::InProgress(_) = self.state {
            info!(
                "Study session restarted after {} answers; progress discarded",
                self.stats.answered()
            );
        }
        let queue = StudyQueue::initialize(&self.cards, self.order);
        self.begin(queue);
        Ok(())
    }

    /// Ends the session before every card was mastered.
    pub fn end(&mut self) -> Result<SessionSummary, StudyError> {
        if !matches!(self.state, SessionState::InProgress(_)) {
            return Err(self.invalid("end"));
        }
        Ok(self.finish(false))
    }

    /// Advances the session clock by one second while studying.
    pub fn tick(&mut self) {
        if let SessionState::InProgress(_) = self.state {
            self.stats.tick();
        }
    }

    /// Drops any session state and returns to `NotStarted`.
    pub fn reset(&mut self) {
        self.scope = StudyScope::default();
        self.cards.clear();
        self.queue = StudyQueue::default();
        self.stats = SessionStats::default();
        self.position = 0;
        self.started_at = None;
        self.summary = None;
        self.state = SessionState::NotStarted;
    }

    fn finish(&mut self, completed: bool) -> SessionSummary {
        self.state = SessionState::Completed;
        let finished_at = Utc::now();

        let mut record = StudySessionRecord {
            id: 0,
            scope: self.scope,
            stats: self.stats,
            completed,
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        };
        let store = &self.store;
        let summary = match with_retry(&self.retry, || store.persist_study_session(&record)) {
            Ok(id) => {
                record.id = id;
                SessionSummary {
                    record,
                    save_error: None,
                }
            }
            Err(e) => {
                error!("Failed to save study session: {}", e);
                SessionSummary {
                    record,
                    save_error: Some(e.to_string()),
                }
            }
        };

        info!(
            "Study session finished ({}): {}/{} correct, {} wrong",
            if completed { "completed" } else { "ended early" },
            self.stats.correct_count,
            self.stats.total_cards,
            self.stats.wrong_count
        );
        self.summary = Some(summary.clone());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use crate::study::MemoryHistoryStore;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory content store that remembers what it was asked to save.
    #[derive(Default)]
    struct FakeStore {
        cards: HashMap<i64, Vec<Flashcard>>,
        saved: RefCell<Vec<StudySessionRecord>>,
        fail_saves: bool,
    }

    impl ContentStore for FakeStore {
        fn fetch_flashcards(&self, subtopic_id: i64) -> Result<Vec<Flashcard>> {
            Ok(self.cards.get(&subtopic_id).cloned().unwrap_or_default())
        }

        fn persist_study_session(&self, record: &StudySessionRecord) -> Result<i64> {
            if self.fail_saves {
                return Err(AppError::Validation("store offline".to_string()));
            }
            let mut saved = self.saved.borrow_mut();
            saved.push(record.clone());
            Ok(saved.len() as i64)
        }
    }

    const SUBTOPIC: i64 = 40;

    fn card(id: i64) -> Flashcard {
        let mut card = Flashcard::new(SUBTOPIC, &format!("q{}", id), &format!("a{}", id));
        card.id = id;
        card
    }

    fn scope() -> StudyScope {
        StudyScope {
            user_id: 1,
            course_id: 10,
            subject_id: 20,
            topic_id: 30,
            subtopic_id: SUBTOPIC,
        }
    }

    fn controller_with(ids: &[i64]) -> SessionController<FakeStore, MemoryHistoryStore> {
        let mut store = FakeStore::default();
        store
            .cards
            .insert(SUBTOPIC, ids.iter().copied().map(card).collect());
        SessionController::new(store, MemoryHistoryStore::new(), QueueOrder::AsGiven)
            .with_retry_policy(RetryPolicy::none())
    }

    fn queue_ids<S: ContentStore, H: CardHistoryStore>(c: &SessionController<S, H>) -> Vec<i64> {
        c.queue().iter().map(|card| card.id).collect()
    }

    fn answer(
        c: &mut SessionController<FakeStore, MemoryHistoryStore>,
        correct: bool,
    ) -> AnswerReport {
        c.reveal().unwrap();
        c.answer(correct).unwrap()
    }

    #[test]
    fn test_no_cards_stays_not_started() {
        let mut c = controller_with(&[]);
        let result = c.start(scope());

        assert!(matches!(result, Err(StudyError::NoCardsAvailable)));
        assert_eq!(c.state(), SessionState::NotStarted);
        assert_eq!(c.stats().total_cards, 0);
        assert!(c.current_card().is_none());
    }

    #[test]
    fn test_only_inactive_cards_is_no_cards() {
        let mut store = FakeStore::default();
        let mut hidden = card(1);
        hidden.active = false;
        store.cards.insert(SUBTOPIC, vec![hidden]);
        let mut c = SessionController::new(store, MemoryHistoryStore::new(), QueueOrder::AsGiven);

        assert!(matches!(c.start(scope()), Err(StudyError::NoCardsAvailable)));
        assert_eq!(c.state(), SessionState::NotStarted);
    }

    #[test]
    fn test_start_shows_first_question() {
        let mut c = controller_with(&[1, 2, 3]);
        assert_eq!(c.start(scope()).unwrap(), 3);

        assert_eq!(c.state(), SessionState::InProgress(CardPhase::QuestionShown));
        assert_eq!(c.current_card().map(|card| card.id), Some(1));
        assert_eq!(c.stats().total_cards, 3);
        assert_eq!(c.current_difficulty(), Some(Difficulty::Medium));
    }

    #[test]
    fn test_answer_requires_reveal() {
        let mut c = controller_with(&[1]);
        c.start(scope()).unwrap();

        assert!(matches!(
            c.answer(true),
            Err(StudyError::InvalidTransition { action: "answer", .. })
        ));
        c.reveal().unwrap();
        assert!(c.is_revealed());
        assert!(c.reveal().is_err());
    }

    #[test]
    fn test_mixed_answers_scenario() {
        let mut c = controller_with(&[1, 2, 3]);
        c.start(scope()).unwrap();
        assert_eq!(queue_ids(&c), vec![1, 2, 3]);

        answer(&mut c, true);
        assert_eq!(queue_ids(&c), vec![2, 3]);

        let report = answer(&mut c, false);
        assert_eq!(report.card_id, 2);
        assert_eq!(report.difficulty, Difficulty::Hard);
        assert_eq!(queue_ids(&c), vec![3, 2]);
        assert_eq!(c.current_card().map(|card| card.id), Some(3));

        answer(&mut c, true);
        assert_eq!(queue_ids(&c), vec![2]);
        assert_eq!(c.state(), SessionState::InProgress(CardPhase::QuestionShown));

        let report = answer(&mut c, true);
        assert_eq!(report.difficulty, Difficulty::Medium);
        let summary = report.finished.expect("session should be finished");
        assert_eq!(c.state(), SessionState::Completed);
        assert!(summary.record.completed);
        assert_eq!(summary.record.stats.correct_count, 3);
        assert_eq!(summary.record.stats.wrong_count, 1);
        assert_eq!(summary.record.scope, scope());
        assert_eq!(summary.save_error, None);
        assert_eq!(c.store.saved.borrow().len(), 1);
    }

    #[test]
    fn test_all_correct_completes_in_n_answers() {
        let mut c = controller_with(&[1, 2, 3, 4]);
        c.start(scope()).unwrap();

        for step in 1..=4 {
            let report = answer(&mut c, true);
            assert_eq!(report.finished.is_some(), step == 4);
        }
        assert_eq!(c.stats().percent_complete(), 1.0);
    }

    #[test]
    fn test_single_card_wrong_then_right() {
        let mut c = controller_with(&[7]);
        c.start(scope()).unwrap();

        answer(&mut c, false);
        assert_eq!(c.current_card().map(|card| card.id), Some(7));
        assert_eq!(c.current_difficulty(), Some(Difficulty::Hard));

        let report = answer(&mut c, true);
        assert_eq!(report.difficulty, Difficulty::Medium);
        assert!(report.finished.is_some());
    }

    #[test]
    fn test_navigation_wraps_and_hides_answer() {
        let mut c = controller_with(&[1, 2, 3]);
        c.start(scope()).unwrap();

        c.reveal().unwrap();
        c.next().unwrap();
        assert_eq!(c.current_card().map(|card| card.id), Some(2));
        assert!(!c.is_revealed());

        c.previous().unwrap();
        c.previous().unwrap();
        assert_eq!(c.current_card().map(|card| card.id), Some(3));

        c.next().unwrap();
        assert_eq!(c.current_card().map(|card| card.id), Some(1));
    }

    #[test]
    fn test_wrong_answer_on_last_position_returns_to_head() {
        let mut c = controller_with(&[1, 2, 3]);
        c.start(scope()).unwrap();
        c.previous().unwrap();
        assert_eq!(c.current_card().map(|card| card.id), Some(3));

        answer(&mut c, false);
        assert_eq!(queue_ids(&c), vec![1, 2, 3]);
        assert_eq!(c.current_card().map(|card| card.id), Some(1));
    }

    #[test]
    fn test_answer_from_middle_position() {
        let mut c = controller_with(&[1, 2, 3]);
        c.start(scope()).unwrap();
        c.next().unwrap();

        answer(&mut c, true);
        assert_eq!(queue_ids(&c), vec![1, 3]);
        assert_eq!(c.current_card().map(|card| card.id), Some(3));
    }

    #[test]
    fn test_restart_reproduces_seeded_order() {
        let mut store = FakeStore::default();
        store.cards.insert(SUBTOPIC, (1..=12).map(card).collect());
        let mut c = SessionController::new(
            store,
            MemoryHistoryStore::new(),
            QueueOrder::Shuffled(Some(99)),
        );
        c.start(scope()).unwrap();
        let first = queue_ids(&c);

        answer(&mut c, true);
        c.restart().unwrap();
        assert_eq!(queue_ids(&c), first);
        c.restart().unwrap();
        assert_eq!(queue_ids(&c), first);
        assert_eq!(c.stats().answered(), 0);
    }

    #[test]
    fn test_restart_after_completion_zeroes_stats() {
        let mut c = controller_with(&[1, 2]);
        c.start(scope()).unwrap();
        answer(&mut c, false);
        answer(&mut c, true);
        answer(&mut c, true);
        assert_eq!(c.state(), SessionState::Completed);

        c.restart().unwrap();
        assert_eq!(c.state(), SessionState::InProgress(CardPhase::QuestionShown));
        assert_eq!(queue_ids(&c), vec![1, 2]);
        assert_eq!(*c.stats(), SessionStats::new(2));
        assert!(c.summary().is_none());
    }

    #[test]
    fn test_restart_before_start_is_rejected() {
        let mut c = controller_with(&[1]);
        assert!(c.restart().is_err());
        assert!(c.next().is_err());
        assert!(c.end().is_err());
    }

    #[test]
    fn test_end_early_saves_incomplete_record() {
        let mut c = controller_with(&[1, 2, 3]);
        c.start(scope()).unwrap();
        answer(&mut c, true);
        c.tick();
        c.tick();

        let summary = c.end().unwrap();
        assert!(!summary.record.completed);
        assert_eq!(summary.record.stats.correct_count, 1);
        assert_eq!(summary.record.stats.elapsed_seconds, 2);
        assert_eq!(c.state(), SessionState::Completed);

        c.tick();
        assert_eq!(c.stats().elapsed_seconds, 2);
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let mut store = FakeStore::default();
        store.cards.insert(SUBTOPIC, vec![card(1)]);
        store.fail_saves = true;
        let mut c = SessionController::new(store, MemoryHistoryStore::new(), QueueOrder::AsGiven)
            .with_retry_policy(RetryPolicy::none());
        c.start(scope()).unwrap();

        let summary = answer(&mut c, true).finished.unwrap();
        assert_eq!(c.state(), SessionState::Completed);
        assert!(summary.save_error.is_some());
        assert_eq!(summary.record.stats.correct_count, 1);
    }

    #[test]
    fn test_cannot_start_while_in_progress() {
        let mut c = controller_with(&[1]);
        c.start(scope()).unwrap();
        assert!(matches!(
            c.start(scope()),
            Err(StudyError::InvalidTransition { .. })
        ));

        c.reset();
        assert_eq!(c.state(), SessionState::NotStarted);
        assert!(c.start(scope()).is_ok());
    }

    #[test]
    fn test_history_carries_across_sessions() {
        let mut c = controller_with(&[5]);
        c.start(scope()).unwrap();
        answer(&mut c, true);

        c.restart().unwrap();
        let report = answer(&mut c, true);
        assert_eq!(report.difficulty, Difficulty::Easy);
    }

    /// History store whose reads and appends can be made to fail.
    #[derive(Default)]
    struct FlakyHistoryStore {
        entries: HashMap<CardKey, Vec<AnswerOutcome>>,
        fail_reads: bool,
        fail_appends: bool,
    }

    impl CardHistoryStore for FlakyHistoryStore {
        fn history(&self, key: &CardKey) -> Result<Vec<AnswerOutcome>> {
            if self.fail_reads {
                return Err(AppError::LockPoisoned);
            }
            Ok(self.entries.get(key).cloned().unwrap_or_default())
        }

        fn append(&mut self, key: &CardKey, outcome: AnswerOutcome) -> Result<()> {
            if self.fail_appends {
                return Err(AppError::LockPoisoned);
            }
            self.entries.entry(*key).or_default().push(outcome);
            Ok(())
        }
    }

    fn controller_with_history(
        ids: &[i64],
        history: FlakyHistoryStore,
    ) -> SessionController<FakeStore, FlakyHistoryStore> {
        let mut store = FakeStore::default();
        store
            .cards
            .insert(SUBTOPIC, ids.iter().copied().map(card).collect());
        SessionController::new(store, history, QueueOrder::AsGiven).with_retry_policy(RetryPolicy::none())
    }

    #[test]
    fn test_broken_history_store_does_not_block_answering() {
        let history = FlakyHistoryStore {
            fail_reads: true,
            fail_appends: true,
            ..FlakyHistoryStore::default()
        };
        let mut c = controller_with_history(&[1, 2], history);
        c.start(scope()).unwrap();
        assert_eq!(c.current_difficulty(), Some(Difficulty::Medium));

        c.reveal().unwrap();
        let report = c.answer(false).unwrap();
        assert_eq!(report.difficulty, Difficulty::Medium);
        assert_eq!(queue_ids(&c), vec![2, 1]);
        assert_eq!(c.stats().wrong_count, 1);
        assert_eq!(c.current_difficulty(), Some(Difficulty::Medium));

        for _ in 0..2 {
            c.reveal().unwrap();
            c.answer(true).unwrap();
        }
        assert_eq!(c.state(), SessionState::Completed);
        let summary = c.summary().unwrap();
        assert!(summary.save_error.is_none());
        assert!(summary.record.completed);
        assert_eq!(c.store.saved.borrow().len(), 1);
    }

    #[test]
    fn test_failed_append_reports_difficulty_with_this_answer() {
        let key = CardKey::new(scope().subject_id, scope().topic_id, 1);
        let mut history = FlakyHistoryStore {
            fail_appends: true,
            ..FlakyHistoryStore::default()
        };
        history
            .entries
            .insert(key, vec![AnswerOutcome::Correct, AnswerOutcome::Correct]);
        let mut c = controller_with_history(&[1, 2], history);
        c.start(scope()).unwrap();
        assert_eq!(c.current_difficulty(), Some(Difficulty::Easy));

        c.reveal().unwrap();
        let report = c.answer(false).unwrap();
        assert_eq!(report.outcome, AnswerOutcome::Incorrect);
        assert_eq!(report.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_scope_follows_session_lifecycle() {
        let mut c = controller_with(&[1]);
        assert!(c.scope().is_none());

        c.start(scope()).unwrap();
        assert_eq!(c.scope(), Some(&scope()));

        answer(&mut c, true);
        assert_eq!(c.state(), SessionState::Completed);
        assert_eq!(c.scope().map(|s| s.subtopic_id), Some(SUBTOPIC));

        c.reset();
        assert!(c.scope().is_none());
    }
}
