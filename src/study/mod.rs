//! Study session core: queue of pending cards, per-card difficulty from answer
//! history, session counters and the controller that ties them together.

pub mod controller;
pub mod difficulty;
pub mod history;
pub mod queue;
pub mod stats;

pub use controller::{AnswerReport, CardPhase, SessionController, SessionState, SessionSummary};
pub use difficulty::{AnswerOutcome, Difficulty, classify};
pub use history::{CardHistoryStore, CardKey, MemoryHistoryStore};
pub use queue::{QueueOrder, StudyQueue};
pub use stats::SessionStats;

use crate::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("No cards available for this subtopic")]
    NoCardsAvailable,

    #[error("Cannot {action} while the session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Card {0} is not in the study queue")]
    CardNotQueued(i64),

    #[error(transparent)]
    Store(#[from] AppError),
}
