pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod study;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use models::{Course, Flashcard, StudyScope, StudySessionRecord, SubTopic, Subject, Topic, User};
pub use study::{SessionController, SessionStats, StudyQueue};
