//! Finished study sessions as they are stored.
use crate::study::SessionStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where in the content tree a session takes place and who studies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyScope {
    pub user_id: i64,
    pub course_id: i64,
    pub subject_id: i64,
    pub topic_id: i64,
    pub subtopic_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudySessionRecord {
    pub id: i64,
    pub scope: StudyScope,
    pub stats: SessionStats,
    /// False when the user ended the session before mastering every card.
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
