//! The two content-store operations a study session depends on, and the
//! study session records they write.

use crate::error::{AppError, Result};
use crate::models::{Flashcard, StudyScope, StudySessionRecord};
use crate::study::SessionStats;
use log::{debug, info};
use rusqlite::{Connection, Row, params};
use std::sync::{Arc, Mutex};

use super::db::get_flashcards_for_subtopic;

pub trait ContentStore {
    /// Every flashcard of the subtopic, active or not, in study order.
    fn fetch_flashcards(&self, subtopic_id: i64) -> Result<Vec<Flashcard>>;

    /// Stores the finished session and returns the record ID.
    fn persist_study_session(&self, record: &StudySessionRecord) -> Result<i64>;
}

/// `ContentStore` over the shared application connection.
#[derive(Clone)]
pub struct SqliteContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl ContentStore for SqliteContentStore {
    fn fetch_flashcards(&self, subtopic_id: i64) -> Result<Vec<Flashcard>> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        let cards = get_flashcards_for_subtopic(subtopic_id, &conn)?;
        debug!("Fetched {} flashcards for subtopic {}", cards.len(), subtopic_id);
        Ok(cards)
    }

    fn persist_study_session(&self, record: &StudySessionRecord) -> Result<i64> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        insert_study_session(record, &conn)
    }
}

pub fn insert_study_session(record: &StudySessionRecord, conn: &Connection) -> Result<i64> {
    let scope = &record.scope;
    let stats = &record.stats;
    conn.execute(
        "INSERT INTO study_sessions (
            user_id, course_id, subject_id, topic_id, subtopic_id,
            total_cards, correct_count, wrong_count, elapsed_seconds,
            completed, started_at, finished_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            scope.user_id,
            scope.course_id,
            scope.subject_id,
            scope.topic_id,
            scope.subtopic_id,
            stats.total_cards,
            stats.correct_count,
            stats.wrong_count,
            stats.elapsed_seconds as i64,
            record.completed,
            record.started_at,
            record.finished_at
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        "Study session {} saved: {}/{} correct, {} wrong, {}s",
        id, stats.correct_count, stats.total_cards, stats.wrong_count, stats.elapsed_seconds
    );
    Ok(id)
}

fn record_from_row(row: &Row) -> rusqlite::Result<StudySessionRecord> {
    Ok(StudySessionRecord {
        id: row.get(0)?,
        scope: StudyScope {
            user_id: row.get(1)?,
            course_id: row.get(2)?,
            subject_id: row.get(3)?,
            topic_id: row.get(4)?,
            subtopic_id: row.get(5)?,
        },
        stats: SessionStats {
            total_cards: row.get(6)?,
            correct_count: row.get(7)?,
            wrong_count: row.get(8)?,
            elapsed_seconds: row.get::<_, i64>(9)?.max(0) as u64,
        },
        completed: row.get(10)?,
        started_at: row.get(11)?,
        finished_at: row.get(12)?,
    })
}

/// Sessions of one user, most recent first.
pub fn get_study_sessions_for_user(user_id: i64, conn: &Connection) -> Result<Vec<StudySessionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, course_id, subject_id, topic_id, subtopic_id,
                total_cards, correct_count, wrong_count, elapsed_seconds,
                completed, started_at, finished_at
         FROM study_sessions WHERE user_id = ?1
         ORDER BY finished_at DESC, id DESC",
    )?;
    let records = stmt
        .query_map(params![user_id], record_from_row)?
        .collect::<rusqlite::Result<Vec<StudySessionRecord>>>()?;
    Ok(records)
}
