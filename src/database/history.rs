//! Card answer history kept in the application database.

use crate::error::{AppError, Result};
use crate::study::{AnswerOutcome, CardHistoryStore, CardKey};
use rusqlite::types::Type;
use rusqlite::{Connection, params};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl CardHistoryStore for SqliteHistoryStore {
    fn history(&self, key: &CardKey) -> Result<Vec<AnswerOutcome>> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT outcome FROM card_history
             WHERE subject_id = ?1 AND topic_id = ?2 AND card_id = ?3
             ORDER BY id",
        )?;
        let outcomes = stmt
            .query_map(params![key.subject_id, key.topic_id, key.card_id], |row| {
                let value: String = row.get(0)?;
                AnswerOutcome::parse(&value).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        format!("unknown outcome '{}'", value).into(),
                    )
                })
            })?
            .collect::<rusqlite::Result<Vec<AnswerOutcome>>>()?;
        Ok(outcomes)
    }

    fn append(&mut self, key: &CardKey, outcome: AnswerOutcome) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| AppError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO card_history (subject_id, topic_id, card_id, outcome) VALUES (?1, ?2, ?3, ?4)",
            params![key.subject_id, key.topic_id, key.card_id, outcome.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::open_in_memory;
    use crate::study::Difficulty;

    fn store() -> SqliteHistoryStore {
        SqliteHistoryStore::new(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_history_survives_new_store_handle() {
        let mut writer = store();
        let key = CardKey::new(1, 2, 3);
        writer.append(&key, AnswerOutcome::Correct).unwrap();
        writer.append(&key, AnswerOutcome::Correct).unwrap();

        let reader = writer.clone();
        assert_eq!(reader.history(&key).unwrap().len(), 2);
        assert_eq!(reader.difficulty(&key).unwrap(), Difficulty::Easy);
    }

    #[test]
    fn test_history_is_scoped_by_subject_and_topic() {
        let mut history = store();
        history
            .append(&CardKey::new(1, 1, 10), AnswerOutcome::Incorrect)
            .unwrap();
        history
            .append(&CardKey::new(1, 1, 10), AnswerOutcome::Incorrect)
            .unwrap();

        assert_eq!(
            history.difficulty(&CardKey::new(1, 1, 10)).unwrap(),
            Difficulty::Hard
        );
        assert!(history.history(&CardKey::new(1, 2, 10)).unwrap().is_empty());
        assert_eq!(
            history.difficulty(&CardKey::new(1, 2, 10)).unwrap(),
            Difficulty::Medium
        );
    }
}
