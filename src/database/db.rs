//! Database operations for the content tree
//!
//! Handles SQLite database initialization and CRUD operations for courses,
//! subjects, topics, subtopics, flashcards and deepening content.

use crate::error::{AppError, Result};
use crate::models::{Course, Deepening, Flashcard, SubTopic, Subject, Topic};
use log::info;
use rusqlite::{Connection, Row, params};
use std::path::Path;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        price_cents INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        order_index INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS topics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        order_index INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (subject_id) REFERENCES subjects(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS subtopics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        order_index INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS flashcards (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subtopic_id INTEGER NOT NULL,
        front TEXT NOT NULL DEFAULT '',
        back TEXT NOT NULL DEFAULT '',
        explanation TEXT,
        deepening TEXT,
        order_index INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY (subtopic_id) REFERENCES subtopics(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS deepenings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subtopic_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL DEFAULT '',
        FOREIGN KEY (subtopic_id) REFERENCES subtopics(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'student',
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS payments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        amount_cents INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS study_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        subject_id INTEGER NOT NULL,
        topic_id INTEGER NOT NULL,
        subtopic_id INTEGER NOT NULL,
        total_cards INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        wrong_count INTEGER NOT NULL,
        elapsed_seconds INTEGER NOT NULL,
        completed INTEGER NOT NULL,
        started_at TEXT NOT NULL,
        finished_at TEXT NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS card_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subject_id INTEGER NOT NULL,
        topic_id INTEGER NOT NULL,
        card_id INTEGER NOT NULL,
        outcome TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_card_history_key
        ON card_history (subject_id, topic_id, card_id);
";

/// Opens (creating if needed) the SQLite database at `path` and makes sure
/// every table exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    info!("Database ready at {}", path.display());
    Ok(conn)
}

/// In-memory database with the full schema.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(format!("{} name cannot be empty", kind)));
    }
    Ok(())
}

fn check_changed(changed: usize, entity: &'static str, id: i64) -> Result<()> {
    if changed == 0 {
        return Err(AppError::not_found(entity, id));
    }
    Ok(())
}

// ==================== Courses ====================

fn course_from_row(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price_cents: row.get(3)?,
        active: row.get(4)?,
    })
}

/// Creates a course and returns its ID. The `id` field of `course` is ignored.
pub fn create_course(course: &Course, conn: &Connection) -> Result<i64> {
    require_name("Course", &course.name)?;
    conn.execute(
        "INSERT INTO courses (name, description, price_cents, active) VALUES (?1, ?2, ?3, ?4)",
        params![
            course.name.trim(),
            course.description,
            course.price_cents,
            course.active
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!("Course '{}' created with id {}", course.name, id);
    Ok(id)
}

pub fn update_course(course: &Course, conn: &Connection) -> Result<()> {
    require_name("Course", &course.name)?;
    let changed = conn.execute(
        "UPDATE courses SET name = ?1, description = ?2, price_cents = ?3, active = ?4 WHERE id = ?5",
        params![
            course.name.trim(),
            course.description,
            course.price_cents,
            course.active,
            course.id
        ],
    )?;
    check_changed(changed, "Course", course.id)
}

/// Deletes a course together with its whole content tree.
pub fn delete_course(course_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM courses WHERE id = ?1", params![course_id])?;
    check_changed(changed, "Course", course_id)?;
    info!("Course {} deleted", course_id);
    Ok(())
}

pub fn get_course(course_id: i64, conn: &Connection) -> Result<Course> {
    conn.query_row(
        "SELECT id, name, description, price_cents, active FROM courses WHERE id = ?1",
        params![course_id],
        course_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::not_found("Course", course_id),
        other => other.into(),
    })
}

/// Retrieves courses ordered by name. Inactive courses are included only
/// when `include_inactive` is set (content management screens).
pub fn get_courses(include_inactive: bool, conn: &Connection) -> Result<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, price_cents, active FROM courses
         WHERE active = 1 OR ?1
         ORDER BY name",
    )?;
    let courses = stmt
        .query_map(params![include_inactive], course_from_row)?
        .collect::<rusqlite::Result<Vec<Course>>>()?;
    Ok(courses)
}

// ==================== Subjects ====================

fn subject_from_row(row: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        course_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
    })
}

pub fn create_subject(course_id: i64, name: &str, order_index: i64, conn: &Connection) -> Result<i64> {
    require_name("Subject", name)?;
    conn.execute(
        "INSERT INTO subjects (course_id, name, order_index) VALUES (?1, ?2, ?3)",
        params![course_id, name.trim(), order_index],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_subject(subject: &Subject, conn: &Connection) -> Result<()> {
    require_name("Subject", &subject.name)?;
    let changed = conn.execute(
        "UPDATE subjects SET name = ?1, order_index = ?2 WHERE id = ?3",
        params![subject.name.trim(), subject.order_index, subject.id],
    )?;
    check_changed(changed, "Subject", subject.id)
}

pub fn delete_subject(subject_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM subjects WHERE id = ?1", params![subject_id])?;
    check_changed(changed, "Subject", subject_id)
}

pub fn get_subjects(course_id: i64, conn: &Connection) -> Result<Vec<Subject>> {
    let mut stmt = conn.prepare(
        "SELECT id, course_id, name, order_index FROM subjects
         WHERE course_id = ?1 ORDER BY order_index, id",
    )?;
    let subjects = stmt
        .query_map(params![course_id], subject_from_row)?
        .collect::<rusqlite::Result<Vec<Subject>>>()?;
    Ok(subjects)
}

// ==================== Topics ====================

fn topic_from_row(row: &Row) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
    })
}

pub fn create_topic(subject_id: i64, name: &str, order_index: i64, conn: &Connection) -> Result<i64> {
    require_name("Topic", name)?;
    conn.execute(
        "INSERT INTO topics (subject_id, name, order_index) VALUES (?1, ?2, ?3)",
        params![subject_id, name.trim(), order_index],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_topic(topic: &Topic, conn: &Connection) -> Result<()> {
    require_name("Topic", &topic.name)?;
    let changed = conn.execute(
        "UPDATE topics SET name = ?1, order_index = ?2 WHERE id = ?3",
        params![topic.name.trim(), topic.order_index, topic.id],
    )?;
    check_changed(changed, "Topic", topic.id)
}

pub fn delete_topic(topic_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM topics WHERE id = ?1", params![topic_id])?;
    check_changed(changed, "Topic", topic_id)
}

pub fn get_topics(subject_id: i64, conn: &Connection) -> Result<Vec<Topic>> {
    let mut stmt = conn.prepare(
        "SELECT id, subject_id, name, order_index FROM topics
         WHERE subject_id = ?1 ORDER BY order_index, id",
    )?;
    let topics = stmt
        .query_map(params![subject_id], topic_from_row)?
        .collect::<rusqlite::Result<Vec<Topic>>>()?;
    Ok(topics)
}

// ==================== Subtopics ====================

fn subtopic_from_row(row: &Row) -> rusqlite::Result<SubTopic> {
    Ok(SubTopic {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        name: row.get(2)?,
        order_index: row.get(3)?,
    })
}

pub fn create_subtopic(topic_id: i64, name: &str, order_index: i64, conn: &Connection) -> Result<i64> {
    require_name("Subtopic", name)?;
    conn.execute(
        "INSERT INTO subtopics (topic_id, name, order_index) VALUES (?1, ?2, ?3)",
        params![topic_id, name.trim(), order_index],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_subtopic(subtopic: &SubTopic, conn: &Connection) -> Result<()> {
    require_name("Subtopic", &subtopic.name)?;
    let changed = conn.execute(
        "UPDATE subtopics SET name = ?1, order_index = ?2 WHERE id = ?3",
        params![subtopic.name.trim(), subtopic.order_index, subtopic.id],
    )?;
    check_changed(changed, "Subtopic", subtopic.id)
}

pub fn delete_subtopic(subtopic_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM subtopics WHERE id = ?1", params![subtopic_id])?;
    check_changed(changed, "Subtopic", subtopic_id)
}

pub fn get_subtopics(topic_id: i64, conn: &Connection) -> Result<Vec<SubTopic>> {
    let mut stmt = conn.prepare(
        "SELECT id, topic_id, name, order_index FROM subtopics
         WHERE topic_id = ?1 ORDER BY order_index, id",
    )?;
    let subtopics = stmt
        .query_map(params![topic_id], subtopic_from_row)?
        .collect::<rusqlite::Result<Vec<SubTopic>>>()?;
    Ok(subtopics)
}

// ==================== Flashcards ====================

fn flashcard_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        subtopic_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        explanation: row.get(4)?,
        deepening: row.get(5)?,
        order_index: row.get(6)?,
        active: row.get(7)?,
    })
}

/// Adds a flashcard to its subtopic and returns the new ID.
pub fn create_flashcard(card: &Flashcard, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT INTO flashcards (subtopic_id, front, back, explanation, deepening, order_index, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            card.subtopic_id,
            card.front,
            card.back,
            card.explanation,
            card.deepening,
            card.order_index,
            card.active
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_flashcard(card: &Flashcard, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "UPDATE flashcards
         SET front = ?1, back = ?2, explanation = ?3, deepening = ?4, order_index = ?5, active = ?6
         WHERE id = ?7",
        params![
            card.front,
            card.back,
            card.explanation,
            card.deepening,
            card.order_index,
            card.active,
            card.id
        ],
    )?;
    check_changed(changed, "Flashcard", card.id)
}

pub fn delete_flashcard(card_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM flashcards WHERE id = ?1", params![card_id])?;
    check_changed(changed, "Flashcard", card_id)
}

/// Retrieves every flashcard of a subtopic, active or not, in study order.
pub fn get_flashcards_for_subtopic(subtopic_id: i64, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, subtopic_id, front, back, explanation, deepening, order_index, active
         FROM flashcards WHERE subtopic_id = ?1 ORDER BY order_index, id",
    )?;
    let cards = stmt
        .query_map(params![subtopic_id], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<Flashcard>>>()?;
    Ok(cards)
}

pub fn count_active_flashcards(subtopic_id: i64, conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM flashcards WHERE subtopic_id = ?1 AND active = 1",
        params![subtopic_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ==================== Deepenings ====================

fn deepening_from_row(row: &Row) -> rusqlite::Result<Deepening> {
    Ok(Deepening {
        id: row.get(0)?,
        subtopic_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
    })
}

pub fn create_deepening(subtopic_id: i64, title: &str, body: &str, conn: &Connection) -> Result<i64> {
    require_name("Deepening", title)?;
    conn.execute(
        "INSERT INTO deepenings (subtopic_id, title, body) VALUES (?1, ?2, ?3)",
        params![subtopic_id, title.trim(), body],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_deepening(deepening: &Deepening, conn: &Connection) -> Result<()> {
    require_name("Deepening", &deepening.title)?;
    let changed = conn.execute(
        "UPDATE deepenings SET title = ?1, body = ?2 WHERE id = ?3",
        params![deepening.title.trim(), deepening.body, deepening.id],
    )?;
    check_changed(changed, "Deepening", deepening.id)
}

pub fn delete_deepening(deepening_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute("DELETE FROM deepenings WHERE id = ?1", params![deepening_id])?;
    check_changed(changed, "Deepening", deepening_id)
}

pub fn get_deepenings(subtopic_id: i64, conn: &Connection) -> Result<Vec<Deepening>> {
    let mut stmt = conn.prepare(
        "SELECT id, subtopic_id, title, body FROM deepenings WHERE subtopic_id = ?1 ORDER BY id",
    )?;
    let deepenings = stmt
        .query_map(params![subtopic_id], deepening_from_row)?
        .collect::<rusqlite::Result<Vec<Deepening>>>()?;
    Ok(deepenings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course(name: &str) -> Course {
        Course {
            id: 0,
            name: name.to_string(),
            description: "Exam prep".to_string(),
            price_cents: 4990,
            active: true,
        }
    }

    /// course -> subject -> topic -> subtopic, returning the subtopic id
    fn content_tree(conn: &Connection) -> (i64, i64) {
        let course_id = create_course(&sample_course("OAB"), conn).unwrap();
        let subject_id = create_subject(course_id, "Civil Law", 0, conn).unwrap();
        let topic_id = create_topic(subject_id, "Contracts", 0, conn).unwrap();
        let subtopic_id = create_subtopic(topic_id, "Formation", 0, conn).unwrap();
        (course_id, subtopic_id)
    }

    #[test]
    fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("content.sqlite3");

        let conn = init_database(&path).unwrap();
        assert!(path.exists());
        assert!(get_courses(true, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_course_crud() {
        let conn = open_in_memory().unwrap();
        let id = create_course(&sample_course("ENEM"), &conn).unwrap();

        let mut course = get_course(id, &conn).unwrap();
        assert_eq!(course.name, "ENEM");
        assert_eq!(course.price_cents, 4990);

        course.active = false;
        update_course(&course, &conn).unwrap();
        assert!(get_courses(false, &conn).unwrap().is_empty());
        assert_eq!(get_courses(true, &conn).unwrap().len(), 1);

        delete_course(id, &conn).unwrap();
        assert!(matches!(
            get_course(id, &conn),
            Err(AppError::NotFound { entity: "Course", .. })
        ));
    }

    #[test]
    fn test_empty_name_rejected() {
        let conn = open_in_memory().unwrap();
        let result = create_course(&sample_course("   "), &conn);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_update_missing_entity() {
        let conn = open_in_memory().unwrap();
        let topic = Topic {
            id: 99,
            subject_id: 1,
            name: "Ghost".to_string(),
            order_index: 0,
        };
        assert!(matches!(
            update_topic(&topic, &conn),
            Err(AppError::NotFound { entity: "Topic", id: 99 })
        ));
    }

    #[test]
    fn test_children_are_ordered() {
        let conn = open_in_memory().unwrap();
        let course_id = create_course(&sample_course("OAB"), &conn).unwrap();
        create_subject(course_id, "Second", 2, &conn).unwrap();
        create_subject(course_id, "First", 1, &conn).unwrap();

        let names: Vec<String> = get_subjects(course_id, &conn)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_flashcard_crud() {
        let conn = open_in_memory().unwrap();
        let (_, subtopic_id) = content_tree(&conn);

        let mut card = Flashcard::new(subtopic_id, "Offer + acceptance = ?", "Contract");
        card.explanation = Some("Art. 427".to_string());
        let id = create_flashcard(&card, &conn).unwrap();

        let cards = get_flashcards_for_subtopic(subtopic_id, &conn).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, id);
        assert_eq!(cards[0].explanation.as_deref(), Some("Art. 427"));

        let mut stored = cards[0].clone();
        stored.active = false;
        update_flashcard(&stored, &conn).unwrap();
        assert_eq!(count_active_flashcards(subtopic_id, &conn).unwrap(), 0);

        delete_flashcard(id, &conn).unwrap();
        assert!(get_flashcards_for_subtopic(subtopic_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_delete_course_cascades() {
        let conn = open_in_memory().unwrap();
        let (course_id, subtopic_id) = content_tree(&conn);
        create_flashcard(&Flashcard::new(subtopic_id, "q", "a"), &conn).unwrap();
        create_deepening(subtopic_id, "Read more", "Long text", &conn).unwrap();

        delete_course(course_id, &conn).unwrap();

        assert!(get_flashcards_for_subtopic(subtopic_id, &conn).unwrap().is_empty());
        assert!(get_deepenings(subtopic_id, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_deepening_update() {
        let conn = open_in_memory().unwrap();
        let (_, subtopic_id) = content_tree(&conn);
        let id = create_deepening(subtopic_id, "Draft", "", &conn).unwrap();

        update_deepening(
            &Deepening {
                id,
                subtopic_id,
                title: "Final".to_string(),
                body: "Body".to_string(),
            },
            &conn,
        )
        .unwrap();

        let stored = get_deepenings(subtopic_id, &conn).unwrap();
        assert_eq!(stored[0].title, "Final");
        assert_eq!(stored[0].body, "Body");
    }
}
