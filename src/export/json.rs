//! JSON import/export of a whole course tree.
//! A course document nests subjects, topics, subtopics, cards and deepenings
//! and can be loaded back into another database.

use crate::database::db;
use crate::error::{AppError, Result};
use crate::models::{Course, RawFlashcard};
use log::info;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub subjects: Vec<SubjectDocument>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectDocument {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<TopicDocument>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicDocument {
    pub name: String,
    #[serde(default)]
    pub subtopics: Vec<SubTopicDocument>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubTopicDocument {
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<RawFlashcard>,
    #[serde(default)]
    pub deepenings: Vec<DeepeningDocument>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepeningDocument {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl CourseDocument {
    pub fn card_count(&self) -> usize {
        self.subjects
            .iter()
            .flat_map(|s| &s.topics)
            .flat_map(|t| &t.subtopics)
            .map(|st| st.flashcards.len())
            .sum()
    }
}

/// Exports a course document to a JSON file at the specified path.
pub fn export_json_to_path(document: &CourseDocument, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(document)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!("Course '{}' exported to '{}'", document.name, path.display());
    Ok(())
}

/// Reads a course document from a JSON file.
pub fn import_json(path: &Path) -> Result<CourseDocument> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let document: CourseDocument = serde_json::from_str(&contents)?;
    info!("Course '{}' read from '{}'", document.name, path.display());
    Ok(document)
}

/// Builds the document for a stored course, including inactive cards.
pub fn load_course_document(course_id: i64, conn: &Connection) -> Result<CourseDocument> {
    let course = db::get_course(course_id, conn)?;
    let mut subjects = Vec::new();

    for subject in db::get_subjects(course.id, conn)? {
        let mut topics = Vec::new();
        for topic in db::get_topics(subject.id, conn)? {
            let mut subtopics = Vec::new();
            for subtopic in db::get_subtopics(topic.id, conn)? {
                let flashcards = db::get_flashcards_for_subtopic(subtopic.id, conn)?
                    .iter()
                    .map(RawFlashcard::from)
                    .collect();
                let deepenings = db::get_deepenings(subtopic.id, conn)?
                    .into_iter()
                    .map(|d| DeepeningDocument {
                        title: d.title,
                        body: d.body,
                    })
                    .collect();
                subtopics.push(SubTopicDocument {
                    name: subtopic.name,
                    flashcards,
                    deepenings,
                });
            }
            topics.push(TopicDocument {
                name: topic.name,
                subtopics,
            });
        }
        subjects.push(SubjectDocument {
            name: subject.name,
            topics,
        });
    }

    Ok(CourseDocument {
        name: course.name,
        description: course.description,
        price_cents: course.price_cents,
        subjects,
    })
}

/// Stores a document as a new course and returns its ID. Nothing is written
/// when any part fails, and a course with the same name is rejected.
pub fn store_course_document(document: &CourseDocument, conn: &Connection) -> Result<i64> {
    if db::get_courses(true, conn)?
        .iter()
        .any(|c| c.name.eq_ignore_ascii_case(document.name.trim()))
    {
        return Err(AppError::Validation(format!(
            "Course '{}' already exists! Please rename it in the JSON file.",
            document.name
        )));
    }

    let tx = conn.unchecked_transaction()?;
    let course_id = db::create_course(
        &Course {
            id: 0,
            name: document.name.clone(),
            description: document.description.clone(),
            price_cents: document.price_cents,
            active: true,
        },
        &tx,
    )?;

    for (si, subject) in document.subjects.iter().enumerate() {
        let subject_id = db::create_subject(course_id, &subject.name, si as i64, &tx)?;
        for (ti, topic) in subject.topics.iter().enumerate() {
            let topic_id = db::create_topic(subject_id, &topic.name, ti as i64, &tx)?;
            for (sti, subtopic) in topic.subtopics.iter().enumerate() {
                let subtopic_id = db::create_subtopic(topic_id, &subtopic.name, sti as i64, &tx)?;
                for (position, raw) in subtopic.flashcards.iter().enumerate() {
                    let card = raw.clone().normalize(subtopic_id, position);
                    db::create_flashcard(&card, &tx)?;
                }
                for deepening in &subtopic.deepenings {
                    db::create_deepening(subtopic_id, &deepening.title, &deepening.body, &tx)?;
                }
            }
        }
    }
    tx.commit()?;

    info!(
        "Course '{}' imported with {} cards",
        document.name,
        document.card_count()
    );
    Ok(course_id)
}
