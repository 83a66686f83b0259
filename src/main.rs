mod app;
use flashconcards::*;

use app::FlashApp;
use database::db::{get_courses, init_database};
use export::json::{CourseDocument, DeepeningDocument, SubTopicDocument, SubjectDocument, TopicDocument, store_course_document};
use log::{error, info};
use models::RawFlashcard;
use rusqlite::Connection;

fn card(front: &str, back: &str, explanation: Option<&str>) -> RawFlashcard {
    RawFlashcard {
        front: Some(front.to_string()),
        back: Some(back.to_string()),
        explanation: explanation.map(str::to_string),
        ..RawFlashcard::default()
    }
}

/// Demo course stored into an empty database.
fn sample_course() -> CourseDocument {
    CourseDocument {
        name: "Constitutional Law Basics".to_string(),
        description: "Free sample course to try the study mode.".to_string(),
        price_cents: 0,
        subjects: vec![SubjectDocument {
            name: "Constitutional Law".to_string(),
            topics: vec![TopicDocument {
                name: "Fundamental rights".to_string(),
                subtopics: vec![SubTopicDocument {
                    name: "Constitutional remedies".to_string(),
                    flashcards: vec![
                        card(
                            "Which remedy protects freedom of movement?",
                            "Habeas corpus",
                            Some("Art. 5, LXVIII"),
                        ),
                        card(
                            "Which remedy protects a clear and certain right not covered by habeas corpus?",
                            "Writ of mandamus (mandado de segurança)",
                            Some("Art. 5, LXIX"),
                        ),
                        card(
                            "Which remedy gives access to personal data held by public bodies?",
                            "Habeas data",
                            None,
                        ),
                    ],
                    deepenings: vec![DeepeningDocument {
                        title: "Why remedies matter".to_string(),
                        body: "Constitutional remedies are the procedural tools that make fundamental rights enforceable in court.".to_string(),
                    }],
                }],
            }],
        }],
    }
}

fn seed_sample_data(conn: &Connection) -> Result<()> {
    if get_courses(true, conn)?.is_empty() {
        store_course_document(&sample_course(), conn)?;
        info!("Sample data created!");
    }
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter.as_str()))
        .init();

    let conn = init_database(&config.database_path).inspect_err(|e| {
        error!(
            "Failed to initialize database at '{}': {}",
            config.database_path.display(),
            e
        )
    })?;

    if config.seed_sample_data {
        seed_sample_data(&conn)?;
    }

    let courses = get_courses(true, &conn)?;
    info!("Loaded {} courses from database", courses.len());
    for course in &courses {
        info!("  - {} ({})", course.name, course.price_label());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height]),
        ..Default::default()
    };
    eframe::run_native(
        "FlashConCards",
        options,
        Box::new(|_cc| Ok(Box::new(FlashApp::new(conn, config)))),
    )?;
    Ok(())
}
