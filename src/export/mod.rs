pub mod json;

pub use json::{CourseDocument, export_json_to_path, import_json};
