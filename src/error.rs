//! Error types shared by the content store, import/export and configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Database connection lock was poisoned")]
    LockPoisoned,
}

impl AppError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// SQLite reported the database as busy or locked; retrying may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Course", 42);
        assert_eq!(err.to_string(), "Course not found: 42");
    }

    #[test]
    fn test_validation_is_not_transient() {
        assert!(!AppError::Validation("empty name".to_string()).is_transient());
        assert!(!AppError::LockPoisoned.is_transient());
    }

    #[test]
    fn test_query_error_is_not_transient() {
        let err = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_transient());
    }
}
