pub mod accounts;
pub mod content;
pub mod db;
pub mod history;
pub mod retry;

pub use content::{ContentStore, SqliteContentStore};
pub use history::SqliteHistoryStore;
pub use retry::{RetryPolicy, with_retry};
