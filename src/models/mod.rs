pub mod account;
pub mod course;
pub mod flashcard;
pub mod study_record;

pub use account::{Payment, PaymentStatus, Role, User};
pub use course::{Course, Deepening, SubTopic, Subject, Topic};
pub use flashcard::{Flashcard, RawFlashcard};
pub use study_record::{StudyScope, StudySessionRecord};
