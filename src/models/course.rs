//! Content tree: a course is split into subjects, subjects into topics and
//! topics into subtopics. Flashcards and deepening content hang off subtopics.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub active: bool,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.price_cents <= 0
    }

    /// Price formatted as "R$ 49,90".
    pub fn price_label(&self) -> String {
        if self.is_free() {
            return "Free".to_string();
        }
        format!(
            "R$ {},{:02}",
            self.price_cents / 100,
            self.price_cents % 100
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub order_index: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub order_index: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: i64,
    pub topic_id: i64,
    pub name: String,
    pub order_index: i64,
}

/// Supplementary rich-text content shown on demand for a subtopic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deepening {
    pub id: i64,
    pub subtopic_id: i64,
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(price_cents: i64) -> Course {
        Course {
            id: 1,
            name: "OAB".to_string(),
            description: String::new(),
            price_cents,
            active: true,
        }
    }

    #[test]
    fn test_price_label() {
        assert_eq!(course(4990).price_label(), "R$ 49,90");
        assert_eq!(course(1005).price_label(), "R$ 10,05");
        assert_eq!(course(0).price_label(), "Free");
    }

    #[test]
    fn test_is_free() {
        assert!(course(0).is_free());
        assert!(!course(1).is_free());
    }
}
