//! Flashcard is a pair <front, back> attached to a subtopic, with optional
//! explanation and deepening text shown after the answer is revealed.
use serde::{Deserialize, Serialize};

pub const MISSING_FRONT: &str = "(question not available)";
pub const MISSING_BACK: &str = "(answer not available)";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: i64,
    pub subtopic_id: i64,
    pub front: String,
    pub back: String,
    pub explanation: Option<String>,
    pub deepening: Option<String>,
    pub order_index: i64,
    pub active: bool,
}

impl Flashcard {
    pub fn new(subtopic_id: i64, front: &str, back: &str) -> Self {
        Self {
            id: 0,
            subtopic_id,
            front: front.to_string(),
            back: back.to_string(),
            explanation: None,
            deepening: None,
            order_index: 0,
            active: true,
        }
    }

    /// Front text, or a placeholder when the card was stored without one.
    pub fn display_front(&self) -> &str {
        if self.front.trim().is_empty() {
            MISSING_FRONT
        } else {
            &self.front
        }
    }

    pub fn display_back(&self) -> &str {
        if self.back.trim().is_empty() {
            MISSING_BACK
        } else {
            &self.back
        }
    }
}

/// Card shape as found in course documents. Older documents use
/// `question`/`answer`, newer ones `front`/`back`; some carry both.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFlashcard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepening: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl From<&Flashcard> for RawFlashcard {
    fn from(card: &Flashcard) -> Self {
        Self {
            front: Some(card.front.clone()),
            back: Some(card.back.clone()),
            explanation: card.explanation.clone(),
            deepening: card.deepening.clone(),
            order_index: Some(card.order_index),
            active: Some(card.active),
            ..Self::default()
        }
    }
}

fn first_non_blank(a: Option<String>, b: Option<String>) -> String {
    a.filter(|s| !s.trim().is_empty())
        .or(b.filter(|s| !s.trim().is_empty()))
        .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl RawFlashcard {
    /// Normalizes the document into a single `Flashcard` shape.
    /// `position` is used as ordering index when the document has none.
    pub fn normalize(self, subtopic_id: i64, position: usize) -> Flashcard {
        Flashcard {
            id: 0,
            subtopic_id,
            front: first_non_blank(self.front, self.question),
            back: first_non_blank(self.back, self.answer),
            explanation: non_blank(self.explanation),
            deepening: non_blank(self.deepening),
            order_index: self
                .order_index
                .or(self.order)
                .unwrap_or(position as i64),
            active: self.active.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcard_creation() {
        let card = Flashcard::new(7, "Capital of Brazil?", "Brasília");

        assert_eq!(card.subtopic_id, 7);
        assert_eq!(card.front, "Capital of Brazil?");
        assert_eq!(card.back, "Brasília");
        assert!(card.active);
    }

    #[test]
    fn test_display_placeholders() {
        let card = Flashcard::new(1, "  ", "");
        assert_eq!(card.display_front(), MISSING_FRONT);
        assert_eq!(card.display_back(), MISSING_BACK);
    }

    #[test]
    fn test_normalize_question_answer_shape() {
        let raw: RawFlashcard =
            serde_json::from_str(r#"{"question": "2 + 2?", "answer": "4"}"#).unwrap();
        let card = raw.normalize(3, 5);

        assert_eq!(card.front, "2 + 2?");
        assert_eq!(card.back, "4");
        assert_eq!(card.subtopic_id, 3);
        assert_eq!(card.order_index, 5);
        assert!(card.active);
    }

    #[test]
    fn test_normalize_prefers_front_back() {
        let raw: RawFlashcard = serde_json::from_str(
            r#"{"front": "new", "question": "old", "back": "", "answer": "fallback", "orderIndex": 2, "active": false}"#,
        )
        .unwrap();
        let card = raw.normalize(1, 0);

        assert_eq!(card.front, "new");
        assert_eq!(card.back, "fallback");
        assert_eq!(card.order_index, 2);
        assert!(!card.active);
    }

    #[test]
    fn test_normalize_missing_text_is_empty() {
        let raw: RawFlashcard = serde_json::from_str(r#"{"explanation": "  "}"#).unwrap();
        let card = raw.normalize(1, 0);

        assert!(card.front.is_empty());
        assert_eq!(card.display_front(), MISSING_FRONT);
        assert_eq!(card.explanation, None);
    }
}
