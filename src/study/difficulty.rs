//! Rough per-card difficulty derived from the card's answer history.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

impl AnswerOutcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correct" => Some(Self::Correct),
            "incorrect" => Some(Self::Incorrect),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Classifies a card from its outcomes, oldest first.
///
/// Rules are checked in order:
/// 1. no history: medium
/// 2. last two correct: easy
/// 3. wrong then right: medium
/// 4. two or more wrong and never right: hard
/// 5. last answer wrong: hard
/// 6. anything else: medium
pub fn classify(history: &[AnswerOutcome]) -> Difficulty {
    use AnswerOutcome::{Correct, Incorrect};

    match history {
        [] => Difficulty::Medium,
        [.., Correct, Correct] => Difficulty::Easy,
        [.., Incorrect, Correct] => Difficulty::Medium,
        _ => {
            let wrong = history.iter().filter(|&&o| o == Incorrect).count();
            let ever_right = history.contains(&Correct);
            if wrong >= 2 && !ever_right {
                Difficulty::Hard
            } else if history.last() == Some(&Incorrect) {
                Difficulty::Hard
            } else {
                Difficulty::Medium
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnswerOutcome::{Correct, Incorrect};

    #[test]
    fn test_empty_history_is_medium() {
        assert_eq!(classify(&[]), Difficulty::Medium);
    }

    #[test]
    fn test_two_correct_is_easy() {
        assert_eq!(classify(&[Correct, Correct]), Difficulty::Easy);
        assert_eq!(classify(&[Incorrect, Incorrect, Correct, Correct]), Difficulty::Easy);
    }

    #[test]
    fn test_wrong_then_right_is_medium() {
        assert_eq!(classify(&[Incorrect, Correct]), Difficulty::Medium);
        assert_eq!(classify(&[Incorrect, Incorrect, Incorrect, Correct]), Difficulty::Medium);
    }

    #[test]
    fn test_repeated_wrong_without_right_is_hard() {
        assert_eq!(classify(&[Incorrect, Incorrect]), Difficulty::Hard);
    }

    #[test]
    fn test_last_wrong_is_hard() {
        assert_eq!(classify(&[Incorrect]), Difficulty::Hard);
        assert_eq!(classify(&[Correct, Correct, Incorrect]), Difficulty::Hard);
    }

    #[test]
    fn test_single_correct_is_medium() {
        assert_eq!(classify(&[Correct]), Difficulty::Medium);
    }

    #[test]
    fn test_history_ending_correct_is_never_hard() {
        let histories: [&[AnswerOutcome]; 6] = [
            &[Correct],
            &[Incorrect, Correct],
            &[Correct, Correct],
            &[Incorrect, Incorrect, Correct],
            &[Correct, Incorrect, Correct],
            &[Incorrect, Correct, Incorrect, Incorrect, Correct],
        ];
        for history in histories {
            assert_ne!(classify(history), Difficulty::Hard, "{:?}", history);
        }
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(AnswerOutcome::parse("correct"), Some(Correct));
        assert_eq!(AnswerOutcome::parse(Incorrect.as_str()), Some(Incorrect));
        assert_eq!(AnswerOutcome::parse("acertou"), None);
        assert_eq!(AnswerOutcome::from_correct(false), Incorrect);
    }
}
