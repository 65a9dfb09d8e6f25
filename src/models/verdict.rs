use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::ChecklistQuestion;

/// One yes/no judgment from the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// The topic was addressed in the call
    Exists,
    /// The topic was not addressed
    Missing,
}

/// Vote counts for one checklist question
///
/// Only constructed from a non-empty set of answers, so the total is always
/// the number of tries and at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionTally {
    pub id: String,
    pub question: String,
    answered_exists: u32,
    answered_missing: u32,
}

impl QuestionTally {
    /// Tally a set of answers; fails on an empty set
    pub fn from_answers(
        question: &ChecklistQuestion,
        answers: impl IntoIterator<Item = Answer>,
    ) -> Result<Self, ConfigError> {
        let (answered_exists, answered_missing) =
            answers
                .into_iter()
                .fold((0u32, 0u32), |(exists, missing), answer| match answer {
                    Answer::Exists => (exists + 1, missing),
                    Answer::Missing => (exists, missing + 1),
                });

        if answered_exists + answered_missing == 0 {
            return Err(ConfigError::InvalidTries(0));
        }

        Ok(Self {
            id: question.id.clone(),
            question: question.description.clone(),
            answered_exists,
            answered_missing,
        })
    }

    pub fn answered_exists(&self) -> u32 {
        self.answered_exists
    }

    pub fn answered_missing(&self) -> u32 {
        self.answered_missing
    }

    pub fn tries(&self) -> u32 {
        self.answered_exists + self.answered_missing
    }

    /// Strict majority; an even split counts as missing
    pub fn exists(&self) -> bool {
        self.answered_exists > self.answered_missing
    }

    /// Share of tries that agreed with the majority, in [0.5, 1]
    pub fn confidence(&self) -> f64 {
        self.answered_exists.max(self.answered_missing) as f64 / self.tries() as f64
    }

    /// Finalize into a verdict; the extract is dropped unless the question exists
    pub fn into_verdict(self, text_extract: Option<String>) -> QuestionVerdict {
        let exists = self.exists();
        let confidence = self.confidence();
        QuestionVerdict {
            id: self.id,
            question: self.question,
            exists,
            confidence,
            text_extract: if exists { text_extract } else { None },
        }
    }
}

/// Final outcome for one checklist question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionVerdict {
    pub id: String,
    pub question: String,
    pub exists: bool,
    pub confidence: f64,
    /// Supporting quotation, only for questions judged as existing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_extract: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use Answer::{Exists, Missing};

    fn question() -> ChecklistQuestion {
        ChecklistQuestion::new("item_1", "Emittentenrisiko erwähnt")
    }

    #[test]
    fn test_majority_exists() {
        let tally = QuestionTally::from_answers(&question(), [Exists, Missing, Exists]).unwrap();
        assert_eq!(tally.answered_exists(), 2);
        assert_eq!(tally.answered_missing(), 1);
        assert_eq!(tally.tries(), 3);
        assert!(tally.exists());
        assert!((tally.confidence() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_is_missing() {
        let tally =
            QuestionTally::from_answers(&question(), [Exists, Missing, Missing, Exists]).unwrap();
        assert!(!tally.exists());
        assert_eq!(tally.confidence(), 0.5);
    }

    #[test]
    fn test_empty_answers_rejected() {
        let err = QuestionTally::from_answers(&question(), []).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTries(0)));
    }

    #[test]
    fn test_counts_sum_to_tries() {
        for tries in 1..=7u32 {
            for yes in 0..=tries {
                let answers = (0..tries).map(|i| if i < yes { Exists } else { Missing });
                let tally = QuestionTally::from_answers(&question(), answers).unwrap();
                assert_eq!(tally.answered_exists() + tally.answered_missing(), tries);
                assert_eq!(tally.exists(), yes * 2 > tries);
                let confidence = tally.confidence();
                assert!((0.0..=1.0).contains(&confidence));
                assert_eq!(confidence, yes.max(tries - yes) as f64 / tries as f64);
            }
        }
    }

    #[test]
    fn test_verdict_drops_extract_when_missing() {
        let tally = QuestionTally::from_answers(&question(), [Missing, Missing, Exists]).unwrap();
        let verdict = tally.into_verdict(Some("quote".to_string()));
        assert!(!verdict.exists);
        assert_eq!(verdict.text_extract, None);
    }

    #[test]
    fn test_verdict_keeps_extract_when_exists() {
        let tally = QuestionTally::from_answers(&question(), [Exists]).unwrap();
        let verdict = tally.into_verdict(Some("Das Emittentenrisiko...".to_string()));
        assert!(verdict.exists);
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.text_extract.as_deref(), Some("Das Emittentenrisiko..."));
    }
}
