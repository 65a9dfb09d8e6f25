use futures::future::try_join_all;
use tracing::debug;

use crate::error::{AnalysisError, ConfigError, OracleError};
use crate::llm::{build_compliance_prompt, Oracle, ANSWER_LABELS, ANSWER_NO, ANSWER_YES};
use crate::models::{Answer, ChecklistQuestion, QuestionTally};

/// Vote on whether a checklist question was addressed
///
/// Sends `tries` identical yes/no queries concurrently and tallies every
/// answer. All queries run to completion; the first oracle failure fails the
/// whole vote.
pub async fn vote<O: Oracle>(
    oracle: &O,
    question: &ChecklistQuestion,
    text: &str,
    tries: u32,
) -> Result<QuestionTally, AnalysisError> {
    if tries == 0 {
        return Err(ConfigError::InvalidTries(tries).into());
    }

    let prompt = build_compliance_prompt(question, text);
    let answers = try_join_all((0..tries).map(|_| ask(oracle, &prompt))).await?;
    let tally = QuestionTally::from_answers(question, answers)?;

    debug!(
        question = %question.id,
        exists = tally.answered_exists(),
        missing = tally.answered_missing(),
        "Vote complete"
    );

    Ok(tally)
}

async fn ask<O: Oracle>(oracle: &O, prompt: &str) -> Result<Answer, OracleError> {
    let label = oracle.classify(prompt, &ANSWER_LABELS).await?;
    match label.as_str() {
        ANSWER_YES => Ok(Answer::Exists),
        ANSWER_NO => Ok(Answer::Missing),
        _ => Err(OracleError::UnexpectedLabel {
            label,
            allowed: ANSWER_LABELS.iter().map(|l| l.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::llm::testing::{BarrierOracle, StubOracle};

    fn question() -> ChecklistQuestion {
        ChecklistQuestion::new("item_4", "Hinweis auf Verlustrisiken")
    }

    #[tokio::test]
    async fn test_two_of_three() {
        for order in [["yes", "yes", "no"], ["yes", "no", "yes"], ["no", "yes", "yes"]] {
            let oracle = StubOracle::sequence(&order);
            let tally = vote(&oracle, &question(), "transcript", 3).await.unwrap();

            assert_eq!(tally.answered_exists(), 2);
            assert_eq!(tally.answered_missing(), 1);
            assert!(tally.exists());
            assert!((tally.confidence() - 0.667).abs() < 1e-3);
            assert_eq!(oracle.classify_calls(), 3);
        }
    }

    #[tokio::test]
    async fn test_even_split_is_missing() {
        let oracle = StubOracle::sequence(&["yes", "no", "no", "yes"]);
        let tally = vote(&oracle, &question(), "transcript", 4).await.unwrap();

        assert!(!tally.exists());
        assert_eq!(tally.confidence(), 0.5);
    }

    #[tokio::test]
    async fn test_no_early_exit() {
        let oracle = StubOracle::constant("yes", "");
        let tally = vote(&oracle, &question(), "transcript", 5).await.unwrap();

        assert_eq!(oracle.classify_calls(), 5);
        assert_eq!(tally.tries(), 5);
        assert_eq!(tally.confidence(), 1.0);
    }

    #[tokio::test]
    async fn test_tries_are_in_flight_together() {
        let oracle = BarrierOracle::new(5, "yes");

        let tally = tokio::time::timeout(
            Duration::from_secs(2),
            vote(&oracle, &question(), "transcript", 5),
        )
        .await
        .expect("tries should run concurrently")
        .unwrap();

        assert_eq!(tally.tries(), 5);
        assert!(tally.exists());
    }

    #[tokio::test]
    async fn test_zero_tries_rejected_without_queries() {
        let oracle = StubOracle::constant("yes", "");
        let err = vote(&oracle, &question(), "transcript", 0).await.unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Configuration(ConfigError::InvalidTries(0))
        ));
        assert_eq!(oracle.classify_calls(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_fails_vote() {
        // Two answers for three tries: the third query fails
        let oracle = StubOracle::sequence(&["yes", "yes"]);
        let err = vote(&oracle, &question(), "transcript", 3).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Oracle(_)));
    }

    #[tokio::test]
    async fn test_unknown_label_is_error() {
        let oracle = StubOracle::constant("Ja", "");
        let err = vote(&oracle, &question(), "transcript", 1).await.unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Oracle(OracleError::UnexpectedLabel { .. })
        ));
    }
}
