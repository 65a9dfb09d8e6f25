use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, warn};

use crate::error::{AnalysisError, ConfigError};
use crate::io::Transcriber;
use crate::llm::Oracle;
use crate::models::{
    AnalysisReport, CategoryLabel, ChecklistQuestion, ChecklistTable, QuestionVerdict, Transcript,
};
use crate::stages::{categorize, extract_evidence, identify_consultant, vote};

/// Configuration for the analysis pipeline
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Independent yes/no queries per checklist question; odd avoids ties
    pub tries: u32,
    /// Labels offered to the category classifier; `None` uses the checklist categories
    pub category_labels: Option<Vec<CategoryLabel>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            category_labels: None,
        }
    }
}

/// Steps of one analysis, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    RawTranscript,
    ConsultantIdentified,
    Anonymized,
    CategoryClassified,
    ChecklistResolved,
    QuestionsVoted,
    EvidenceExtracted,
    ReportAssembled,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::RawTranscript => "raw_transcript",
            AnalysisStage::ConsultantIdentified => "consultant_identified",
            AnalysisStage::Anonymized => "anonymized",
            AnalysisStage::CategoryClassified => "category_classified",
            AnalysisStage::ChecklistResolved => "checklist_resolved",
            AnalysisStage::QuestionsVoted => "questions_voted",
            AnalysisStage::EvidenceExtracted => "evidence_extracted",
            AnalysisStage::ReportAssembled => "report_assembled",
        };
        f.write_str(name)
    }
}

/// Vote on one question, then quote the evidence if it was addressed
pub async fn assess_question<O: Oracle>(
    oracle: &O,
    question: &ChecklistQuestion,
    text: &str,
    tries: u32,
) -> Result<QuestionVerdict, AnalysisError> {
    let tally = vote(oracle, question, text, tries).await?;

    let text_extract = if tally.exists() {
        Some(extract_evidence(oracle, question, text).await?)
    } else {
        None
    };

    Ok(tally.into_verdict(text_extract))
}

/// Assess every question concurrently; verdicts keep checklist order
pub async fn assess_checklist<O: Oracle>(
    oracle: &O,
    questions: &[ChecklistQuestion],
    text: &str,
    tries: u32,
) -> Result<Vec<QuestionVerdict>, AnalysisError> {
    if tries == 0 {
        return Err(ConfigError::InvalidTries(tries).into());
    }

    try_join_all(
        questions
            .iter()
            .map(|question| assess_question(oracle, question, text, tries)),
    )
    .await
}

/// End-to-end analysis of one call
///
/// Either a complete report is produced or the first fatal error is
/// returned; there are no partial reports. A category without a checklist
/// yields a report with no verdicts.
pub struct CallAnalyzer<O> {
    oracle: O,
    checklists: Arc<ChecklistTable>,
    config: AnalysisConfig,
}

impl<O: Oracle> CallAnalyzer<O> {
    pub fn new(oracle: O, checklists: Arc<ChecklistTable>, config: AnalysisConfig) -> Self {
        Self {
            oracle,
            checklists,
            config,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Transcribe an audio file, then analyze it
    pub async fn analyze_audio<T: Transcriber>(
        &self,
        transcriber: &T,
        audio: &Path,
    ) -> Result<AnalysisReport, AnalysisError> {
        info!("Transcribing {:?}", audio);
        let transcript = transcriber.transcribe(audio).await?;
        self.analyze_transcript(&transcript).await
    }

    pub async fn analyze_transcript(
        &self,
        transcript: &Transcript,
    ) -> Result<AnalysisReport, AnalysisError> {
        let tries = self.config.tries;
        if tries == 0 {
            return Err(ConfigError::InvalidTries(tries).into());
        }

        log_stage(AnalysisStage::RawTranscript);
        info!(
            "{} segments, {} speakers",
            transcript.segments.len(),
            transcript.speakers().len()
        );

        let consultant = identify_consultant(&self.oracle, transcript).await?;
        log_stage(AnalysisStage::ConsultantIdentified);
        info!("Consultant: {}", consultant.as_deref().unwrap_or("none"));

        let anonymized = match &consultant {
            Some(label) => transcript.anonymize(label),
            None => transcript.clone(),
        };
        let text = anonymized.render();
        log_stage(AnalysisStage::Anonymized);

        let categories = self.category_labels();
        let category = categorize(&self.oracle, &text, &categories).await?;
        log_stage(AnalysisStage::CategoryClassified);
        info!("Category: {}", category);

        let questions = match self.checklists.resolve(category.as_str()) {
            Ok(questions) => questions,
            Err(e) => {
                warn!("{}, returning empty report", e);
                log_stage(AnalysisStage::ReportAssembled);
                return Ok(self.assemble(category, consultant, Vec::new(), text));
            }
        };
        log_stage(AnalysisStage::ChecklistResolved);
        info!("{} questions, {} tries each", questions.len(), tries);

        // Voting and extraction run per question inside one fan-out
        let verdicts = assess_checklist(&self.oracle, questions, &text, tries).await?;
        log_stage(AnalysisStage::QuestionsVoted);
        log_stage(AnalysisStage::EvidenceExtracted);

        let report = self.assemble(category, consultant, verdicts, text);
        log_stage(AnalysisStage::ReportAssembled);
        info!(
            "{}/{} questions addressed ({:?})",
            report.summary.addressed, report.summary.total, report.summary.traffic_light
        );

        Ok(report)
    }

    fn category_labels(&self) -> Vec<CategoryLabel> {
        match &self.config.category_labels {
            Some(labels) => labels.clone(),
            None => self.checklists.categories().cloned().collect(),
        }
    }

    fn assemble(
        &self,
        category: CategoryLabel,
        consultant: Option<String>,
        verdicts: Vec<QuestionVerdict>,
        text: String,
    ) -> AnalysisReport {
        AnalysisReport::new(
            category.to_string(),
            self.checklists.version().map(String::from),
            consultant,
            verdicts,
            text,
        )
    }
}

fn log_stage(stage: AnalysisStage) {
    info!(stage = %stage, "Stage reached");
}
