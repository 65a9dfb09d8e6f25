use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::QuestionVerdict;

/// Coverage share at or above which an incomplete call is yellow
const YELLOW_COVERAGE: f64 = 0.7;

/// Overall compliance rating of a call
///
/// Green only when every question was addressed; verdicts are binary, so a
/// single missing question already rules it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

/// Aggregate view over all verdicts of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of questions judged as addressed
    pub addressed: usize,
    /// Number of questions in the checklist
    pub total: usize,
    /// `addressed / total`, 0 for an empty checklist
    pub coverage: f64,
    pub traffic_light: TrafficLight,
}

impl ReportSummary {
    pub fn from_verdicts(verdicts: &[QuestionVerdict]) -> Self {
        let total = verdicts.len();
        let addressed = verdicts.iter().filter(|v| v.exists).count();

        if total == 0 {
            return Self {
                addressed,
                total,
                coverage: 0.0,
                traffic_light: TrafficLight::Red,
            };
        }

        let coverage = addressed as f64 / total as f64;

        let traffic_light = if addressed == total {
            TrafficLight::Green
        } else if coverage >= YELLOW_COVERAGE {
            TrafficLight::Yellow
        } else {
            TrafficLight::Red
        };

        Self {
            addressed,
            total,
            coverage,
            traffic_light,
        }
    }
}

/// Result of analysing one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Category chosen by the classifier
    pub category: String,
    /// Version of the checklist table, when it declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist_version: Option<String>,
    /// Speaker label identified as the bank consultant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultant: Option<String>,
    /// Verdicts in checklist order; empty when the category has no checklist
    pub verdicts: Vec<QuestionVerdict>,
    pub summary: ReportSummary,
    /// Transcript with the consultant anonymised, as sent to the oracle
    pub transcript: String,
}

impl AnalysisReport {
    pub fn new(
        category: String,
        checklist_version: Option<String>,
        consultant: Option<String>,
        verdicts: Vec<QuestionVerdict>,
        transcript: String,
    ) -> Self {
        let summary = ReportSummary::from_verdicts(&verdicts);
        Self {
            analysis_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            category,
            checklist_version,
            consultant,
            verdicts,
            summary,
            transcript,
        }
    }
}
