use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{AnalysisReport, TrafficLight, Transcript};

/// Write any serializable value as pretty JSON
fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

/// Write the machine-readable report
pub fn write_report_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    write_json(report, path)
}

/// Write a transcript in the format `load_transcript` reads back
pub fn write_transcript_json(transcript: &Transcript, path: &Path) -> Result<()> {
    write_json(transcript, path)
}

/// Human-readable report summary
pub struct HumanReport<'a> {
    report: &'a AnalysisReport,
}

impl<'a> HumanReport<'a> {
    pub fn new(report: &'a AnalysisReport) -> Self {
        Self { report }
    }

    /// Format the report as text
    pub fn format(&self) -> String {
        let report = self.report;
        let summary = &report.summary;
        let mut output = String::new();

        output.push_str(&format!("Category: {}\n", report.category));
        if let Some(version) = &report.checklist_version {
            output.push_str(&format!("Checklist version: {}\n", version));
        }
        if let Some(consultant) = &report.consultant {
            output.push_str(&format!("Consultant: {}\n", consultant));
        }
        output.push_str(&format!(
            "Coverage: {}/{} ({:.1}%) - {}\n\n",
            summary.addressed,
            summary.total,
            summary.coverage * 100.0,
            traffic_light_name(summary.traffic_light)
        ));

        if report.verdicts.is_empty() {
            output.push_str("No checklist for this category.\n");
            return output;
        }

        for verdict in &report.verdicts {
            let mark = if verdict.exists { "x" } else { " " };
            output.push_str(&format!(
                "[{}] {} (confidence {:.2})\n",
                mark, verdict.id, verdict.confidence
            ));
            output.push_str(&indent(&wrap_text(&verdict.question, 76), "    "));
            output.push('\n');
            if let Some(extract) = &verdict.text_extract {
                output.push_str(&indent(&wrap_text(&format!("\"{}\"", extract), 74), "    > "));
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    /// Write to a text file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        write!(file, "{}", self.format())?;
        Ok(())
    }
}

fn traffic_light_name(light: TrafficLight) -> &'static str {
    match light {
        TrafficLight::Green => "green",
        TrafficLight::Yellow => "yellow",
        TrafficLight::Red => "red",
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        if line_len + word.len() + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionVerdict;

    fn report(verdicts: Vec<QuestionVerdict>) -> AnalysisReport {
        AnalysisReport::new(
            "Mit Beratung – Fonds".to_string(),
            Some("v1".to_string()),
            Some("Speaker01".to_string()),
            verdicts,
            "Consultant: Hallo".to_string(),
        )
    }

    #[test]
    fn test_format_verdicts() {
        let report = report(vec![
            QuestionVerdict {
                id: "item_1".to_string(),
                question: "Risikoklasse erklärt".to_string(),
                exists: true,
                confidence: 2.0 / 3.0,
                text_extract: Some("Der Fonds hat Risikoklasse 4.".to_string()),
            },
            QuestionVerdict {
                id: "item_2".to_string(),
                question: "Kostenhinweis gegeben".to_string(),
                exists: false,
                confidence: 1.0,
                text_extract: None,
            },
        ]);

        let text = HumanReport::new(&report).format();

        assert!(text.contains("Category: Mit Beratung – Fonds\n"));
        assert!(text.contains("Coverage: 1/2 (50.0%) - red\n"));
        assert!(text.contains("[x] item_1 (confidence 0.67)\n    Risikoklasse erklärt\n"));
        assert!(text.contains("    > \"Der Fonds hat Risikoklasse 4.\""));
        assert!(text.contains("[ ] item_2 (confidence 1.00)\n"));
    }

    #[test]
    fn test_format_empty_report() {
        let text = HumanReport::new(&report(Vec::new())).format();
        assert!(text.contains("No checklist for this category."));
    }

    #[test]
    fn test_report_json_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = report(Vec::new());

        write_report_json(&report, &path).unwrap();

        let read: AnalysisReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read.analysis_id, report.analysis_id);
        assert_eq!(read.category, report.category);
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a test of the text wrapping function that should wrap at 20 chars";
        let wrapped = wrap_text(text, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 25);
        }
    }
}
