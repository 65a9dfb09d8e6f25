use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::ConfigError;
use crate::models::{
    CategoryLabel, ChecklistQuestion, ChecklistTable, SttOutput, Transcript, TranscriptSegment,
    CONSULTANT_LABEL,
};

/// Speaker label for text that precedes any labelled line
const UNKNOWN_SPEAKER: &str = "Unknown";

/// Longest prefix accepted as a speaker label in plain-text transcripts
const MAX_LABEL_CHARS: usize = 40;

/// On-disk checklist formats
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChecklistFile {
    /// `{"version": "...", "checklists": {"<category>": [...]}}`
    Versioned {
        #[serde(default)]
        version: Option<String>,
        checklists: OrderedChecklists,
    },
    /// `{"<category>": [{"id": ..., "description": ...}]}`
    Flat(OrderedChecklists),
}

/// Category map in file order
#[derive(Debug)]
struct OrderedChecklists(Vec<(CategoryLabel, Vec<ChecklistQuestion>)>);

impl<'de> Deserialize<'de> for OrderedChecklists {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChecklistsVisitor;

        impl<'de> Visitor<'de> for ChecklistsVisitor {
            type Value = OrderedChecklists;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category to its questions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut checklists = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    checklists.push(entry);
                }
                Ok(OrderedChecklists(checklists))
            }
        }

        deserializer.deserialize_map(ChecklistsVisitor)
    }
}

/// Load and validate a checklist table from a JSON file
pub fn load_checklists(path: &Path) -> Result<ChecklistTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read checklist file: {:?}", path))?;
    let table = parse_checklists_json(&content)
        .with_context(|| format!("Invalid checklist file: {:?}", path))?;
    Ok(table)
}

/// Parse a checklist table in either the flat or the versioned format
pub fn parse_checklists_json(json: &str) -> Result<ChecklistTable, ConfigError> {
    let file: ChecklistFile = serde_json::from_str(json)
        .map_err(|e| ConfigError::MalformedChecklist(e.to_string()))?;

    match file {
        ChecklistFile::Versioned {
            version,
            checklists,
        } => ChecklistTable::new(version, checklists.0),
        ChecklistFile::Flat(checklists) => ChecklistTable::new(None, checklists.0),
    }
}

/// Load a transcript from a file
///
/// Accepts the transcription script's JSON, a serialized [`Transcript`], or
/// plain text with one `Label: text` turn per line.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {:?}", path))?;

    if content.trim_start().starts_with('{') {
        parse_transcript_json(&content)
    } else {
        Ok(parse_transcript_text(&content))
    }
}

fn parse_transcript_json(json: &str) -> Result<Transcript> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Failed to parse transcript JSON")?;

    if value.get("segments_with_speaker").is_some() {
        let output: SttOutput =
            serde_json::from_value(value).context("Invalid transcription output")?;
        Ok(output.into_transcript())
    } else if value.get("segments").is_some() {
        serde_json::from_value(value).context("Invalid transcript")
    } else {
        anyhow::bail!("Transcript JSON has neither \"segments\" nor \"segments_with_speaker\"")
    }
}

/// Parse a plain-text transcript
///
/// Each turn is `Label: text`, optionally preceded by a timestamp such as
/// `00:00:05` or `[00:05]`. Lines without a speaker label continue the
/// previous turn. A label only counts as a speaker when it looks like a
/// diarization id (`Speaker00`, `SPEAKER_01`), is `Consultant`, or opens more
/// than one turn, so `Hinweis: ...` stays text. When no label qualifies, every
/// label is taken as a speaker.
pub fn parse_transcript_text(text: &str) -> Transcript {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut turns: HashMap<&str, usize> = HashMap::new();
    for &line in &lines {
        if let Some((label, _)) = split_speaker(strip_timestamp(line)) {
            *turns.entry(label).or_default() += 1;
        }
    }
    let qualifies =
        |label: &str| is_speaker_id(label) || turns.get(label).copied().unwrap_or(0) > 1;
    let accept_all = !turns.keys().any(|label| qualifies(*label));

    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for line in lines {
        let turn = split_speaker(strip_timestamp(line)).filter(|(label, _)| {
            let accepted = accept_all || qualifies(*label);
            if !accepted {
                warn!(label = %label, "Single-use label treated as text, not as a speaker");
            }
            accepted
        });

        match turn {
            Some((speaker, rest)) => segments.push(TranscriptSegment {
                start: None,
                end: None,
                speaker: speaker.to_string(),
                text: rest.to_string(),
            }),
            None => match segments.last_mut() {
                Some(last) => {
                    if !last.text.is_empty() {
                        last.text.push(' ');
                    }
                    last.text.push_str(line);
                }
                None => segments.push(TranscriptSegment {
                    start: None,
                    end: None,
                    speaker: UNKNOWN_SPEAKER.to_string(),
                    text: line.to_string(),
                }),
            },
        }
    }

    Transcript { segments }
}

/// Drop a leading timestamp token (`00:00:05`, `[00:05.120]`)
fn strip_timestamp(line: &str) -> &str {
    let Some((token, rest)) = line.split_once(char::is_whitespace) else {
        return line;
    };
    let is_timestamp = token.contains(':')
        && token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || ":.,[]()-".contains(c));
    if is_timestamp { rest.trim_start() } else { line }
}

/// Split `Label: text`, where the label is a single short word
fn split_speaker(line: &str) -> Option<(&str, &str)> {
    let (label, rest) = line.split_once(':')?;
    let label = label.trim();
    let valid = label.chars().count() <= MAX_LABEL_CHARS
        && label.chars().any(char::is_alphabetic)
        && !label.chars().any(char::is_whitespace);
    valid.then(|| (label, rest.trim()))
}

/// Diarization-style ids carry a digit (`Speaker00`, `SPEAKER_01`, `S1`)
fn is_speaker_id(label: &str) -> bool {
    label == CONSULTANT_LABEL || label.chars().any(|c| c.is_ascii_digit())
}
