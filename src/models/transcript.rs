use serde::{Deserialize, Serialize};

/// Label that replaces the consultant's speaker id after identification
pub const CONSULTANT_LABEL: &str = "Consultant";

/// Label given to a non-consultant speaker already called `Consultant`
pub const DISPLACED_CONSULTANT_LABEL: &str = "Consultant_other";

/// Root output of the speech-to-text/diarization script
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SttOutput {
    #[serde(default)]
    pub segments_with_speaker: Option<Vec<SpeakerSegment>>,
}

/// A diarized segment as emitted by the script
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakerSegment {
    /// Start timestamp in seconds
    pub start: f64,
    /// End timestamp in seconds
    pub end: f64,
    pub text: String,
    /// Speaker identifier, e.g. "SPEAKER_00"
    pub speaker_id: String,
}

impl SttOutput {
    pub fn into_transcript(self) -> Transcript {
        let segments = self
            .segments_with_speaker
            .unwrap_or_default()
            .into_iter()
            .map(|s| TranscriptSegment {
                start: Some(s.start),
                end: Some(s.end),
                speaker: s.speaker_id,
                text: s.text.trim().to_string(),
            })
            .filter(|s| !s.text.is_empty())
            .collect();
        Transcript { segments }
    }
}

/// One speaker turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    pub speaker: String,
    pub text: String,
}

/// A call transcript with speaker attribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Distinct speaker labels in order of first appearance
    pub fn speakers(&self) -> Vec<&str> {
        let mut speakers: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if !speakers.contains(&segment.speaker.as_str()) {
                speakers.push(&segment.speaker);
            }
        }
        speakers
    }

    /// Replace the consultant's label with [`CONSULTANT_LABEL`]
    ///
    /// Another speaker already labelled `Consultant` is renamed to
    /// [`DISPLACED_CONSULTANT_LABEL`] so the two stay distinct.
    pub fn anonymize(&self, consultant: &str) -> Transcript {
        let segments = self
            .segments
            .iter()
            .map(|s| {
                let speaker = if s.speaker == consultant {
                    CONSULTANT_LABEL
                } else if s.speaker == CONSULTANT_LABEL {
                    DISPLACED_CONSULTANT_LABEL
                } else {
                    s.speaker.as_str()
                };
                TranscriptSegment {
                    speaker: speaker.to_string(),
                    ..s.clone()
                }
            })
            .collect();
        Transcript { segments }
    }

    /// Render as `Label: text` lines, the form sent to the oracle
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Duration in seconds, when timestamps are known
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.segments.iter().filter_map(|s| s.start).reduce(f64::min)?;
        let end = self.segments.iter().filter_map(|s| s.end).reduce(f64::max)?;
        Some(end - start)
    }
}
