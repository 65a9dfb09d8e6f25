use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::TranscriptionError;
use crate::models::{SttOutput, Transcript};

/// Characters of stderr/stdout kept in error diagnostics
const DIAGNOSTIC_TAIL_CHARS: usize = 2000;

/// Speech-to-text with speaker diarization
pub trait Transcriber: Send + Sync {
    fn transcribe(
        &self,
        audio: &Path,
    ) -> impl Future<Output = Result<Transcript, TranscriptionError>> + Send;
}

/// Configuration for the external transcription script
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    /// Interpreter or executable to run
    pub program: PathBuf,
    /// Script passed as first argument, if any
    pub script: Option<PathBuf>,
    /// Extra environment for the child process
    pub envs: Vec<(String, String)>,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            script: Some(PathBuf::from("transcription/stt_with_diarization_new.py")),
            // silences ONNX runtime warnings on stderr
            envs: vec![("ORT_LOG_SEVERITY_LEVEL".to_string(), "3".to_string())],
        }
    }
}

/// Runs an external program that prints diarized segments as JSON
///
/// The program is called as `<program> [script] <absolute audio path>` and must
/// print `{"segments_with_speaker": [{start, end, text, speaker_id}, ...]}`.
pub struct ScriptTranscriber {
    config: TranscriberConfig,
}

impl ScriptTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }
}

impl Transcriber for ScriptTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Transcript, TranscriptionError> {
        if !audio.is_file() {
            return Err(TranscriptionError::AudioNotFound(audio.display().to_string()));
        }
        let audio = std::path::absolute(audio)
            .map_err(|_| TranscriptionError::AudioNotFound(audio.display().to_string()))?;

        let program = self.config.program.display().to_string();
        let mut command = Command::new(&self.config.program);
        if let Some(script) = &self.config.script {
            command.arg(script);
        }
        command
            .arg(&audio)
            .envs(self.config.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!("Running transcriber {} on {:?}", program, audio);
        let output = command
            .output()
            .await
            .map_err(|source| TranscriptionError::Spawn { program, source })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(TranscriptionError::Failed {
                code: output.status.code(),
                stderr: tail(&stderr, DIAGNOSTIC_TAIL_CHARS),
            });
        }

        let transcript = parse_stt_output(&stdout)?;
        debug!("Transcriber returned {} segments", transcript.segments.len());
        Ok(transcript)
    }
}

/// Parse the transcription script's stdout
pub fn parse_stt_output(stdout: &str) -> Result<Transcript, TranscriptionError> {
    let output: SttOutput =
        serde_json::from_str(stdout.trim()).map_err(|e| TranscriptionError::MalformedOutput {
            reason: e.to_string(),
            stdout: tail(stdout, DIAGNOSTIC_TAIL_CHARS),
        })?;
    Ok(output.into_transcript())
}

/// Last `max_chars` characters of `text`
fn tail(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stt_output() {
        let stdout = r#"
            {"segments_with_speaker": [
                {"start": 0.0, "end": 1.0, "text": "Hallo", "speaker_id": "SPEAKER_00"},
                {"start": 1.2, "end": 2.0, "text": "Guten Tag", "speaker_id": "SPEAKER_01"}
            ]}
        "#;
        let transcript = parse_stt_output(stdout).unwrap();
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[1].speaker, "SPEAKER_01");
    }

    #[test]
    fn test_parse_stt_output_malformed() {
        let err = parse_stt_output("Traceback (most recent call last):").unwrap_err();
        assert!(matches!(
            err,
            TranscriptionError::MalformedOutput { stdout, .. } if stdout.starts_with("Traceback")
        ));
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail("  abc  ", 10), "abc");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("äöüß", 2), "üß");
    }

    #[tokio::test]
    async fn test_missing_audio() {
        let transcriber = ScriptTranscriber::new(TranscriberConfig::default());
        let err = transcriber
            .transcribe(Path::new("/nonexistent/call.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::AudioNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_program_and_parses_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("call.mp3");
        std::fs::write(&audio, b"ID3").unwrap();
        let script = dir.path().join("stt.sh");
        std::fs::write(
            &script,
            r#"echo '{"segments_with_speaker":[{"start":0,"end":1,"text":"Hallo","speaker_id":"SPEAKER_00"}]}'"#,
        )
        .unwrap();

        let transcriber = ScriptTranscriber::new(TranscriberConfig {
            program: PathBuf::from("sh"),
            script: Some(script),
            envs: Vec::new(),
        });
        let transcript = transcriber.transcribe(&audio).await.unwrap();

        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, "Hallo");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("call.mp3");
        std::fs::write(&audio, b"ID3").unwrap();
        let script = dir.path().join("stt.sh");
        std::fs::write(&script, "echo 'model not found' >&2\nexit 3\n").unwrap();

        let transcriber = ScriptTranscriber::new(TranscriberConfig {
            program: PathBuf::from("sh"),
            script: Some(script),
            envs: Vec::new(),
        });
        let err = transcriber.transcribe(&audio).await.unwrap_err();

        assert!(matches!(
            err,
            TranscriptionError::Failed { code: Some(3), ref stderr } if stderr == "model not found"
        ));
    }
}
