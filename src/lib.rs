pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use error::{AnalysisError, ConfigError, OracleError, TranscriptionError, UnknownCategoryError};
pub use io::{
    load_checklists, load_transcript, write_report_json, write_transcript_json, HumanReport,
    ScriptTranscriber, Transcriber, TranscriberConfig,
};
pub use llm::{build_gateway, ClassifierGateway, ModelBackend, Oracle, OracleConfig, Provider};
pub use models::{
    AnalysisReport, CategoryLabel, ChecklistQuestion, ChecklistTable, QuestionTally,
    QuestionVerdict, Transcript,
};
pub use stages::{
    assess_checklist, assess_question, extract_evidence, vote, AnalysisConfig, CallAnalyzer,
};
