use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use callaudit::{
    build_gateway, load_checklists, load_transcript, write_report_json, write_transcript_json,
    AnalysisConfig, CallAnalyzer, CategoryLabel, HumanReport, OracleConfig, Provider,
    ScriptTranscriber, Transcriber, TranscriberConfig,
};

#[derive(Parser)]
#[command(name = "callaudit")]
#[command(author, version, long_about = None)]
#[command(about = "Compliance checklist audit of recorded advisory calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a call against its compliance checklist
    #[command(group(ArgGroup::new("source").required(true).args(["audio", "transcript"])))]
    Analyze {
        /// Audio recording to transcribe and analyze
        #[arg(short, long)]
        audio: Option<PathBuf>,

        /// Existing transcript (JSON or `Label: text` lines)
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Checklist table (JSON)
        #[arg(short, long)]
        checklists: PathBuf,

        /// Output file for the report (JSON); printed to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for a human-readable summary (text)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Independent judgments per checklist question
        #[arg(long, default_value = "3")]
        tries: u32,

        /// Model provider (anthropic or openai)
        #[arg(long, default_value = "anthropic")]
        provider: Provider,

        /// Primary model (overrides CALLAUDIT_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Model to fall back to on rate limits; repeat for a chain
        #[arg(long = "fallback-model")]
        fallback_models: Vec<String>,

        /// Sampling temperature (provider default if omitted)
        #[arg(long)]
        temperature: Option<f64>,

        /// Category labels offered to the classifier (defaults to the checklist categories)
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// Maximum concurrent oracle requests
        #[arg(long)]
        max_in_flight: Option<usize>,

        #[command(flatten)]
        stt: SttArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Transcribe a recording without analyzing it
    Transcribe {
        /// Audio recording
        #[arg(short, long)]
        audio: PathBuf,

        /// Output file for the transcript (JSON)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        stt: SttArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a checklist table and list its contents
    Checklist {
        /// Checklist table (JSON)
        #[arg(short, long)]
        checklists: PathBuf,

        /// Only show this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(clap::Args)]
struct SttArgs {
    /// Interpreter for the transcription script
    #[arg(long, default_value = "python3")]
    python: PathBuf,

    /// Speech-to-text/diarization script
    #[arg(long, default_value = "transcription/stt_with_diarization_new.py")]
    stt_script: PathBuf,
}

impl SttArgs {
    fn transcriber(self) -> ScriptTranscriber {
        ScriptTranscriber::new(TranscriberConfig {
            program: self.python,
            script: Some(self.stt_script),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            audio,
            transcript,
            checklists,
            output,
            summary,
            tries,
            provider,
            model,
            fallback_models,
            temperature,
            categories,
            max_in_flight,
            stt,
            verbose,
        } => {
            setup_logging(verbose);

            let mut oracle_config = OracleConfig::from_env(provider)?;
            if let Some(model) = model {
                oracle_config.model = model;
            }
            if !fallback_models.is_empty() {
                oracle_config.fallback_models = fallback_models;
            }
            oracle_config.temperature = temperature;
            oracle_config.max_in_flight = max_in_flight;

            let analysis_config = AnalysisConfig {
                tries,
                category_labels: categories
                    .map(|labels| labels.iter().map(|l| CategoryLabel::new(l.trim())).collect()),
            };

            analyze_call(
                audio,
                transcript,
                checklists,
                output,
                summary,
                oracle_config,
                analysis_config,
                stt,
            )
            .await
        }
        Commands::Transcribe {
            audio,
            output,
            stt,
            verbose,
        } => {
            setup_logging(verbose);
            transcribe_call(audio, output, stt).await
        }
        Commands::Checklist {
            checklists,
            category,
        } => {
            setup_logging(false);
            show_checklists(checklists, category)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[allow(clippy::too_many_arguments)]
async fn analyze_call(
    audio: Option<PathBuf>,
    transcript: Option<PathBuf>,
    checklists: PathBuf,
    output: Option<PathBuf>,
    summary: Option<PathBuf>,
    oracle_config: OracleConfig,
    analysis_config: AnalysisConfig,
    stt: SttArgs,
) -> Result<()> {
    info!("Loading checklists from {:?}", checklists);
    let table = Arc::new(load_checklists(&checklists)?);
    info!(
        "Loaded {} categories (version {})",
        table.len(),
        table.version().unwrap_or("unversioned")
    );

    info!(
        "Using {} model {} ({} fallbacks), {} tries per question",
        oracle_config.provider,
        oracle_config.model,
        oracle_config.fallback_models.len(),
        analysis_config.tries
    );
    let gateway = build_gateway(&oracle_config).context("Failed to create API client")?;
    let analyzer = CallAnalyzer::new(gateway, table, analysis_config);

    let report = match (audio, transcript) {
        (Some(audio), _) => analyzer.analyze_audio(&stt.transcriber(), &audio).await?,
        (None, Some(path)) => {
            info!("Loading transcript from {:?}", path);
            let transcript = load_transcript(&path).context("Failed to load transcript")?;
            analyzer.analyze_transcript(&transcript).await?
        }
        (None, None) => anyhow::bail!("either --audio or --transcript is required"),
    };

    match output {
        Some(path) => {
            write_report_json(&report, &path)?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(path) = summary {
        HumanReport::new(&report).write_file(&path)?;
        info!("Summary written to {:?}", path);
    }

    info!(
        "Complete: {} - {}/{} questions addressed ({:.1}%)",
        report.category,
        report.summary.addressed,
        report.summary.total,
        report.summary.coverage * 100.0
    );

    Ok(())
}

async fn transcribe_call(audio: PathBuf, output: PathBuf, stt: SttArgs) -> Result<()> {
    let transcript = stt
        .transcriber()
        .transcribe(&audio)
        .await
        .context("Transcription failed")?;

    info!(
        "Transcribed {} segments, {} speakers",
        transcript.segments.len(),
        transcript.speakers().len()
    );
    if let Some(duration) = transcript.duration_secs() {
        info!("Duration: {:.1}s", duration);
    }

    write_transcript_json(&transcript, &output)?;
    info!("Transcript written to {:?}", output);

    Ok(())
}

fn show_checklists(checklists: PathBuf, category: Option<String>) -> Result<()> {
    let table = load_checklists(&checklists)?;

    println!("Checklists");
    println!("==========");
    println!("Version: {}", table.version().unwrap_or("unversioned"));
    println!("Categories: {}", table.len());
    println!();

    let labels: Vec<CategoryLabel> = match category {
        Some(category) => vec![CategoryLabel::new(category)],
        None => table.categories().cloned().collect(),
    };

    for label in labels {
        let questions = table.resolve(label.as_str())?;
        println!("{} ({} questions)", label, questions.len());
        println!("{}", "-".repeat(label.as_str().chars().count()));
        for question in questions {
            println!("  {}: {}", question.id, question.description);
        }
        println!();
    }

    Ok(())
}
