// veritext CLI
// Reads the submitted document and candidate files from disk, runs the
// engine and prints the JSON report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use veritext::{
    CandidateDocument, HttpEmbedder, HttpSemanticJudge, MethodWeights, PlagiarismEngine,
    ThresholdConfig,
};

#[derive(Parser, Debug)]
#[command(name = "veritext", version, about = "Plagiarism analysis for academic submissions")]
struct Cli {
    /// Document to check
    document: PathBuf,

    /// Candidate file to compare against (repeatable). The file stem
    /// becomes the source id; the mtime becomes the submission time.
    #[arg(short, long = "candidate")]
    candidates: Vec<PathBuf>,

    /// JSON file overriding detection thresholds
    #[arg(long)]
    thresholds: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

fn load_candidate(path: &PathBuf) -> Result<CandidateDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading candidate {}", path.display()))?;
    let source_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("candidate")
        .to_string();
    let submitted_on = fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from);

    Ok(CandidateDocument {
        text,
        source_id,
        submitted_on,
        author_id: None,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    veritext::init_logging();
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.document)
        .with_context(|| format!("reading document {}", cli.document.display()))?;

    let candidates: Vec<CandidateDocument> = cli
        .candidates
        .iter()
        .map(load_candidate)
        .collect::<Result<_>>()?;

    let thresholds = match &cli.thresholds {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading thresholds {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing thresholds JSON")?
        }
        None => ThresholdConfig::default(),
    };

    let embedder = HttpEmbedder::from_env();
    let judge = HttpSemanticJudge::from_env();
    info!(
        embedding_oracle = embedder.is_some(),
        judge_oracle = judge.is_some(),
        candidates = candidates.len(),
        "[CLI] starting analysis"
    );

    let engine = PlagiarismEngine::with_config(embedder, judge, thresholds, MethodWeights::default());
    let report = engine.analyze(&text, &candidates).await;

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "[CLI] report written");
        }
        None => println!("{json}"),
    }

    if report.error {
        anyhow::bail!(
            "analysis failed: {}",
            report.message.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    Ok(())
}
