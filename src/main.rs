mod analysis;
mod config;
mod report;
mod source;

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use analysis::llm::LlmAnalyzer;
use analysis::ReadinessAnalyzer;

/// Repo Readiness: CLI tool that scores a source repository's code quality
/// and production readiness from per-function metrics and an optional
/// model-backed review.
#[derive(Parser, Debug)]
#[command(name = "repo-readiness", version, about)]
struct Cli {
    /// Path to a local checkout of the repository
    path: PathBuf,

    /// Repository URL (e.g., https://github.com/org/repo), used for naming
    #[arg(long)]
    url: Option<String>,

    /// Optional output file: `.json` writes the analysis record, anything else markdown
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the model-backed analyzer and use heuristics only
    #[arg(long)]
    offline: bool,

    /// Configuration file (defaults to .readiness.toml in the working directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _main_span = info_span!("readiness", path = %cli.path.display()).entered();

    info!("loading configuration");
    let config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };

    info!("loading repository");
    let snapshot = source::load_directory(&cli.path, cli.url.as_deref(), &config.limits)?;
    debug!(
        name = %snapshot.name,
        files = snapshot.files.len(),
        has_readme = snapshot.readme.is_some(),
        "loaded repository"
    );

    let llm = if cli.offline {
        info!("offline mode, model-backed analysis disabled");
        None
    } else {
        LlmAnalyzer::from_config(&config)?
    };
    let primary = llm.as_ref().map(|a| a as &dyn ReadinessAnalyzer);

    info!("running analysis");
    let assessment = analysis::run(&snapshot, &config, primary).await;

    info!("generating report");
    report::output(&assessment, cli.output.as_deref())?;
    info!(
        readiness = assessment.readiness.readiness_score,
        overall_score = assessment.analysis.overall_score,
        model = %assessment.readiness.model,
        "done"
    );

    Ok(())
}
