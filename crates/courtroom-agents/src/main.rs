use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use courtroom_agents::client::OpenAiCompatClient;
use courtroom_agents::config::{CourtConfig, Tier};
use courtroom_agents::prompts::PROMPT_VERSION;
use courtroom_agents::runner::{BaselineVerifier, DebateRunner};
use tribunal::case::{Case, CaseSet};
use tribunal::export::{
    AbortedCase, BaselineEntry, BaselineSummary, ComparisonEntry, ComparisonReport, RunMetadata,
    RunSummary,
};

/// Courtroom-style claim verification against an LLM completion API.
#[derive(Parser)]
#[command(name = "courtroom-agents", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Case selection and output options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct SelectionArgs {
    /// Path to the claim/truth CSV dataset.
    #[arg(long, default_value = "cases.csv")]
    dataset: PathBuf,

    /// Explicit case indices to run, e.g. --cases 0,2,5.
    #[arg(long, value_delimiter = ',')]
    cases: Option<Vec<usize>>,

    /// Run only the first N cases (ignored when --cases is given).
    #[arg(long)]
    limit: Option<usize>,

    /// Output directory for exports.
    #[arg(long, default_value = "reports")]
    out: PathBuf,

    /// Cost/quality model tier.
    #[arg(long, value_enum, default_value_t = Tier::Fast)]
    tier: Tier,

    /// List the loaded cases and pick indices on stdin.
    #[arg(long, conflicts_with = "cases")]
    interactive: bool,

    /// Also write a Markdown report next to the JSON exports.
    #[arg(long)]
    markdown: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the four-role debate over the selected cases.
    Run {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Deliberation rounds before the jury closes.
        #[arg(long, default_value_t = 1)]
        rounds: u32,

        /// Force a binary verdict when the jury returns ambiguous.
        #[arg(long)]
        force_binary: bool,
    },
    /// Run the single-agent baseline over the selected cases.
    Baseline {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Run both systems and export a side-by-side comparison.
    Compare {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Deliberation rounds for the debate side.
        #[arg(long, default_value_t = 1)]
        rounds: u32,

        /// Force a binary debate verdict when the jury returns ambiguous.
        #[arg(long)]
        force_binary: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            selection,
            rounds,
            force_binary,
        } => run_debate(selection, rounds, force_binary).await,
        Command::Baseline { selection } => run_baseline(selection).await,
        Command::Compare {
            selection,
            rounds,
            force_binary,
        } => run_compare(selection, rounds, force_binary).await,
    }
}

/// Resolve config, selection, and output directory common to all commands.
fn prepare(selection: &SelectionArgs, rounds: u32, force_binary: bool) -> Result<(CourtConfig, Vec<Case>)> {
    let mut config = CourtConfig::from_env();
    config.deliberation_rounds = rounds;
    config.force_binary = force_binary;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Dataset problems are fatal to the whole run.
    let case_set = CaseSet::from_csv_path(&selection.dataset)
        .with_context(|| format!("loading dataset {}", selection.dataset.display()))?;
    let cases = match &selection.cases {
        Some(indices) => case_set.select(indices)?,
        None if selection.interactive => interactive_selection(&case_set)?,
        None => case_set.take(selection.limit),
    };

    std::fs::create_dir_all(&selection.out)
        .with_context(|| format!("creating output directory {}", selection.out.display()))?;

    Ok((config, cases))
}

/// List the loaded cases on stdout and read index choices from stdin.
/// An empty line selects every case.
fn interactive_selection(case_set: &CaseSet) -> Result<Vec<Case>> {
    use std::io::{BufRead, Write};

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for case in case_set.iter() {
        writeln!(out, "  {}", case.summary_line())?;
    }
    write!(out, "Select case indices (comma-separated, empty for all): ")?;
    out.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(case_set.take(None));
    }

    let indices = line
        .split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parsing case selection `{line}`"))?;
    Ok(case_set.select(&indices)?)
}

fn metadata(description: String, model: &str, rounds: u32) -> RunMetadata {
    RunMetadata {
        description,
        model: model.to_string(),
        prompt_version: PROMPT_VERSION.to_string(),
        deliberation_rounds: rounds,
        generated_at: chrono::Utc::now(),
    }
}

async fn run_debate(selection: SelectionArgs, rounds: u32, force_binary: bool) -> Result<()> {
    let (config, cases) = prepare(&selection, rounds, force_binary)?;
    let model = config.model_for(selection.tier).to_string();
    let client = Arc::new(OpenAiCompatClient::new(&config, &model)?);
    let runner = DebateRunner::new(client, config);

    info!(cases = cases.len(), model = %model, tier = %selection.tier, "starting debate run");

    let mut reports = Vec::new();
    let mut aborted = Vec::new();
    for case in &cases {
        info!("{}", case.summary_line());
        match runner.run_case(case).await {
            Ok(outcome) => {
                let name = outcome.report.write_to_dir(&selection.out)?;
                info!(
                    case = case.id,
                    verdict = %outcome.report.verdict.summary(),
                    calls = outcome.completion_calls,
                    file = %name,
                    "case exported"
                );
                reports.push(outcome.report);
            }
            Err(e) => {
                error!(case = case.id, error = %e, "case aborted");
                aborted.push(AbortedCase {
                    case_id: case.id,
                    kind: e.abort_kind(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if reports.is_empty() {
        bail!("no case produced a verdict ({} aborted)", aborted.len());
    }

    let summary = RunSummary::new(
        metadata(
            format!("multi-agent debate over {} cases", cases.len()),
            &model,
            rounds,
        ),
        reports,
        aborted,
    );
    summary.write_to_dir(&selection.out)?;
    if selection.markdown {
        std::fs::write(selection.out.join("report.md"), summary.to_markdown())?;
    }

    info!(
        completed = summary.statistics.completed,
        aborted = summary.statistics.total_cases - summary.statistics.completed,
        avg_confidence = %format!("{:.0}%", summary.statistics.average_confidence * 100.0),
        out = %selection.out.display(),
        "debate run finished"
    );
    Ok(())
}

async fn run_baseline(selection: SelectionArgs) -> Result<()> {
    let (config, cases) = prepare(&selection, 1, false)?;
    let model = config.model_for(selection.tier).to_string();
    let client = Arc::new(OpenAiCompatClient::new(&config, &model)?);
    let verifier = BaselineVerifier::new(client, config);

    info!(cases = cases.len(), model = %model, "starting baseline run");

    let mut entries = Vec::new();
    let mut aborted = Vec::new();
    for case in &cases {
        info!("{}", case.summary_line());
        match verifier.verify(case).await {
            Ok(verdict) => {
                info!(case = case.id, verdict = %verdict.summary(), "baseline verdict");
                entries.push(BaselineEntry {
                    case: case.clone(),
                    verdict,
                });
            }
            Err(e) => {
                error!(case = case.id, error = %e, "case aborted");
                aborted.push(AbortedCase {
                    case_id: case.id,
                    kind: e.abort_kind(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if entries.is_empty() {
        bail!("no case produced a verdict ({} aborted)", aborted.len());
    }

    let summary = BaselineSummary::new(
        metadata(
            format!("single-agent baseline over {} cases", cases.len()),
            &model,
            1,
        ),
        entries,
        aborted,
    );
    summary.write_to_dir(&selection.out)?;

    info!(out = %selection.out.display(), "baseline run finished");
    Ok(())
}

async fn run_compare(selection: SelectionArgs, rounds: u32, force_binary: bool) -> Result<()> {
    let (config, cases) = prepare(&selection, rounds, force_binary)?;
    let model = config.model_for(selection.tier).to_string();
    let client = Arc::new(OpenAiCompatClient::new(&config, &model)?);
    let runner = DebateRunner::new(client.clone(), config.clone());
    let verifier = BaselineVerifier::new(client, config);

    info!(cases = cases.len(), model = %model, "starting comparison run");

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for case in &cases {
        info!("{}", case.summary_line());
        let baseline = match verifier.verify(case).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(case = case.id, error = %e, "baseline side aborted; skipping case");
                skipped += 1;
                continue;
            }
        };
        let debate = match runner.run_case(case).await {
            Ok(outcome) => outcome.report.verdict,
            Err(e) => {
                error!(case = case.id, error = %e, "debate side aborted; skipping case");
                skipped += 1;
                continue;
            }
        };
        info!(
            case = case.id,
            baseline = %baseline.summary(),
            debate = %debate.summary(),
            "case compared"
        );
        entries.push(ComparisonEntry::new(case.clone(), baseline, debate));
    }

    if entries.is_empty() {
        bail!("no case completed both systems ({skipped} skipped)");
    }

    let report = ComparisonReport::new(
        metadata(
            format!(
                "baseline vs debate comparison over {} cases ({} skipped)",
                cases.len(),
                skipped
            ),
            &model,
            rounds,
        ),
        entries,
    );
    report.write_to_dir(&selection.out)?;
    if selection.markdown {
        std::fs::write(selection.out.join("comparison.md"), report.to_markdown())?;
    }

    info!(
        agreement = %format!("{:.0}%", report.agreement_rate * 100.0),
        out = %selection.out.display(),
        "comparison run finished"
    );
    Ok(())
}
