use anyhow::Context;
use clap::{Parser, ValueEnum};
use ontap_report::report::{self, ReportKind, ReportOptions, ReportOutcome};
use ontap_report::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FATAL: u8 = 1;
/// Exit code of a run that wrote its reports, but with missing volume metrics
const EXIT_DEGRADED: u8 = 2;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    Aggregates,
    Volumes,
    All,
}

impl Target {
    fn kinds(self) -> &'static [ReportKind] {
        match self {
            Self::Aggregates => &[ReportKind::Aggregates],
            Self::Volumes => &[ReportKind::Volumes],
            Self::All => &[ReportKind::Aggregates, ReportKind::Volumes],
        }
    }
}

/// Capacity reports from the ONTAP REST API.
///
/// Connection settings come from the configuration file and the ONTAP_* environment
/// variables (ONTAP_HOST, ONTAP_USER, ONTAP_PASSWORD, ONTAP_TOKEN, ONTAP_VERIFY_TLS, ...).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Report to produce
    #[arg(value_enum, default_value = "all")]
    report: Target,

    /// JSON configuration file
    #[arg(long, short, env = "ONTAP_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory, overrides the configuration
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output file, only valid for a single report
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Concurrent volume metrics requests
    #[arg(long)]
    concurrency: Option<usize>,
}

async fn run(args: &Args) -> anyhow::Result<Vec<ReportOutcome>> {
    let cfg = Config::load(args.config.as_deref())
        .await
        .context("loading configuration")?;
    tracing::debug!("{:?}", cfg);

    let client = cfg.client().await.context("creating API client")?;
    info!("Connecting to api at {}", client.base_url());

    let kinds = args.report.kinds();
    if args.output.is_some() && kinds.len() > 1 {
        anyhow::bail!("--output needs a single report, use --output-dir for all reports");
    }

    let mut options = ReportOptions::from_config(&cfg);
    if let Some(dir) = &args.output_dir {
        options.output_dir.clone_from(dir);
    }
    if let Some(concurrency) = args.concurrency {
        options.metrics_concurrency = concurrency;
    }
    options.output_path.clone_from(&args.output);

    let mut outcomes = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let outcome = report::generate(&client, *kind, &options)
            .await
            .with_context(|| format!("{kind} report"))?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Log the run and pick the process exit code: 0 when every report is complete,
/// `EXIT_DEGRADED` when a report is missing metrics, `EXIT_FATAL` when nothing was written.
fn exit_code(result: &anyhow::Result<Vec<ReportOutcome>>) -> u8 {
    match result {
        Ok(outcomes) => {
            let mut degraded = false;
            for outcome in outcomes {
                info!(
                    "{} report: {} rows in {} ({})",
                    outcome.kind,
                    outcome.rows,
                    outcome.path.display(),
                    outcome.generated_at.to_rfc3339()
                );
                if outcome.is_degraded() {
                    warn!(
                        "{} report is missing metrics for {} entities: {}",
                        outcome.kind,
                        outcome.degraded.len(),
                        outcome.degraded.join(", ")
                    );
                    degraded = true;
                }
            }
            if degraded {
                EXIT_DEGRADED
            } else {
                EXIT_SUCCESS
            }
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_FATAL
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    ExitCode::from(exit_code(&run(&args).await))
}
