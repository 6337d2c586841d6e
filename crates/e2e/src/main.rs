//! translit-e2e - acceptance runner entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use translit_common::report::{export, load_records};
use translit_common::{corpus, summarize, Classifier, Corpus, ResultLog, TargetScript, Verdict};
use translit_e2e::config::SettleMode;
use translit_e2e::output::{render_files, render_records, render_summary};
use translit_e2e::playwright::{Browser, PlaywrightLauncher};
use translit_e2e::{CaseRunner, Harness, RunnerConfig};

#[derive(Parser, Debug)]
#[command(name = "translit-e2e")]
#[command(
    author,
    version,
    about = "Acceptance runner for Singlish to Sinhala transliteration sites"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the corpus against the page and write reports
    Run(RunArgs),

    /// Print the summary of a previous run's CSV or JSON report
    Summarize {
        /// Report file (.csv or .json)
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "translit-check.toml")]
    config: PathBuf,

    /// Page under test
    #[arg(long, env = "TRANSLIT_URL")]
    url: Option<String>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML corpus file or directory (defaults to the built-in corpus)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Run only cases whose id starts with this prefix
    #[arg(short, long)]
    filter: Option<String>,

    /// Cases to run at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// How to wait for output to render
    #[arg(long, value_enum)]
    settle: Option<SettleMode>,

    /// Browser to use
    #[arg(long, value_enum)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Exit non-zero when any case fails or errors
    #[arg(long)]
    strict: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut RunnerConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(settle) = self.settle {
            config.settle.mode = settle;
        }
        if let Some(browser) = self.browser {
            config.browser.browser = browser;
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Summarize { path } => summarize_file(path),
    };

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<bool> {
    let mut config = RunnerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    args.apply(&mut config);
    config.validate()?;

    let mut corpus = match &args.corpus {
        Some(path) => Corpus::load(path)
            .with_context(|| format!("loading corpus {}", path.display()))?,
        None => corpus::builtin(),
    };
    if let Some(prefix) = &args.filter {
        corpus = corpus.filter_prefix(prefix);
    }

    let launcher = PlaywrightLauncher::new(config.browser.clone())?;
    let classifier = Classifier::new(TargetScript::sinhala(), config.thresholds.clone());
    let csv_path = config.csv_path();
    let json_path = config.json_path();
    let harness = Harness::new(launcher, CaseRunner::new(config, classifier));

    let log = Arc::new(ResultLog::new());
    harness.run(&corpus, &log).await;

    let mut records = log.snapshot();
    corpus.order_records(&mut records);
    info!("Total test cases executed: {}", records.len());

    export(&records, &csv_path, &json_path).context("writing reports")?;

    let report = summarize(&records);
    println!("{}", render_records(&records));
    println!("{}", render_summary(&report));
    println!("{}", render_files(&csv_path, &json_path));

    let clean =
        report.summary.count(Verdict::Fail) == 0 && report.summary.count(Verdict::Error) == 0;
    Ok(report.complete() && (clean || !args.strict))
}

fn summarize_file(path: PathBuf) -> anyhow::Result<bool> {
    let records = load_records(&path).with_context(|| format!("reading {}", path.display()))?;
    let report = summarize(&records);
    println!("{}", render_summary(&report));
    Ok(report.complete())
}
