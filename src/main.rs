//! netlog - summarise outages recorded in a connectivity sample log.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netlog::analyze::{analyze, Outcome};
use netlog::config::AnalyzerConfig;

#[derive(Parser, Debug)]
#[command(name = "netlog", about = "Analyze netlog.csv and summarize outages")]
struct Cli {
    /// Path to netlog.csv (overrides config)
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Directory containing netlog.csv and traces
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,

    /// Number of worst hours to list
    #[arg(long = "top-hours")]
    top_hours: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("netlog=info".parse()?))
        .init();

    let cli = Cli::parse();
    let cfg = AnalyzerConfig::load().with_overrides(cli.csv, cli.log_dir, cli.top_hours);

    match analyze(&cfg).await {
        Ok(Outcome::Empty { sample_log }) => {
            println!("CSV is empty: {}", sample_log.display());
            Ok(ExitCode::SUCCESS)
        }
        Ok(Outcome::Analyzed { report, .. }) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("{}", e);
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}
