use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use cars_etl::config::{Config, DEFAULT_LOG_PATH};
use cars_etl::logging;
use cars_etl::run_etl;
use cars_etl::services::excel::SheetSelector;

#[derive(Parser)]
#[command(name = "cars_etl")]
#[command(about = "Load car listings from a spreadsheet into SQLite")]
#[command(version)]
struct Cli {
    /// Spreadsheet to read [default: data/dataset_final.xlsx]
    #[arg(long)]
    excel: Option<PathBuf>,
    /// SQLite database to create or update [default: dataset_final.db]
    #[arg(long)]
    db: Option<PathBuf>,
    /// Run log, appended to [default: logs/app.log]
    #[arg(long)]
    log: Option<PathBuf>,
    /// Sheet name or zero-based index; first sheet when omitted
    #[arg(long)]
    sheet: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, flags win over the environment
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No usable config yet; the run log still gets the failure.
            let log_path = cli.log.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
            let _guard = logging::init_logging(&log_path)?;
            tracing::error!("CARS ETL failed: {}", e);
            return Err(e.into());
        }
    };
    if let Some(path) = cli.excel {
        config.excel_path = path;
    }
    if let Some(path) = cli.db {
        config.db_path = path;
    }
    if let Some(path) = cli.log {
        config.log_path = path;
    }
    if let Some(sheet) = cli.sheet {
        config.sheet = SheetSelector::parse(&sheet);
    }

    // Initialize logging
    let _guard = logging::init_logging(&config.log_path)?;

    let summary = run_etl(&config)?;
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
