use tracing::{error, info};
use crate::config::Config;
use crate::error::Result;
use crate::models::RunSummary;
use crate::services::db_loader::ListingStore;
use crate::services::excel::ExcelExtractor;
use crate::services::transform::transform;

/// Runs extract, transform and load once. Any failure is logged and ends the run.
pub fn run_etl(config: &Config) -> Result<RunSummary> {
    info!("=== CARS ETL START ===");
    info!(
        "Excel: {} | DB: {} | Log: {}",
        config.excel_path.display(),
        config.db_path.display(),
        config.log_path.display()
    );

    match run_stages(config) {
        Ok(summary) => {
            info!(
                "=== CARS ETL DONE: {} records loaded, {} rows in store ===",
                summary.records_loaded, summary.rows_in_store
            );
            Ok(summary)
        }
        Err(e) => {
            error!("CARS ETL failed: {}", e);
            Err(e)
        }
    }
}

fn run_stages(config: &Config) -> Result<RunSummary> {
    let raw = ExcelExtractor::new(config.sheet.clone()).read_sheet(&config.excel_path)?;
    let batch = transform(&raw)?;

    let store = ListingStore::open(&config.db_path)?;
    store.init_schema()?;
    let records_loaded = store.upsert_batch(&batch)?;

    Ok(RunSummary {
        rows_read: batch.rows_read,
        rows_skipped: batch.rows_skipped,
        duplicates_removed: batch.duplicates_removed,
        records_loaded,
        rows_in_store: store.count()?,
    })
}
