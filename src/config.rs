use std::env::VarError;
use std::path::PathBuf;
use dotenvy::dotenv;
use crate::error::{EtlError, Result};
use crate::services::excel::SheetSelector;

pub const DEFAULT_EXCEL_PATH: &str = "data/dataset_final.xlsx";
pub const DEFAULT_DB_PATH: &str = "dataset_final.db";
pub const DEFAULT_LOG_PATH: &str = "logs/app.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub excel_path: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub sheet: SheetSelector,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excel_path: PathBuf::from(DEFAULT_EXCEL_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            sheet: SheetSelector::First,
        }
    }
}

impl Config {
    /// Defaults, overridden by `CARS_ETL_*` variables from the environment or a `.env` file.
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let mut config = Config::default();
        if let Some(v) = env_var("CARS_ETL_EXCEL")? {
            config.excel_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("CARS_ETL_DB")? {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("CARS_ETL_LOG")? {
            config.log_path = PathBuf::from(v);
        }
        if let Some(v) = env_var("CARS_ETL_SHEET")? {
            config.sheet = SheetSelector::parse(&v);
        }
        Ok(config)
    }
}

fn env_var(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(EtlError::Config(format!("Failed to load {}: {}", key, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layout() {
        let config = Config::default();
        assert_eq!(config.excel_path, PathBuf::from("data/dataset_final.xlsx"));
        assert_eq!(config.db_path, PathBuf::from("dataset_final.db"));
        assert_eq!(config.log_path, PathBuf::from("logs/app.log"));
        assert_eq!(config.sheet, SheetSelector::First);
    }

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(env_var("CARS_ETL_TEST_SURELY_UNSET").unwrap(), None);
    }
}
