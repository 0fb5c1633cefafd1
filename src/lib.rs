pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::{EtlError, Result};
pub use models::{CarListing, RunSummary};
pub use services::db_loader::ListingStore;
pub use services::pipeline::run_etl;
pub use services::transform::{transform, ListingBatch};
