pub mod chain_client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod pinning_client;
pub mod services;

pub use config::Config;
pub use errors::{ContestApiError, Result};
pub use services::ContestService;
