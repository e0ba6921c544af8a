pub mod aggregate;
pub mod api;
pub mod args;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod parser;
pub mod stats;
pub mod tail;
pub mod utils;

pub use api::{ApiClient, ApiResponse};
pub use args::Args;
pub use cache::StatsCache;
pub use config::Settings;
pub use dashboard::Dashboard;
pub use error::ConfigError;
pub use stats::StatsSnapshot;
