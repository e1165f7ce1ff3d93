pub mod api;
pub mod app_config;
pub mod config;
pub mod criteria;
pub mod item;

pub use api::{PageQuery, SearchApi, SearchPage};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use criteria::{SearchCriteria, SortMode};
pub use item::{format_distance_miles, Coordinate, Item, ItemId, Review};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
