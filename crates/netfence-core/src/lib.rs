pub mod config;
pub mod error;
pub mod ids;
pub mod paths;
pub mod store;
pub mod types;

pub use config::{Config, ConfigPaths};
pub use error::{BlockError, ControlError};
pub use ids::RuleNames;
pub use paths::{absolute_from, clean_declared_path, normalized_key, PATH_PLACEHOLDER};
pub use store::BlockStore;
pub use types::{BlockedItem, Direction};
