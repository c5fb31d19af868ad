pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{CheckConfig, TomlConfig};

pub use crate::core::{engine::CheckEngine, pipeline::SchedulePipeline};
pub use utils::error::{CheckError, Result};
