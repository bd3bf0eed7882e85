pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use config::TomlConfig;
pub use core::{etl::EtlEngine, pipeline::ProductPipeline};
pub use utils::error::{EtlError, Result};
