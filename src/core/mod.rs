pub mod aggregate;
pub mod etl;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod query;
pub mod raw_dump;
pub mod stats;

pub use crate::domain::model::{CategoryDataset, CategoryResponse, LoadReport, ProductRecord};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
