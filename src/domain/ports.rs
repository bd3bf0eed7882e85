use crate::domain::category::Category;
use crate::domain::model::{CategoryDataset, CategoryResponse, ChartSpec, LoadReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn search_type(&self) -> &str;
    fn result_type(&self) -> &str;
    fn page_size(&self) -> usize;
    fn request_timeout(&self) -> Option<Duration>;
    fn categories(&self) -> &[Category];
    fn search_text(&self, category: &Category) -> String;
    fn name_filter(&self) -> &str;
    fn dump_raw_responses(&self) -> bool;
    fn chart_spec(&self) -> &ChartSpec;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<CategoryResponse>>;
    async fn transform(&self, responses: Vec<CategoryResponse>) -> Result<Vec<CategoryDataset>>;
    async fn load(&self, datasets: Vec<CategoryDataset>) -> Result<LoadReport>;
}
