use crate::adapters::chart::ChartRenderer;
use crate::adapters::spreadsheet::{spreadsheet_filename, write_products};
use crate::core::aggregate::{count_bars, price_bars};
use crate::core::fetcher::{dump_filename, Fetcher};
use crate::core::normalizer::Normalizer;
use crate::domain::model::{CategoryDataset, CategoryResponse, LoadReport};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};

/// 搜尋每個類別、清理產品並輸出試算表與兩張圖
pub struct ProductPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: Fetcher,
    normalizer: Normalizer,
}

impl<S: Storage, C: ConfigProvider> ProductPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let fetcher = Fetcher::from_config(&config);
        let normalizer = Normalizer::new(config.name_filter())?;
        Ok(Self {
            storage,
            config,
            fetcher,
            normalizer,
        })
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 依類別順序列出會呼叫的 URL
    pub fn planned_requests(&self) -> Vec<String> {
        self.config
            .categories()
            .iter()
            .map(|category| {
                self.fetcher
                    .query_for(&self.config.search_text(category))
                    .to_url(self.config.api_endpoint())
            })
            .collect()
    }

    /// 一次完整執行會寫出的所有檔案
    pub fn planned_outputs(&self) -> Vec<String> {
        let categories = self.config.categories();
        let mut files = Vec::new();
        if self.config.dump_raw_responses() {
            files.extend(
                categories
                    .iter()
                    .map(|c| dump_filename(&self.config.search_text(c))),
            );
        }
        files.extend(categories.iter().map(|c| spreadsheet_filename(&c.label)));
        let spec = self.config.chart_spec();
        files.push(spec.count_filename.clone());
        files.push(spec.price_filename.clone());
        files
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ProductPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<CategoryResponse>> {
        let categories = self.config.categories();
        let mut responses = Vec::with_capacity(categories.len());

        // 依序請求，任何一個失敗就中止
        for category in categories {
            let text = self.config.search_text(category);
            let response = if self.config.dump_raw_responses() {
                self.fetcher.fetch_and_store(&self.storage, &text).await?
            } else {
                self.fetcher.fetch(&text).await?
            };

            let count = response
                .body
                .get("products")
                .and_then(|p| p.as_array())
                .map(|p| p.len())
                .unwrap_or(0);
            tracing::info!("📦 {}: {} products for '{}'", category.label, count, text);

            responses.push(CategoryResponse {
                category: category.clone(),
                response,
            });
        }

        Ok(responses)
    }

    async fn transform(&self, responses: Vec<CategoryResponse>) -> Result<Vec<CategoryDataset>> {
        let mut datasets = Vec::with_capacity(responses.len());

        for CategoryResponse { category, response } in responses {
            let records = self.normalizer.clean(&response)?;
            if records.is_empty() {
                tracing::warn!("⚠️ {}: no products left after cleaning", category.label);
            } else {
                tracing::info!("🧹 {}: {} products kept", category.label, records.len());
            }

            // 清理完立刻寫出，後面的類別失敗也不影響已寫出的試算表
            let filename = spreadsheet_filename(&category.label);
            let data = write_products(&records)?;
            self.storage.write_file(&filename, &data).await?;
            tracing::debug!("📊 {} rows written to {}", records.len(), filename);

            datasets.push(CategoryDataset::new(category, records));
        }

        Ok(datasets)
    }

    async fn load(&self, datasets: Vec<CategoryDataset>) -> Result<LoadReport> {
        if datasets.is_empty() {
            return Err(EtlError::ProcessingError {
                message: "no category datasets to export".to_string(),
            });
        }

        // 試算表已在轉換階段寫出
        let mut report = LoadReport {
            spreadsheets: datasets
                .iter()
                .map(|d| spreadsheet_filename(d.label()))
                .collect(),
            charts: Vec::new(),
        };

        let spec = self.config.chart_spec();
        let renderer = ChartRenderer::new(spec);

        let counts = renderer.render_counts(&count_bars(&datasets))?;
        self.storage.write_file(&spec.count_filename, &counts).await?;
        report.charts.push(spec.count_filename.clone());

        let prices = renderer.render_prices(&price_bars(&datasets))?;
        self.storage.write_file(&spec.price_filename, &prices).await?;
        report.charts.push(spec.price_filename.clone());

        Ok(report)
    }
}
