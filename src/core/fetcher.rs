use crate::core::raw_dump::to_pretty_ascii_json;
use crate::domain::model::{RawResponse, SearchQuery};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

/// 每個搜尋字串發出一次 GET，沒有重試
pub struct Fetcher {
    client: Client,
    endpoint: String,
    search_type: String,
    result_type: String,
    page_size: usize,
    timeout: Option<Duration>,
}

impl Fetcher {
    pub fn new(endpoint: impl Into<String>, search_type: impl Into<String>, result_type: impl Into<String>, page_size: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            search_type: search_type.into(),
            result_type: result_type.into(),
            page_size,
            timeout: None,
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        let mut fetcher = Self::new(
            config.api_endpoint(),
            config.search_type(),
            config.result_type(),
            config.page_size(),
        );
        fetcher.timeout = config.request_timeout();
        fetcher
    }

    pub fn query_for(&self, text: &str) -> SearchQuery {
        SearchQuery::new(text, &self.search_type, &self.result_type, self.page_size)
    }

    pub async fn fetch(&self, text: &str) -> Result<RawResponse> {
        let url = self.query_for(text).to_url(&self.endpoint);
        tracing::debug!("📡 Making API request to: {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        // 傳輸層錯誤直接往上拋
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);
        if !status.is_success() {
            tracing::warn!("⚠️ Search '{}' answered with status {}", text, status);
        }

        let bytes = response.bytes().await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;

        Ok(RawResponse {
            query: text.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// 抓取並把回應寫成 `<query>.json`，覆蓋舊檔
    pub async fn fetch_and_store<S: Storage>(&self, storage: &S, text: &str) -> Result<RawResponse> {
        let response = self.fetch(text).await?;
        let filename = dump_filename(text);
        let data = to_pretty_ascii_json(&response.body)?;
        storage.write_file(&filename, &data).await?;
        tracing::info!("💾 Raw response saved to {} ({} bytes)", filename, data.len());
        Ok(response)
    }
}

pub fn dump_filename(query: &str) -> String {
    format!("{}.json", query)
}
