use crate::domain::model::SearchQuery;

impl SearchQuery {
    pub fn new(
        text: impl Into<String>,
        search_type: impl Into<String>,
        result_type: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            text: text.into(),
            search_type: search_type.into(),
            result_type: result_type.into(),
            page_size,
        }
    }

    pub fn to_url(&self, endpoint: &str) -> String {
        build_search_url(
            endpoint,
            &self.text,
            &self.search_type,
            &self.result_type,
            self.page_size,
        )
    }
}

/// 組合搜尋 URL。參數原樣代入，不做百分比編碼
pub fn build_search_url(
    endpoint: &str,
    query: &str,
    search_type: &str,
    result_type: &str,
    page_size: usize,
) -> String {
    format!(
        "{}?query={}&searchType={}&type={}&pageSize={}",
        endpoint, query, search_type, result_type, page_size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://product-search.services.dmtech.com/de/search";

    #[test]
    fn test_build_search_url() {
        let url = build_search_url(ENDPOINT, "rasierschaum Herren", "product", "search", 50);
        assert_eq!(
            url,
            "https://product-search.services.dmtech.com/de/search?query=rasierschaum Herren&searchType=product&type=search&pageSize=50"
        );
    }

    #[test]
    fn test_query_text_is_not_encoded() {
        let query = SearchQuery::new("rasieröl & co", "product", "search", 50);
        let url = query.to_url(ENDPOINT);
        assert!(url.contains("query=rasieröl & co&searchType=product"));
        assert!(!url.contains("%20"));
    }
}
