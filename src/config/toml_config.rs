use crate::domain::category::{Category, ChartColor, Marker};
use crate::domain::model::ChartSpec;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://product-search.services.dmtech.com/de/search";
pub const DEFAULT_QUERY_TEMPLATE: &str = "rasierschaum {category}";
pub const DEFAULT_NAME_FILTER: &str = "Rasierschaum|Rasiergel|Rasieröl|Rasiercreme";
const CATEGORY_PLACEHOLDER: &str = "{category}";

/// 所有區段都可省略，省略時使用內建預設值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub transform: TransformConfig,
    pub categories: Vec<Category>,
    pub load: LoadConfig,
    pub charts: ChartSpec,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "dm-price-etl".to_string(),
            description: "Shaving product prices per category".to_string(),
            version: "1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub search_type: String,
    pub result_type: String,
    pub page_size: usize,
    /// 未設定時不限時間
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_type: "product".to_string(),
            result_type: "search".to_string(),
            page_size: 50,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub query_template: String,
    pub dump_raw: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            dump_raw: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// 產品名稱的正規表達式，大小寫有別
    pub name_filter: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            name_filter: DEFAULT_NAME_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("Herren", ChartColor::rgb(128, 0, 128), Marker::TriangleLeft),
        Category::new("Frauen", ChartColor::rgb(255, 255, 0), Marker::TriangleRight),
        Category::new("Divers", ChartColor::rgb(0, 0, 255), Marker::TriangleUp),
    ]
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            source: SourceConfig::default(),
            extract: ExtractConfig::default(),
            transform: TransformConfig::default(),
            categories: default_categories(),
            load: LoadConfig::default(),
            charts: ChartSpec::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DM_OUTPUT})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_non_empty_string("source.search_type", &self.source.search_type)?;
        validation::validate_non_empty_string("source.result_type", &self.source.result_type)?;
        validation::validate_positive_number("source.page_size", self.source.page_size, 1)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_regex("transform.name_filter", &self.transform.name_filter)?;

        // 類別
        if self.categories.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "categories".to_string(),
            });
        }
        for category in &self.categories {
            validation::validate_non_empty_string("categories.label", &category.label)?;
            if category.query.is_none() && !self.extract.query_template.contains(CATEGORY_PLACEHOLDER) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "extract.query_template".to_string(),
                    value: self.extract.query_template.clone(),
                    reason: format!(
                        "Category '{}' has no query, so the template must contain {}",
                        category.label, CATEGORY_PLACEHOLDER
                    ),
                });
            }
        }
        validation::validate_unique(
            "categories.label",
            self.categories.iter().map(|c| c.label.as_str()),
        )?;

        // 圖表
        validation::validate_file_extension("charts.count_filename", &self.charts.count_filename, &["png"])?;
        validation::validate_file_extension("charts.price_filename", &self.charts.price_filename, &["png"])?;
        validation::validate_positive_number("charts.width", self.charts.width as usize, 1)?;
        validation::validate_positive_number("charts.height", self.charts.height as usize, 1)?;
        validation::validate_positive_number("charts.dpi", self.charts.dpi as usize, 1)?;

        Ok(())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.log_level.as_deref()
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn search_type(&self) -> &str {
        &self.source.search_type
    }

    fn result_type(&self) -> &str {
        &self.source.result_type
    }

    fn page_size(&self) -> usize {
        self.source.page_size
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn search_text(&self, category: &Category) -> String {
        category.search_text(&self.extract.query_template)
    }

    fn name_filter(&self) -> &str {
        &self.transform.name_filter
    }

    fn dump_raw_responses(&self) -> bool {
        self.extract.dump_raw
    }

    fn chart_spec(&self) -> &ChartSpec {
        &self.charts
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_matches_builtin_run() {
        let config = TomlConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.api_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.output_path(), ".");

        let labels: Vec<&str> = config.categories().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Herren", "Frauen", "Divers"]);
        assert_eq!(config.categories()[1].marker, Marker::TriangleRight);
        assert_eq!(config.search_text(&config.categories()[2]), "rasierschaum Divers");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.categories.len(), 3);
        assert_eq!(config.transform.name_filter, DEFAULT_NAME_FILTER);
        assert!(config.extract.dump_raw);
        assert_eq!(config.charts.width, 1920);
    }

    #[test]
    fn test_parse_categories_and_overrides() {
        let toml_content = r##"
[pipeline]
name = "bart-test"

[source]
page_size = 20
timeout_seconds = 15

[extract]
query_template = "rasiergel {category}"

[[categories]]
label = "Herren"
color = "#112233"
marker = "o"

[[categories]]
label = "Kinder"
color = "green"
marker = "s"
query = "kinder rasiergel"

[charts]
bar_color = "#000000"
"##;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.pipeline.name, "bart-test");
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].color, ChartColor::rgb(0x11, 0x22, 0x33));
        assert_eq!(config.categories[1].marker, Marker::Square);
        assert_eq!(config.search_text(&config.categories[0]), "rasiergel Herren");
        assert_eq!(config.search_text(&config.categories[1]), "kinder rasiergel");
        assert_eq!(config.charts.bar_color, ChartColor::rgb(0, 0, 0));
        assert_eq!(config.charts.x_label, "Geschlecht");
    }

    #[test]
    fn test_unknown_marker_is_a_parse_error() {
        let toml_content = r#"
[[categories]]
label = "Herren"
color = "purple"
marker = "*"
"#;

        let err = TomlConfig::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DM_ETL_TEST_OUTPUT", "/tmp/dm-reports");

        let toml_content = r#"
[load]
output_path = "${DM_ETL_TEST_OUTPUT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), "/tmp/dm-reports");

        std::env::remove_var("DM_ETL_TEST_OUTPUT");
    }

    #[test]
    fn test_config_validation() {
        let mut config = TomlConfig::default();
        config.source.endpoint = "invalid-url".to_string();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.categories.push(Category::new("Herren", ChartColor::rgb(0, 0, 0), Marker::Circle));
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.categories.clear();
        assert!(matches!(
            config.validate(),
            Err(EtlError::MissingConfigError { .. })
        ));

        let mut config = TomlConfig::default();
        config.extract.query_template = "rasierschaum".to_string();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.transform.name_filter = "(unclosed".to_string();
        assert!(config.validate().is_err());

        let mut config = TomlConfig::default();
        config.charts.price_filename = "preise.jpg".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[pipeline]
name = "file-test"

[load]
output_path = "./reports"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "file-test");
        assert_eq!(config.output_path(), "./reports");
    }
}
