use crate::domain::category::{Category, ChartColor};
use serde::{Deserialize, Serialize};

/// 一次產品搜尋的參數，建立後不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub search_type: String,
    pub result_type: String,
    pub page_size: usize,
}

/// API 回傳的原始 JSON，每次執行都重新抓取
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub query: String,
    pub status: u16,
    pub body: serde_json::Value,
}

/// 抽取階段的輸出：類別與它的原始回應
#[derive(Debug, Clone)]
pub struct CategoryResponse {
    pub category: Category,
    pub response: RawResponse,
}

/// 清理後的一列產品資料。欄位依欄名字母順序宣告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    /// 產品在 API `products` 陣列中的位置
    #[serde(skip)]
    pub index: usize,
    #[serde(rename = "basePrice.Value")]
    pub base_price_value: f64,
    #[serde(rename = "basePrice.currencySymbol")]
    pub base_price_currency_symbol: Option<String>,
    #[serde(rename = "basePriceQuantity")]
    pub base_price_quantity: Option<f64>,
    #[serde(rename = "basePriceUnit")]
    pub base_price_unit: Option<String>,
    pub gtin: Option<String>,
    pub name: String,
    #[serde(rename = "netQuantityContent")]
    pub net_quantity_content: Option<f64>,
    #[serde(rename = "price.currencySymbol")]
    pub price_currency_symbol: Option<String>,
    #[serde(rename = "price.value")]
    pub price_value: f64,
}

/// 匯出用的儲存格值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
    Empty,
}

impl<'a> CellValue<'a> {
    fn text(value: &'a Option<String>) -> Self {
        value.as_deref().map(CellValue::Text).unwrap_or(CellValue::Empty)
    }

    /// NaN 與缺值都輸出成空白儲存格
    fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => CellValue::Number(v),
            _ => CellValue::Empty,
        }
    }
}

impl ProductRecord {
    pub const COLUMNS: [&'static str; 9] = [
        "basePrice.Value",
        "basePrice.currencySymbol",
        "basePriceQuantity",
        "basePriceUnit",
        "gtin",
        "name",
        "netQuantityContent",
        "price.currencySymbol",
        "price.value",
    ];

    /// 與 `COLUMNS` 同順序的儲存格
    pub fn cells(&self) -> [CellValue<'_>; 9] {
        [
            CellValue::number(Some(self.base_price_value)),
            CellValue::text(&self.base_price_currency_symbol),
            CellValue::number(self.base_price_quantity),
            CellValue::text(&self.base_price_unit),
            CellValue::text(&self.gtin),
            CellValue::Text(&self.name),
            CellValue::number(self.net_quantity_content),
            CellValue::text(&self.price_currency_symbol),
            CellValue::number(Some(self.price_value)),
        ]
    }
}

/// 一個類別的清理結果，是彙總與繪圖的單位
#[derive(Debug, Clone)]
pub struct CategoryDataset {
    pub category: Category,
    pub records: Vec<ProductRecord>,
}

impl CategoryDataset {
    pub fn new(category: Category, records: Vec<ProductRecord>) -> Self {
        Self { category, records }
    }

    pub fn label(&self) -> &str {
        &self.category.label
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn base_prices(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.base_price_value).collect()
    }
}

/// 圖表外觀設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub count_y_label: String,
    pub price_y_label: String,
    pub bar_color: ChartColor,
    pub currency_symbol: String,
    pub count_filename: String,
    pub price_filename: String,
    pub width: u32,
    pub height: u32,
    /// 字體與標記大小以 pt 計，依 dpi 換算成像素
    pub dpi: u32,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            title: "Rasierschaum Rasiergel Rasieröl Rasiercreme".to_string(),
            x_label: "Geschlecht".to_string(),
            count_y_label: "#Produkte".to_string(),
            price_y_label: "Durchschnittspreis pro 100ml".to_string(),
            bar_color: ChartColor::rgb(0xb9, 0xc9, 0x97),
            currency_symbol: "€".to_string(),
            count_filename: "anzahl_produkte.png".to_string(),
            price_filename: "durchschnittspreis_pro_100ml_produkte.png".to_string(),
            width: 1920,
            height: 1440,
            dpi: 300,
        }
    }
}

impl ChartSpec {
    /// pt 轉像素
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

/// 載入階段寫出的檔案
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub spreadsheets: Vec<String>,
    pub charts: Vec<String>,
}

impl LoadReport {
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.spreadsheets
            .iter()
            .chain(self.charts.iter())
            .map(String::as_str)
    }
}
