use crate::core::stats;
use crate::domain::category::{ChartColor, Marker};
use crate::domain::model::CategoryDataset;

/// 一個長條：位置即為類別在設定中的順序
#[derive(Debug, Clone, PartialEq)]
pub struct CountBar {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub label: String,
    pub mean: f64,
    pub median: f64,
    pub color: ChartColor,
    pub marker: Marker,
}

pub fn count_bars(datasets: &[CategoryDataset]) -> Vec<CountBar> {
    datasets
        .iter()
        .map(|dataset| CountBar {
            label: dataset.label().to_string(),
            count: dataset.len(),
        })
        .collect()
}

pub fn price_bars(datasets: &[CategoryDataset]) -> Vec<PriceBar> {
    datasets
        .iter()
        .map(|dataset| {
            let prices = dataset.base_prices();
            let bar = PriceBar {
                label: dataset.label().to_string(),
                mean: stats::mean(&prices),
                median: stats::median(&prices),
                color: dataset.category.color,
                marker: dataset.category.marker,
            };
            if bar.mean.is_nan() || bar.median.is_nan() {
                tracing::warn!(
                    "⚠️ Category '{}' has no usable base prices ({} rows), statistics are NaN",
                    bar.label,
                    prices.len()
                );
            }
            bar
        })
        .collect()
}

/// `12.345` → `"12,35 €"`
pub fn format_price(value: f64, currency_symbol: &str) -> String {
    if value.is_nan() {
        return format!("nan {}", currency_symbol);
    }
    format!("{:.2} {}", value, currency_symbol).replace('.', ",")
}
