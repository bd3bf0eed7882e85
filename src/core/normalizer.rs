use crate::domain::model::{ProductRecord, RawResponse};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// 攤平後保留的欄位，其餘一律丟棄
pub const RETAINED_COLUMNS: [&str; 8] = [
    "gtin",
    "name",
    "price.value",
    "basePriceUnit",
    "basePrice.formattedValue",
    "basePriceQuantity",
    "netQuantityContent",
    "price.currencySymbol",
];

/// 清理步驟會讀取的欄位；整份回應都沒有時視為格式錯誤
const ACCESSED_COLUMNS: [&str; 5] = [
    "name",
    "basePriceUnit",
    "basePriceQuantity",
    "basePrice.formattedValue",
    "price.value",
];

pub const PIECE_UNIT: &str = "St";
pub const LITER_UNIT: &str = "l";
pub const MILLILITER_UNIT: &str = "ml";
pub const REFERENCE_QUANTITY_ML: f64 = 100.0;
/// 公升價格換算成新參考量時的除數
pub const LITER_PRICE_DIVISOR: f64 = 10.0;

pub type FlatRow = Map<String, Value>;

/// 把 `products` 陣列攤平成一列一個產品，巢狀物件以點號路徑命名
pub fn flatten_products(body: &Value) -> Result<Vec<FlatRow>> {
    let products = body
        .get("products")
        .and_then(Value::as_array)
        .ok_or_else(|| EtlError::MissingFieldError {
            field: "products".to_string(),
            row: None,
        })?;

    Ok(products
        .iter()
        .map(|product| {
            let mut row = FlatRow::new();
            flatten_into("", product, &mut row);
            row
        })
        .collect())
}

fn flatten_into(prefix: &str, value: &Value, out: &mut FlatRow) {
    match value {
        // 空物件不產生欄位
        Value::Object(obj) => {
            for (key, nested) in obj {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(&path, nested, out);
            }
        }
        // 陣列與純量保持原樣
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

pub fn retain_columns(rows: Vec<FlatRow>, allowed: &[&str]) -> Vec<FlatRow> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .filter(|(key, _)| allowed.contains(&key.as_str()))
                .collect()
        })
        .collect()
}

fn ensure_columns(rows: &[FlatRow], required: &[&str]) -> Result<()> {
    for column in required {
        if !rows.iter().any(|row| row.contains_key(*column)) {
            return Err(EtlError::MissingFieldError {
                field: column.to_string(),
                row: None,
            });
        }
    }
    Ok(())
}

/// 依欄位過濾、換算並轉型產品資料
pub struct Normalizer {
    name_filter: Regex,
}

impl Normalizer {
    pub fn new(name_filter: &str) -> Result<Self> {
        let name_filter = Regex::new(name_filter).map_err(|e| EtlError::InvalidConfigValueError {
            field: "transform.name_filter".to_string(),
            value: name_filter.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { name_filter })
    }

    pub fn clean(&self, response: &RawResponse) -> Result<Vec<ProductRecord>> {
        let rows = retain_columns(flatten_products(&response.body)?, &RETAINED_COLUMNS);
        ensure_columns(&rows, &ACCESSED_COLUMNS)?;
        let total = rows.len();

        let mut matched = 0;
        let mut records = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let name = text_field(row, "name").ok_or_else(|| EtlError::MissingFieldError {
                field: "name".to_string(),
                row: Some(index),
            })?;
            if !self.name_filter.is_match(name) {
                continue;
            }
            matched += 1;

            let unit = text_field(row, "basePriceUnit");
            if unit == Some(PIECE_UNIT) {
                continue;
            }

            records.push(self.clean_row(index, name, unit, row)?);
        }

        tracing::debug!(
            "🧹 Query '{}': {} products, {} matched the name filter, {} kept",
            response.query,
            total,
            matched,
            records.len()
        );
        Ok(records)
    }

    fn clean_row(&self, index: usize, name: &str, unit: Option<&str>, row: &FlatRow) -> Result<ProductRecord> {
        let per_liter = unit == Some(LITER_UNIT);

        // 公升改成每 100ml：數量、單位、價格一起換算
        let base_price_unit = if per_liter {
            Some(MILLILITER_UNIT.to_string())
        } else {
            unit.map(str::to_string)
        };
        let base_price_quantity = if per_liter {
            Some(REFERENCE_QUANTITY_ML)
        } else {
            number_field(row, "basePriceQuantity", index)?
        };

        let (value_text, currency) = split_formatted_price(text_field(row, "basePrice.formattedValue"));
        let value = parse_decimal(value_text, "basePrice.Value", index)?;
        let base_price_value = if per_liter {
            value / LITER_PRICE_DIVISOR
        } else {
            value
        };

        Ok(ProductRecord {
            index,
            base_price_value,
            base_price_currency_symbol: currency.map(str::to_string),
            base_price_quantity,
            base_price_unit,
            gtin: identifier_field(row, "gtin"),
            name: name.to_string(),
            net_quantity_content: number_field(row, "netQuantityContent", index)?,
            price_currency_symbol: text_field(row, "price.currencySymbol").map(str::to_string),
            price_value: number_field(row, "price.value", index)?.unwrap_or(f64::NAN),
        })
    }
}

/// `"1,23 €"` 在第一個空白切成數值與幣別
pub fn split_formatted_price(formatted: Option<&str>) -> (Option<&str>, Option<&str>) {
    match formatted {
        Some(text) => match text.split_once(' ') {
            Some((value, currency)) => (Some(value), Some(currency)),
            None => (Some(text), None),
        },
        None => (None, None),
    }
}

/// 逗號小數點轉成句點後解析；缺值為 NaN
pub fn parse_decimal(text: Option<&str>, field: &str, row: usize) -> Result<f64> {
    match text {
        Some(text) => {
            let normalized = text.replace(',', ".");
            normalized
                .trim()
                .parse::<f64>()
                .map_err(|_| EtlError::ParseError {
                    field: field.to_string(),
                    value: text.to_string(),
                    row,
                })
        }
        None => Ok(f64::NAN),
    }
}

fn text_field<'a>(row: &'a FlatRow, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

fn identifier_field(row: &FlatRow, key: &str) -> Option<String> {
    match row.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn number_field(row: &FlatRow, key: &str, index: usize) -> Result<Option<f64>> {
    match row.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| EtlError::ParseError {
            field: key.to_string(),
            value: s.clone(),
            row: index,
        }),
        Some(other) => Err(EtlError::ParseError {
            field: key.to_string(),
            value: other.to_string(),
            row: index,
        }),
    }
}
