use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 中位數標記的形狀，沿用 matplotlib 的單字元代碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Marker {
    TriangleLeft,
    TriangleRight,
    TriangleUp,
    TriangleDown,
    Circle,
    Square,
    Diamond,
}

impl Marker {
    pub fn code(&self) -> &'static str {
        match self {
            Marker::TriangleLeft => "<",
            Marker::TriangleRight => ">",
            Marker::TriangleUp => "^",
            Marker::TriangleDown => "v",
            Marker::Circle => "o",
            Marker::Square => "s",
            Marker::Diamond => "D",
        }
    }
}

impl FromStr for Marker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Marker::TriangleLeft),
            ">" => Ok(Marker::TriangleRight),
            "^" => Ok(Marker::TriangleUp),
            "v" => Ok(Marker::TriangleDown),
            "o" => Ok(Marker::Circle),
            "s" => Ok(Marker::Square),
            "D" => Ok(Marker::Diamond),
            other => Err(format!(
                "unknown marker '{}', expected one of < > ^ v o s D",
                other
            )),
        }
    }
}

impl TryFrom<String> for Marker {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.code().to_string()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// RGB 顏色，可由名稱 (purple) 或 #rrggbb 解析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("purple", (128, 0, 128)),
    ("orange", (255, 165, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("pink", (255, 192, 203)),
    ("brown", (165, 42, 42)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
];

impl ChartColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for ChartColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("invalid hex color '{}', expected #rrggbb", s));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| format!("invalid hex color '{}', expected #rrggbb", s))
            };
            return Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        let lower = s.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| Self::rgb(*r, *g, *b))
            .ok_or_else(|| format!("unknown color name '{}'", s))
    }
}

impl TryFrom<String> for ChartColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChartColor> for String {
    fn from(color: ChartColor) -> Self {
        color.to_hex()
    }
}

/// 一個比較類別（例如性別）：標籤、圖表顏色與標記放在同一筆記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub color: ChartColor,
    pub marker: Marker,
    /// 明確指定的搜尋字串，未設定時由 query_template 產生
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Category {
    pub fn new(label: impl Into<String>, color: ChartColor, marker: Marker) -> Self {
        Self {
            label: label.into(),
            color,
            marker,
            query: None,
        }
    }

    /// 搜尋字串：explicit query 優先，否則把 `{category}` 代入模板
    pub fn search_text(&self, template: &str) -> String {
        match &self.query {
            Some(query) => query.clone(),
            None => template.replace("{category}", &self.label),
        }
    }
}
