// Adapters layer: concrete implementations for external systems (storage, spreadsheet, charts).

pub mod chart;
pub mod spreadsheet;
pub mod storage;
