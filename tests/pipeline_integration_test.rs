use anyhow::Result;
use dm_price_etl::utils::error::ErrorCategory;
use dm_price_etl::{EtlEngine, EtlError, LocalStorage, ProductPipeline, TomlConfig};
use httpmock::prelude::*;
use serde_json::json;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

fn product(name: &str, unit: &str, quantity: f64, formatted: &str, price: f64) -> serde_json::Value {
    json!({
        "gtin": 4066447232321u64,
        "name": name,
        "brandName": "Balea",
        "price": {"value": price, "currencySymbol": "€"},
        "basePrice": {"formattedValue": formatted},
        "basePriceUnit": unit,
        "basePriceQuantity": quantity,
        "netQuantityContent": 300
    })
}

fn test_config(endpoint: String, output_path: &str) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.source.endpoint = endpoint;
    config.load.output_path = output_path.to_string();
    config.charts.width = 640;
    config.charts.height = 480;
    config.charts.dpi = 100;
    config
}

fn read_zip_entry(path: &Path, entry: &str) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;
    let mut file = archive.by_name(entry)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn cell_value<'x>(xml: &'x str, cell: &str) -> Option<&'x str> {
    let start = xml.find(&format!(r#"<c r="{}""#, cell))?;
    let rest = &xml[start..];
    let end = rest.find("</c>")?;
    rest[..end].split("<v>").nth(1)?.strip_suffix("</v>")
}

#[tokio::test]
async fn test_end_to_end_three_categories() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let herren = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Herren")
            .query_param("searchType", "product")
            .query_param("type", "search")
            .query_param("pageSize", "50");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "count": 3,
                "products": [
                    product("Rasierschaum Sensitive", "l", 1.0, "6,50 €", 1.95),
                    product("Rasieröl Pflege", "ml", 100.0, "4,95 €", 2.45),
                    product("Rasierklingen", "St", 1.0, "0,99 €", 4.95),
                ]
            }));
    });
    let frauen = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Frauen");
        then.status(200).json_body(json!({
            "products": [product("Rasiergel Aloe", "l", 1.0, "9,90 €", 1.49)]
        }));
    });
    let divers = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Divers");
        // 沒有產品符合名稱篩選
        then.status(200).json_body(json!({
            "products": [product("Duschgel Vanille", "ml", 100.0, "1,25 €", 1.25)]
        }));
    });

    let config = test_config(server.url("/search"), &output_path);
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = ProductPipeline::new(storage, config)?;
    let engine = EtlEngine::new_with_monitoring(pipeline, false);

    let report = engine.run().await?;

    herren.assert();
    frauen.assert();
    divers.assert();
    assert_eq!(
        report.spreadsheets,
        vec!["Herren.xlsx", "Frauen.xlsx", "Divers.xlsx"]
    );

    let out = Path::new(&output_path);

    // 原始回應：四格縮排，非 ASCII 以 \u 跳脫
    let dump = std::fs::read_to_string(out.join("rasierschaum Herren.json"))?;
    assert!(dump.starts_with("{\n    \"count\": 3,\n    \"products\": ["));
    assert!(dump.contains("Rasier\\u00f6l Pflege"));
    assert!(dump.contains("\\u20ac"));
    assert!(dump.is_ascii());
    assert!(out.join("rasierschaum Divers.json").exists());

    // 試算表
    let herren_xlsx = out.join("Herren.xlsx");
    let strings = read_zip_entry(&herren_xlsx, "xl/sharedStrings.xml")?;
    for column in [
        "basePrice.Value",
        "basePrice.currencySymbol",
        "basePriceQuantity",
        "basePriceUnit",
        "gtin",
        "name",
        "netQuantityContent",
        "price.currencySymbol",
        "price.value",
    ] {
        assert!(strings.contains(column), "missing column {}", column);
    }
    assert!(strings.contains("Rasierschaum Sensitive"));
    assert!(strings.contains("Rasieröl Pflege"));
    assert!(!strings.contains("Rasierklingen"));
    assert!(!strings.contains("basePrice.formattedValue"));

    let workbook = read_zip_entry(&herren_xlsx, "xl/workbook.xml")?;
    assert!(workbook.contains("name=\"Sheet1\""));

    // 儲存格數值：公升列換算成每 100ml
    let sheet = read_zip_entry(&herren_xlsx, "xl/worksheets/sheet1.xml")?;
    assert_eq!(cell_value(&sheet, "A2"), Some("0"));
    assert_eq!(cell_value(&sheet, "B2"), Some("0.65"));
    assert_eq!(cell_value(&sheet, "D2"), Some("100"));
    assert_eq!(cell_value(&sheet, "J2"), Some("1.95"));
    assert_eq!(cell_value(&sheet, "A3"), Some("1"));
    assert_eq!(cell_value(&sheet, "B3"), Some("4.95"));
    assert_eq!(cell_value(&sheet, "D3"), Some("100"));
    assert_eq!(cell_value(&sheet, "H2"), Some("300"));
    // 件數單位的刀片不會出現
    assert_eq!(cell_value(&sheet, "A4"), None);

    // 空類別仍然有只含表頭的試算表
    let divers_strings = read_zip_entry(&out.join("Divers.xlsx"), "xl/sharedStrings.xml")?;
    assert!(divers_strings.contains("basePriceUnit"));
    assert!(!divers_strings.contains("Duschgel"));

    // 圖表
    for chart in ["anzahl_produkte.png", "durchschnittspreis_pro_100ml_produkte.png"] {
        let png = std::fs::read(out.join(chart))?;
        let image = image::load_from_memory(&png)?;
        assert_eq!((image.width(), image.height()), (640, 480));
    }

    Ok(())
}

#[tokio::test]
async fn test_rerun_overwrites_outputs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(temp_dir.path().join("Herren.xlsx"), b"stale")?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).json_body(json!({
            "products": [product("Rasiercreme Classic", "ml", 100.0, "2,95 €", 2.95)]
        }));
    });

    let config = test_config(server.url("/search"), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path.clone()), config)?;
    EtlEngine::new(pipeline).run().await?;

    let xlsx = std::fs::read(temp_dir.path().join("Herren.xlsx"))?;
    assert_eq!(&xlsx[..2], b"PK");

    Ok(())
}

#[tokio::test]
async fn test_missing_products_field_aborts_without_reports() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(500).json_body(json!({ "error": "maintenance" }));
    });

    let config = test_config(server.url("/search"), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path.clone()), config)?;
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    api_mock.assert_hits(3);
    assert!(matches!(
        err,
        EtlError::MissingFieldError { ref field, row: None } if field == "products"
    ));
    assert_eq!(err.category(), ErrorCategory::Data);
    assert_eq!(err.exit_code(), 1);

    // 抽取已完成，原始回應仍然留下
    assert!(temp_dir.path().join("rasierschaum Herren.json").exists());
    assert!(!temp_dir.path().join("Herren.xlsx").exists());
    assert!(!temp_dir.path().join("anzahl_produkte.png").exists());

    Ok(())
}

#[tokio::test]
async fn test_malformed_category_keeps_earlier_spreadsheets() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Herren");
        then.status(200).json_body(json!({
            "products": [product("Rasiergel Sensitive", "ml", 100.0, "2,45 €", 2.45)]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Frauen");
        then.status(200).json_body(json!({ "error": "x" }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("query", "rasierschaum Divers");
        then.status(200).json_body(json!({
            "products": [product("Rasiercreme Classic", "ml", 100.0, "2,95 €", 2.95)]
        }));
    });

    let config = test_config(server.url("/search"), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path.clone()), config)?;
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(
        err,
        EtlError::MissingFieldError { ref field, row: None } if field == "products"
    ));
    assert!(temp_dir.path().join("Herren.xlsx").exists());
    assert!(!temp_dir.path().join("Frauen.xlsx").exists());
    assert!(!temp_dir.path().join("Divers.xlsx").exists());
    assert!(!temp_dir.path().join("anzahl_produkte.png").exists());

    Ok(())
}

#[tokio::test]
async fn test_unparseable_base_price_is_a_parse_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).json_body(json!({
            "products": [product("Rasierschaum", "ml", 100.0, "ab € ", 1.0)]
        }));
    });

    let config = test_config(server.url("/search"), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path), config)?;
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::ParseError { row: 0, .. }));

    Ok(())
}

#[tokio::test]
async fn test_non_json_body_is_a_serialization_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).body("<html>Wartung</html>");
    });

    let config = test_config(server.url("/search"), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path), config)?;
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::SerializationError(_)));
    assert!(std::fs::read_dir(temp_dir.path())?.next().is_none());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_is_a_network_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = test_config("http://127.0.0.1:9/search".to_string(), &output_path);
    let pipeline = ProductPipeline::new(LocalStorage::new(output_path), config)?;
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::ApiError(_)));
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(err.exit_code(), 2);

    Ok(())
}
