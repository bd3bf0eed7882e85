use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATE_TARGET: &str = "dm_price_etl";

/// `RUST_LOG` 優先，其次是設定檔的 log_level，最後依 verbose 決定
pub fn build_filter(verbose: bool, configured_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match (verbose, configured_level) {
            (true, _) => "debug",
            (false, Some(level)) => level,
            (false, None) => "info",
        };
        EnvFilter::new(format!("{}={},warn", CRATE_TARGET, level))
    })
}

pub fn init_cli_logger(verbose: bool, configured_level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(verbose, configured_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
