use crate::domain::model::LoadReport;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<LoadReport> {
        tracing::info!("🚀 Starting ETL process...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Extracting search results...");
        let responses = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} category responses", responses.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔄 Cleaning product data and writing spreadsheets...");
        let datasets = self.pipeline.transform(responses).await?;
        let total: usize = datasets.iter().map(|d| d.len()).sum();
        tracing::info!(
            "🔄 Kept {} products across {} categories",
            total,
            datasets.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("📤 Rendering charts...");
        let report = self.pipeline.load(datasets).await?;
        for file in report.files() {
            tracing::info!("📁 Written: {}", file);
        }
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(report)
    }
}
