use crate::core::{GeocodePlan, GeocodeSummary, Pipeline};
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub summary: GeocodeSummary,
}

pub struct GeocodingEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> GeocodingEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// 只讀檔與清理地址，不呼叫 API
    pub async fn preview(&self) -> Result<GeocodePlan> {
        let records = self.pipeline.extract().await?;
        let plan = self.pipeline.plan(&records);
        tracing::info!(
            "🔍 {} of {} records would be geocoded, estimated cost {}",
            plan.cost.requests,
            records.len(),
            plan.cost
        );
        Ok(plan)
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting geocoding run");

        tracing::info!("📥 Importing passengers...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Imported {} records", records.len());

        tracing::info!("🌍 Geocoding addresses...");
        let result = self.pipeline.transform(records).await?;

        tracing::info!("💾 Exporting results...");
        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(RunReport {
            output_path,
            summary: result.summary,
        })
    }
}
