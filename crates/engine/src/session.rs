//! DataFusion session wrapper that runs plans to completion synchronously.

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use callframe_common::Result;
use datafusion::dataframe::DataFrame;
use datafusion::execution::context::SessionContext;
use datafusion::prelude::SessionConfig;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target rows per batch inside DataFusion operators.
    pub batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { batch_size: 8192 }
    }
}

/// Execution engine shared by every frame derived from the same source.
///
/// DataFusion is async; the engine owns a current-thread runtime and blocks
/// on it, so it must not be driven from inside another tokio runtime.
/// Everything runs on a single partition, which keeps row order stable
/// through filters and projections.
pub struct Engine {
    ctx: SessionContext,
    runtime: Runtime,
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let session_config = SessionConfig::new()
            .with_target_partitions(1)
            .with_batch_size(config.batch_size.max(1));
        let ctx = SessionContext::new_with_config(session_config);
        let runtime = Builder::new_current_thread().enable_all().build()?;
        tracing::debug!(batch_size = config.batch_size, "engine session created");
        Ok(Engine { ctx, runtime, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Wraps an in-memory batch as a DataFrame.
    pub fn read(&self, batch: RecordBatch) -> Result<DataFrame> {
        Ok(self.ctx.read_batch(batch)?)
    }

    /// Executes `df` and concatenates the output into one batch, in
    /// partition order.
    pub fn collect(&self, df: DataFrame) -> Result<RecordBatch> {
        let logical_schema = Arc::clone(df.schema().inner());
        let partitions = self.runtime.block_on(df.collect_partitioned())?;
        let batches: Vec<RecordBatch> = partitions.into_iter().flatten().collect();
        let schema = batches.first().map(|b| b.schema()).unwrap_or(logical_schema);
        Ok(concat_batches(&schema, &batches)?)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use datafusion::prelude::{col, lit};

    fn numbers() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![5, 1, 4, 2, 3]))]).unwrap()
    }

    #[test]
    fn collect_preserves_input_order() {
        let engine = Engine::with_config(EngineConfig { batch_size: 2 }).unwrap();
        let df = engine.read(numbers()).unwrap().filter(col("n").gt(lit(1i64))).unwrap();
        let batch = engine.collect(df).unwrap();
        let values = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(values.values(), &[5, 4, 2, 3]);
    }

    #[test]
    fn empty_result_keeps_schema() {
        let engine = Engine::new().unwrap();
        let df = engine.read(numbers()).unwrap().filter(col("n").gt(lit(100i64))).unwrap();
        let batch = engine.collect(df).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema().field(0).name(), "n");
    }
}
