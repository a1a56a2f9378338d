//! Engine crate
//!
//! Executes parsed call plans against Arrow record batches. Filters, sorts,
//! aggregations and joins are planned through DataFusion's DataFrame API on a
//! single partition; projections and appends work on the batch directly.
//!
//! # Example
//! ```rust
//! use arrow::array::Int64Array;
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use callframe_engine::{Engine, NoTables};
//! use callframe_grammar::parse_call;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::new(vec![Field::new("age", DataType::Int64, false)]));
//! let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![25, 35]))]).unwrap();
//! let plan = parse_call("filter_age_gt_30", None).unwrap();
//! let out = Engine::new().unwrap().execute(&plan, &batch, &NoTables).unwrap();
//! assert_eq!(out.num_rows(), 1);
//! ```

pub mod dispatch;
mod expr;
pub mod operators;
mod resolve;
pub mod session;

pub use dispatch::{NoTables, TableLookup};
pub use operators::aggregate::GROUP_COUNT_COLUMN;
pub use session::{Engine, EngineConfig};
