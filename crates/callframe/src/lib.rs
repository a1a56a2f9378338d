//! callframe
//!
//! Wraps an Arrow table so that operations can be requested by name:
//! `filter_age_greaterthan_30_and_city_equals_london`,
//! `sort_by_age_desc`, `groupby_city_and_aggregate_salary_mean`, and so on.
//!
//! # Example
//! ```rust
//! use arrow::array::{ArrayRef, Int64Array, StringArray};
//! use callframe::Frame;
//! use std::sync::Arc;
//!
//! let frame = Frame::from_columns(vec![
//!     ("age", Arc::new(Int64Array::from(vec![25, 30, 35])) as ArrayRef),
//!     ("city", Arc::new(StringArray::from(vec!["NY", "LN", "PA"])) as ArrayRef),
//! ])
//! .unwrap();
//! let adults = frame.call("filter_age_greaterthan_28").unwrap();
//! assert_eq!(adults.shape(), (2, 2));
//! ```

pub mod config;
pub mod frame;

pub use callframe_common::{Error, Result};
pub use callframe_engine::{Engine, EngineConfig};
pub use frame::{CallArgs, Frame, Outcome};
