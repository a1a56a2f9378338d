//! Common crate
//!
//! Shared error handling and the column catalog used by both the grammar
//! and the engine crates.
//!
//! # Example
//! ```rust
//! use callframe_common::Error;
//! let err = Error::new("example error");
//! assert!(err.to_string().contains("example error"));
//! ```

pub mod catalog;
pub mod error;

pub use catalog::ColumnCatalog;
pub use error::{Error, Result};
