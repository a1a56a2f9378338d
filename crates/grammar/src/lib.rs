//! Grammar crate
//!
//! Compiles method-name-shaped strings such as
//! `filter_age_greaterthan_30_and_city_equals_london` into operation plans.
//!
//! The pipeline is tokenizer → matcher → builder:
//! - [`tokenizer`] splits the name on `_`;
//! - [`matcher`] walks the tokens, classifying keywords and matching free
//!   spans against a known schema;
//! - [`builder`] folds the spans into a [`Plan`].
//!
//! # Example
//! ```rust
//! use callframe_grammar::{parse_call, Plan};
//! let plan = parse_call("sort_by_age_desc", None).unwrap();
//! assert!(matches!(plan, Plan::Sort(_)));
//! ```

pub mod builder;
pub mod keyword;
pub mod matcher;
pub mod plan;
pub mod tokenizer;

pub use builder::parse_call;
pub use keyword::{AggFunc, Direction, JoinKind, Operator};
pub use plan::{
    AggregatePlan, Aggregation, AppendPlan, ColumnRef, Condition, DropPlan, FilterPlan,
    GroupAggregatePlan, JoinPlan, Literal, Logic, Operand, Plan, Predicate, RenamePlan,
    SelectPlan, SortKey, SortPlan, Value, DEFAULT_TARGET,
};
