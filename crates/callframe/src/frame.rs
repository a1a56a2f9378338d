//! The table wrapper that turns call names into operations.

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use callframe_common::{ColumnCatalog, Error, Result};
use callframe_connector_filesystem::{CsvTable, TableProvider};
use callframe_engine::{Engine, TableLookup};
use callframe_grammar::parse_call;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

/// Rows returned by `head` and `tail` when no count is given.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// An immutable table plus the engine that runs calls against it.
///
/// Every call returns a new `Frame` sharing the same engine; the wrapped
/// batch is never modified. All `RecordBatch` methods are reachable through
/// `Deref`.
#[derive(Clone)]
pub struct Frame {
    batch: RecordBatch,
    engine: Arc<Engine>,
}

/// Extra inputs for a call: external tables and a row count for
/// `head`/`tail`.
#[derive(Clone, Default)]
pub struct CallArgs {
    tables: HashMap<String, Frame>,
    count: Option<usize>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `frame` under `name`. Names are matched case-insensitively,
    /// like call names.
    pub fn with_table(mut self, name: &str, frame: Frame) -> Self {
        self.tables.insert(name.to_lowercase(), frame);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn count(&self) -> Option<usize> {
        self.count
    }
}

impl TableLookup for CallArgs {
    fn table(&self, name: &str) -> Option<&RecordBatch> {
        self.tables.get(&name.to_lowercase()).map(|frame| &frame.batch)
    }
}

/// Result of [`Frame::invoke`].
#[derive(Debug, Clone)]
pub enum Outcome {
    Frame(Frame),
    Shape(usize, usize),
    Columns(Vec<String>),
    DataTypes(Vec<(String, DataType)>),
    Len(usize),
    Bool(bool),
}

impl Outcome {
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Outcome::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}

impl Frame {
    pub fn new(batch: RecordBatch) -> Result<Self> {
        Ok(Self::with_engine(batch, Arc::new(Engine::new()?)))
    }

    pub fn with_engine(batch: RecordBatch, engine: Arc<Engine>) -> Self {
        Self { batch, engine }
    }

    /// Builds a frame from `(name, array)` pairs. All arrays must have the
    /// same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: AsRef<str>,
    {
        Self::new(RecordBatch::try_from_iter(columns)?)
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(&CsvTable::new(path), Arc::new(Engine::new()?))
    }

    pub fn load(provider: &dyn TableProvider, engine: Arc<Engine>) -> Result<Self> {
        Ok(Self::with_engine(provider.load()?, engine))
    }

    /// Column names known to the call parser.
    pub fn catalog(&self) -> ColumnCatalog {
        ColumnCatalog::from_schema(&self.batch.schema())
    }

    /// Parses `name` and runs it with no external tables.
    pub fn call(&self, name: &str) -> Result<Frame> {
        self.call_with(name, &CallArgs::default())
    }

    /// Parses `name` against this frame's columns and runs it.
    ///
    /// Parse errors are raised before any data is touched.
    pub fn call_with(&self, name: &str, args: &CallArgs) -> Result<Frame> {
        let plan = parse_call(name, Some(&self.catalog()))?;
        let batch = self.engine.execute(&plan, &self.batch, args)?;
        Ok(self.derive(batch))
    }

    /// Name-based dispatch: native accessors first, then the call grammar.
    pub fn invoke(&self, name: &str, args: &CallArgs) -> Result<Outcome> {
        let count = args.count().unwrap_or(DEFAULT_PREVIEW_ROWS);
        let outcome = match name {
            "shape" => {
                let (rows, cols) = self.shape();
                Outcome::Shape(rows, cols)
            }
            "columns" => Outcome::Columns(self.column_names()),
            "dtypes" => Outcome::DataTypes(self.dtypes()),
            "len" => Outcome::Len(self.batch.num_rows()),
            "is_empty" => Outcome::Bool(self.batch.num_rows() == 0),
            "head" => Outcome::Frame(self.head(count)),
            "tail" => Outcome::Frame(self.tail(count)),
            "copy" => Outcome::Frame(self.clone()),
            _ => Outcome::Frame(self.call_with(name, args)?),
        };
        Ok(outcome)
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.batch.num_rows(), self.batch.num_columns())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch.schema().fields().iter().map(|f| f.name().clone()).collect()
    }

    pub fn dtypes(&self) -> Vec<(String, DataType)> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| (f.name().clone(), f.data_type().clone()))
            .collect()
    }

    /// Column by name, matched the same way call names are.
    pub fn column_named(&self, name: &str) -> Result<&ArrayRef> {
        let catalog = self.catalog();
        let index = catalog
            .resolve(name)
            .and_then(|canonical| self.batch.schema().index_of(canonical).ok())
            .ok_or_else(|| Error::UnknownColumn {
                column: name.to_string(),
                available: catalog.names().to_vec(),
            })?;
        Ok(self.batch.column(index))
    }

    pub fn head(&self, n: usize) -> Frame {
        let len = n.min(self.batch.num_rows());
        self.derive(self.batch.slice(0, len))
    }

    pub fn tail(&self, n: usize) -> Frame {
        let rows = self.batch.num_rows();
        let len = n.min(rows);
        self.derive(self.batch.slice(rows - len, len))
    }

    pub fn to_record_batch(&self) -> RecordBatch {
        self.batch.clone()
    }

    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    fn derive(&self, batch: RecordBatch) -> Frame {
        Frame { batch, engine: Arc::clone(&self.engine) }
    }
}

impl Deref for Frame {
    type Target = RecordBatch;

    fn deref(&self) -> &RecordBatch {
        &self.batch
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = pretty_format_batches(std::slice::from_ref(&self.batch)).map_err(|_| fmt::Error)?;
        write!(f, "{}", table)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("columns", &self.column_names())
            .field("rows", &self.batch.num_rows())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Int64Array, StringArray};

    fn frame() -> Frame {
        Frame::from_columns(vec![
            ("Age", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
            ("name", Arc::new(StringArray::from(vec!["a", "b", "c"])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn head_and_tail_clamp_to_row_count() {
        let f = frame();
        assert_eq!(f.head(2).num_rows(), 2);
        assert_eq!(f.tail(10).num_rows(), 3);
        let last = f.tail(1);
        let ages = last.column_named("age").unwrap().as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ages.value(0), 3);
    }

    #[test]
    fn column_lookup_reports_available_names() {
        let err = frame().column_named("salary").unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref available, .. } if available.len() == 2));
    }

    #[test]
    fn record_batch_methods_stay_reachable() {
        let f = frame();
        assert_eq!(f.columns().len(), 2);
        assert_eq!(f.column(1).len(), 3);
        assert_eq!(f.column_names(), vec!["Age", "name"]);
    }

    #[test]
    fn display_renders_a_table() {
        let text = frame().to_string();
        assert!(text.contains("| Age | name |"));
    }

    #[test]
    fn call_args_match_names_case_insensitively() {
        let args = CallArgs::new().with_table("Orders", frame());
        assert!(args.table("orders").is_some());
        assert!(args.table("other").is_none());
    }
}
