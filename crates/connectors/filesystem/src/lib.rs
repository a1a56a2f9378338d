//! Filesystem connector
//!
//! Loads delimited text files into Arrow record batches, inferring one type
//! per column.

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use callframe_common::{Error, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A source of tabular data.
pub trait TableProvider {
    /// Load the whole table as a typed batch.
    fn load(&self) -> Result<RecordBatch>;
}

/// A TableProvider that reads from a CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    path: PathBuf,
    has_header: bool,
    delimiter: u8,
}

impl CsvTable {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::new_with_header(path, true)
    }

    pub fn new_with_header(path: impl AsRef<Path>, has_header: bool) -> Self {
        Self { path: path.as_ref().to_path_buf(), has_header, delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Header names (or `column_<n>` placeholders) and every data row.
    fn read(&self) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let file = File::open(&self.path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(self.has_header)
            .delimiter(self.delimiter)
            .from_reader(file);

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| Error::Csv(e.to_string()))?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }

        let names = if self.has_header {
            let headers = rdr.headers().map_err(|e| Error::Csv(e.to_string()))?;
            headers.iter().map(|h| h.trim().to_string()).collect()
        } else {
            let width = rows.first().map_or(0, Vec::len);
            (1..=width).map(|i| format!("column_{}", i)).collect()
        };
        tracing::debug!(path = %self.path.display(), columns = ?names, rows = rows.len(), "read csv");
        Ok((names, rows))
    }
}

impl TableProvider for CsvTable {
    fn load(&self) -> Result<RecordBatch> {
        let (names, rows) = self.read()?;
        let mut fields = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).filter(|c| !c.is_empty()))
                .collect();
            let (data_type, array) = build_column(&cells);
            fields.push(Field::new(name, data_type, true));
            columns.push(array);
        }
        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        Ok(RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?)
    }
}

/// Narrowest of Int64, Float64, Boolean and Utf8 that holds every
/// non-empty cell.
fn build_column(cells: &[Option<&str>]) -> (DataType, ArrayRef) {
    let present = || cells.iter().flatten();
    let any_present = present().next().is_some();

    if any_present && present().all(|c| c.parse::<i64>().is_ok()) {
        let values = cells.iter().map(|c| c.and_then(|v| v.parse::<i64>().ok()));
        return (DataType::Int64, Arc::new(values.collect::<Int64Array>()));
    }
    if any_present && present().all(|c| parse_float(c).is_some()) {
        let values = cells.iter().map(|c| c.and_then(parse_float));
        return (DataType::Float64, Arc::new(values.collect::<Float64Array>()));
    }
    if any_present && present().all(|c| parse_bool(c).is_some()) {
        let values = cells.iter().map(|c| c.and_then(parse_bool));
        return (DataType::Boolean, Arc::new(values.collect::<BooleanArray>()));
    }
    (DataType::Utf8, Arc::new(cells.iter().copied().collect::<StringArray>()))
}

// Rejects the words `f64::from_str` accepts, such as "nan" or "inf".
fn parse_float(cell: &str) -> Option<f64> {
    if cell.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    cell.parse().ok()
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data").join("people.csv")
    }

    #[test]
    fn test_load_csv_with_header() {
        let batch = CsvTable::new(fixture()).load().unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names.len(), 5);
        assert_eq!(names[0], "name");

        let first = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(first.value(0), "Ann");
    }

    #[test]
    fn test_load_infers_column_types() {
        let batch = CsvTable::new(fixture()).load().unwrap();
        let schema = batch.schema();
        let types: Vec<&DataType> = schema.fields().iter().map(|f| f.data_type()).collect();
        assert_eq!(
            types,
            vec![&DataType::Utf8, &DataType::Int64, &DataType::Utf8, &DataType::Float64, &DataType::Boolean]
        );
        assert_eq!(batch.num_rows(), 3);

        let score = batch.column(3).as_any().downcast_ref::<Float64Array>().unwrap();
        assert!(score.is_null(1));
        assert_eq!(score.value(2), 3.0);

        let active = batch.column(4).as_any().downcast_ref::<BooleanArray>().unwrap();
        assert!(active.value(2));
    }

    #[test]
    fn test_load_csv_no_header() {
        let temp_dir = std::env::temp_dir();
        let file_path = temp_dir.join("callframe_test_no_header.csv");
        {
            let mut wtr = csv::Writer::from_path(&file_path).unwrap();
            wtr.write_record(["a", "1"]).unwrap();
            wtr.write_record(["c", "2"]).unwrap();
            wtr.flush().unwrap();
        }

        let batch = CsvTable::new_with_header(&file_path, false).load().unwrap();
        assert_eq!(batch.schema().field(0).name(), "column_1");
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Int64);
        assert_eq!(batch.num_rows(), 2);

        std::fs::remove_file(file_path).unwrap();
    }

    #[test]
    fn test_semicolon_delimiter() {
        let file_path = std::env::temp_dir().join("callframe_test_semicolon.csv");
        std::fs::write(&file_path, "x;y\n1;a\n2;b\n").unwrap();
        let batch = CsvTable::new(&file_path).with_delimiter(b';').load().unwrap();
        assert_eq!(batch.num_columns(), 2);
        std::fs::remove_file(file_path).unwrap();
    }

    #[test]
    fn test_load_csv_file_not_found() {
        let table = CsvTable::new("non_existent_file.csv");
        let result = table.load();
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
