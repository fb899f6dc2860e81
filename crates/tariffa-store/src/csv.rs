//! CSV reader for exported tariff sheets.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::StoreError;

/// Rows sampled when reading the header.
const INFER_ROWS: usize = 100;

const BOM: char = '\u{feff}';

/// Read a headed CSV file into Arrow RecordBatches.
///
/// Every column is read as `Utf8`: codes keep their leading zeros and prices
/// stay textual until parsed as decimals. A UTF-8 byte order mark in front
/// of the first header (as written by spreadsheet exports) is dropped.
pub fn read_csv(path: &Path, delimiter: u8) -> Result<Vec<RecordBatch>, StoreError> {
    if !path.exists() {
        return Err(StoreError::TableNotFound(path.to_path_buf()));
    }
    let mut file = File::open(path)?;
    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (inferred, _) = format.infer_schema(&mut file, Some(INFER_ROWS))?;
    file.rewind()?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| {
            let name = f.name().trim_start_matches(BOM).trim();
            Field::new(name, DataType::Utf8, true)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema).with_format(format).build(file)?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}
