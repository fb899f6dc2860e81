//! Price table loading: file → Arrow RecordBatches → [`PriceTable`].

use std::path::Path;
use std::str::FromStr;

use arrow::array::{
    Array, Decimal128Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tariffa_core::tariff::{self, TariffColumns};
use tariffa_core::{PriceEntry, PriceTable};
use tracing::{info, warn};

use crate::StoreError;

/// How to read a price table file.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Field delimiter for CSV files.
    pub delimiter: u8,
    pub columns: TariffColumns,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            columns: TariffColumns::default(),
        }
    }
}

/// Load a price table, choosing the reader by file extension.
///
/// `.csv` and `.txt` use the configured delimiter, `.tsv` is tab separated,
/// `.parquet` needs the `parquet` feature.
pub fn load_price_table(path: &Path, options: &TableOptions) -> Result<PriceTable, StoreError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let batches = match ext.as_str() {
        "csv" | "txt" => crate::read_csv(path, options.delimiter)?,
        "tsv" => crate::read_csv(path, b'\t')?,
        #[cfg(feature = "parquet")]
        "parquet" => crate::read_parquet(path)?,
        #[cfg(not(feature = "parquet"))]
        "parquet" => {
            return Err(StoreError::UnsupportedFormat(
                "parquet (built without the `parquet` feature)".into(),
            ));
        }
        other => return Err(StoreError::UnsupportedFormat(format!("{other:?}"))),
    };

    let table = price_table_from_batches(&batches, &options.columns)?;
    if table.is_empty() {
        warn!(path = %path.display(), "price table has no entries");
    }
    info!(entries = table.len(), path = %path.display(), "loaded price table");
    Ok(table)
}

/// Build a PriceTable from Arrow batches holding the tariff columns.
///
/// Rows without a code are skipped. A missing or unparseable price is an
/// error, since a silently wrong tariff would corrupt every estimate.
pub fn price_table_from_batches(
    batches: &[RecordBatch],
    columns: &TariffColumns,
) -> Result<PriceTable, StoreError> {
    let mut rows = Vec::new();

    for batch in batches {
        let schema = batch.schema();
        if let Some(missing) = tariff::missing_columns(&schema, columns).first() {
            return Err(StoreError::MissingColumn(missing.to_string()));
        }
        let code_col = column(batch, &columns.code)?;
        let desc_col = column(batch, &columns.description)?;
        let price_col = column(batch, &columns.price)?;

        for row in 0..batch.num_rows() {
            let code = match cell_string(code_col, &columns.code, row)? {
                Some(c) if !c.trim().is_empty() => c.trim().to_string(),
                _ => {
                    warn!(row, "price table row without code, skipped");
                    continue;
                }
            };
            let description = cell_string(desc_col, &columns.description, row)?
                .map(|d| d.trim().to_string())
                .unwrap_or_default();
            let price = cell_decimal(price_col, &columns.price, row, &code)?;
            rows.push(PriceEntry {
                code,
                description,
                price,
            });
        }
    }

    Ok(PriceTable::new(rows))
}

/// Parse a textual price: `10.50`, `10,50`, `€ 1.234,56`, `1,234.56`.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let s = raw.trim().trim_start_matches('€').trim();
    let normalized = match (s.rfind(','), s.rfind('.')) {
        // Comma is the decimal separator, dots group thousands.
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        // Dot is the decimal separator, commas group thousands.
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s.to_string(),
    };
    Decimal::from_str(&normalized).ok()
}

// ── Helpers ──

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a dyn Array, StoreError> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or_else(|| StoreError::MissingColumn(name.to_string()))
}

fn unsupported(name: &str, col: &dyn Array) -> StoreError {
    StoreError::UnsupportedColumnType {
        column: name.to_string(),
        data_type: col.data_type().to_string(),
    }
}

/// Get a cell as text from a Utf8, LargeUtf8 or integer column.
fn cell_string(col: &dyn Array, name: &str, i: usize) -> Result<Option<String>, StoreError> {
    if col.is_null(i) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(i).to_string()),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| a.value(i).to_string()),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(i).to_string()),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(i).to_string()),
        _ => None,
    };
    value.map(Some).ok_or_else(|| unsupported(name, col))
}

/// Get a cell as an exact decimal from a text, Float64 or Decimal128 column.
fn cell_decimal(
    col: &dyn Array,
    name: &str,
    i: usize,
    code: &str,
) -> Result<Decimal, StoreError> {
    let invalid = |value: String| StoreError::InvalidPrice {
        code: code.to_string(),
        value,
    };
    if col.is_null(i) {
        return Err(invalid(String::new()));
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = cell_string(col, name, i)?.unwrap_or_default();
            parse_price(&text).ok_or_else(|| invalid(text))
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| unsupported(name, col))?;
            let v = arr.value(i);
            Decimal::from_f64(v).ok_or_else(|| invalid(v.to_string()))
        }
        DataType::Decimal128(_, scale) => {
            let arr = col
                .as_any()
                .downcast_ref::<Decimal128Array>()
                .ok_or_else(|| unsupported(name, col))?;
            let v = arr.value(i);
            u32::try_from(*scale)
                .ok()
                .and_then(|s| Decimal::try_from_i128_with_scale(v, s).ok())
                .ok_or_else(|| invalid(arr.value_as_string(i)))
        }
        _ => Err(unsupported(name, col)),
    }
}
