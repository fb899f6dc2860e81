//! Storage layer: loads the regional price table from CSV (Arrow) or Parquet.

mod csv;
mod error;
mod table;

pub use csv::read_csv;
pub use error::StoreError;
pub use table::{TableOptions, load_price_table, parse_price, price_table_from_batches};

#[cfg(feature = "parquet")]
mod columnar;
#[cfg(feature = "parquet")]
pub use columnar::read_parquet;
