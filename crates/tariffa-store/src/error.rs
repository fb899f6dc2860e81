use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("price table not found: {0}")]
    TableNotFound(std::path::PathBuf),

    #[error("unsupported price table format: {0}")]
    UnsupportedFormat(String),

    #[error("price table has no column named {0:?}")]
    MissingColumn(String),

    #[error("column {column:?} has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("invalid price {value:?} for code {code}")]
    InvalidPrice { code: String, value: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),
}
