pub mod code;
pub mod estimate;
pub mod report;
pub mod schema;
pub mod table;

pub use code::{ParsedCode, parse_codes};
pub use estimate::{Estimate, EstimateLine, LineKind, generate};
pub use report::ReportLine;
pub use schema::tariff;
pub use table::{PriceEntry, PriceTable, TableSummary};
