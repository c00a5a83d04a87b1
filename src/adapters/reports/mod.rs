//! Report storage adapters.

mod csv_report_storage;

pub use csv_report_storage::CsvReportStorage;
