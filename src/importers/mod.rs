// Import module - CSV readers for real and simulated operation records

pub mod operations_csv;

pub use operations_csv::{load_operations, read_operation_inputs, CsvLoad};
