// Metrics module
// Collection, console reporting and JSON export of load test metrics

pub mod collector;
pub mod reporter;
pub mod summary;
pub mod types;
