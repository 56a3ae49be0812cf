//! File boundary: delimited-text input and the plain-text report.

mod load;
mod report;

pub use load::{load, LoadOptions, Loaded};
pub use report::{save, write_report};
