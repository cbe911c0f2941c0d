// Shared part with the clfstat binary
pub mod aggregate;
pub mod analyze;
pub mod parser;
pub mod report;

pub use aggregate::{Aggregator, Summary};
pub use parser::{combined::CombinedParser, LogParser, LogRecord};
