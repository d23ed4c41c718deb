//! Line-oriented parsers for the two equipment logs.

pub mod result_log;
pub mod test_log;

pub use result_log::{ResultLog, parse_result_log};
pub use test_log::{TestLog, classify, parse_test_log};
