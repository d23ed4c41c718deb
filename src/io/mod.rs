//! File adapters: log decoding, the reference table, and workbook read/write.

pub mod excel_read;
pub mod excel_write;
pub mod merged;
pub mod reference_csv;
pub mod text;
