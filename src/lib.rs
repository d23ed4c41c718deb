//! Core library for the parts-coverage command line application.
//!
//! The library reconciles the exports of an in-circuit tester into a parts
//! coverage report. Log parsers live under [`parse`], designator range
//! expansion under [`reference`], description lookup and deduplication under
//! [`reconcile`], the typed records in [`model`], file adapters under [`io`],
//! the mapping from records to sheet tables in [`flatten`], and the run
//! orchestration in [`pipeline`].

pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod reconcile;
pub mod reference;

pub use error::{Result, ToolError};
