//! fastvvc-dataset: CSV sinks for offline classifier training
//!
//! In collection mode the controller dumps, per CU, one row of each
//! feature vector and one row per trialed split cost. Rows are
//! semicolon-delimited, appended, and flushed at row boundaries so that a
//! crashed run leaves no partial rows.

pub mod sink;

pub use self::sink::*;
