//! fastvvc-features: feature extraction for split classification
//!
//! Computes the two fixed-layout feature vectors consumed by the
//! random-forest classifiers: 34 dimensions for the QT-vs-MTT decision and
//! 45 dimensions for the Hor-vs-Ver decision. Features are derived from
//! the original luma samples, the 4x4 motion-vector field and the 4x4 SAD
//! map of the picture under encode.
//!
//! The vector layouts are training contracts: element order must never
//! change without retraining the forests.

pub mod extractor;
pub mod vectors;

pub use self::extractor::*;
pub use self::vectors::*;
