//! fastvvc-forest: random-forest evaluation and decision gating
//!
//! Two cascaded classifiers steer the partition search: QT-vs-MTT and
//! Hor-vs-Ver, each a per-shape ensemble of binary decision trees over a
//! trained feature-index selection. Probabilities are thresholded into
//! force / forbid / undecided verdicts by the decision gate.
//!
//! Models load from a JSON resource; a compiled-in default model covers
//! the trained shape set. Evaluation is pure f64 arithmetic so verdicts
//! reproduce bit-exactly across hosts.

pub mod gate;
pub mod model;

pub use self::gate::*;
pub use self::model::*;
