//! Decision gate: probabilities to force / forbid / undecided verdicts
//!
//! A probability `p` against threshold `t` yields `force` when `p > t`,
//! `forbid` when `p < 1 - t` and `undecided` otherwise. The three cascade
//! verdicts are computed with short-circuit: the QT-vs-MTT query runs only
//! when no-split did not force, the Hor-vs-Ver query only when QT did not
//! force and its ratio denominators were sound.

use tracing::debug;

use fastvvc_core::GateConfig;
use fastvvc_features::FeatureBundle;

use crate::model::{ForestKind, ForestModel};

/// Verdict for one branch of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Take this branch; prune the alternatives
    Force,
    /// Prune this branch
    Forbid,
    /// No verdict; the baseline search order stands
    #[default]
    Undecided,
}

/// Threshold a probability into a verdict
pub fn classify(p: f64, t: f64) -> Decision {
    if p > t {
        Decision::Force
    } else if p < 1.0 - t {
        Decision::Forbid
    } else {
        Decision::Undecided
    }
}

/// The three cascade verdicts for one CU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateVerdicts {
    /// Split-vs-no-split
    pub no_split: Decision,
    /// Quad-tree vs multi-type tree
    pub qt: Decision,
    /// Horizontal vs vertical MTT direction
    pub hor: Decision,
}

impl GateVerdicts {
    /// All three branches undecided (classifier skipped)
    pub fn undecided() -> Self {
        Self::default()
    }
}

/// Classifier cascade bound to a model and a threshold configuration
#[derive(Debug, Clone)]
pub struct DecisionGate<'m> {
    model: &'m ForestModel,
    config: GateConfig,
}

impl<'m> DecisionGate<'m> {
    pub fn new(model: &'m ForestModel, config: GateConfig) -> Self {
        Self { model, config }
    }

    /// Run the cascade for a CU of the given shape
    pub fn assess(&self, width: u32, height: u32, bundle: &FeatureBundle) -> GateVerdicts {
        let (qt_t, hor_t) = self.config.thresholds_for(width, height);
        let mut verdicts = GateVerdicts::undecided();

        let p_no_split = self
            .model
            .evaluate(ForestKind::NoSplit, width, height, &bundle.qt_mtt);
        verdicts.no_split = classify(p_no_split, qt_t);
        if verdicts.no_split == Decision::Force {
            return verdicts;
        }

        // QT-vs-MTT forests exist for square shapes only
        let p_qt = if width == height {
            self.model
                .evaluate(ForestKind::QtMtt, width, height, &bundle.qt_mtt)
        } else {
            0.5
        };
        verdicts.qt = classify(p_qt, qt_t);

        if verdicts.qt != Decision::Force && bundle.hor_ver_valid {
            let p_hor = self
                .model
                .evaluate(ForestKind::HorVer, width, height, &bundle.hor_ver);
            verdicts.hor = classify(p_hor, hor_t);
            debug!(width, height, p_qt, p_hor, ?verdicts, "classifier cascade");
        } else {
            debug!(width, height, p_qt, ?verdicts, "classifier cascade");
        }
        verdicts
    }
}

#[cfg(test)]
mod tests {
    include!("gate_test.rs");
}
