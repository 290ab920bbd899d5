//! Runtime configuration of the fast-decision subsystem
//!
//! The original research encoder selected thresholds and heuristic
//! variants with compile-time switches; here they are one serde-friendly
//! configuration struct the host encoder fills at startup.

use serde::{Deserialize, Serialize};

/// How the classifier participates in the encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassifierMode {
    /// Classifier disabled; the unpruned candidate list is used
    Off,
    /// Classifier verdicts gate the candidate list
    #[default]
    Predict,
    /// No pruning; feature vectors and per-split costs are dumped for
    /// offline training
    Collect,
}

/// Uniform decision-threshold presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThresholdPreset {
    #[default]
    P50,
    P75,
    P85,
    P90,
    P95,
    P975,
    /// Per-shape thresholds from the PCA table in [`GateConfig::pca`]
    PcaTable,
}

impl ThresholdPreset {
    /// The uniform threshold value; `None` for the PCA table
    pub fn value(&self) -> Option<f64> {
        match self {
            ThresholdPreset::P50 => Some(0.50),
            ThresholdPreset::P75 => Some(0.75),
            ThresholdPreset::P85 => Some(0.85),
            ThresholdPreset::P90 => Some(0.90),
            ThresholdPreset::P95 => Some(0.95),
            ThresholdPreset::P975 => Some(0.975),
            ThresholdPreset::PcaTable => None,
        }
    }
}

/// Per-shape threshold pair of the PCA table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcaThreshold {
    pub width: u32,
    pub height: u32,
    /// Threshold for the QT-vs-MTT verdict
    pub qt: f64,
    /// Threshold for the Hor-vs-Ver verdict
    pub hor: f64,
}

/// Decision-gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    pub preset: ThresholdPreset,
    /// PCA table; consulted only with [`ThresholdPreset::PcaTable`].
    /// Shapes missing from the table fall back to 0.5.
    pub pca: Vec<PcaThreshold>,
}

impl GateConfig {
    /// Effective (qt, hor) thresholds for a shape
    pub fn thresholds_for(&self, width: u32, height: u32) -> (f64, f64) {
        match self.preset.value() {
            Some(t) => (t, t),
            None => self
                .pca
                .iter()
                .find(|e| e.width == width && e.height == height)
                .map(|e| (e.qt, e.hor))
                .unwrap_or((0.5, 0.5)),
        }
    }
}

/// Baseline fast-search heuristics retained from the host encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicToggles {
    /// Gate forbid verdicts on a surviving alternative branch
    pub more_restrictive_skip: bool,
    /// Bypass classifier gates on frames whose best structure is empty
    pub disable_when_empty_cu: bool,
    /// Directional-gradient split pruning (content-based fast QTBT)
    pub content_based_fast_qtbt: bool,
    /// Stop splitting below a skip best-CU
    pub early_cu: bool,
    /// Early skip detection after inter ME
    pub early_skip_detection: bool,
    /// Reject intra trials unlikely to beat the inter best
    pub pb_intra_fast: bool,
    /// Reuse ISP decisions across geometry repeats
    pub fast_isp: bool,
    /// Picture-distance-adaptive skip depth
    pub e0023_fast_enc: bool,
    /// Composite reference doubling of the picture-distance threshold
    pub composite_ref: bool,
    /// Restrict TT trials to elongated shapes under an inter best
    pub tt_shape_speedup: bool,
    /// Replay cached best encodings (RecoCached candidates)
    pub reuse_cu_results: bool,
    /// Never try intra in inter slices after an inter/IBC best
    pub disable_intra_in_inter: bool,
    /// All-intra configuration (intra period 1)
    pub all_intra: bool,
    /// Fast large-CTU handling: skip intra above 64x64 areas
    pub fast_lctu: bool,
    /// Skip intra after a residual-free IBC best
    pub ibc_no_intra_on_cbf0: bool,
    /// Content is coded in RGB order (drives the color-space record)
    pub rgb_format: bool,
}

impl Default for HeuristicToggles {
    fn default() -> Self {
        Self {
            more_restrictive_skip: true,
            disable_when_empty_cu: true,
            content_based_fast_qtbt: false,
            early_cu: false,
            early_skip_detection: false,
            pb_intra_fast: false,
            fast_isp: true,
            e0023_fast_enc: true,
            composite_ref: false,
            tt_shape_speedup: true,
            reuse_cu_results: true,
            disable_intra_in_inter: false,
            all_intra: false,
            fast_lctu: false,
            ibc_no_intra_on_cbf0: false,
            rgb_format: false,
        }
    }
}

/// IMV (adaptive MV precision) search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImvConfig {
    /// IMV search enabled at all
    pub enabled: bool,
    /// Fast 4-pel pass (opts 3 instead of 2)
    pub four_pel_fast: bool,
}

impl Default for ImvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            four_pel_fast: true,
        }
    }
}

/// Complete configuration of the partition fast-decision subsystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub classifier: ClassifierMode,
    pub gates: GateConfig,
    pub heuristics: HeuristicToggles,
    pub imv: ImvConfig,
    /// Half-width of the QP range tried at quantization-group leaves;
    /// 0 disables delta-QP search
    pub max_delta_qp: i32,
    /// Subdivision level down to which delta QP may be signalled
    pub cu_qp_delta_subdiv: u32,
    /// Worker count for sibling-split fan-out; 0 = single-threaded
    pub num_split_threads: usize,
}

impl EncoderConfig {
    /// Configuration for dataset collection runs
    pub fn collect() -> Self {
        Self {
            classifier: ClassifierMode::Collect,
            ..Self::default()
        }
    }

    /// Configuration with the classifier disabled
    pub fn baseline() -> Self {
        Self {
            classifier: ClassifierMode::Off,
            ..Self::default()
        }
    }
}
