//! Fixed-layout feature vectors
//!
//! Values are quantized to f32 exactly as the training data was, so that
//! threshold comparisons in the forests reproduce across hosts.

/// Dimensions of the QT-vs-MTT vector
pub const QT_MTT_DIMS: usize = 34;
/// Dimensions of the Hor-vs-Ver vector
pub const HOR_VER_DIMS: usize = 45;

/// Prediction class of the best non-split result, fed as trailing features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonSplitClass {
    pub is_intra: bool,
    pub is_inter: bool,
    pub is_merge: bool,
    pub is_geo: bool,
}

/// Both classifier vectors for one CU
#[derive(Debug, Clone)]
pub struct FeatureBundle {
    /// QT-vs-MTT vector (34 dims)
    pub qt_mtt: [f32; QT_MTT_DIMS],
    /// Hor-vs-Ver vector (45 dims)
    pub hor_ver: [f32; HOR_VER_DIMS],
    /// False when a Hor-vs-Ver ratio denominator vanished; the dependent
    /// verdict must stay undecided and no Hor-vs-Ver row is collected
    pub hor_ver_valid: bool,
}
