//! Summary of an RD trial result
//!
//! The external RD evaluators (prediction, transform, entropy coding) are
//! opaque to this subsystem; what flows back from a trial is a
//! [`CodingStructure`]: the RD triple plus a summary record per coded CU.
//! The controller reads these to adopt bests, update per-branch cost slots
//! and populate the per-geometry caches.

use serde::{Deserialize, Serialize};

use crate::area::CuArea;

/// Transform coefficient type
pub type Coeff = i32;

/// Prediction class of a coded CU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredClass {
    Intra,
    /// Inter prediction; `merge` covers merge and skip, `geo` the
    /// geometric partitioning merge
    Inter { merge: bool, geo: bool },
    Ibc,
    Palette,
}

impl PredClass {
    pub fn is_intra(&self) -> bool {
        matches!(self, PredClass::Intra)
    }

    pub fn is_inter(&self) -> bool {
        matches!(self, PredClass::Inter { .. })
    }

    pub fn is_ibc(&self) -> bool {
        matches!(self, PredClass::Ibc)
    }
}

/// Summary of one coded CU inside a trial result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CuRecord {
    pub area: CuArea,
    pub pred: PredClass,
    /// CU was coded as skip
    pub skip: bool,
    /// CU was coded as MMVD skip
    pub mmvd_skip: bool,
    /// Any non-zero residual below the CU root
    pub root_cbf: bool,
    /// Quad-depth the CU sits at
    pub qt_depth: u32,
    /// Binary-depth within the multi-type tree
    pub bt_depth: u32,
    /// Multi-type-tree depth
    pub mt_depth: u32,
    /// Bi-prediction CU weight index
    pub bcw_idx: u8,
    /// Adaptive color transform was applied
    pub color_transform: bool,
    pub qp: i32,
}

impl CuRecord {
    /// A plain CU record with neutral side information
    pub fn new(area: CuArea, pred: PredClass) -> Self {
        Self {
            area,
            pred,
            skip: false,
            mmvd_skip: false,
            root_cbf: true,
            qt_depth: 0,
            bt_depth: 0,
            mt_depth: 0,
            bcw_idx: 0,
            color_transform: false,
            qp: 32,
        }
    }
}

/// Result of one RD trial over a CU area
///
/// `cost` is the RD objective `dist + lambda * fracBits`. When
/// `use_db_cost` is set, best-adoption compares `cost + cost_db_offset`
/// on both sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodingStructure {
    pub area: CuArea,
    pub cost: f64,
    pub frac_bits: u64,
    pub dist: u64,
    /// Deblocking-aware cost correction
    pub cost_db_offset: f64,
    /// Compare costs with the deblocking correction applied
    pub use_db_cost: bool,
    /// Coded CUs in coding order; a non-split result has exactly one
    pub cus: Vec<CuRecord>,
    /// Prediction units in the structure
    pub num_pus: usize,
    /// Transform units in the structure
    pub num_tus: usize,
    /// Luma coded block flag of the first TU
    pub tu_cbf_luma: bool,
    /// Opaque coefficient payload carried for best-encoding replay;
    /// empty when the host does not request caching
    pub coeffs: Vec<Coeff>,
}

impl CodingStructure {
    /// An unset structure carrying infinite cost
    pub fn unset(area: CuArea) -> Self {
        Self {
            area,
            cost: f64::MAX,
            frac_bits: 0,
            dist: 0,
            cost_db_offset: 0.0,
            use_db_cost: false,
            cus: Vec::new(),
            num_pus: 0,
            num_tus: 0,
            tu_cbf_luma: false,
            coeffs: Vec::new(),
        }
    }

    /// A single-CU result with the given cost
    pub fn single(area: CuArea, pred: PredClass, cost: f64) -> Self {
        Self {
            area,
            cost,
            frac_bits: 0,
            dist: 0,
            cost_db_offset: 0.0,
            use_db_cost: false,
            cus: vec![CuRecord::new(area, pred)],
            num_pus: 1,
            num_tus: 1,
            tu_cbf_luma: true,
            coeffs: Vec::new(),
        }
    }

    pub fn is_single_cu(&self) -> bool {
        self.cus.len() == 1
    }

    /// The first (top-left) CU record
    pub fn first_cu(&self) -> Option<&CuRecord> {
        self.cus.first()
    }

    /// The last (bottom-right) CU record
    pub fn last_cu(&self) -> Option<&CuRecord> {
        self.cus.last()
    }

    /// Cost used for best-adoption comparisons
    pub fn adoption_cost(&self, apply_db_offset: bool) -> f64 {
        if apply_db_offset {
            self.cost + self.cost_db_offset
        } else {
            self.cost
        }
    }
}
