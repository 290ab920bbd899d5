//! Per-level compression context
//!
//! One [`ComprCuCtx`] frame exists per open CU level: the LIFO candidate
//! stack, the best result seen so far, the per-branch best-cost slots and
//! the gate flags the filter rules read and clear.

use fastvvc_core::{Candidate, CodingStructure, CuArea};
use fastvvc_forest::GateVerdicts;

/// Per-branch best-cost slots, `f64::MAX` until the branch was tried
#[derive(Debug, Clone)]
pub struct SplitCosts {
    pub non_split: f64,
    pub qt: f64,
    pub horz: f64,
    pub vert: f64,
    pub trih: f64,
    pub triv: f64,
    pub imv: f64,
    pub no_imv: f64,
}

impl Default for SplitCosts {
    fn default() -> Self {
        Self {
            non_split: f64::MAX,
            qt: f64::MAX,
            horz: f64::MAX,
            vert: f64::MAX,
            trih: f64::MAX,
            triv: f64::MAX,
            // half-range sentinel keeps the IMV quick-reject product finite
            imv: f64::MAX * 0.5,
            no_imv: f64::MAX * 0.5,
        }
    }
}

/// Gate flags driving the split-pruning rules
#[derive(Debug, Clone, Copy)]
pub struct CtxFlags {
    /// A QT attempt is (still) scheduled or ran at this level
    pub did_quad_split: bool,
    /// A horizontal BT attempt is scheduled or ran
    pub did_horz_split: bool,
    /// A vertical BT attempt is scheduled or ran
    pub did_vert_split: bool,
    /// TT_H remains worth trying after the BT_H result
    pub do_trih_split: bool,
    /// TT_V remains worth trying after the BT_V result
    pub do_triv_split: bool,
    /// QT is enumerated before BT/TT at this level
    pub qt_before_bt: bool,
    /// Best non-split result is a skip CU
    pub is_best_nosplit_skip: bool,
    /// A cached best encoding will be replayed at this level
    pub is_reusing_cu: bool,
    /// Best structure was absent or empty at the sentinel
    pub empty_cu_when_full: bool,
}

impl Default for CtxFlags {
    fn default() -> Self {
        Self {
            did_quad_split: false,
            did_horz_split: false,
            did_vert_split: false,
            do_trih_split: true,
            do_triv_split: true,
            qt_before_bt: false,
            is_best_nosplit_skip: false,
            is_reusing_cu: false,
            empty_cu_when_full: false,
        }
    }
}

/// Best result adopted at this level
#[derive(Debug, Clone)]
pub struct BestEntry {
    pub cs: CodingStructure,
    pub mode: Candidate,
}

/// ISP reuse hints exchanged with the intra searcher
#[derive(Debug, Clone, Copy, Default)]
pub struct IspHints {
    /// Intra search ran ISP at this level
    pub was_tested: bool,
    pub pred_mode_val: u32,
    pub best_isp_intra_mode: u32,
    pub best_dct2_non_isp_cost: f64,
    pub best_non_dct2_cost: f64,
    /// Hints were loaded from a prior CU at this geometry
    pub loaded: bool,
}

/// One frame of the partition context stack
#[derive(Debug, Clone)]
pub struct ComprCuCtx {
    pub area: CuArea,
    /// Candidate stack; popped back-to-front
    pub candidates: Vec<Candidate>,
    /// Candidate currently being RD-tried by the driver
    pub current: Option<Candidate>,
    /// Mode tried before the current one
    pub last_mode: Option<Candidate>,
    pub best: Option<BestEntry>,
    /// Best cost among the inter trials of this level
    pub best_inter_cost: f64,
    pub costs: SplitCosts,
    pub flags: CtxFlags,
    /// Classifier verdicts; undecided until the sentinel fires
    pub verdicts: GateVerdicts,
    /// Classifier consultation already happened at this level
    pub classified: bool,
    /// Minimum QT depth this level must reach
    pub min_depth: u32,
    /// Maximum QT depth worth searching
    pub max_depth: u32,
    /// Deepest QT depth observed inside the QT attempt
    pub max_qt_sub_depth: u32,
    /// Inter ME signalled early skip
    pub early_skip: bool,
    /// SATD of the best inter prediction, `u64::MAX` until known
    pub inter_had: u64,
    /// ISP reuse hints for the intra searcher
    pub isp: IspHints,
}

impl ComprCuCtx {
    pub fn new(area: CuArea, min_depth: u32, max_depth: u32) -> Self {
        Self {
            area,
            candidates: Vec::with_capacity(24),
            current: None,
            last_mode: None,
            best: None,
            best_inter_cost: f64::MAX,
            costs: SplitCosts::default(),
            flags: CtxFlags::default(),
            verdicts: GateVerdicts::undecided(),
            classified: false,
            min_depth,
            max_depth,
            max_qt_sub_depth: 0,
            early_skip: false,
            inter_had: u64::MAX,
            isp: IspHints::default(),
        }
    }

    pub fn push(&mut self, cand: Candidate) {
        self.candidates.push(cand);
    }

    /// Peek the candidate that pops next
    pub fn top(&self) -> Option<Candidate> {
        self.candidates.last().copied()
    }

    pub fn pop(&mut self) -> Option<Candidate> {
        self.candidates.pop()
    }

    /// Cost of the current best, or infinity
    pub fn best_cost(&self) -> f64 {
        self.best.as_ref().map_or(f64::MAX, |b| b.cs.cost)
    }

    /// Best result is a single-CU (non-split) structure
    pub fn best_is_single_cu(&self) -> bool {
        self.best.as_ref().is_some_and(|b| b.cs.is_single_cu())
    }

    /// SATD-based inter threshold is live
    pub fn inter_had_active(&self) -> bool {
        self.inter_had != 0
    }
}
