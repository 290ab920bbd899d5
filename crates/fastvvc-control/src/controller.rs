//! The CU mode controller
//!
//! Lifecycle, per the host encoder's traversal:
//!
//! ```text
//! begin_slice -> [per CTU] begin_ctu -> [per tree node] init_cu_level
//!   -> loop { next_mode -> external RD -> record_result }
//!   -> finish_cu_level -> ... -> end_slice
//! ```
//!
//! The stack must be empty at CTU boundaries and at slice end; a violation
//! is fatal.

use tracing::debug;

use fastvvc_core::{
    Candidate, ClassifierMode, CuArea, EncoderConfig, Mv, NullStats, PartitionError, PartitionView,
    PictureView, Result, SliceContext, StatEvent, StatsSink,
};
use fastvvc_dataset::DatasetSink;
use fastvvc_forest::ForestModel;

use crate::best_cache::BestEncCache;
use crate::blk_info::BlockInfoCache;
use crate::ctx::{BestEntry, ComprCuCtx};
use crate::sbt_cache::SbtSaveLoad;

/// Depth budget before the skip-chain rule stops splitting
pub(crate) const SKIP_DEPTH: u32 = 3;
/// Tighter budget for close reference pictures
pub(crate) const FAST_SKIP_DEPTH: u32 = 2;
/// POC distance under which the tighter budget applies
pub(crate) const PICTURE_DISTANCE_TH: i32 = 1;

/// Quad-depths of the already-coded neighbor CUs, used to seed the
/// QT-before-BT traversal order
#[derive(Debug, Clone, Copy, Default)]
pub struct NeighborContext {
    pub left_qt_depth: Option<u32>,
    pub above_qt_depth: Option<u32>,
}

/// Encoder-side controller of the partition search
pub struct ModeController {
    pub(crate) config: EncoderConfig,
    pub(crate) model: ForestModel,
    pub(crate) slice: Option<SliceContext>,
    pub(crate) skip_threshold: u32,
    pub(crate) stack: Vec<ComprCuCtx>,
    pub(crate) blk_info: BlockInfoCache,
    pub(crate) best_cache: BestEncCache,
    pub(crate) sbt: SbtSaveLoad,
    pub(crate) dataset: Option<DatasetSink>,
    pub(crate) stats: Box<dyn StatsSink>,
    /// Hash-ME found a perfect match for the current frame
    pub(crate) hash_perfect_match: bool,
}

impl ModeController {
    pub fn new(config: EncoderConfig, model: ForestModel) -> Self {
        Self {
            config,
            model,
            slice: None,
            skip_threshold: SKIP_DEPTH,
            stack: Vec::new(),
            blk_info: BlockInfoCache::new(),
            best_cache: BestEncCache::new(),
            sbt: SbtSaveLoad::new(),
            dataset: None,
            stats: Box::new(NullStats),
            hash_perfect_match: false,
        }
    }

    /// Controller with the compiled-in default model
    pub fn with_builtin_model(config: EncoderConfig) -> Self {
        Self::new(config, ForestModel::builtin().clone())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Attach the CSV sinks used in collection mode
    pub fn set_dataset_sink(&mut self, sink: DatasetSink) {
        self.dataset = Some(sink);
    }

    pub fn set_stats_sink(&mut self, stats: Box<dyn StatsSink>) {
        self.stats = stats;
    }

    /// Start a slice: caches reset, skip threshold derived
    pub fn begin_slice(&mut self, slice: SliceContext) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(PartitionError::invariant(
                "context stack not empty at slice start",
            ));
        }
        self.skip_threshold = if self.config.heuristics.e0023_fast_enc {
            let th = if self.config.heuristics.composite_ref {
                PICTURE_DISTANCE_TH * 2
            } else {
                PICTURE_DISTANCE_TH
            };
            if slice.min_picture_distance <= th {
                FAST_SKIP_DEPTH
            } else {
                SKIP_DEPTH
            }
        } else {
            SKIP_DEPTH
        };
        self.blk_info.reset();
        self.best_cache.reset();
        self.sbt.reset();
        self.hash_perfect_match = false;
        debug!(
            poc = slice.poc,
            slice_type = ?slice.slice_type,
            skip_threshold = self.skip_threshold,
            "slice begin"
        );
        self.slice = Some(slice);
        Ok(())
    }

    /// Start a CTU; the stack must be balanced
    pub fn begin_ctu(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(PartitionError::invariant(
                "mode list is not empty at the beginning of a CTU",
            ));
        }
        Ok(())
    }

    /// End the slice; the stack must be balanced
    pub fn end_slice(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(PartitionError::invariant(
                "context stack not empty at slice end",
            ));
        }
        self.slice = None;
        Ok(())
    }

    pub(crate) fn slice_ctx(&self) -> &SliceContext {
        self.slice
            .as_ref()
            .expect("slice context is set between begin_slice and end_slice")
    }

    pub(crate) fn ctx(&self) -> &ComprCuCtx {
        self.stack.last().expect("an open CU level")
    }

    pub(crate) fn ctx_mut(&mut self) -> &mut ComprCuCtx {
        self.stack.last_mut().expect("an open CU level")
    }

    /// Depth of the open context stack
    pub fn open_levels(&self) -> usize {
        self.stack.len()
    }

    /// Close the current CU level and hand back its best result
    pub fn finish_cu_level(&mut self) -> Result<Option<BestEntry>> {
        match self.stack.pop() {
            Some(ctx) => Ok(ctx.best),
            None => Err(PartitionError::invariant(
                "finish_cu_level without matching init_cu_level",
            )),
        }
    }

    /// Pop candidates until one passes the filter; `None` ends the level.
    ///
    /// The `PostDontSplit` sentinel is consumed internally: its side
    /// effects (classifier consultation, dataset rows, cache write-back)
    /// fire between the non-split and the split candidates.
    pub fn next_mode(
        &mut self,
        pic: &PictureView<'_>,
        part: &dyn PartitionView,
    ) -> Option<Candidate> {
        let ctx = self.ctx_mut();
        if let Some(current) = ctx.current.take() {
            ctx.last_mode = Some(current);
        }
        while let Some(cand) = self.ctx_mut().pop() {
            if self.try_mode(cand, pic, part) {
                let area = part.curr_area();
                self.stats.record(
                    (area.width, area.height),
                    cand.mode.split_kind(),
                    part.curr_subdiv(),
                    StatEvent::Tried,
                );
                self.ctx_mut().current = Some(cand);
                return Some(cand);
            }
        }
        None
    }

    /// The candidate most recently returned by `next_mode`
    pub fn curr_mode(&self) -> Option<Candidate> {
        self.ctx().current
    }

    /// Inter ME found an early skip; non-split non-inter candidates of
    /// this level will be dropped
    pub fn set_early_skip_detected(&mut self) {
        self.ctx_mut().early_skip = true;
    }

    /// Hash-ME reported a perfect match for the current frame
    pub fn set_hash_perfect_match(&mut self, matched: bool) {
        self.hash_perfect_match = matched;
    }

    /// SATD of the best inter prediction, for the intra fast path
    pub fn set_inter_had(&mut self, had: u64) {
        self.ctx_mut().inter_had = had;
    }

    /// Best result of the open level
    pub fn best_of_level(&self) -> Option<&BestEntry> {
        self.ctx().best.as_ref()
    }

    /// Gate flags of the open level
    pub fn level_flags(&self) -> crate::ctx::CtxFlags {
        self.ctx().flags
    }

    /// Per-branch best-cost slots of the open level
    pub fn level_costs(&self) -> crate::ctx::SplitCosts {
        self.ctx().costs.clone()
    }

    /// Candidates still pending at the open level, bottom of stack first
    pub fn pending_candidates(&self) -> &[Candidate] {
        &self.ctx().candidates
    }

    // ------------------------------------------------------------------
    // Per-geometry cache pass-throughs for the external searchers
    // ------------------------------------------------------------------

    /// Saved uni-prediction MV for the geometry, if any
    pub fn cached_mv(&self, area: &CuArea, list: usize, ref_idx: usize) -> Option<Mv> {
        self.blk_info.mv(area, list, ref_idx)
    }

    pub fn save_mv(&mut self, area: &CuArea, list: usize, ref_idx: usize, mv: Mv) {
        self.blk_info.set_mv(area, list, ref_idx, mv);
    }

    pub fn cached_bcw_idx(&self, area: &CuArea) -> u8 {
        self.blk_info.bcw_idx(area)
    }

    pub fn save_bcw_idx(&mut self, area: &CuArea, bcw_idx: u8) {
        self.blk_info.set_bcw_idx(area, bcw_idx);
    }

    /// SBT history lookup for the transform search
    pub fn find_best_sbt(&self, area: &CuArea, pu_sse: u32) -> Option<(u8, u8)> {
        self.sbt.find_best_sbt(area, pu_sse)
    }

    pub fn save_best_sbt(&mut self, area: &CuArea, pu_sse: u32, pu_sbt: u8, pu_trs: u8) -> bool {
        self.sbt.save_best_sbt(area, pu_sse, pu_sbt, pu_trs)
    }

    /// Replay payload for a `RecoCached` trial
    pub fn cached_encoding(&self, area: &CuArea) -> Option<fastvvc_core::CodingStructure> {
        self.best_cache.replay(area)
    }

    /// Classifier participates in gating (not collection, not off)
    pub(crate) fn predicting(&self) -> bool {
        self.config.classifier == ClassifierMode::Predict
    }

    /// Collection mode: dump rows instead of pruning
    pub(crate) fn collecting(&self) -> bool {
        self.config.classifier == ClassifierMode::Collect
    }

    /// Shapes covered by the classifier cascade: both dimensions in
    /// {8, 16, 32, 64}, plus the 128-wide CTU shapes
    pub(crate) fn classifier_shape(width: u32, height: u32) -> bool {
        let mtt = |d: u32| (8..=64).contains(&d) && d.is_power_of_two();
        (mtt(width) && mtt(height))
            || (width == 128 && height == 128)
            || (width == 128 && height == 64)
            || (width == 64 && height == 128)
    }
}
