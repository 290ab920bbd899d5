//! Candidate enumeration for one CU level
//!
//! Candidates are pushed least-preferred first so the LIFO pop tries the
//! common cases (merge/skip, affine, inter ME) before intra, and every
//! non-split mode before any split. The `PostDontSplit` sentinel sits
//! between the two groups. Within splits, QT is enumerated before BT/TT
//! when the neighborhood suggests deep quad partitioning
//! (`QT_BEFORE_BT`), after them otherwise.

use tracing::trace;

use fastvvc_core::{Candidate, PartitionView, Result, SplitKind, TestMode, TreeKind};

use crate::controller::{ModeController, NeighborContext};
use crate::ctx::ComprCuCtx;

/// Subdivision increment class for QP-range derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QpSplitClass {
    Quad,
    Binary,
    NoSplit,
}

impl ModeController {
    /// QP range tried at this level, widened only at quantization-group
    /// leaves when delta-QP search is configured
    pub(crate) fn min_max_qp(
        &self,
        part: &dyn PartitionView,
        base_qp: i32,
        class: QpSplitClass,
    ) -> (i32, i32) {
        let slice = self.slice_ctx();
        let incr = match class {
            QpSplitClass::Quad => 2,
            QpSplitClass::Binary => 1,
            QpSplitClass::NoSplit => 0,
        };
        let qg_enable = part.curr_subdiv() <= self.config.cu_qp_delta_subdiv;
        let qg_enable_children =
            qg_enable && incr > 0 && part.curr_subdiv() + incr <= self.config.cu_qp_delta_subdiv;
        let is_leaf_qg = qg_enable && !qg_enable_children;
        if is_leaf_qg && self.config.max_delta_qp > 0 {
            (
                slice.clip_qp(base_qp - self.config.max_delta_qp),
                slice.clip_qp(base_qp + self.config.max_delta_qp),
            )
        } else {
            (base_qp, base_qp)
        }
    }

    /// Open a CU level: push a context frame and populate its candidates
    pub fn init_cu_level(
        &mut self,
        part: &dyn PartitionView,
        neighbors: &NeighborContext,
    ) -> Result<()> {
        let slice = self.slice_ctx().clone();
        let area = part.curr_area();

        // depth hints: the full CTU-to-min-QT window, narrowed to the
        // coded neighborhood's quad depths under fast large-CTU handling
        let full_depth = slice.ctu_size.ilog2() - slice.min_qt_size.ilog2();
        let (min_depth, max_depth) = if self.config.heuristics.fast_lctu {
            match (neighbors.left_qt_depth, neighbors.above_qt_depth) {
                (Some(left), Some(above)) => (
                    left.min(above).saturating_sub(1),
                    (left.max(above) + 1).min(full_depth),
                ),
                // a missing neighbor leaves the window open
                _ => (0, full_depth),
            }
        } else {
            (0, full_depth)
        };
        let mut ctx = ComprCuCtx::new(area, min_depth, max_depth);

        // deep quad partitioning in the neighborhood biases the order
        let curr_qt = part.qt_depth();
        let deep_neighbors = match (neighbors.left_qt_depth, neighbors.above_qt_depth) {
            (Some(left), Some(above)) => left > curr_qt && above > curr_qt,
            (Some(left), None) => left > curr_qt,
            (None, Some(above)) => above > curr_qt,
            (None, None) => area.width >= (32 << slice.gop_depth),
        };
        ctx.flags.qt_before_bt = deep_neighbors && area.width > (slice.min_qt_size << 1);

        let base_qp = slice.clip_qp(slice.base_qp);

        // ---- split candidates ----
        let (quad_min, quad_max) = self.min_max_qp(part, base_qp, QpSplitClass::Quad);
        if !ctx.flags.qt_before_bt {
            for qp in (quad_min..=quad_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::Quad), qp));
            }
        }
        if part.can_split(SplitKind::TtVert) {
            for qp in (quad_min..=quad_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::TtVert), qp));
            }
        }
        if part.can_split(SplitKind::TtHorz) {
            for qp in (quad_min..=quad_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::TtHorz), qp));
            }
        }

        let (bt_min, bt_max) = self.min_max_qp(part, base_qp, QpSplitClass::Binary);
        if part.can_split(SplitKind::BtVert) {
            for qp in (bt_min..=bt_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::BtVert), qp));
            }
            ctx.flags.did_vert_split = true;
        }
        if part.can_split(SplitKind::BtHorz) {
            for qp in (bt_min..=bt_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::BtHorz), qp));
            }
            ctx.flags.did_horz_split = true;
        }
        if ctx.flags.qt_before_bt {
            for qp in (quad_min..=quad_max).rev() {
                ctx.push(Candidate::new(TestMode::Split(SplitKind::Quad), qp));
            }
        }

        ctx.push(Candidate::new(TestMode::PostDontSplit, base_qp));

        // ---- non-split candidates ----
        let (ns_min, ns_max) = self.min_max_qp(part, base_qp, QpSplitClass::NoSplit);
        let lowest_qp = ns_min;

        let try_intra = !part.is_cons_inter();
        let try_inter = !part.is_cons_intra();
        let try_ibc = try_intra && part.tree() != TreeKind::SeparateChroma;
        let is_4x4 = area.width == 4 && area.height == 4;

        for qp_loop in (ns_min..=ns_max).rev() {
            let qp = qp_loop.max(lowest_qp);

            let reusing = self.config.heuristics.reuse_cu_results
                && self.best_cache.is_valid(&area, part, qp, slice.poc);
            ctx.flags.is_reusing_cu = reusing;
            if reusing {
                ctx.push(Candidate::new(TestMode::RecoCached, qp));
            }

            if try_intra {
                let palette_legal = slice.tools.palette;
                if palette_legal
                    && (part.tree() != TreeKind::Joint || slice.is_irap || is_4x4)
                {
                    ctx.push(Candidate::new(TestMode::Palette, qp));
                }
                ctx.push(Candidate::new(TestMode::Intra, qp));
                if palette_legal && part.tree() == TreeKind::Joint && !slice.is_irap && !is_4x4 {
                    ctx.push(Candidate::new(TestMode::Palette, qp));
                }
            }
            if slice.tools.ibc && try_ibc {
                ctx.push(Candidate::new(TestMode::Ibc, qp));
                ctx.push(Candidate::new(TestMode::IbcMerge, qp));
            }
        }

        if !slice.is_irap && !is_4x4 && try_inter {
            for qp_loop in (ns_min..=ns_max).rev() {
                let qp = qp_loop.max(lowest_qp);
                if self.config.imv.enabled {
                    ctx.push(Candidate::new(TestMode::InterMe { imv: 4 }, qp));
                }
                if self.config.imv.enabled || slice.tools.affine_amvr {
                    let imv = if self.config.imv.four_pel_fast { 3 } else { 2 };
                    ctx.push(Candidate::new(TestMode::InterMe { imv }, qp));
                    ctx.push(Candidate::new(TestMode::InterMe { imv: 1 }, qp));
                }
                if self.config.heuristics.early_skip_detection {
                    if slice.tools.geo && slice.is_inter_b() {
                        ctx.push(Candidate::new(TestMode::MergeGeo, qp));
                    }
                    ctx.push(Candidate::new(TestMode::MergeSkip, qp));
                    if slice.tools.affine || slice.tools.sbtmvp {
                        ctx.push(Candidate::new(TestMode::Affine, qp));
                    }
                    ctx.push(Candidate::new(TestMode::InterMe { imv: 0 }, qp));
                } else {
                    ctx.push(Candidate::new(TestMode::InterMe { imv: 0 }, qp));
                    if slice.tools.geo && slice.is_inter_b() {
                        ctx.push(Candidate::new(TestMode::MergeGeo, qp));
                    }
                    ctx.push(Candidate::new(TestMode::MergeSkip, qp));
                    if slice.tools.affine || slice.tools.sbtmvp {
                        ctx.push(Candidate::new(TestMode::Affine, qp));
                    }
                }
                if slice.tools.hash_me {
                    let min_dim = area.min_dim();
                    if (4..128).contains(&min_dim) {
                        ctx.push(Candidate::new(TestMode::HashInter, qp));
                    }
                }
            }
        }

        trace!(
            area = %area,
            candidates = ctx.candidates.len(),
            qt_before_bt = ctx.flags.qt_before_bt,
            "CU level opened"
        );
        self.stack.push(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("enumerator_test.rs");
}
