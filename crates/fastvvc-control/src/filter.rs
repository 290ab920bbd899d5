//! Candidate filtering
//!
//! Every popped candidate runs through this chain before RD: sentinel side
//! effects, hash/early-skip fast-outs, the picture-boundary rule, the
//! classifier gates, cached-result reuse, depth hints, and the per-mode
//! structural and heuristic rules retained from the baseline encoder.

use tracing::{trace, warn};

use fastvvc_core::{
    Candidate, CuArea, PartitionView, PictureView, SplitKind, StatEvent, TestMode, TreeKind,
};
use fastvvc_dataset::{FeatureRowKind, RowHeader};
use fastvvc_features::{extract, NonSplitClass};
use fastvvc_forest::{Decision, DecisionGate, GateVerdicts};

use crate::controller::ModeController;

impl ModeController {
    /// Decide whether `cand` is worth an RD trial. Side effects on the
    /// level context (flag clearing, sentinel work) happen here even when
    /// the answer is `false`.
    pub(crate) fn try_mode(
        &mut self,
        cand: Candidate,
        pic: &PictureView<'_>,
        part: &dyn PartitionView,
    ) -> bool {
        let area = part.curr_area();
        let slice_is_intra = self.slice_ctx().is_intra();
        let classifier_shape = Self::classifier_shape(area.width, area.height);

        // sentinel work: one-time classifier consultation for this level
        if cand.mode == TestMode::PostDontSplit
            && (self.predicting() || self.collecting())
            && !slice_is_intra
            && classifier_shape
            && !self.ctx().classified
        {
            self.run_classifier(pic, part);
        }
        if cand.mode == TestMode::PostDontSplit {
            let empty = self
                .ctx()
                .best
                .as_ref()
                .map_or(true, |b| b.cs.cus.is_empty());
            self.ctx_mut().flags.empty_cu_when_full = empty;
        }

        // a perfect hash match leaves only the inter merge family in play
        if self.hash_perfect_match
            && !matches!(
                cand.mode,
                TestMode::MergeSkip
                    | TestMode::InterMe { .. }
                    | TestMode::Affine
                    | TestMode::MergeGeo
            )
        {
            return false;
        }

        // after an early skip, only splits and inter modes remain
        if self.ctx().early_skip
            && self.config.heuristics.early_skip_detection
            && !cand.mode.is_split()
            && !cand.mode.is_inter()
        {
            return false;
        }

        let implicit = part.implicit_split();

        // classifier gates
        if self.predicting()
            && !slice_is_intra
            && classifier_shape
            && !(self.config.heuristics.disable_when_empty_cu
                && self.ctx().flags.empty_cu_when_full)
            && !self.classifier_gates(cand, part)
        {
            return false;
        }

        // boundary CUs may only take the implicit split
        if let Some(implicit) = implicit {
            return if cand.mode == TestMode::Split(SplitKind::Quad) {
                part.can_split(SplitKind::Quad)
            } else {
                cand.mode.split_kind() == Some(implicit)
            };
        }

        // a replayable cached result displaces all other non-split work
        if self.ctx().flags.is_reusing_cu {
            if cand.mode == TestMode::RecoCached {
                self.stats.record(
                    (area.width, area.height),
                    None,
                    part.curr_subdiv(),
                    StatEvent::CacheReplay,
                );
                return true;
            }
            if cand.mode.is_no_split() {
                return false;
            }
        }

        // depth hints
        if self.ctx().min_depth > part.qt_depth() && part.can_split(SplitKind::Quad) {
            return cand.mode == TestMode::Split(SplitKind::Quad);
        }
        if cand.mode == TestMode::Split(SplitKind::Quad)
            && self.ctx().max_depth <= part.qt_depth()
        {
            return false;
        }

        // keep the best non-split cost slot current
        if self.ctx().best_is_single_cu() {
            let cost = self.ctx().best_cost();
            self.ctx_mut().costs.non_split = cost;
        }

        match cand.mode {
            TestMode::Intra => self.filter_intra(part),
            TestMode::Palette => self.filter_palette(part),
            TestMode::Ibc | TestMode::IbcMerge => {
                self.slice_ctx().tools.ibc && area.width < 128 && area.height < 128
            }
            TestMode::InterMe { .. }
            | TestMode::MergeSkip
            | TestMode::Affine
            | TestMode::MergeGeo
            | TestMode::HashInter => self.filter_inter(cand, part),
            TestMode::Split(kind) => self.filter_split(kind, pic, part),
            TestMode::PostDontSplit => self.finalize_non_split(part),
            TestMode::RecoCached => false,
        }
    }

    /// Extract features, consult the cascade (predict) or dump rows
    /// (collect). Runs once per level, at the sentinel.
    fn run_classifier(&mut self, pic: &PictureView<'_>, part: &dyn PartitionView) {
        let area = part.curr_area();
        let slice = self.slice_ctx();
        let base_qp = slice.base_qp;
        let poc = slice.poc;

        let class = match self.ctx().best.as_ref().map(|b| &b.cs) {
            Some(cs) if !cs.cus.is_empty() => {
                let cu = &cs.cus[0];
                let is_intra = cu.pred.is_intra();
                match cu.pred {
                    fastvvc_core::PredClass::Inter { merge, geo } => NonSplitClass {
                        is_intra,
                        is_inter: !merge,
                        is_merge: merge && !geo,
                        is_geo: geo,
                    },
                    _ => NonSplitClass {
                        is_intra,
                        ..NonSplitClass::default()
                    },
                }
            }
            _ => NonSplitClass::default(),
        };

        self.ctx_mut().classified = true;
        let bundle = match extract(pic, &area, base_qp, class) {
            Ok(bundle) => bundle,
            Err(err) => {
                trace!(area = %area, %err, "classifier skipped");
                self.ctx_mut().verdicts = GateVerdicts::undecided();
                return;
            }
        };

        if self.collecting() {
            let header = RowHeader {
                poc,
                height: area.height,
                width: area.width,
                x: area.x,
                y: area.y,
                split_series: part.split_series(),
            };
            if let Some(sink) = self.dataset.as_mut() {
                if area.width == area.height && area.width != 8 {
                    if let Err(err) =
                        sink.write_feature_row(header, FeatureRowKind::QtMtt, &bundle.qt_mtt)
                    {
                        warn!(%err, "feature row dropped");
                    }
                }
                if bundle.hor_ver_valid {
                    if let Err(err) =
                        sink.write_feature_row(header, FeatureRowKind::HorVer, &bundle.hor_ver)
                    {
                        warn!(%err, "feature row dropped");
                    }
                }
            }
            return;
        }

        if self.predicting() {
            let gate = DecisionGate::new(&self.model, self.config.gates.clone());
            let verdicts = gate.assess(area.width, area.height, &bundle);
            self.ctx_mut().verdicts = verdicts;
        }
    }

    /// The four classifier pruning rules. Clearing the branch flags keeps
    /// the downstream TT/QT heuristics consistent with the pruned search.
    fn classifier_gates(&mut self, cand: Candidate, part: &dyn PartitionView) -> bool {
        let verdicts = self.ctx().verdicts;
        let restrictive = self.config.heuristics.more_restrictive_skip;
        let area = part.curr_area();
        let Some(kind) = cand.mode.split_kind() else {
            return true;
        };

        let prune = |this: &mut Self| {
            this.stats.record(
                (area.width, area.height),
                Some(kind),
                part.curr_subdiv(),
                StatEvent::PrunedByClassifier,
            );
            false
        };

        if verdicts.qt == Decision::Force
            && kind != SplitKind::Quad
            && (!restrictive || self.ctx().flags.did_quad_split)
        {
            let flags = &mut self.ctx_mut().flags;
            flags.did_horz_split = false;
            flags.did_vert_split = false;
            flags.do_trih_split = false;
            flags.do_triv_split = false;
            return prune(self);
        }
        if verdicts.qt == Decision::Forbid && kind == SplitKind::Quad {
            let flags = self.ctx().flags;
            if !restrictive
                || flags.did_horz_split
                || flags.did_vert_split
                || flags.do_trih_split
                || flags.do_triv_split
            {
                self.ctx_mut().flags.did_quad_split = false;
                return prune(self);
            }
        }
        if verdicts.hor == Decision::Force
            && matches!(kind, SplitKind::BtVert | SplitKind::TtVert)
            && (!restrictive || self.ctx().flags.did_horz_split || self.ctx().flags.do_trih_split)
        {
            let flags = &mut self.ctx_mut().flags;
            flags.did_vert_split = false;
            flags.do_triv_split = false;
            return prune(self);
        }
        if verdicts.hor == Decision::Forbid
            && matches!(kind, SplitKind::BtHorz | SplitKind::TtHorz)
            && (!restrictive || self.ctx().flags.did_vert_split || self.ctx().flags.do_triv_split)
        {
            let flags = &mut self.ctx_mut().flags;
            flags.did_horz_split = false;
            flags.do_trih_split = false;
            return prune(self);
        }
        true
    }

    fn filter_intra(&mut self, part: &dyn PartitionView) -> bool {
        let slice = self.slice_ctx().clone();
        let heur = self.config.heuristics.clone();
        let area = part.curr_area();

        if heur.fast_lctu && area.area() > 4096 {
            return false;
        }
        if part.tree() == TreeKind::SeparateLuma && (area.width > 64 || area.height > 64) {
            return false;
        }

        let best_is_intra = self
            .ctx()
            .best
            .as_ref()
            .and_then(|b| b.cs.first_cu())
            .is_some_and(|cu| cu.pred.is_intra());
        if heur.pb_intra_fast
            && (!slice.is_intra() || slice.tools.ibc)
            && !self.ctx().inter_had_active()
            && self.ctx().best.is_some()
            && !best_is_intra
        {
            return false;
        }

        let have_best = self.ctx().best.is_some();
        if slice.tools.ibc && !have_best {
            return true;
        }
        if part.is_cons_intra() && !have_best {
            return true;
        }
        if area.width == 4 && area.height == 4 && !slice.is_intra() && !have_best {
            return true;
        }

        let related = self.blk_info.get(&area).cloned().unwrap_or_default();
        let best_mode = self.ctx().best.as_ref().map(|b| b.mode.mode);
        let best_cbf = self.ctx().best.as_ref().is_some_and(|b| b.cs.tu_cbf_luma);

        // avoid very complex intra when it is unlikely to win
        let intra_plausible = slice.is_irap
            || best_mode == Some(TestMode::Intra)
            || !have_best
            || (!heur.disable_intra_in_inter && (!related.is_inter || !related.is_ibc) && best_cbf);
        if !intra_plausible {
            return false;
        }

        if heur.ibc_no_intra_on_cbf0
            && matches!(best_mode, Some(TestMode::Ibc) | Some(TestMode::IbcMerge))
            && !best_cbf
        {
            return false;
        }

        if best_mode == Some(TestMode::Palette)
            && !slice.is_irap
            && part.tree() == TreeKind::Joint
            && !(area.width == 4 && area.height == 4)
        {
            return false;
        }

        if heur.fast_isp && related.related_cu_is_valid {
            let ctx = self.ctx_mut();
            ctx.isp.loaded = true;
            ctx.isp.pred_mode_val = related.isp_pred_mode_val;
            ctx.isp.best_isp_intra_mode = related.best_isp_intra_mode;
            ctx.isp.best_dct2_non_isp_cost = related.best_dct2_non_isp_cost;
            ctx.isp.best_non_dct2_cost = related.best_non_dct2_cost;
        }
        true
    }

    fn filter_palette(&self, part: &dyn PartitionView) -> bool {
        let area = part.curr_area();
        if area.width > 64 || area.height > 64 {
            return false;
        }
        if area.area() <= 16 {
            return false;
        }
        true
    }

    fn filter_inter(&self, cand: Candidate, part: &dyn PartitionView) -> bool {
        debug_assert!(
            !self.slice_ctx().is_intra(),
            "inter mode in an I-slice candidate list"
        );
        let area = part.curr_area();
        let related = self.blk_info.get(&area).cloned().unwrap_or_default();

        if let TestMode::InterMe { imv } = cand.mode {
            if imv == 0 {
                if !self.config.heuristics.early_skip_detection
                    && (related.is_skip || related.is_intra)
                {
                    return false;
                }
            } else if imv == 3
                && self.ctx().costs.no_imv * 1.06 < self.ctx().costs.imv
                && !self.slice_ctx().tools.affine_amvr
            {
                return false;
            }
        }

        if cand.mode == TestMode::Affine && related.is_intra {
            return false;
        }

        if cand.mode == TestMode::MergeGeo
            && (area.width < 8
                || area.height < 8
                || area.width > 64
                || area.height > 64
                || area.width >= 8 * area.height
                || area.height >= 8 * area.width)
        {
            return false;
        }
        true
    }

    fn filter_split(
        &mut self,
        kind: SplitKind,
        pic: &PictureView<'_>,
        part: &dyn PartitionView,
    ) -> bool {
        let slice = self.slice_ctx().clone();
        let heur = self.config.heuristics.clone();
        let area = part.curr_area();

        // skip-history rule: stop splitting when this and at least two
        // enclosing levels all settled on a skip CU
        let mut skip_score = 0;
        if (!slice.is_intra() || slice.tools.ibc) && self.ctx().flags.is_best_nosplit_skip {
            for ctx in self.stack.iter().rev().skip(1) {
                if ctx.flags.is_best_nosplit_skip {
                    skip_score += 1;
                } else {
                    break;
                }
            }
        }

        // TT only pays off on elongated shapes under a motion-search best
        if heur.tt_shape_speedup && kind.is_ternary() && self.ctx().best_is_single_cu() {
            let cu = self.ctx().best.as_ref().and_then(|b| b.cs.first_cu()).copied();
            let moving = cu.is_some_and(|cu| match cu.pred {
                fastvvc_core::PredClass::Inter { merge, geo } => !merge || geo,
                _ => false,
            });
            let shape_ok = match kind {
                SplitKind::TtHorz => {
                    matches!((area.width, area.height), (8, 64) | (4, 64) | (16, 64))
                }
                SplitKind::TtVert => {
                    matches!((area.width, area.height), (64, 8) | (64, 4) | (64, 16))
                }
                _ => false,
            };
            if !(moving && shape_ok) {
                return false;
            }
        }

        if !part.can_split(kind) || skip_score >= 2 {
            let flags = &mut self.ctx_mut().flags;
            match kind {
                SplitKind::BtHorz => flags.did_horz_split = false,
                SplitKind::BtVert => flags.did_vert_split = false,
                SplitKind::Quad => flags.did_quad_split = false,
                _ => {}
            }
            return false;
        }

        if heur.content_based_fast_qtbt && !self.content_allows_split(kind, pic, part) {
            return false;
        }

        // a deep skip best-CU ends the split search unless a split just won
        let best_cu = self.ctx().best.as_ref().and_then(|b| b.cs.first_cu()).copied();
        let last_was_split = self
            .ctx()
            .last_mode
            .is_some_and(|last| last.mode.is_split());
        if best_cu.is_some_and(|cu| cu.skip && cu.mt_depth >= self.skip_threshold)
            && !last_was_split
        {
            return false;
        }

        let mut feature_to_clear: Option<SplitKind> = None;
        match kind {
            SplitKind::Quad => {
                // after BT already explored shallow depths, QT is redundant
                if !self.ctx().flags.qt_before_bt {
                    if let (Some(cu), Some(best)) = (best_cu, self.ctx().best.as_ref()) {
                        let cu_br = best.cs.last_cu().copied();
                        let max_btd = slice.max_bt_depth;
                        let depth_budget = if slice.is_intra() && !slice.tools.ibc {
                            (3, 4)
                        } else {
                            (2, 3)
                        };
                        let redundant = ((cu.bt_depth == 0 && max_btd >= depth_budget.0)
                            || (cu.bt_depth == 1
                                && cu_br.is_some_and(|br| br.bt_depth == 1)
                                && max_btd >= depth_budget.1))
                            && area.width <= slice.max_tb_size
                            && area.height <= slice.max_tb_size
                            && self.ctx().flags.did_horz_split
                            && self.ctx().flags.did_vert_split;
                        if redundant {
                            return false;
                        }
                    }
                }
                if heur.early_cu
                    && self.ctx().best_cost() != f64::MAX
                    && best_cu.is_some_and(|cu| cu.skip)
                {
                    return false;
                }
            }
            SplitKind::BtHorz => feature_to_clear = Some(SplitKind::BtHorz),
            SplitKind::BtVert => feature_to_clear = Some(SplitKind::BtVert),
            SplitKind::TtHorz => {
                if self.ctx().flags.did_horz_split
                    && best_cu
                        .is_some_and(|cu| cu.bt_depth == part.bt_depth() && !cu.root_cbf)
                {
                    return false;
                }
                if !self.ctx().flags.do_trih_split {
                    return false;
                }
            }
            SplitKind::TtVert => {
                if self.ctx().flags.did_vert_split
                    && best_cu
                        .is_some_and(|cu| cu.bt_depth == part.bt_depth() && !cu.root_cbf)
                {
                    return false;
                }
                if !self.ctx().flags.do_triv_split {
                    return false;
                }
            }
        }

        // below a deep QT winner, MTT exploration cannot pay off
        if kind != SplitKind::Quad
            && self.ctx().flags.qt_before_bt
            && self.ctx().flags.did_quad_split
            && self.ctx().max_qt_sub_depth > part.qt_depth() + 1
        {
            if let Some(cleared) = feature_to_clear {
                let flags = &mut self.ctx_mut().flags;
                match cleared {
                    SplitKind::BtHorz => flags.did_horz_split = false,
                    SplitKind::BtVert => flags.did_vert_split = false,
                    _ => {}
                }
            }
            return false;
        }

        if kind == SplitKind::Quad {
            self.ctx_mut().flags.did_quad_split = true;
        }

        // splits must not create CUs straddling the parallel merge level
        if slice.parallel_merge_log2 > 2 {
            let size = 1u32 << slice.parallel_merge_log2;
            if !slice.is_intra() && (area.width > size || area.height > size) {
                let blocked = match kind {
                    SplitKind::BtHorz => area.height <= size,
                    SplitKind::BtVert => area.width <= size,
                    SplitKind::TtHorz => area.height <= 2 * size,
                    SplitKind::TtVert => area.width <= 2 * size,
                    SplitKind::Quad => false,
                };
                if blocked {
                    return false;
                }
            }
        }
        true
    }

    /// Directional-gradient split pruning (content-based fast QTBT)
    fn content_allows_split(
        &self,
        kind: SplitKind,
        pic: &PictureView<'_>,
        part: &dyn PartitionView,
    ) -> bool {
        let all_intra = self.config.heuristics.all_intra;
        let area = part.curr_area();
        let (w, h) = (area.width, area.height);

        let cond = if all_intra {
            part.bt_depth() == 0
        } else {
            h > 32 && w > 32
        };
        if w == h && cond && kind != SplitKind::Quad {
            let th = if all_intra { 1.2 } else { 1.0 };
            let mut hor_val = 0.0f64;
            let mut ver_val = 0.0f64;
            let mut dup_val = 0.0f64;
            let mut dow_val = 0.0f64;
            for j in 0..w - 1 {
                for k in 0..h - 1 {
                    let p = |x: u32, y: u32| pic.luma.at(area.x + x, area.y + y) as f64;
                    hor_val += (p(j + 1, k) - p(j, k)).abs();
                    ver_val += (p(j, k + 1) - p(j, k)).abs();
                    dow_val += (p(j + 1, k) - p(j, k + 1)).abs();
                    dup_val += (p(j + 1, k + 1) - p(j, k)).abs();
                }
            }
            let sqrt2 = std::f64::consts::SQRT_2;
            if hor_val > th * ver_val
                && sqrt2 * hor_val > th * dow_val
                && sqrt2 * hor_val > th * dup_val
                && kind.is_horizontal()
            {
                return false;
            }
            if th * dup_val < sqrt2 * ver_val
                && th * dow_val < sqrt2 * ver_val
                && th * hor_val < ver_val
                && kind.is_vertical()
            {
                return false;
            }
        }

        if all_intra && w <= 32 && h <= 32 && part.bt_depth() > 1 {
            let best = self.ctx().best.as_ref();
            let no_residual = best.is_some_and(|b| {
                b.cs.num_tus == 1
                    && b.cs.first_cu().is_some_and(|cu| !cu.root_cbf)
            });
            if no_residual {
                return false;
            }
        }
        true
    }

    /// Terminal sentinel work: the non-split phase of this level is over.
    /// Never emitted as a mode; always returns `false`.
    fn finalize_non_split(&mut self, part: &dyn PartitionView) -> bool {
        let area = part.curr_area();
        let poc = self.slice_ctx().poc;

        let best_is_split = self
            .ctx()
            .best
            .as_ref()
            .is_some_and(|b| b.mode.mode.is_split());
        let Some(best) = self.ctx().best.as_ref() else {
            return false;
        };
        if best_is_split {
            return false;
        }

        if self.config.heuristics.reuse_cu_results {
            let cs = best.cs.clone();
            let mode = best.mode;
            self.best_cache.store(&cs, mode, part, poc);
        }

        // an intra-constrained traversal does not own the shared caches
        if part.is_cons_intra() {
            return false;
        }

        self.write_back_coded_info(&area);
        false
    }

    /// Record the best non-split outcome into the per-geometry cache
    fn write_back_coded_info(&mut self, area: &CuArea) {
        let Some(best) = self.ctx().best.as_ref() else {
            return;
        };
        let Some(cu) = best.cs.first_cu().copied() else {
            return;
        };
        let best_cost = best.cs.cost;
        let isp = self.ctx().isp;
        let color_transform = self.slice_ctx().tools.color_transform;
        let rgb_format = self.config.heuristics.rgb_format;
        let fast_isp = self.config.heuristics.fast_isp;

        let color_space_option = |applied: bool, root_cbf: bool| -> u8 {
            let first = if rgb_format {
                applied && root_cbf
            } else {
                !applied || !root_cbf
            };
            if first {
                1
            } else {
                2
            }
        };

        if let Some(related) = self.blk_info.get_mut(area) {
            match cu.pred {
                fastvvc_core::PredClass::Inter { .. } => {
                    related.is_inter = true;
                    related.is_skip |= cu.skip;
                    related.is_mmvd_skip |= cu.mmvd_skip;
                    related.bcw_idx = cu.bcw_idx;
                    if color_transform {
                        related.select_color_space_option =
                            color_space_option(cu.color_transform, cu.root_cbf);
                    }
                }
                fastvvc_core::PredClass::Ibc => {
                    related.is_ibc = true;
                    related.is_skip |= cu.skip;
                    if color_transform {
                        related.select_color_space_option =
                            color_space_option(cu.color_transform, cu.root_cbf);
                    }
                }
                fastvvc_core::PredClass::Intra | fastvvc_core::PredClass::Palette => {
                    related.is_intra = true;
                    if fast_isp
                        && isp.was_tested
                        && (!related.related_cu_is_valid || best_cost < related.best_cost)
                    {
                        related.isp_pred_mode_val = isp.pred_mode_val;
                        related.best_isp_intra_mode = isp.best_isp_intra_mode;
                        related.best_dct2_non_isp_cost = isp.best_dct2_non_isp_cost;
                        related.best_non_dct2_cost = isp.best_non_dct2_cost;
                        related.best_cost = best_cost;
                        related.related_cu_is_valid = true;
                    }
                }
            }
        }
        let skip = cu.skip;
        self.ctx_mut().flags.is_best_nosplit_skip = skip;
    }
}
