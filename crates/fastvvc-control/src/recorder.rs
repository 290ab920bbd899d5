//! Result recording
//!
//! After an RD trial, the controller updates the per-branch best-cost
//! slots, derives the TT/QT follow-up flags from the attempt's children,
//! adopts the trial as the level best when it wins the cost comparison,
//! and emits dataset cost rows in collection mode.

use tracing::{trace, warn};

use fastvvc_core::{Candidate, CodingStructure, PartitionView, SplitKind, StatEvent, TestMode};
use fastvvc_dataset::RowHeader;

use crate::controller::ModeController;
use crate::ctx::BestEntry;

impl ModeController {
    /// After an intra trial, whether the remaining LFNST passes can be
    /// skipped: the winning intra candidate carries no residual.
    pub fn should_skip_other_lfnst(&self, cand: Candidate, temp: &CodingStructure) -> bool {
        if cand.mode != TestMode::Intra {
            return false;
        }
        let temp_no_residual = temp.first_cu().is_some_and(|cu| !cu.root_cbf);
        match self.ctx().best.as_ref() {
            None => temp_no_residual,
            Some(best) => {
                let best_is_single_intra = best.cs.is_single_cu()
                    && best.cs.first_cu().is_some_and(|cu| cu.pred.is_intra());
                let temp_is_intra = temp.first_cu().is_some_and(|cu| cu.pred.is_intra());
                if (temp.cost >= best.cs.cost && best_is_single_intra)
                    || (temp.cost < best.cs.cost && temp_is_intra)
                {
                    temp_no_residual
                } else {
                    false
                }
            }
        }
    }

    /// Fold the RD result of `cand` into the open level. Returns `true`
    /// when the result was adopted as the new level best (the structure
    /// is then owned by the context).
    pub fn record_result(
        &mut self,
        cand: Candidate,
        temp: CodingStructure,
        part: &dyn PartitionView,
    ) -> bool {
        let area = part.curr_area();

        // cost rows for offline training, split trials of inter slices only
        if self.collecting() && !self.slice_ctx().is_intra() && cand.mode.is_split() {
            let header = RowHeader {
                poc: self.slice_ctx().poc,
                height: area.height,
                width: area.width,
                x: area.x,
                y: area.y,
                split_series: part.split_series(),
            };
            if let Some(sink) = self.dataset.as_mut() {
                if let Err(err) = sink.write_cost_row(header, cand.mode.dataset_tag(), temp.cost) {
                    warn!(%err, "cost row dropped");
                }
            }
        }

        match cand.mode {
            TestMode::Split(SplitKind::BtHorz) => self.ctx_mut().costs.horz = temp.cost,
            TestMode::Split(SplitKind::BtVert) => self.ctx_mut().costs.vert = temp.cost,
            TestMode::Split(SplitKind::Quad) => self.ctx_mut().costs.qt = temp.cost,
            TestMode::Split(SplitKind::TtHorz) => self.ctx_mut().costs.trih = temp.cost,
            TestMode::Split(SplitKind::TtVert) => self.ctx_mut().costs.triv = temp.cost,
            _ => {}
        }

        // IMV cost slots feed the 4-pel quick-reject
        if self.config.imv.four_pel_fast && self.config.imv.enabled {
            if let TestMode::InterMe { imv } = cand.mode {
                let costs = &mut self.ctx_mut().costs;
                if imv == 1 {
                    costs.imv = costs.imv.min(temp.cost);
                } else if imv == 0 {
                    costs.no_imv = costs.no_imv.min(temp.cost);
                }
            }
        }

        if cand.mode == TestMode::Split(SplitKind::Quad) {
            let max_qt = temp.cus.iter().map(|cu| cu.qt_depth).max().unwrap_or(0);
            self.ctx_mut().max_qt_sub_depth = max_qt;
        }

        // TT in a direction stays scheduled only when the BT children were
        // asymmetric or the MTT budget is nearly exhausted
        let max_mt_depth = self.slice_ctx().max_bt_depth + part.implicit_bt_depth();
        if cand.mode == TestMode::Split(SplitKind::BtHorz) && temp.cus.len() > 2 {
            let half = area.height / 2;
            let first = temp.cus.first().map_or(half, |cu| cu.area.height);
            let last = temp.cus.last().map_or(half, |cu| cu.area.height);
            self.ctx_mut().flags.do_trih_split =
                first < half || last < half || part.mt_depth() + 1 == max_mt_depth;
        } else if cand.mode == TestMode::Split(SplitKind::BtVert) && temp.cus.len() > 2 {
            let half = area.width / 2;
            let first = temp.cus.first().map_or(half, |cu| cu.area.width);
            let last = temp.cus.last().map_or(half, |cu| cu.area.width);
            self.ctx_mut().flags.do_triv_split =
                first < half || last < half || part.mt_depth() + 1 == max_mt_depth;
        }

        // adopt as level best on a win of the (deblock-aware) cost
        let apply_db = temp.use_db_cost;
        let adopted = temp.cost != f64::MAX
            && self.ctx().best.as_ref().map_or(true, |best| {
                temp.adoption_cost(apply_db) < best.cs.adoption_cost(apply_db)
            });
        if adopted {
            trace!(area = %area, mode = ?cand.mode, cost = temp.cost, "level best adopted");
            if cand.mode.is_inter() {
                self.ctx_mut().best_inter_cost = temp.cost;
            }
            self.ctx_mut().best = Some(BestEntry { cs: temp, mode: cand });
            self.stats.record(
                (area.width, area.height),
                cand.mode.split_kind(),
                part.curr_subdiv(),
                StatEvent::AdoptedBest,
            );
        }
        adopted
    }
}

#[cfg(test)]
mod tests {
    include!("recorder_test.rs");
}
