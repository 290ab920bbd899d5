// Result recording tests

use super::*;
use crate::controller::NeighborContext;
use fastvvc_core::{
    CuArea, CuRecord, EncoderConfig, PartitionState, PredClass, SliceContext, SplitKind,
};
use fastvvc_forest::ForestModel;

fn open_level() -> (ModeController, PartitionState) {
    let mut ctrl = ModeController::new(EncoderConfig::baseline(), ForestModel::empty());
    let slice = SliceContext::inter_defaults(256, 256);
    let part = PartitionState::ctu_root(
        CuArea::new(0, 0, 128, 128),
        slice.min_qt_size,
        slice.max_bt_depth,
        256,
        256,
    )
    .descend(SplitKind::Quad, 0); // 64x64
    ctrl.begin_slice(slice).unwrap();
    ctrl.init_cu_level(&part, &NeighborContext::default()).unwrap();
    (ctrl, part)
}

fn split_result(part: &PartitionState, kind: SplitKind, cost: f64) -> CodingStructure {
    let area = part.curr_area();
    let mut cs = CodingStructure::unset(area);
    cs.cost = cost;
    cs.cus = area
        .split_children(kind)
        .into_iter()
        .map(|child| {
            let mut cu = CuRecord::new(child, PredClass::Inter { merge: true, geo: false });
            cu.qt_depth = part.qt_depth + u32::from(kind == SplitKind::Quad);
            cu
        })
        .collect();
    cs.num_pus = cs.cus.len();
    cs.num_tus = cs.cus.len();
    cs
}

#[test]
fn test_split_cost_slots() {
    let (mut ctrl, part) = open_level();
    for (kind, cost) in [
        (SplitKind::Quad, 100.0),
        (SplitKind::BtHorz, 90.0),
        (SplitKind::BtVert, 80.0),
        (SplitKind::TtHorz, 70.0),
        (SplitKind::TtVert, 60.0),
    ] {
        let cand = Candidate::new(TestMode::Split(kind), 32);
        ctrl.record_result(cand, split_result(&part, kind, cost), &part);
    }
    let costs = &ctrl.ctx().costs;
    assert_eq!(costs.qt, 100.0);
    assert_eq!(costs.horz, 90.0);
    assert_eq!(costs.vert, 80.0);
    assert_eq!(costs.trih, 70.0);
    assert_eq!(costs.triv, 60.0);
}

#[test]
fn test_imv_slots_track_minimum() {
    let (mut ctrl, part) = open_level();
    let area = part.curr_area();
    let mk = |cost| CodingStructure::single(area, PredClass::Inter { merge: false, geo: false }, cost);

    ctrl.record_result(Candidate::new(TestMode::InterMe { imv: 0 }, 32), mk(500.0), &part);
    ctrl.record_result(Candidate::new(TestMode::InterMe { imv: 1 }, 32), mk(700.0), &part);
    ctrl.record_result(Candidate::new(TestMode::InterMe { imv: 0 }, 32), mk(600.0), &part);
    assert_eq!(ctrl.ctx().costs.no_imv, 500.0);
    assert_eq!(ctrl.ctx().costs.imv, 700.0);
    // imv 3/4 trials do not touch the slots
    ctrl.record_result(Candidate::new(TestMode::InterMe { imv: 3 }, 32), mk(1.0), &part);
    assert_eq!(ctrl.ctx().costs.imv, 700.0);
}

#[test]
fn test_quad_records_max_sub_depth() {
    let (mut ctrl, part) = open_level();
    let mut cs = split_result(&part, SplitKind::Quad, 100.0);
    cs.cus[2].qt_depth = 4;
    ctrl.record_result(Candidate::new(TestMode::Split(SplitKind::Quad), 32), cs, &part);
    assert_eq!(ctrl.ctx().max_qt_sub_depth, 4);
}

#[test]
fn test_bt_children_gate_tt() {
    // symmetric BT_H children at full half-height: TT_H stops paying off
    let (mut ctrl, part) = open_level();
    let area = part.curr_area();
    let mut cs = split_result(&part, SplitKind::BtHorz, 100.0);
    // three CUs, outer ones at exactly half the parent height
    cs.cus = vec![
        CuRecord::new(
            CuArea::new(area.x, area.y, area.width, area.height / 2),
            PredClass::Inter { merge: true, geo: false },
        ),
        CuRecord::new(
            CuArea::new(area.x, area.y + area.height / 2, area.width, area.height / 4),
            PredClass::Inter { merge: true, geo: false },
        ),
        CuRecord::new(
            CuArea::new(
                area.x,
                area.y + 3 * area.height / 4,
                area.width,
                area.height / 2,
            ),
            PredClass::Inter { merge: true, geo: false },
        ),
    ];
    ctrl.record_result(Candidate::new(TestMode::Split(SplitKind::BtHorz), 32), cs, &part);
    assert!(!ctrl.ctx().flags.do_trih_split);

    // a minor child keeps TT_H scheduled
    let (mut ctrl, part) = open_level();
    let mut cs = split_result(&part, SplitKind::BtHorz, 100.0);
    cs.cus = vec![
        CuRecord::new(
            CuArea::new(area.x, area.y, area.width, area.height / 4),
            PredClass::Inter { merge: true, geo: false },
        ),
        CuRecord::new(
            CuArea::new(area.x, area.y + area.height / 4, area.width, area.height / 4),
            PredClass::Inter { merge: true, geo: false },
        ),
        CuRecord::new(
            CuArea::new(area.x, area.y + area.height / 2, area.width, area.height / 2),
            PredClass::Inter { merge: true, geo: false },
        ),
    ];
    ctrl.record_result(Candidate::new(TestMode::Split(SplitKind::BtHorz), 32), cs, &part);
    assert!(ctrl.ctx().flags.do_trih_split);
}

#[test]
fn test_two_child_bt_leaves_tt_flag_alone() {
    let (mut ctrl, part) = open_level();
    let cs = split_result(&part, SplitKind::BtVert, 100.0); // exactly 2 CUs
    ctrl.record_result(Candidate::new(TestMode::Split(SplitKind::BtVert), 32), cs, &part);
    assert!(ctrl.ctx().flags.do_triv_split);
}

#[test]
fn test_adoption_prefers_lower_cost() {
    let (mut ctrl, part) = open_level();
    let area = part.curr_area();
    let merge = Candidate::new(TestMode::MergeSkip, 32);
    let me = Candidate::new(TestMode::InterMe { imv: 0 }, 32);

    let first = CodingStructure::single(area, PredClass::Inter { merge: true, geo: false }, 400.0);
    assert!(ctrl.record_result(merge, first, &part));
    let worse = CodingStructure::single(area, PredClass::Inter { merge: false, geo: false }, 450.0);
    assert!(!ctrl.record_result(me, worse, &part));
    let better = CodingStructure::single(area, PredClass::Inter { merge: false, geo: false }, 350.0);
    assert!(ctrl.record_result(me, better, &part));
    assert_eq!(ctrl.ctx().best_cost(), 350.0);
    assert_eq!(ctrl.ctx().best_inter_cost, 350.0);
}

#[test]
fn test_adoption_honors_db_offset() {
    let (mut ctrl, part) = open_level();
    let area = part.curr_area();
    let cand = Candidate::new(TestMode::MergeSkip, 32);

    let mut first = CodingStructure::single(area, PredClass::Inter { merge: true, geo: false }, 400.0);
    first.cost_db_offset = 0.0;
    assert!(ctrl.record_result(cand, first, &part));

    // nominal win, but the deblock correction overturns it
    let mut second = CodingStructure::single(area, PredClass::Inter { merge: true, geo: false }, 399.0);
    second.use_db_cost = true;
    second.cost_db_offset = 10.0;
    assert!(!ctrl.record_result(cand, second, &part));
}

#[test]
fn test_skip_other_lfnst() {
    let (mut ctrl, part) = open_level();
    let area = part.curr_area();

    // residual-free intra with no best yet: skip the other LFNST passes
    let mut cs = CodingStructure::single(area, PredClass::Intra, 200.0);
    cs.cus[0].root_cbf = false;
    let intra = Candidate::new(TestMode::Intra, 32);
    assert!(ctrl.should_skip_other_lfnst(intra, &cs));

    // residual present: keep searching
    let mut with_residual = CodingStructure::single(area, PredClass::Intra, 200.0);
    with_residual.cus[0].root_cbf = true;
    assert!(!ctrl.should_skip_other_lfnst(intra, &with_residual));

    // non-intra candidates never trigger the shortcut
    let merge = Candidate::new(TestMode::MergeSkip, 32);
    assert!(!ctrl.should_skip_other_lfnst(merge, &cs));

    // a losing intra against an inter best keeps searching
    let inter_best =
        CodingStructure::single(area, PredClass::Inter { merge: false, geo: false }, 100.0);
    ctrl.record_result(Candidate::new(TestMode::InterMe { imv: 0 }, 32), inter_best, &part);
    assert!(!ctrl.should_skip_other_lfnst(intra, &cs));
}

#[test]
fn test_infinite_cost_never_adopted() {
    let (mut ctrl, part) = open_level();
    let cs = CodingStructure::unset(part.curr_area());
    assert!(!ctrl.record_result(Candidate::new(TestMode::Intra, 32), cs, &part));
    assert!(ctrl.ctx().best.is_none());
}
