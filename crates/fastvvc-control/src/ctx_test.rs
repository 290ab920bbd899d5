// Compression-context tests

use super::*;
use fastvvc_core::{PredClass, TestMode};

#[test]
fn test_cost_slots_start_unset() {
    let ctx = ComprCuCtx::new(CuArea::new(0, 0, 64, 64), 0, 4);
    assert_eq!(ctx.costs.non_split, f64::MAX);
    assert_eq!(ctx.costs.qt, f64::MAX);
    assert_eq!(ctx.costs.imv, f64::MAX * 0.5);
    assert_eq!(ctx.costs.no_imv, f64::MAX * 0.5);
    assert_eq!(ctx.best_cost(), f64::MAX);
}

#[test]
fn test_candidate_stack_is_lifo() {
    let mut ctx = ComprCuCtx::new(CuArea::new(0, 0, 32, 32), 0, 4);
    ctx.push(Candidate::new(TestMode::PostDontSplit, 32));
    ctx.push(Candidate::new(TestMode::Intra, 32));
    ctx.push(Candidate::new(TestMode::MergeSkip, 32));
    assert_eq!(ctx.pop().unwrap().mode, TestMode::MergeSkip);
    assert_eq!(ctx.pop().unwrap().mode, TestMode::Intra);
    assert_eq!(ctx.pop().unwrap().mode, TestMode::PostDontSplit);
    assert!(ctx.pop().is_none());
}

#[test]
fn test_tt_flags_default_enabled() {
    let ctx = ComprCuCtx::new(CuArea::new(0, 0, 32, 32), 0, 4);
    assert!(ctx.flags.do_trih_split);
    assert!(ctx.flags.do_triv_split);
    assert!(!ctx.flags.did_quad_split);
}

#[test]
fn test_best_entry_queries() {
    let area = CuArea::new(0, 0, 16, 16);
    let mut ctx = ComprCuCtx::new(area, 0, 4);
    assert!(!ctx.best_is_single_cu());
    ctx.best = Some(BestEntry {
        cs: CodingStructure::single(area, PredClass::Inter { merge: true, geo: false }, 150.0),
        mode: Candidate::new(TestMode::MergeSkip, 32),
    });
    assert!(ctx.best_is_single_cu());
    assert_eq!(ctx.best_cost(), 150.0);
}

#[test]
fn test_inter_had_active_until_cleared() {
    let mut ctx = ComprCuCtx::new(CuArea::new(0, 0, 16, 16), 0, 4);
    assert!(ctx.inter_had_active());
    ctx.inter_had = 0;
    assert!(!ctx.inter_had_active());
}
