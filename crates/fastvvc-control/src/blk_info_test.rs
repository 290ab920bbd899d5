// Block-info cache tests

use super::*;

#[test]
fn test_fresh_cache_is_empty() {
    let cache = BlockInfoCache::new();
    let area = CuArea::new(0, 0, 16, 16);
    let info = cache.get(&area).unwrap();
    assert!(!info.is_inter && !info.is_intra && !info.is_skip);
    assert_eq!(info.best_cost, f64::MAX);
}

#[test]
fn test_illegal_geometry_has_no_slot() {
    let cache = BlockInfoCache::new();
    assert!(cache.get(&CuArea::new(0, 0, 12, 16)).is_none());
}

#[test]
fn test_slots_keyed_by_shape_and_position() {
    let mut cache = BlockInfoCache::new();
    let a = CuArea::new(0, 0, 16, 16);
    let b = CuArea::new(0, 0, 16, 8);
    cache.get_mut(&a).unwrap().is_skip = true;
    assert!(cache.is_skip(&a));
    assert!(!cache.is_skip(&b));
}

#[test]
fn test_same_position_in_next_ctu_shares_slot() {
    let mut cache = BlockInfoCache::new();
    cache.get_mut(&CuArea::new(16, 0, 16, 16)).unwrap().is_inter = true;
    // +128 in x wraps to the same per-CTU slot
    assert!(cache.is_inter(&CuArea::new(144, 0, 16, 16)));
}

#[test]
fn test_reset_clears_everything() {
    let mut cache = BlockInfoCache::new();
    let area = CuArea::new(32, 32, 32, 32);
    cache.get_mut(&area).unwrap().is_intra = true;
    cache.set_bcw_idx(&area, 3);
    cache.reset();
    assert!(!cache.get(&area).unwrap().is_intra);
    assert_eq!(cache.bcw_idx(&area), 0);
}

#[test]
fn test_mv_save_slots() {
    let mut cache = BlockInfoCache::new();
    let area = CuArea::new(0, 0, 32, 32);
    cache.set_mv(&area, 0, 1, Mv::new(12, -4));
    assert_eq!(cache.mv(&area, 0, 1), Some(Mv::new(12, -4)));
    assert_eq!(cache.mv(&area, 1, 1), None);
    // out-of-range reference indices are ignored
    cache.set_mv(&area, 0, MAX_STORED_CU_REFS, Mv::new(1, 1));
    assert_eq!(cache.mv(&area, 0, MAX_STORED_CU_REFS), None);
}

#[test]
fn test_merge_most_recent_wins() {
    let mut base = BlockInfoCache::new();
    let area = CuArea::new(0, 0, 16, 16);
    base.get_mut(&area).unwrap().bcw_idx = 1;

    // a worker clone advances past the parent write
    let mut worker = BlockInfoCache::new();
    worker.merge_from(&base);
    worker.get_mut(&area).unwrap().bcw_idx = 2;

    base.merge_from(&worker);
    assert_eq!(base.bcw_idx(&area), 2);

    // a stale cache does not overwrite the newer slot
    let stale = BlockInfoCache::new();
    base.merge_from(&stale);
    assert_eq!(base.bcw_idx(&area), 2);
}
