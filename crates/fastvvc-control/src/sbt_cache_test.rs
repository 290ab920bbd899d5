// SBT save/load tests

use super::*;

#[test]
fn test_miss_on_fresh_cache() {
    let cache = SbtSaveLoad::new();
    assert_eq!(cache.find_best_sbt(&CuArea::new(0, 0, 32, 16), 1234), None);
}

#[test]
fn test_save_and_find_by_sse() {
    let mut cache = SbtSaveLoad::new();
    let area = CuArea::new(16, 0, 32, 16);
    assert!(cache.save_best_sbt(&area, 500, 2, 1));
    assert!(cache.save_best_sbt(&area, 900, 3, 0));
    assert_eq!(cache.find_best_sbt(&area, 900), Some((3, 0)));
    assert_eq!(cache.find_best_sbt(&area, 500), Some((2, 1)));
    assert_eq!(cache.find_best_sbt(&area, 501), None);
}

#[test]
fn test_slot_capacity() {
    let mut cache = SbtSaveLoad::new();
    let area = CuArea::new(0, 0, 16, 16);
    for i in 0..SBT_NUM_SL {
        assert!(cache.save_best_sbt(&area, i as u32, 0, 0));
    }
    assert!(!cache.save_best_sbt(&area, 999, 0, 0));
    assert_eq!(cache.find_best_sbt(&area, 999), None);
}

#[test]
fn test_reset_drops_history() {
    let mut cache = SbtSaveLoad::new();
    let area = CuArea::new(0, 0, 16, 16);
    cache.save_best_sbt(&area, 500, 2, 1);
    cache.reset();
    assert_eq!(cache.find_best_sbt(&area, 500), None);
}

#[test]
fn test_illegal_geometry_rejected() {
    let mut cache = SbtSaveLoad::new();
    assert!(!cache.save_best_sbt(&CuArea::new(0, 0, 20, 16), 1, 1, 1));
}
