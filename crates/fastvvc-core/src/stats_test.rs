// Stats sink tests

use super::*;

#[test]
fn test_counter_stats_accumulates() {
    let mut stats = CounterStats::new();
    stats.record((32, 32), Some(SplitKind::Quad), 1, StatEvent::Tried);
    stats.record((32, 32), Some(SplitKind::Quad), 1, StatEvent::Tried);
    stats.record(
        (32, 32),
        Some(SplitKind::BtHorz),
        1,
        StatEvent::PrunedByClassifier,
    );

    assert_eq!(
        stats.count((32, 32), Some(SplitKind::Quad), 1, StatEvent::Tried),
        2
    );
    assert_eq!(
        stats.count(
            (32, 32),
            Some(SplitKind::BtHorz),
            1,
            StatEvent::PrunedByClassifier
        ),
        1
    );
    assert_eq!(stats.count((64, 64), None, 0, StatEvent::Tried), 0);
}

#[test]
fn test_total_sums_across_keys() {
    let mut stats = CounterStats::new();
    stats.record((16, 16), None, 2, StatEvent::AdoptedBest);
    stats.record((32, 32), None, 1, StatEvent::AdoptedBest);
    stats.record((32, 32), Some(SplitKind::Quad), 1, StatEvent::Tried);
    assert_eq!(stats.total(StatEvent::AdoptedBest), 2);
    assert_eq!(stats.total(StatEvent::Tried), 1);
}

#[test]
fn test_null_stats_is_a_sink() {
    let mut stats = NullStats;
    stats.record((8, 8), None, 0, StatEvent::Tried);
}
