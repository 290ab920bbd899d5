// Test-mode classification tests

use super::*;

#[test]
fn test_split_classification() {
    assert!(TestMode::Split(SplitKind::Quad).is_split());
    assert!(TestMode::Split(SplitKind::TtVert).is_split());
    assert!(!TestMode::Intra.is_split());
    assert!(!TestMode::PostDontSplit.is_split());
}

#[test]
fn test_inter_classification() {
    assert!(TestMode::InterMe { imv: 0 }.is_inter());
    assert!(TestMode::MergeSkip.is_inter());
    assert!(TestMode::Affine.is_inter());
    assert!(TestMode::MergeGeo.is_inter());
    assert!(TestMode::HashInter.is_inter());
    assert!(!TestMode::Ibc.is_inter());
    assert!(!TestMode::Intra.is_inter());
    assert!(!TestMode::Split(SplitKind::Quad).is_inter());
}

#[test]
fn test_no_split_excludes_sentinel() {
    assert!(TestMode::Intra.is_no_split());
    assert!(TestMode::RecoCached.is_no_split());
    assert!(!TestMode::PostDontSplit.is_no_split());
    assert!(!TestMode::Split(SplitKind::BtHorz).is_no_split());
}

#[test]
fn test_split_direction_predicates() {
    assert!(SplitKind::BtHorz.is_horizontal());
    assert!(SplitKind::TtHorz.is_horizontal());
    assert!(SplitKind::BtVert.is_vertical());
    assert!(SplitKind::TtVert.is_vertical());
    assert!(!SplitKind::Quad.is_horizontal());
    assert!(!SplitKind::Quad.is_vertical());
}

#[test]
fn test_dataset_tags_distinct() {
    let modes = [
        TestMode::Intra,
        TestMode::InterMe { imv: 0 },
        TestMode::MergeSkip,
        TestMode::Affine,
        TestMode::MergeGeo,
        TestMode::Ibc,
        TestMode::IbcMerge,
        TestMode::Palette,
        TestMode::HashInter,
        TestMode::Split(SplitKind::Quad),
        TestMode::Split(SplitKind::BtHorz),
        TestMode::Split(SplitKind::BtVert),
        TestMode::Split(SplitKind::TtHorz),
        TestMode::Split(SplitKind::TtVert),
        TestMode::RecoCached,
        TestMode::PostDontSplit,
    ];
    let mut tags: Vec<u32> = modes.iter().map(|m| m.dataset_tag()).collect();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), modes.len());
}
