// Partitioner reference-implementation tests

use super::*;

fn ctu_at(x: u32, y: u32, pic_w: u32, pic_h: u32) -> PartitionState {
    PartitionState::ctu_root(CuArea::new(x, y, 128, 128), 8, 3, pic_w, pic_h)
}

#[test]
fn test_ctu_root_allows_quad_only_above_min_qt() {
    let root = ctu_at(0, 0, 256, 256);
    assert!(root.can_split(SplitKind::Quad));

    // walk down to the 8x8 QT leaf
    let mut state = root;
    for _ in 0..4 {
        state = state.descend(SplitKind::Quad, 0);
    }
    assert_eq!(state.area.width, 8);
    assert!(!state.can_split(SplitKind::Quad));
    assert!(state.can_split(SplitKind::BtHorz));
}

#[test]
fn test_quad_descend_updates_depths() {
    let root = ctu_at(0, 0, 256, 256);
    let child = root.descend(SplitKind::Quad, 2);
    assert_eq!(child.area, CuArea::new(0, 64, 64, 64));
    assert_eq!(child.qt_depth, 1);
    assert_eq!(child.subdiv, 2);
    assert_eq!(child.mt_depth, 0);
}

#[test]
fn test_no_quad_below_multi_type_split() {
    let root = ctu_at(0, 0, 256, 256);
    let quad = root.descend(SplitKind::Quad, 0); // 64x64
    let bt = quad.descend(SplitKind::BtHorz, 0); // 64x32
    assert!(!bt.can_split(SplitKind::Quad));
    assert_eq!(bt.mt_depth, 1);
    assert_eq!(bt.bt_depth, 1);
}

#[test]
fn test_mtt_depth_budget() {
    let root = ctu_at(0, 0, 256, 256);
    let mut state = root.descend(SplitKind::Quad, 0); // 64x64
    for _ in 0..3 {
        assert!(state.can_split(SplitKind::BtHorz));
        state = state.descend(SplitKind::BtHorz, 0);
    }
    assert_eq!(state.mt_depth, 3);
    assert!(!state.can_split(SplitKind::BtHorz));
    assert!(!state.can_split(SplitKind::TtVert));
}

#[test]
fn test_tt_size_window() {
    let root = ctu_at(0, 0, 256, 256);
    // 128x128: too large for TT
    assert!(!root.can_split(SplitKind::TtHorz));
    let half = root.descend(SplitKind::Quad, 0); // 64x64
    assert!(half.can_split(SplitKind::TtHorz));
    let mut small = half;
    for _ in 0..2 {
        small = small.descend(SplitKind::Quad, 0);
    }
    // 16x16: TT still legal; one BT below (16x8) the height is exhausted
    assert!(small.can_split(SplitKind::TtHorz));
    let thin = small.descend(SplitKind::BtHorz, 0);
    assert!(!thin.can_split(SplitKind::TtHorz));
    assert!(thin.can_split(SplitKind::TtVert));
}

#[test]
fn test_implicit_split_at_picture_edges() {
    // picture 192 wide: the 128-wide CTU at x=128 must quad-split
    let state = ctu_at(128, 0, 192, 256);
    assert_eq!(state.implicit_split(), Some(SplitKind::Quad));

    // the inside child touches the edge exactly: no implicit split
    let right_edge = state.descend(SplitKind::Quad, 0);
    assert_eq!(right_edge.area, CuArea::new(128, 0, 64, 64));
    assert_eq!(right_edge.implicit_split(), None);

    // a 64x64 over the right edge only takes the vertical binary split
    let over_right = state.descend(SplitKind::Quad, 1);
    assert_eq!(over_right.implicit_split(), Some(SplitKind::BtVert));

    // a 64x64 over the bottom edge takes the horizontal binary split
    let bottom = ctu_at(0, 192, 256, 224).descend(SplitKind::Quad, 2);
    assert_eq!(bottom.implicit_split(), Some(SplitKind::BtHorz));

    // over the corner, the quad split remains implicit
    let corner = ctu_at(128, 192, 160, 224).descend(SplitKind::Quad, 3);
    assert_eq!(corner.implicit_split(), Some(SplitKind::Quad));
}

#[test]
fn test_implicit_split_none_inside_picture() {
    let state = ctu_at(0, 0, 256, 256);
    assert_eq!(state.implicit_split(), None);
}

#[test]
fn test_split_series_packs_walk() {
    let root = ctu_at(0, 0, 256, 256);
    let a = root.descend(SplitKind::Quad, 0);
    let b = a.descend(SplitKind::BtHorz, 1);
    let c = b.descend(SplitKind::TtVert, 2);
    assert_eq!(
        c.split_series(),
        (((SplitKind::Quad.series_id() << 3) | SplitKind::BtHorz.series_id()) << 3)
            | SplitKind::TtVert.series_id()
    );
}

#[test]
fn test_tt_middle_child_subdiv() {
    let root = ctu_at(0, 0, 256, 256);
    let base = root.descend(SplitKind::Quad, 0); // subdiv 2
    let outer = base.descend(SplitKind::TtHorz, 0);
    let middle = base.descend(SplitKind::TtHorz, 1);
    assert_eq!(outer.subdiv, 4);
    assert_eq!(middle.subdiv, 3);
}
