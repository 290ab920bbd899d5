//! Partitioner interface and a reference implementation
//!
//! The host encoder walks the coding tree and owns the authoritative
//! partitioner; the controller only consumes the [`PartitionView`]
//! interface. [`PartitionState`] is a self-contained implementation of the
//! same rules used by the stand-alone driver and the test suite.

use serde::{Deserialize, Serialize};

use crate::area::CuArea;
use crate::mode::SplitKind;

/// Which coding tree the current traversal serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeKind {
    /// Joint luma/chroma tree
    Joint,
    /// Luma part of a separate tree
    SeparateLuma,
    /// Chroma part of a separate tree
    SeparateChroma,
}

/// Read-only view of the partitioner state at the current tree node
pub trait PartitionView {
    /// Area of the CU under consideration
    fn curr_area(&self) -> CuArea;
    /// Quad-tree depth of the current node
    fn qt_depth(&self) -> u32;
    /// Binary-tree depth within the multi-type tree
    fn bt_depth(&self) -> u32;
    /// Multi-type-tree depth
    fn mt_depth(&self) -> u32;
    /// Subdivision counter (quad counts twice, binary once)
    fn curr_subdiv(&self) -> u32;
    /// Extra binary depth granted by implicit boundary splits
    fn implicit_bt_depth(&self) -> u32;
    /// Whether the bitstream syntax allows the split here
    fn can_split(&self, kind: SplitKind) -> bool;
    /// Split forced by the picture boundary; `None` away from boundaries
    fn implicit_split(&self) -> Option<SplitKind>;
    /// Local dual-tree constraint: only intra modes allowed
    fn is_cons_intra(&self) -> bool;
    /// Local dual-tree constraint: only inter modes allowed
    fn is_cons_inter(&self) -> bool;
    /// Tree the traversal serves
    fn tree(&self) -> TreeKind;
    /// Bit-packed walk of the split decisions leading to this node
    fn split_series(&self) -> u64;
}

/// Reference partitioner state
///
/// Carries the geometry limits of the slice and derives the allowed and
/// implicit splits. `descend` produces the state of a child node, which is
/// how drivers and tests walk the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionState {
    pub area: CuArea,
    pub qt_depth: u32,
    pub bt_depth: u32,
    pub mt_depth: u32,
    pub subdiv: u32,
    pub implicit_bt_depth: u32,
    pub series: u64,
    /// Minimum quad-tree leaf dimension
    pub min_qt_size: u32,
    /// Maximum multi-type-tree depth
    pub max_mtt_depth: u32,
    /// Maximum dimension a binary split may operate on
    pub max_bt_size: u32,
    /// Maximum dimension a ternary split may operate on
    pub max_tt_size: u32,
    pub pic_width: u32,
    pub pic_height: u32,
    pub cons_intra: bool,
    pub cons_inter: bool,
    pub tree: TreeKind,
}

impl PartitionState {
    /// State at a CTU root
    pub fn ctu_root(
        area: CuArea,
        min_qt_size: u32,
        max_mtt_depth: u32,
        pic_width: u32,
        pic_height: u32,
    ) -> Self {
        Self {
            area,
            qt_depth: 0,
            bt_depth: 0,
            mt_depth: 0,
            subdiv: 0,
            implicit_bt_depth: 0,
            series: 0,
            min_qt_size,
            max_mtt_depth,
            max_bt_size: 128,
            max_tt_size: 64,
            pic_width,
            pic_height,
            cons_intra: false,
            cons_inter: false,
            tree: TreeKind::Joint,
        }
    }

    /// State of the `child_idx`-th child after applying `kind`
    pub fn descend(&self, kind: SplitKind, child_idx: usize) -> Self {
        let children = self.area.split_children(kind);
        let mut child = self.clone();
        child.area = children[child_idx];
        child.series = (self.series << 3) | kind.series_id();
        match kind {
            SplitKind::Quad => {
                child.qt_depth += 1;
                child.subdiv += 2;
                child.bt_depth = 0;
                child.mt_depth = 0;
            }
            SplitKind::BtHorz | SplitKind::BtVert => {
                child.bt_depth += 1;
                child.mt_depth += 1;
                child.subdiv += 1;
                if self.implicit_split() == Some(kind) {
                    child.implicit_bt_depth += 1;
                }
            }
            SplitKind::TtHorz | SplitKind::TtVert => {
                child.bt_depth += 1;
                child.mt_depth += 1;
                // outer TT children sit one subdivision deeper than the
                // half-sized middle child
                child.subdiv += if child_idx == 1 { 1 } else { 2 };
            }
        }
        child
    }
}

impl PartitionView for PartitionState {
    fn curr_area(&self) -> CuArea {
        self.area
    }

    fn qt_depth(&self) -> u32 {
        self.qt_depth
    }

    fn bt_depth(&self) -> u32 {
        self.bt_depth
    }

    fn mt_depth(&self) -> u32 {
        self.mt_depth
    }

    fn curr_subdiv(&self) -> u32 {
        self.subdiv
    }

    fn implicit_bt_depth(&self) -> u32 {
        self.implicit_bt_depth
    }

    fn can_split(&self, kind: SplitKind) -> bool {
        let w = self.area.width;
        let h = self.area.height;
        let mtt_room = self.mt_depth < self.max_mtt_depth + self.implicit_bt_depth;
        match kind {
            // quad splits stop at the minimum QT leaf and cannot restart
            // below a multi-type split
            SplitKind::Quad => w == h && w > self.min_qt_size && self.mt_depth == 0,
            SplitKind::BtHorz => h >= 8 && h <= self.max_bt_size && mtt_room,
            SplitKind::BtVert => w >= 8 && w <= self.max_bt_size && mtt_room,
            SplitKind::TtHorz => {
                h >= 16 && h <= self.max_tt_size && w <= self.max_tt_size && mtt_room
            }
            SplitKind::TtVert => {
                w >= 16 && w <= self.max_tt_size && h <= self.max_tt_size && mtt_room
            }
        }
    }

    fn implicit_split(&self) -> Option<SplitKind> {
        let over_right = self.area.right() > self.pic_width;
        let over_bottom = self.area.bottom() > self.pic_height;
        if !over_right && !over_bottom {
            return None;
        }
        if self.can_split(SplitKind::Quad) && (over_right == over_bottom || self.area.width > 64) {
            return Some(SplitKind::Quad);
        }
        if over_bottom {
            Some(SplitKind::BtHorz)
        } else {
            Some(SplitKind::BtVert)
        }
    }

    fn is_cons_intra(&self) -> bool {
        self.cons_intra
    }

    fn is_cons_inter(&self) -> bool {
        self.cons_inter
    }

    fn tree(&self) -> TreeKind {
        self.tree
    }

    fn split_series(&self) -> u64 {
        self.series
    }
}

#[cfg(test)]
mod tests {
    include!("partition_test.rs");
}
