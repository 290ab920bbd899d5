//! Candidate encoding test modes
//!
//! One CU-level RD trial is described by a [`Candidate`]: the mode to code
//! the CU with and the QP to code it at. Split candidates carry the split
//! kind; inter motion estimation carries its IMV precision.

use serde::{Deserialize, Serialize};

/// CU split operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitKind {
    /// Quad-tree split into four quadrants
    Quad,
    /// Binary horizontal split (top/bottom)
    BtHorz,
    /// Binary vertical split (left/right)
    BtVert,
    /// Ternary horizontal split (quarter/half/quarter)
    TtHorz,
    /// Ternary vertical split
    TtVert,
}

impl SplitKind {
    /// Split divides along the horizontal axis (stacked children)
    pub fn is_horizontal(&self) -> bool {
        matches!(self, SplitKind::BtHorz | SplitKind::TtHorz)
    }

    /// Split divides along the vertical axis (side-by-side children)
    pub fn is_vertical(&self) -> bool {
        matches!(self, SplitKind::BtVert | SplitKind::TtVert)
    }

    /// Ternary split
    pub fn is_ternary(&self) -> bool {
        matches!(self, SplitKind::TtHorz | SplitKind::TtVert)
    }

    /// Stable id used in split-series packing and dataset rows
    pub fn series_id(&self) -> u64 {
        match self {
            SplitKind::Quad => 1,
            SplitKind::BtHorz => 2,
            SplitKind::BtVert => 3,
            SplitKind::TtHorz => 4,
            SplitKind::TtVert => 5,
        }
    }
}

impl std::fmt::Display for SplitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SplitKind::Quad => "QT",
            SplitKind::BtHorz => "BT_H",
            SplitKind::BtVert => "BT_V",
            SplitKind::TtHorz => "TT_H",
            SplitKind::TtVert => "TT_V",
        };
        write!(f, "{name}")
    }
}

/// Encoding mode tried for one CU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestMode {
    /// Intra prediction
    Intra,
    /// Palette coding
    Palette,
    /// Intra block copy
    Ibc,
    /// Intra block copy, merge candidates only
    IbcMerge,
    /// Inter motion estimation at the given IMV precision (0 = fractional)
    InterMe { imv: u8 },
    /// Inter merge / skip
    MergeSkip,
    /// Affine motion / subblock TMVP merge
    Affine,
    /// Geometric partitioning merge
    MergeGeo,
    /// Hash-based motion estimation
    HashInter,
    /// Recursive split
    Split(SplitKind),
    /// Replay of a cached best encoding for this geometry
    RecoCached,
    /// Sentinel tried last: finalizes the non-split result of the level
    PostDontSplit,
}

impl TestMode {
    /// Any of the five split operations
    pub fn is_split(&self) -> bool {
        matches!(self, TestMode::Split(_))
    }

    pub fn split_kind(&self) -> Option<SplitKind> {
        match self {
            TestMode::Split(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Inter family: ME, merge/skip, affine, geo, hash-ME
    pub fn is_inter(&self) -> bool {
        matches!(
            self,
            TestMode::InterMe { .. }
                | TestMode::MergeSkip
                | TestMode::Affine
                | TestMode::MergeGeo
                | TestMode::HashInter
        )
    }

    /// A mode that codes the CU without splitting it
    pub fn is_no_split(&self) -> bool {
        !matches!(self, TestMode::Split(_) | TestMode::PostDontSplit)
    }

    /// Numeric tag written to dataset cost rows
    pub fn dataset_tag(&self) -> u32 {
        match self {
            TestMode::Intra => 0,
            TestMode::InterMe { .. } => 1,
            TestMode::MergeSkip => 2,
            TestMode::Affine => 3,
            TestMode::MergeGeo => 4,
            TestMode::Ibc => 5,
            TestMode::IbcMerge => 6,
            TestMode::Palette => 7,
            TestMode::HashInter => 8,
            TestMode::Split(SplitKind::Quad) => 9,
            TestMode::Split(SplitKind::BtHorz) => 10,
            TestMode::Split(SplitKind::BtVert) => 11,
            TestMode::Split(SplitKind::TtHorz) => 12,
            TestMode::Split(SplitKind::TtVert) => 13,
            TestMode::RecoCached => 14,
            TestMode::PostDontSplit => 15,
        }
    }
}

/// One entry of the per-level candidate stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub mode: TestMode,
    /// QP the trial is coded at
    pub qp: i32,
}

impl Candidate {
    pub fn new(mode: TestMode, qp: i32) -> Self {
        Self { mode, qp }
    }
}

#[cfg(test)]
mod tests {
    include!("mode_test.rs");
}
