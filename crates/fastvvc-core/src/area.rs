//! CU geometry: rectangles in luma samples and per-CTU cache keys
//!
//! Coding units are power-of-two rectangles between 4x4 and 128x128 luma
//! samples. Per-CTU caches address a CU by its position inside the CTU in
//! 4-sample units plus a dense enumeration of the allowed sizes.

use serde::{Deserialize, Serialize};

use crate::mode::SplitKind;

/// Smallest CU dimension, log2
pub const MIN_CU_LOG2: u32 = 2;
/// Smallest CU dimension in luma samples
pub const MIN_CU_SIZE: u32 = 1 << MIN_CU_LOG2;
/// Largest CU (CTU) dimension, log2
pub const MAX_CU_LOG2: u32 = 7;
/// Largest CU (CTU) dimension in luma samples
pub const MAX_CU_SIZE: u32 = 1 << MAX_CU_LOG2;
/// Positions per CTU axis at 4-sample granularity
pub const NUM_AREA_POS: usize = (MAX_CU_SIZE >> MIN_CU_LOG2) as usize;
/// Number of distinct CU dimensions (4, 8, 16, 32, 64, 128)
pub const NUM_CU_SIZES: usize = (MAX_CU_LOG2 - MIN_CU_LOG2 + 1) as usize;

/// Rectangle of luma samples covered by a coding unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CuArea {
    /// Left edge in luma samples
    pub x: u32,
    /// Top edge in luma samples
    pub y: u32,
    /// Width in luma samples
    pub width: u32,
    /// Height in luma samples
    pub height: u32,
}

impl CuArea {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Covered area in samples
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Smaller of the two dimensions
    pub fn min_dim(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Larger of the two dimensions
    pub fn max_dim(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Check if point is inside this area
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Both dimensions are legal CU dimensions
    pub fn is_cu_sized(&self) -> bool {
        is_cu_dim(self.width) && is_cu_dim(self.height)
    }

    /// The area lies entirely inside the picture
    pub fn fits_within(&self, pic_width: u32, pic_height: u32) -> bool {
        self.right() <= pic_width && self.bottom() <= pic_height
    }

    /// Child areas produced by the given split, in coding order
    pub fn split_children(&self, kind: SplitKind) -> Vec<CuArea> {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        match kind {
            SplitKind::Quad => vec![
                CuArea::new(x, y, w / 2, h / 2),
                CuArea::new(x + w / 2, y, w / 2, h / 2),
                CuArea::new(x, y + h / 2, w / 2, h / 2),
                CuArea::new(x + w / 2, y + h / 2, w / 2, h / 2),
            ],
            SplitKind::BtHorz => vec![
                CuArea::new(x, y, w, h / 2),
                CuArea::new(x, y + h / 2, w, h / 2),
            ],
            SplitKind::BtVert => vec![
                CuArea::new(x, y, w / 2, h),
                CuArea::new(x + w / 2, y, w / 2, h),
            ],
            SplitKind::TtHorz => vec![
                CuArea::new(x, y, w, h / 4),
                CuArea::new(x, y + h / 4, w, h / 2),
                CuArea::new(x, y + 3 * h / 4, w, h / 4),
            ],
            SplitKind::TtVert => vec![
                CuArea::new(x, y, w / 4, h),
                CuArea::new(x + w / 4, y, w / 2, h),
                CuArea::new(x + 3 * w / 4, y, w / 4, h),
            ],
        }
    }
}

impl std::fmt::Display for CuArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@({},{})", self.width, self.height, self.x, self.y)
    }
}

/// Whether `dim` is a legal CU dimension (power of two in 4..=128)
pub fn is_cu_dim(dim: u32) -> bool {
    dim.is_power_of_two() && (MIN_CU_SIZE..=MAX_CU_SIZE).contains(&dim)
}

/// Dense index of a CU dimension: 4 -> 0, 8 -> 1, ..., 128 -> 5
pub fn size_idx(dim: u32) -> Option<usize> {
    if is_cu_dim(dim) {
        Some((dim.ilog2() - MIN_CU_LOG2) as usize)
    } else {
        None
    }
}

/// Key addressing a CU shape/position inside its CTU
///
/// Positions are taken modulo the CTU size at 4-sample granularity, so the
/// same key space serves every CTU of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaKey {
    /// Horizontal position inside the CTU, 4-sample units
    pub x_idx: usize,
    /// Vertical position inside the CTU, 4-sample units
    pub y_idx: usize,
    /// Dense width index
    pub w_idx: usize,
    /// Dense height index
    pub h_idx: usize,
}

impl AreaKey {
    /// Key for `area`; `None` when the geometry is not a legal CU size
    pub fn from_area(area: &CuArea) -> Option<Self> {
        let w_idx = size_idx(area.width)?;
        let h_idx = size_idx(area.height)?;
        Some(Self {
            x_idx: ((area.x & (MAX_CU_SIZE - 1)) >> MIN_CU_LOG2) as usize,
            y_idx: ((area.y & (MAX_CU_SIZE - 1)) >> MIN_CU_LOG2) as usize,
            w_idx,
            h_idx,
        })
    }

    /// Row-major offset into a dense per-CTU cache array
    pub fn flat_index(&self) -> usize {
        ((self.x_idx * NUM_AREA_POS + self.y_idx) * NUM_CU_SIZES + self.w_idx) * NUM_CU_SIZES
            + self.h_idx
    }
}

/// Total number of slots in a dense per-CTU cache
pub const AREA_KEY_SLOTS: usize = NUM_AREA_POS * NUM_AREA_POS * NUM_CU_SIZES * NUM_CU_SIZES;
