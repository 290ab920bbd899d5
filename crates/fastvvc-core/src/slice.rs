//! Slice-level context consumed by the mode controller
//!
//! A flat snapshot of the slice header and SPS/PPS fields the partition
//! subsystem reads. The host encoder fills this once per slice.

use serde::{Deserialize, Serialize};

/// Slice coding type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceType {
    I,
    P,
    B,
}

/// SPS coding-tool switches relevant to candidate enumeration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ToolFlags {
    /// Intra block copy
    pub ibc: bool,
    /// Palette mode
    pub palette: bool,
    /// Affine motion compensation
    pub affine: bool,
    /// Subblock-based temporal MV prediction
    pub sbtmvp: bool,
    /// Geometric partitioning merge
    pub geo: bool,
    /// Hash-based motion estimation
    pub hash_me: bool,
    /// Affine AMVR (adaptive MV resolution)
    pub affine_amvr: bool,
    /// Adaptive color transform
    pub color_transform: bool,
}

/// Per-slice view of everything the controller needs from the bitstream
/// headers and the slice's place in the GOP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceContext {
    pub slice_type: SliceType,
    /// Picture order count of the host picture
    pub poc: i32,
    /// Temporal sublayer
    pub temporal_layer: u32,
    /// Slice base QP before local adaptation
    pub base_qp: i32,
    /// QP range extension from bit depth (QpBDOffset)
    pub qp_bd_offset: i32,
    /// Picture is an intra random access point
    pub is_irap: bool,
    /// Hierarchy depth of the slice within its GOP
    pub gop_depth: u32,
    /// Smallest POC distance to a reference picture
    pub min_picture_distance: i32,
    pub tools: ToolFlags,
    /// CTU dimension for this sequence
    pub ctu_size: u32,
    /// Minimum quad-tree leaf dimension for this slice type
    pub min_qt_size: u32,
    /// Maximum multi-type-tree depth for this slice type
    pub max_bt_depth: u32,
    /// Maximum transform block dimension
    pub max_tb_size: u32,
    /// log2 of the parallel merge level; 2 when the tool is off
    pub parallel_merge_log2: u32,
    /// Picture width in luma samples
    pub pic_width: u32,
    /// Picture height in luma samples
    pub pic_height: u32,
}

impl SliceContext {
    pub fn is_intra(&self) -> bool {
        self.slice_type == SliceType::I
    }

    pub fn is_inter_b(&self) -> bool {
        self.slice_type == SliceType::B
    }

    /// Highest QP allowed by the profile
    pub const MAX_QP: i32 = 63;

    /// Clamp a QP into the legal range for this slice
    pub fn clip_qp(&self, qp: i32) -> i32 {
        qp.clamp(-self.qp_bd_offset, Self::MAX_QP)
    }

    /// An inter-slice context with common defaults, for drivers and tests
    pub fn inter_defaults(pic_width: u32, pic_height: u32) -> Self {
        Self {
            slice_type: SliceType::B,
            poc: 0,
            temporal_layer: 0,
            base_qp: 32,
            qp_bd_offset: 12,
            is_irap: false,
            gop_depth: 0,
            min_picture_distance: 1,
            tools: ToolFlags::default(),
            ctu_size: 128,
            min_qt_size: 8,
            max_bt_depth: 3,
            max_tb_size: 64,
            parallel_merge_log2: 2,
            pic_width,
            pic_height,
        }
    }

    /// An intra-slice context with common defaults
    pub fn intra_defaults(pic_width: u32, pic_height: u32) -> Self {
        Self {
            slice_type: SliceType::I,
            is_irap: true,
            min_qt_size: 8,
            ..Self::inter_defaults(pic_width, pic_height)
        }
    }
}
