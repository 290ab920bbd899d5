//! Per-geometry coded-CU info cache
//!
//! Records the best-known properties of every CU geometry already encoded
//! in the current CTU so later trials at the same shape/position can skip
//! work. Slots live in one dense flat array addressed by [`AreaKey`];
//! the whole cache resets at slice start.

use fastvvc_core::{AreaKey, CuArea, Mv, AREA_KEY_SLOTS};

/// Reference lists
pub const NUM_REF_LISTS: usize = 2;
/// MV save slots per reference list
pub const MAX_STORED_CU_REFS: usize = 4;

/// Best-known properties of a previously coded CU geometry
#[derive(Debug, Clone)]
pub struct CodedCuInfo {
    pub is_inter: bool,
    pub is_intra: bool,
    pub is_ibc: bool,
    pub is_skip: bool,
    pub is_mmvd_skip: bool,
    pub bcw_idx: u8,
    /// 0 = untested, 1 = first color space, 2 = second
    pub select_color_space_option: u8,
    /// Saved uni-prediction MVs per list and reference index
    pub saved_mv: [[Option<Mv>; MAX_STORED_CU_REFS]; NUM_REF_LISTS],
    // fast-ISP reuse records
    pub related_cu_is_valid: bool,
    pub isp_pred_mode_val: u32,
    pub best_isp_intra_mode: u32,
    pub best_cost: f64,
    pub best_non_dct2_cost: f64,
    pub best_dct2_non_isp_cost: f64,
    /// Monotonic write tag for the parallel merge policy
    pub touched: u64,
}

impl Default for CodedCuInfo {
    fn default() -> Self {
        Self {
            is_inter: false,
            is_intra: false,
            is_ibc: false,
            is_skip: false,
            is_mmvd_skip: false,
            bcw_idx: 0,
            select_color_space_option: 0,
            saved_mv: [[None; MAX_STORED_CU_REFS]; NUM_REF_LISTS],
            related_cu_is_valid: false,
            isp_pred_mode_val: 0,
            best_isp_intra_mode: 0,
            best_cost: f64::MAX,
            best_non_dct2_cost: f64::MAX,
            best_dct2_non_isp_cost: f64::MAX,
            touched: 0,
        }
    }
}

/// Dense per-CTU cache of [`CodedCuInfo`]
#[derive(Debug, Clone)]
pub struct BlockInfoCache {
    slots: Vec<CodedCuInfo>,
    /// Monotonic counter stamped on every write
    clock: u64,
}

impl Default for BlockInfoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockInfoCache {
    pub fn new() -> Self {
        Self {
            slots: vec![CodedCuInfo::default(); AREA_KEY_SLOTS],
            clock: 0,
        }
    }

    /// Clear every slot; called at slice start
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = CodedCuInfo::default();
        }
        self.clock = 0;
    }

    /// Read the slot for `area`; `None` for illegal CU geometries
    pub fn get(&self, area: &CuArea) -> Option<&CodedCuInfo> {
        AreaKey::from_area(area).map(|key| &self.slots[key.flat_index()])
    }

    /// Mutable slot access, stamping the write clock
    pub fn get_mut(&mut self, area: &CuArea) -> Option<&mut CodedCuInfo> {
        let key = AreaKey::from_area(area)?;
        self.clock += 1;
        let clock = self.clock;
        let slot = &mut self.slots[key.flat_index()];
        slot.touched = clock;
        Some(slot)
    }

    pub fn is_inter(&self, area: &CuArea) -> bool {
        self.get(area).is_some_and(|info| info.is_inter)
    }

    pub fn is_skip(&self, area: &CuArea) -> bool {
        self.get(area).is_some_and(|info| info.is_skip)
    }

    pub fn set_bcw_idx(&mut self, area: &CuArea, bcw_idx: u8) {
        if let Some(info) = self.get_mut(area) {
            info.bcw_idx = bcw_idx;
        }
    }

    pub fn bcw_idx(&self, area: &CuArea) -> u8 {
        self.get(area).map_or(0, |info| info.bcw_idx)
    }

    pub fn set_mv(&mut self, area: &CuArea, list: usize, ref_idx: usize, mv: Mv) {
        if ref_idx >= MAX_STORED_CU_REFS {
            return;
        }
        if let Some(info) = self.get_mut(area) {
            info.saved_mv[list][ref_idx] = Some(mv);
        }
    }

    pub fn mv(&self, area: &CuArea, list: usize, ref_idx: usize) -> Option<Mv> {
        if ref_idx >= MAX_STORED_CU_REFS {
            return None;
        }
        self.get(area).and_then(|info| info.saved_mv[list][ref_idx])
    }

    /// Merge another cache in, newest write per slot winning
    pub fn merge_from(&mut self, other: &BlockInfoCache) {
        for (dst, src) in self.slots.iter_mut().zip(other.slots.iter()) {
            if src.touched > dst.touched {
                *dst = src.clone();
            }
        }
        self.clock = self.clock.max(other.clock);
    }
}

#[cfg(test)]
mod tests {
    include!("blk_info_test.rs");
}
