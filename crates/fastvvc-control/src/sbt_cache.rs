//! Sub-block-transform save/load history
//!
//! Per geometry, up to [`SBT_NUM_SL`] prior attempts map a prediction-unit
//! SSE to the SBT mode and transform choice that won, short-circuiting the
//! SBT search on repeats.

use fastvvc_core::{AreaKey, CuArea, AREA_KEY_SLOTS};

/// Save/load entries kept per geometry
pub const SBT_NUM_SL: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
struct SbtEntry {
    pu_sse: u32,
    pu_sbt: u8,
    pu_trs: u8,
}

#[derive(Debug, Clone, Copy, Default)]
struct SbtSlot {
    stored: usize,
    entries: [SbtEntry; SBT_NUM_SL],
}

/// Per-CTU SBT history cache
#[derive(Debug)]
pub struct SbtSaveLoad {
    slots: Vec<SbtSlot>,
}

impl Default for SbtSaveLoad {
    fn default() -> Self {
        Self::new()
    }
}

impl SbtSaveLoad {
    pub fn new() -> Self {
        Self {
            slots: vec![SbtSlot::default(); AREA_KEY_SLOTS],
        }
    }

    /// Clear the history; called at slice start
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = SbtSlot::default();
        }
    }

    /// Look up `(puSbt, puTrs)` recorded for this SSE, if any
    pub fn find_best_sbt(&self, area: &CuArea, cur_pu_sse: u32) -> Option<(u8, u8)> {
        let key = AreaKey::from_area(area)?;
        let slot = &self.slots[key.flat_index()];
        slot.entries[..slot.stored]
            .iter()
            .find(|e| e.pu_sse == cur_pu_sse)
            .map(|e| (e.pu_sbt, e.pu_trs))
    }

    /// Record an attempt; `false` when the slot is full or illegal
    pub fn save_best_sbt(&mut self, area: &CuArea, pu_sse: u32, pu_sbt: u8, pu_trs: u8) -> bool {
        let Some(key) = AreaKey::from_area(area) else {
            return false;
        };
        let slot = &mut self.slots[key.flat_index()];
        if slot.stored == SBT_NUM_SL {
            return false;
        }
        slot.entries[slot.stored] = SbtEntry {
            pu_sse,
            pu_sbt,
            pu_trs,
        };
        slot.stored += 1;
        true
    }
}
