//! Best-encoding snapshot cache
//!
//! Stores, per CU geometry, the complete best single-CU encoding seen in
//! the current picture so a later visit of the same geometry can replay it
//! (`RecoCached`) instead of re-running RD. Coefficient payloads live in
//! one contiguous arena that is released at slice start.

use std::ops::Range;

use fastvvc_core::{
    AreaKey, Candidate, CodingStructure, Coeff, CuArea, CuRecord, PartitionView, TreeKind,
    AREA_KEY_SLOTS,
};
use tracing::trace;

/// Most transform units a reusable snapshot may carry
pub const MAX_NUM_TUS: usize = 8;

/// Reusable best encoding of one CU geometry
#[derive(Debug, Clone)]
pub struct BestEncSnapshot {
    /// Picture the snapshot was taken in
    pub poc: i32,
    /// Mode that produced the encoding
    pub mode: Candidate,
    pub cu: CuRecord,
    pub num_pus: usize,
    pub num_tus: usize,
    pub tu_cbf_luma: bool,
    /// Partition-tree walk that led to the CU; replay requires identity
    pub split_series: u64,
    pub cost: f64,
    pub frac_bits: u64,
    pub dist: u64,
    pub cost_db_offset: f64,
    pub use_db_cost: bool,
    coeffs: Range<usize>,
}

/// Per-CTU cache of best encodings with a shared coefficient arena
#[derive(Debug)]
pub struct BestEncCache {
    slots: Vec<Option<BestEncSnapshot>>,
    arena: Vec<Coeff>,
}

impl Default for BestEncCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BestEncCache {
    pub fn new() -> Self {
        Self {
            slots: vec![None; AREA_KEY_SLOTS],
            arena: Vec::new(),
        }
    }

    /// Drop all snapshots and release the arena; called at slice start
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.arena.clear();
    }

    /// Snapshot a single-CU result. Returns `false` when the structure is
    /// not reusable (multiple CUs/PUs, too many TUs).
    pub fn store(
        &mut self,
        cs: &CodingStructure,
        mode: Candidate,
        part: &dyn PartitionView,
        poc: i32,
    ) -> bool {
        if !cs.is_single_cu() || cs.num_pus != 1 || cs.num_tus > MAX_NUM_TUS {
            return false;
        }
        let Some(key) = AreaKey::from_area(&cs.area) else {
            return false;
        };
        let start = self.arena.len();
        self.arena.extend_from_slice(&cs.coeffs);
        let cu = cs.cus[0];
        self.slots[key.flat_index()] = Some(BestEncSnapshot {
            poc,
            mode,
            cu,
            num_pus: cs.num_pus,
            num_tus: cs.num_tus,
            tu_cbf_luma: cs.tu_cbf_luma,
            split_series: part.split_series(),
            cost: cs.cost,
            frac_bits: cs.frac_bits,
            dist: cs.dist,
            cost_db_offset: cs.cost_db_offset,
            use_db_cost: cs.use_db_cost,
            coeffs: start..self.arena.len(),
        });
        trace!(area = %cs.area, cost = cs.cost, "best encoding cached");
        true
    }

    /// Whether a snapshot can be replayed for this geometry at this QP
    pub fn is_valid(&self, area: &CuArea, part: &dyn PartitionView, qp: i32, poc: i32) -> bool {
        // chroma-only traversals would need matching luma state too
        if part.tree() == TreeKind::SeparateChroma {
            return false;
        }
        let Some(key) = AreaKey::from_area(area) else {
            return false;
        };
        match &self.slots[key.flat_index()] {
            Some(snap) => {
                snap.poc == poc && snap.cu.qp == qp && snap.split_series == part.split_series()
            }
            None => false,
        }
    }

    /// Read access for drivers inspecting the snapshot
    pub fn snapshot(&self, area: &CuArea) -> Option<&BestEncSnapshot> {
        let key = AreaKey::from_area(area)?;
        self.slots[key.flat_index()].as_ref()
    }

    /// Rebuild the cached result as a fresh coding structure
    pub fn replay(&self, area: &CuArea) -> Option<CodingStructure> {
        let snap = self.snapshot(area)?;
        Some(CodingStructure {
            area: *area,
            cost: snap.cost,
            frac_bits: snap.frac_bits,
            dist: snap.dist,
            cost_db_offset: snap.cost_db_offset,
            use_db_cost: snap.use_db_cost,
            cus: vec![snap.cu],
            num_pus: snap.num_pus,
            num_tus: snap.num_tus,
            tu_cbf_luma: snap.tu_cbf_luma,
            coeffs: self.arena[snap.coeffs.clone()].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    include!("best_cache_test.rs");
}
