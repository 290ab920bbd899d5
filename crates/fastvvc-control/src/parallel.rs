//! Optional sibling-split parallelism
//!
//! Off by default. When enabled, the sibling split attempts of one level
//! fan out as speculative jobs: each worker owns a private clone of the
//! block-info cache and the results merge back under a most-recent-wins
//! policy keyed by the caches' write clocks. Job descriptors:
//!
//! 1. all non-split modes
//! 2. QT split
//! 3. BT_V
//! 4. BT_H
//! 5. TT_V
//! 6. TT_H

use parking_lot::Mutex;

use fastvvc_core::{Candidate, EncoderConfig, PartitionView, SliceContext, SplitKind};

use crate::blk_info::BlockInfoCache;

/// Upper bound on job descriptors (0 is the serial driver)
pub const NUM_RESERVED_SPLIT_JOBS: usize = 7;

/// Number of speculative jobs worth launching at this node
pub fn num_parallel_jobs(part: &dyn PartitionView) -> usize {
    if part.can_split(SplitKind::TtHorz) {
        6
    } else if part.can_split(SplitKind::TtVert) {
        5
    } else if part.can_split(SplitKind::BtHorz) {
        4
    } else if part.can_split(SplitKind::BtVert) {
        3
    } else if part.can_split(SplitKind::Quad) {
        2
    } else {
        1
    }
}

/// Whether this node is where the split fan-out should happen
pub fn is_parallel_split(
    slice: &SliceContext,
    part: &dyn PartitionView,
    config: &EncoderConfig,
) -> bool {
    if config.num_split_threads == 0 {
        return false;
    }
    if part.implicit_split().is_some() {
        return false;
    }
    // delta-QP decisions must stay sequential within a quantization group
    if config.max_delta_qp > 0 && part.curr_subdiv() <= config.cu_qp_delta_subdiv {
        return false;
    }
    let num_jobs = num_parallel_jobs(part);
    let num_pxl = part.curr_area().area();
    let parl_at = if config.num_split_threads <= 3 {
        1024
    } else {
        256
    };
    let at_level = num_pxl == parl_at || !part.can_split(SplitKind::Quad);
    if slice.is_intra() {
        num_jobs > 2 && at_level
    } else {
        num_jobs > 1 && at_level
    }
}

/// Whether a job works on the given candidate
pub fn job_accepts(job: u32, cand: &Candidate) -> bool {
    match job {
        1 => !cand.mode.is_split(),
        2 => cand.mode.split_kind() == Some(SplitKind::Quad),
        3 => cand.mode.split_kind() == Some(SplitKind::BtVert),
        4 => cand.mode.split_kind() == Some(SplitKind::BtHorz),
        5 => cand.mode.split_kind() == Some(SplitKind::TtVert),
        6 => cand.mode.split_kind() == Some(SplitKind::TtHorz),
        _ => false,
    }
}

/// Fan the given jobs out over rayon workers, each with a private clone of
/// `base`, then merge the worker caches back most-recent-wins. Results
/// come back ordered by job id so the merge is deterministic.
pub fn run_split_jobs<R, F>(base: &mut BlockInfoCache, jobs: &[u32], run: F) -> Vec<(u32, R)>
where
    F: Fn(u32, &mut BlockInfoCache) -> R + Sync,
    R: Send,
{
    let results: Mutex<Vec<(u32, R, BlockInfoCache)>> = Mutex::new(Vec::new());
    {
        let base_view: &BlockInfoCache = base;
        let run = &run;
        rayon::scope(|s| {
            for &job in jobs {
                let results = &results;
                s.spawn(move |_| {
                    let mut cache = base_view.clone();
                    let result = run(job, &mut cache);
                    results.lock().push((job, result, cache));
                });
            }
        });
    }
    let mut collected = results.into_inner();
    collected.sort_by_key(|(job, _, _)| *job);
    let mut out = Vec::with_capacity(collected.len());
    for (job, result, cache) in collected {
        base.merge_from(&cache);
        out.push((job, result));
    }
    out
}
