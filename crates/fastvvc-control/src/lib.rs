//! fastvvc-control: the CU mode controller
//!
//! Owns the per-CTU stack of partitioning contexts, enumerates the
//! candidate modes for each CU level, filters candidates through the
//! baseline fast-search heuristics and the classifier gates, records RD
//! results into per-branch best-cost slots, and maintains the per-geometry
//! caches (coded-CU info, best-encoding snapshots, SBT history).
//!
//! The external RD evaluators are opaque: the host driver pulls candidates
//! with `next_mode`, runs RD, and hands the result back through
//! `record_result`.

pub mod best_cache;
pub mod blk_info;
pub mod controller;
pub mod ctx;
pub mod enumerator;
pub mod filter;
pub mod parallel;
pub mod recorder;
pub mod sbt_cache;

pub use self::best_cache::*;
pub use self::blk_info::*;
pub use self::controller::*;
pub use self::ctx::*;
pub use self::parallel::*;
pub use self::sbt_cache::*;
