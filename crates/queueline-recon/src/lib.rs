//! Queue reconciliation: converging an externally rendered queue toward a
//! desired list of resolved players.
//!
//! The surface offers no insert/delete primitive, only discoverable trigger
//! elements that may be relabeled, reordered, or hidden between observations.
//! The engine therefore works observe-act-reobserve: every mutating step is
//! followed by a fresh scan, retries are bounded, and heuristic misses are
//! recovered into typed per-item outcomes instead of failures.

pub mod engine;
pub mod outcome;
pub mod scan;
pub mod validate;

pub use engine::{ReconConfig, ReconEngine};
pub use outcome::{ItemOutcome, ReconciliationOutcome, RunSummary};
pub use scan::{extract_name, extract_name_with_label, QueuedEntry, DEFAULT_REMOVE_LABEL};
pub use validate::{loose_compare, ValidateReport};
