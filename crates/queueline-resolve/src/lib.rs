//! Identity resolution for free-text player names.
//!
//! Two layers: [`normalize`] turns raw names into foldable, pattern-matchable
//! form (diacritic folding, first-name abbreviation expansion, compiled name
//! patterns with manual overrides), and [`engine`] scans a roster with those
//! patterns to produce ranked, confidence-scored candidates plus a best-match
//! selector with disambiguation.

pub mod engine;
pub mod normalize;

pub use engine::{
    find_matches, resolve_best, resolve_list, try_resolve_best, AmbiguousLine, LineError,
    MatchCandidate, MatchOptions, ResolutionResult, ResolveListResult,
};
pub use normalize::{expand_first_name_prefix, fold, names_match, pattern_for, PatternError};
