//! Roster scanning, confidence scoring, and best-match selection.

use std::collections::HashSet;

use queueline_core::{CancelToken, PlayerRecord, Position, Roster};

use crate::normalize::{fold, names_match, pattern_for, PatternError};

/// Pinned scoring policy. The constants are empirically tuned heuristics kept
/// for compatibility; treat them as a policy table, not derived values.
pub mod scoring {
    pub const BASE: f64 = 0.5;
    pub const ACTIVE_BONUS: f64 = 0.2;
    pub const TEAM_BONUS: f64 = 0.1;
    pub const POSITION_BONUS: f64 = 0.15;
    /// Confidence lead over the runner-up beyond which the top candidate wins
    /// outright without tie narrowing.
    pub const DOMINANCE_MARGIN: f64 = 0.1;
}

#[derive(Clone, Debug, Default)]
pub struct MatchOptions {
    /// Hard filter: exclude any record whose status is not active. On by
    /// default; turn off to search injured or practice-squad players.
    pub include_inactive: bool,
    /// Soft ordering: active candidates sort before non-active ones
    /// regardless of confidence. Off by default.
    pub prefer_active_in_ordering: bool,
    /// Hard filter: only records whose position is in the set.
    pub require_position_in: Option<HashSet<Position>>,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    pub fn prefer_active_in_ordering(mut self) -> Self {
        self.prefer_active_in_ordering = true;
        self
    }

    pub fn require_position_in(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.require_position_in = Some(positions.into_iter().collect());
        self
    }
}

/// One scored roster candidate for a search name. Ordering among candidates
/// for the same query is significant and deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCandidate {
    pub player: PlayerRecord,
    /// Heuristic estimate in [0, 1]; exactly 1.0 only for a case-insensitive
    /// exact full-name match.
    pub confidence: f64,
    /// The search name this candidate was produced for.
    pub query: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResolutionResult {
    NoMatch,
    UniqueMatch(MatchCandidate),
    /// Near-tied candidates the caller must disambiguate. `alternatives`
    /// holds the next-best one or two candidates in tie-break order.
    AmbiguousMatch {
        best: MatchCandidate,
        alternatives: Vec<MatchCandidate>,
    },
}

fn confidence_for(query: &str, player: &PlayerRecord, full_name: &str) -> f64 {
    let q = fold(query.trim()).to_lowercase();
    let f = fold(full_name).to_lowercase();
    // Exact match overrides rather than stacks.
    if q == f {
        return 1.0;
    }
    let mut score = scoring::BASE;
    if player.status.is_active() {
        score += scoring::ACTIVE_BONUS;
    }
    if player.team.is_some() {
        score += scoring::TEAM_BONUS;
    }
    if player.position.is_fantasy_relevant() {
        score += scoring::POSITION_BONUS;
    }
    score.clamp(0.0, 1.0)
}

/// Scan the whole roster for candidates matching `search`. No early
/// termination: the roster is bounded to one season of players, so every
/// record is tested on every call.
pub fn find_matches(search: &str, roster: &Roster, options: &MatchOptions) -> Vec<MatchCandidate> {
    let search = search.trim();
    let mut out: Vec<MatchCandidate> = Vec::new();
    if search.is_empty() {
        return out;
    }
    for player in roster.values() {
        let Some(full_name) = player.full_name() else {
            continue;
        };
        if !options.include_inactive && !player.status.is_active() {
            continue;
        }
        if let Some(positions) = &options.require_position_in {
            if !positions.contains(&player.position) {
                continue;
            }
        }
        if names_match(search, &full_name) {
            out.push(MatchCandidate {
                confidence: confidence_for(search, player, &full_name),
                player: player.clone(),
                query: search.to_string(),
            });
        }
    }
    let prefer_active = options.prefer_active_in_ordering;
    out.sort_by(|a, b| {
        // 0 sorts first; the active partition only applies when requested.
        let rank = |c: &MatchCandidate| u8::from(prefer_active && !c.player.status.is_active());
        rank(a)
            .cmp(&rank(b))
            .then(
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            // Stable id tie-break keeps the ordering deterministic.
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
    tracing::debug!(query = %search, candidates = out.len(), "roster scan complete");
    out
}

/// Resolve a search name to its best roster match, narrowing near-ties by
/// unique active status, then unique team affiliation, before giving up and
/// surfacing alternatives.
pub fn resolve_best(search: &str, roster: &Roster, options: &MatchOptions) -> ResolutionResult {
    let mut candidates = find_matches(search, roster, options);
    if candidates.is_empty() {
        return ResolutionResult::NoMatch;
    }
    if candidates.len() == 1 {
        return ResolutionResult::UniqueMatch(candidates.remove(0));
    }
    let top = candidates[0].confidence;
    if top - candidates[1].confidence > scoring::DOMINANCE_MARGIN {
        return ResolutionResult::UniqueMatch(candidates.remove(0));
    }
    // Everything within the margin of the top is contested.
    let tied: Vec<MatchCandidate> = candidates
        .iter()
        .filter(|c| top - c.confidence <= scoring::DOMINANCE_MARGIN)
        .cloned()
        .collect();
    let actives: Vec<&MatchCandidate> =
        tied.iter().filter(|c| c.player.status.is_active()).collect();
    if actives.len() == 1 {
        return ResolutionResult::UniqueMatch(actives[0].clone());
    }
    let with_team: Vec<&MatchCandidate> =
        tied.iter().filter(|c| c.player.team.is_some()).collect();
    if with_team.len() == 1 {
        return ResolutionResult::UniqueMatch(with_team[0].clone());
    }
    let best = tied[0].clone();
    let alternatives: Vec<MatchCandidate> = tied.iter().skip(1).take(2).cloned().collect();
    ResolutionResult::AmbiguousMatch { best, alternatives }
}

/// `resolve_best` with the one genuinely fallible per-query step surfaced:
/// compiling the query's own pattern. Used by batch resolution to route
/// pathological inputs to the error bucket instead of aborting.
pub fn try_resolve_best(
    search: &str,
    roster: &Roster,
    options: &MatchOptions,
) -> Result<ResolutionResult, PatternError> {
    pattern_for(&fold(search.trim()))?;
    Ok(resolve_best(search, roster, options))
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbiguousLine {
    pub query: String,
    pub best: MatchCandidate,
    pub alternatives: Vec<MatchCandidate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineError {
    pub query: String,
    pub message: String,
}

/// Batch resolution outcome. Every non-blank input line lands in exactly one
/// bucket; nothing is silently dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveListResult {
    pub matched: Vec<MatchCandidate>,
    pub unmatched: Vec<String>,
    pub ambiguous: Vec<AmbiguousLine>,
    pub errors: Vec<LineError>,
    /// Lines skipped because the caller cancelled mid-batch.
    pub not_attempted: Vec<String>,
}

/// Resolve a batch of raw input lines. Lines are trimmed and blanks skipped;
/// per-item failures are caught into `errors` so the batch is total over its
/// input. The cancel token is consulted at the top of each iteration.
pub fn resolve_list(
    lines: &[String],
    roster: &Roster,
    options: &MatchOptions,
    cancel: &CancelToken,
) -> ResolveListResult {
    let mut result = ResolveListResult::default();
    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if cancel.is_cancelled() {
            result.not_attempted.push(line.to_string());
            continue;
        }
        match try_resolve_best(line, roster, options) {
            Ok(ResolutionResult::NoMatch) => result.unmatched.push(line.to_string()),
            Ok(ResolutionResult::UniqueMatch(candidate)) => result.matched.push(candidate),
            Ok(ResolutionResult::AmbiguousMatch { best, alternatives }) => {
                result.ambiguous.push(AmbiguousLine {
                    query: line.to_string(),
                    best,
                    alternatives,
                })
            }
            Err(err) => {
                tracing::warn!(query = %line, error = %err, "line failed to resolve");
                result.errors.push(LineError {
                    query: line.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
    result
}
