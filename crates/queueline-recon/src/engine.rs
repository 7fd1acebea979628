//! The reconciliation engine: add and clear state machines over a
//! [`SurfaceAdapter`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use queueline_core::{CancelToken, PlayerRecord, Roster};
use queueline_resolve::{fold, try_resolve_best, MatchOptions, ResolutionResult};
use queueline_surface::{
    DiscoveryQuery, ElementHandle, ElementRole, FilterStrategy, SurfaceAdapter, SurfaceError,
};

use crate::outcome::{ItemOutcome, ReconciliationOutcome, RunSummary};
use crate::scan::{extract_name_with_label, QueuedEntry, DEFAULT_REMOVE_LABEL};
use crate::validate::{loose_compare, ValidateReport};

/// Tunables for one engine instance. Constructed once per session and passed
/// in; the delays pace the surface's own reactive updates and are not
/// correctness mechanisms.
#[derive(Clone, Debug)]
pub struct ReconConfig {
    /// Pause between consecutive per-item operations.
    pub inter_op_delay: Duration,
    /// Wait after a trigger or filter change before re-observing.
    pub settle_delay: Duration,
    /// Visible label of remove triggers, compared case-insensitively.
    pub remove_label: String,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            inter_op_delay: Duration::from_millis(150),
            settle_delay: Duration::from_millis(250),
            remove_label: DEFAULT_REMOVE_LABEL.to_string(),
        }
    }
}

/// Search-box variations tried, in order, when a target is not among the
/// currently rendered rows.
fn name_variations(full_name: &str) -> Vec<String> {
    let stripped: String = full_name
        .chars()
        .filter(|c| !matches!(c, '.' | '\'' | '-' | ','))
        .collect();
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.last().unwrap_or_default().to_string();
    let mut out = vec![
        full_name.to_string(),
        stripped,
        first,
        last,
        full_name.to_lowercase(),
        full_name.to_uppercase(),
    ];
    out.retain(|v| !v.trim().is_empty());
    let mut seen = Vec::new();
    out.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(v.clone());
            true
        }
    });
    out
}

/// Containment check for a rendered row against a target name. Deliberately
/// looser than the resolution patterns: compact rows drop punctuation and
/// middle names, so full-name containment or independent first+last token
/// presence both count.
fn entry_matches_target(entry_text: &str, full_name: &str) -> bool {
    let text = fold(entry_text).to_lowercase();
    let name = fold(full_name).to_lowercase();
    if name.is_empty() || text.is_empty() {
        return false;
    }
    if text.contains(&name) {
        return true;
    }
    // Rows render as "Allen, Josh (QB)" and similar; compare bare tokens.
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect();
    let mut parts = name.split_whitespace();
    let (Some(first), Some(last)) = (parts.next(), parts.last()) else {
        return false;
    };
    tokens.iter().any(|t| t == first) && tokens.iter().any(|t| t == last)
}

pub struct ReconEngine {
    surface: Arc<dyn SurfaceAdapter>,
    config: ReconConfig,
}

impl ReconEngine {
    pub fn new(surface: Arc<dyn SurfaceAdapter>, config: ReconConfig) -> Self {
        Self { surface, config }
    }

    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Scan the surface for currently queued entries: every remove trigger
    /// whose visible label matches, with its enclosing row text parsed for a
    /// probable name. The returned handles are stale after the next mutation.
    pub async fn scan_queued(&self) -> Result<Vec<QueuedEntry>, SurfaceError> {
        let query = DiscoveryQuery::labeled(ElementRole::RemoveTrigger, &self.config.remove_label);
        let handles = self.surface.discover(&query).await?;
        let mut entries = Vec::with_capacity(handles.len());
        for handle in handles {
            let label = match self.surface.text_of(&handle).await {
                Ok(label) => label,
                Err(err) => {
                    tracing::debug!(%handle, error = %err, "remove trigger vanished mid-scan");
                    continue;
                }
            };
            if !label.trim().eq_ignore_ascii_case(&self.config.remove_label) {
                continue;
            }
            let raw = match self.surface.entry_text_of(&handle).await {
                Ok(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
                Err(err) => {
                    tracing::debug!(%handle, error = %err, "queued row text unreadable");
                    continue;
                }
            };
            let name = extract_name_with_label(&raw, &self.config.remove_label);
            entries.push(QueuedEntry {
                name,
                raw_text: raw,
                handle,
            });
        }
        tracing::debug!(entries = entries.len(), "queue scan complete");
        Ok(entries)
    }

    /// Drive one add per target, sequentially. Sequencing is a correctness
    /// requirement: the filter input is a single shared resource, so
    /// concurrent attempts would corrupt each other's narrowed view.
    pub async fn add_players(
        &self,
        targets: &[PlayerRecord],
        cancel: &CancelToken,
    ) -> RunSummary {
        let mut items = Vec::with_capacity(targets.len());
        for target in targets {
            let label = target.full_name().unwrap_or_else(|| target.id.clone());
            if cancel.is_cancelled() {
                items.push(ItemOutcome {
                    label,
                    outcome: ReconciliationOutcome::NotAttempted,
                });
                continue;
            }
            let outcome = self.add_player(target).await;
            tracing::info!(player = %label, outcome = outcome.as_str(), "add pass finished");
            items.push(ItemOutcome { label, outcome });
            sleep(self.config.inter_op_delay).await;
        }
        RunSummary { items }
    }

    /// One target's add state machine: pre-scan for presence, seek a rendered
    /// trigger, then fall back to driving the filter through name variations
    /// (native events first, instrumented driving second). Exhaustion reports
    /// `NotFound`; nothing in here panics or propagates surface instability.
    pub async fn add_player(&self, target: &PlayerRecord) -> ReconciliationOutcome {
        let Some(full_name) = target.full_name() else {
            return ReconciliationOutcome::Error(format!(
                "roster record {} is missing a full name",
                target.id
            ));
        };

        // Fresh scan first: an already-queued target is reported, never
        // re-triggered. The queue state still cannot be verified after an
        // add, so this stays a best-effort guard.
        match self.scan_queued().await {
            Ok(entries) => {
                let present = entries.iter().any(|e| {
                    e.name
                        .as_deref()
                        .map(|n| loose_compare(&full_name, n))
                        .unwrap_or(false)
                        || entry_matches_target(&e.raw_text, &full_name)
                });
                if present {
                    return ReconciliationOutcome::AlreadyPresentOrAddedElsewhere;
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "pre-add queue scan failed, continuing");
            }
        }

        // Directly rendered trigger.
        if let Some(handle) = self.seek_add_trigger(&full_name).await {
            return self.activate_add(&handle, &full_name).await;
        }

        // Not rendered: narrow the view through the shared filter, trigger
        // while narrowed, and always restore the unfiltered state after.
        let outcome = self.add_via_filter(&full_name).await;
        self.restore_filter().await;
        outcome
    }

    async fn seek_add_trigger(&self, full_name: &str) -> Option<ElementHandle> {
        let query = DiscoveryQuery::role(ElementRole::AddTrigger);
        let handles = match self.surface.discover(&query).await {
            Ok(handles) => handles,
            Err(err) => {
                tracing::debug!(error = %err, "add trigger discovery failed");
                return None;
            }
        };
        for handle in handles {
            match self.surface.entry_text_of(&handle).await {
                Ok(text) if entry_matches_target(&text, full_name) => return Some(handle),
                Ok(_) => {}
                Err(err) => {
                    tracing::trace!(%handle, error = %err, "row text unreadable during seek");
                }
            }
        }
        None
    }

    async fn activate_add(
        &self,
        handle: &ElementHandle,
        full_name: &str,
    ) -> ReconciliationOutcome {
        if !self.surface.is_attached(handle).await || !self.surface.is_visible(handle).await {
            return ReconciliationOutcome::Error(format!(
                "add trigger for {} went stale before activation",
                full_name
            ));
        }
        match self.surface.trigger(handle).await {
            Ok(()) => {
                sleep(self.config.settle_delay).await;
                ReconciliationOutcome::Added
            }
            Err(err) => ReconciliationOutcome::Error(err.to_string()),
        }
    }

    async fn add_via_filter(&self, full_name: &str) -> ReconciliationOutcome {
        let variations = name_variations(full_name);
        for strategy in [FilterStrategy::NativeEvent, FilterStrategy::Instrumented] {
            for variation in &variations {
                let applied = match self.surface.drive_filter_input(variation, strategy).await {
                    Ok(applied) => applied,
                    Err(SurfaceError::NoFilterInput) => {
                        tracing::debug!("no filter input on surface, giving up on filter path");
                        return ReconciliationOutcome::NotFound;
                    }
                    Err(err) => {
                        tracing::debug!(%variation, ?strategy, error = %err, "filter drive failed");
                        continue;
                    }
                };
                // Re-check even when the drive was not accepted: the row may
                // have been rendered independently in the meantime.
                sleep(self.config.settle_delay).await;
                if !applied {
                    tracing::trace!(%variation, ?strategy, "filter drive not accepted");
                }
                if let Some(handle) = self.seek_add_trigger(full_name).await {
                    // Trigger while still narrowed; the caller restores the
                    // unfiltered view.
                    return self.activate_add(&handle, full_name).await;
                }
            }
        }
        ReconciliationOutcome::NotFound
    }

    async fn restore_filter(&self) {
        for strategy in [FilterStrategy::NativeEvent, FilterStrategy::Instrumented] {
            match self.surface.drive_filter_input("", strategy).await {
                Ok(true) => break,
                Ok(false) => continue,
                Err(err) => {
                    tracing::debug!(?strategy, error = %err, "filter restore failed");
                    break;
                }
            }
        }
        sleep(self.config.settle_delay).await;
    }

    /// Remove everything currently queued. The loop is bounded by the entry
    /// count observed at the start, guarding against runaway iteration when
    /// re-scans drift; each iteration re-scans rather than trusting stale
    /// handles, and one entry's failure never aborts the rest.
    pub async fn clear_queue(&self, cancel: &CancelToken) -> RunSummary {
        let initial = match self.scan_queued().await {
            Ok(entries) => entries,
            Err(err) => {
                return RunSummary {
                    items: vec![ItemOutcome {
                        label: "queue scan".to_string(),
                        outcome: ReconciliationOutcome::Error(err.to_string()),
                    }],
                }
            }
        };
        if initial.is_empty() {
            return RunSummary::default();
        }
        let bound = initial.len();
        let mut items = Vec::with_capacity(bound);
        let mut current = initial;
        for _ in 0..bound {
            let Some(entry) = current.first().cloned() else {
                break;
            };
            let label = entry.name.clone().unwrap_or_else(|| entry.raw_text.clone());
            if cancel.is_cancelled() {
                for remaining in &current {
                    items.push(ItemOutcome {
                        label: remaining
                            .name
                            .clone()
                            .unwrap_or_else(|| remaining.raw_text.clone()),
                        outcome: ReconciliationOutcome::NotAttempted,
                    });
                }
                break;
            }
            let outcome = if !self.surface.is_attached(&entry.handle).await
                || !self.surface.is_visible(&entry.handle).await
            {
                ReconciliationOutcome::Error(format!(
                    "remove trigger for {} went stale before activation",
                    label
                ))
            } else {
                match self.surface.trigger(&entry.handle).await {
                    Ok(()) => {
                        sleep(self.config.settle_delay).await;
                        ReconciliationOutcome::Removed
                    }
                    Err(err) => ReconciliationOutcome::Error(err.to_string()),
                }
            };
            tracing::info!(entry = %label, outcome = outcome.as_str(), "remove pass finished");
            items.push(ItemOutcome { label, outcome });
            sleep(self.config.inter_op_delay).await;
            current = match self.scan_queued().await {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(error = %err, "re-scan failed, ending clear loop");
                    break;
                }
            };
            if current.is_empty() {
                break;
            }
        }
        RunSummary { items }
    }

    /// Review a desired list against the live queue with the loose
    /// comparator. Resolution failures land in `invalid`; ambiguous lines are
    /// compared through their best candidate.
    pub async fn validate_against_queue(
        &self,
        lines: &[String],
        roster: &Roster,
        options: &MatchOptions,
        cancel: &CancelToken,
    ) -> Result<ValidateReport, SurfaceError> {
        let queued = self.scan_queued().await?;
        let queued_names: Vec<String> = queued
            .iter()
            .map(|e| e.name.clone().unwrap_or_else(|| e.raw_text.clone()))
            .collect();
        let mut report = ValidateReport::default();
        for raw in lines {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if cancel.is_cancelled() {
                report.not_attempted.push(line.to_string());
                continue;
            }
            let resolved = match try_resolve_best(line, roster, options) {
                Ok(ResolutionResult::UniqueMatch(c)) => Some(c),
                Ok(ResolutionResult::AmbiguousMatch { best, .. }) => Some(best),
                Ok(ResolutionResult::NoMatch) => None,
                Err(err) => {
                    tracing::debug!(query = %line, error = %err, "validation line unresolvable");
                    None
                }
            };
            let Some(candidate) = resolved else {
                report.invalid.push(line.to_string());
                continue;
            };
            let full_name = candidate
                .player
                .full_name()
                .unwrap_or_else(|| candidate.query.clone());
            let hit = queued_names.iter().any(|q| loose_compare(&full_name, q));
            if hit {
                report.in_queue.push(line.to_string());
            } else {
                report.not_in_queue.push(line.to_string());
            }
        }
        Ok(report)
    }
}
