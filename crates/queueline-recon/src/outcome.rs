//! Per-item reconciliation outcomes and the run summary returned to callers.

/// Outcome of one reconciliation item. Batch operations return one of these
/// per input item; nothing is silently dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The add trigger was activated. The surface provides no acknowledgment
    /// channel, so this is optimistic: activation succeeded, the resulting
    /// queue state is not independently verified.
    Added,
    /// The target already appeared in the scanned queue (or was added
    /// through another path); no trigger was activated.
    AlreadyPresentOrAddedElsewhere,
    /// A remove trigger was activated.
    Removed,
    /// No discoverable trigger after every variation and strategy.
    NotFound,
    /// The batch was cancelled before this item was attempted.
    NotAttempted,
    /// Surface instability or an internal failure, downgraded to this item.
    Error(String),
}

impl ReconciliationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationOutcome::Added => "added",
            ReconciliationOutcome::AlreadyPresentOrAddedElsewhere => "already_present",
            ReconciliationOutcome::Removed => "removed",
            ReconciliationOutcome::NotFound => "not_found",
            ReconciliationOutcome::NotAttempted => "not_attempted",
            ReconciliationOutcome::Error(_) => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ReconciliationOutcome::Added
                | ReconciliationOutcome::AlreadyPresentOrAddedElsewhere
                | ReconciliationOutcome::Removed
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Human-readable target: the player's full name, or the raw entry text
    /// when no name could be extracted.
    pub label: String,
    pub outcome: ReconciliationOutcome,
}

/// Aggregated result of one reconciliation run. Never persisted across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items: Vec<ItemOutcome>,
}

impl RunSummary {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_success()).count()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome.as_str() == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_kind() {
        let summary = RunSummary {
            items: vec![
                ItemOutcome {
                    label: "a".into(),
                    outcome: ReconciliationOutcome::Added,
                },
                ItemOutcome {
                    label: "b".into(),
                    outcome: ReconciliationOutcome::NotFound,
                },
                ItemOutcome {
                    label: "c".into(),
                    outcome: ReconciliationOutcome::Error("boom".into()),
                },
            ],
        };
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.count_of("not_found"), 1);
        assert_eq!(summary.count_of("error"), 1);
    }
}
