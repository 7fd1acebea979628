//! Loose, human-in-the-loop comparison between desired names and the queue.

use queueline_resolve::fold;

/// Review of a desired list against the observed queue.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidateReport {
    /// Input lines that resolved and loosely matched a queued entry.
    pub in_queue: Vec<String>,
    /// Input lines that resolved but matched nothing on the queue.
    pub not_in_queue: Vec<String>,
    /// Input lines that did not resolve to any roster record.
    pub invalid: Vec<String>,
    /// Input lines skipped because the caller cancelled mid-batch.
    pub not_attempted: Vec<String>,
}

/// Token-based comparator, deliberately more permissive than the resolution
/// engine's pattern matching: compact on-queue rendering loses punctuation
/// and middle tokens, and a reviewing human tolerates the slack.
///
/// Accepts on any of: exact folded equality, first and last token equality,
/// a single-word side appearing as a token of the other, or whole-phrase
/// containment either way.
pub fn loose_compare(a: &str, b: &str) -> bool {
    let a = fold(a.trim()).to_lowercase();
    let b = fold(b.trim()).to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    if ta.len() >= 2 && tb.len() >= 2 {
        let (af, al) = (ta[0], ta[ta.len() - 1]);
        let (bf, bl) = (tb[0], tb[tb.len() - 1]);
        if af == bf && al == bl {
            return true;
        }
    }
    if ta.len() == 1 && tb.contains(&ta[0]) {
        return true;
    }
    if tb.len() == 1 && ta.contains(&tb[0]) {
        return true;
    }
    // Whole-phrase containment, multi-token phrases only; single tokens were
    // handled above and raw substrings of one word are too loose.
    (tb.len() >= 2 && a.contains(&b)) || (ta.len() >= 2 && b.contains(&a))
}
