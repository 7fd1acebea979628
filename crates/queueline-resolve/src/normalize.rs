//! Name normalization: diacritic folding, first-name abbreviation expansion,
//! and compiled per-name matching patterns with manual overrides.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(thiserror::Error, Debug)]
pub enum PatternError {
    #[error("name pattern failed to compile for {name:?}: {source}")]
    Compile {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Fold a single character to its ASCII base form, `None` when no mapping
/// exists. "ß" widens to "ss", ligatures widen similarly; everything else is a
/// one-to-one base-letter substitution.
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' | 'Ā' => "A",
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'É' | 'È' | 'Ê' | 'Ë' | 'Ē' => "E",
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' | 'ő' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' | 'Ø' => "O",
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' => "N",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'š' | 'ś' => "s",
        'Š' => "S",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' => "Z",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'ř' => "r",
        'ť' => "t",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "Ae",
        'œ' => "oe",
        'Œ' => "Oe",
        _ => return None,
    };
    Some(folded)
}

/// Fold diacritics to their ASCII base letters. Total and idempotent:
/// characters without a mapping pass through unchanged, and every mapped
/// output is plain ASCII.
pub fn fold(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match fold_char(c) {
            Some(base) => out.push_str(base),
            None => out.push(c),
        }
    }
    out
}

/// Interchangeable first-name forms. Matching any member of a group rewrites
/// the leading token into an alternation over the whole group.
const FIRST_NAME_GROUPS: &[&[&str]] = &[
    &["mike", "michael"],
    &["matt", "matthew"],
    &["chris", "christopher"],
    &["rob", "robert", "bob", "bobby"],
    &["will", "william", "bill", "billy"],
    &["dan", "daniel", "danny"],
    &["dave", "david"],
    &["jim", "james", "jimmy"],
    &["joe", "joseph", "joey"],
    &["josh", "joshua"],
    &["jon", "jonathan", "john", "johnny"],
    &["nick", "nicholas"],
    &["alex", "alexander"],
    &["tony", "anthony"],
    &["zach", "zachary", "zack"],
    &["ken", "kenneth", "kenny"],
    &["cam", "cameron"],
    &["tim", "timothy"],
    &["tom", "thomas", "tommy"],
    &["ben", "benjamin"],
    &["steve", "steven", "stephen"],
    &["greg", "gregory"],
    &["pat", "patrick"],
    &["drew", "andrew"],
    &["jeff", "jeffrey", "jeffery"],
    &["ed", "edward", "eddie"],
];

/// Manual full-name override patterns, keyed by exact lowercase full name.
/// These cover names whose on-roster and colloquial forms diverge beyond what
/// the generic rules recover.
static MANUAL_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("hollywood brown", r"^(?:hollywood|marquise)\s+brown");
    m.insert("marquise brown", r"^(?:hollywood|marquise)\s+brown");
    m.insert("dj moore", r"^d\.?\s*j\.?\s*moore");
    m.insert("gabe davis", r"^(?:gabe|gabriel)\s+davis");
    m.insert("scotty miller", r"^scott?y?\s+miller");
    m
});

/// If the name begins with a known first-name abbreviation (or a known full
/// form), rewrite the leading token into an anchored alternation over every
/// interchangeable form. Returns the input unchanged when no group matches.
///
/// Applied to the escaped pattern text before compilation, never to raw
/// user-visible strings.
pub fn expand_first_name_prefix(pattern: &str) -> String {
    let first_token = match pattern.split(' ').next() {
        Some(t) if !t.is_empty() => t,
        _ => return pattern.to_string(),
    };
    let lowered = first_token.to_lowercase();
    for group in FIRST_NAME_GROUPS {
        if group.contains(&lowered.as_str()) {
            let alternation = format!("^(?:{})", group.join("|"));
            let rest = &pattern[first_token.len()..];
            return format!("{}{}", alternation, rest);
        }
    }
    pattern.to_string()
}

/// Escape pattern metacharacters, except hyphen and period which become
/// "optionally present, optionally space-separated" joints so that
/// "St. Brown", "St Brown", and "A.J." all line up.
fn escape_with_joints(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        match c {
            '.' | '-' => out.push_str(r"[.\-]?\s*"),
            // Only true metacharacters get escaped; escaping arbitrary
            // letters is itself a pattern error.
            '\\' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

fn build_pattern_source(name: &str) -> String {
    let key = name.trim().to_lowercase();
    if let Some(over) = MANUAL_OVERRIDES.get(key.as_str()) {
        return (*over).to_string();
    }
    let escaped = escape_with_joints(name.trim());
    let expanded = expand_first_name_prefix(&escaped);
    if expanded.starts_with('^') {
        expanded
    } else {
        format!("^{}", expanded)
    }
}

// Unbounded by design: the set of distinct names queried in one session is
// small, and patterns are reused heavily across a roster scan.
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Compile (and cache for the process lifetime) the matching pattern for a
/// name. Case-insensitive, anchored at the start of the candidate string.
pub fn pattern_for(name: &str) -> Result<Regex, PatternError> {
    if let Ok(cache) = PATTERN_CACHE.lock() {
        if let Some(re) = cache.get(name) {
            return Ok(re.clone());
        }
    }
    let source = format!("(?i){}", build_pattern_source(name));
    let re = Regex::new(&source).map_err(|source| PatternError::Compile {
        name: name.to_string(),
        source,
    })?;
    if let Ok(mut cache) = PATTERN_CACHE.lock() {
        cache.insert(name.to_string(), re.clone());
    }
    Ok(re)
}

/// Symmetric name comparison: fold both sides, then accept if either folded
/// name satisfies the other's compiled pattern. Total — empty input is a
/// non-match and pattern failures degrade to case-insensitive equality.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let fa = fold(a);
    let fb = fold(b);
    let forward = match pattern_for(&fa) {
        Ok(re) => re.is_match(&fb),
        Err(err) => {
            tracing::debug!(name = %fa, error = %err, "pattern fallback to literal equality");
            fa.eq_ignore_ascii_case(&fb)
        }
    };
    if forward {
        return true;
    }
    match pattern_for(&fb) {
        Ok(re) => re.is_match(&fa),
        Err(err) => {
            tracing::debug!(name = %fb, error = %err, "pattern fallback to literal equality");
            fb.eq_ignore_ascii_case(&fa)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_is_idempotent_and_total() {
        let names = ["José Ramírez", "Müller-Öst", "ßœæ", "Plain Name", ""];
        for n in names {
            let once = fold(n);
            assert_eq!(fold(&once), once, "fold not idempotent for {:?}", n);
        }
        assert_eq!(fold("José"), "Jose");
        assert_eq!(fold("ß"), "ss");
        assert_eq!(fold("名前"), "名前");
    }

    #[test]
    fn names_match_is_reflexive_after_fold() {
        for n in ["Josh Allen", "José Ramírez", "T.J. Hockenson", "Amon-Ra St. Brown"] {
            let folded = fold(n);
            assert!(names_match(&folded, &folded), "not reflexive: {:?}", n);
        }
    }

    #[test]
    fn names_match_is_symmetric() {
        let pairs = [
            ("Mike Evans", "Michael Evans"),
            ("Josh Allen", "Joshua Allen"),
            ("Josh Allen", "Patrick Mahomes"),
            ("T.J. Hockenson", "TJ Hockenson"),
        ];
        for (a, b) in pairs {
            assert_eq!(names_match(a, b), names_match(b, a), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn first_name_abbreviations_expand_both_ways() {
        assert!(names_match("Mike Evans", "Michael Evans"));
        assert!(names_match("Michael Evans", "Mike Evans"));
        assert!(names_match("Matt Stafford", "Matthew Stafford"));
        assert!(!names_match("Mike Evans", "Michael Thomas"));
    }

    #[test]
    fn hyphen_and_period_are_loose_joints() {
        assert!(names_match("A.J. Brown", "AJ Brown"));
        assert!(names_match("Amon-Ra St. Brown", "Amon Ra St Brown"));
        assert!(names_match("Clyde Edwards-Helaire", "Clyde Edwards Helaire"));
    }

    #[test]
    fn manual_overrides_take_precedence() {
        assert!(names_match("Hollywood Brown", "Marquise Brown"));
        assert!(names_match("Gabe Davis", "Gabriel Davis"));
    }

    #[test]
    fn empty_and_blank_inputs_never_match() {
        assert!(!names_match("", ""));
        assert!(!names_match("  ", "Josh Allen"));
        assert!(!names_match("Josh Allen", ""));
    }

    #[test]
    fn diacritics_fold_before_matching() {
        assert!(names_match("Jose Ramirez", "José Ramírez"));
        assert!(names_match("José Ramírez", "Jose Ramirez"));
    }

    #[test]
    fn patterns_anchor_at_the_start() {
        // "Allen" must not match a name merely containing it later on.
        assert!(!names_match("Allen Josh", "Josh Allen"));
    }

    #[test]
    fn expansion_anchors_the_pattern() {
        let expanded = expand_first_name_prefix("mike evans");
        assert!(expanded.starts_with("^(?:"));
        assert!(expanded.contains("michael"));
        let untouched = expand_first_name_prefix("rando evans");
        assert_eq!(untouched, "rando evans");
    }
}
