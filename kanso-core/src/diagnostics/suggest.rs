// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! "Did you mean" suggestion engine.
//!
//! Edit distance ≤ 2, candidate length > 2, and nothing at all for
//! two-byte targets: short names produce too many accidental neighbors to
//! be worth suggesting.

/// Maximum edit distance for a name to count as "close".
const MAX_DISTANCE: usize = 2;

/// Candidates at or below this length are never suggested.
const MIN_CANDIDATE_LEN: usize = 2;

/// Targets at or below this length never get suggestions.
const MIN_TARGET_LEN: usize = 2;

/// Classic Levenshtein distance over bytes.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// All in-scope names close enough to `target`, best first.
pub fn suggest_candidates<'a, I>(target: &str, candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if target.len() <= MIN_TARGET_LEN {
        return Vec::new();
    }

    let mut close: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|c| c.len() > MIN_CANDIDATE_LEN && *c != target)
        .map(|c| (levenshtein(target, c), c))
        .filter(|(d, _)| *d <= MAX_DISTANCE)
        .collect();
    close.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.cmp(b)));
    close.into_iter().map(|(_, c)| c).collect()
}

/// The single best match, if any.
pub fn closest_match<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    suggest_candidates(target, candidates).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("balace", "balance"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn close_names_are_suggested_best_first() {
        let names = ["balance", "balances", "supply"];
        assert_eq!(
            suggest_candidates("balace", names),
            vec!["balance", "balances"]
        );
        assert_eq!(closest_match("balace", names), Some("balance"));
    }

    #[test]
    fn distant_names_are_not_suggested() {
        assert_eq!(closest_match("transfer", ["balance", "supply"]), None);
    }

    #[test]
    fn short_targets_fail_early() {
        assert_eq!(closest_match("xy", ["xyz", "xya"]), None);
    }

    #[test]
    fn short_candidates_are_skipped() {
        assert_eq!(closest_match("abc", ["ab", "ax"]), None);
    }
}
