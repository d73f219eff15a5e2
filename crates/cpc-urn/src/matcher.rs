/// Select the highest-specificity item among candidates whose pattern
/// accepts `request`. See [`all_matches`] for the tie-break rule.
pub fn best_match<'a, T>(
    candidates: &'a [T],
    accepts: impl Fn(&T, &T) -> bool,
    specificity: impl Fn(&T) -> usize,
    canonical_key: impl Fn(&T) -> String,
    request: &T,
) -> Option<&'a T> {
    all_matches(candidates, accepts, specificity, canonical_key, request)
        .into_iter()
        .next()
}

/// All accepting candidates, sorted by specificity descending. Ties are
/// broken by lexicographic order of `canonical_key`, so the result is
/// deterministic regardless of candidate order. Callers that need a
/// different tie-break (e.g. a dispatcher preferring registration order)
/// should sort candidates themselves rather than use this helper.
pub fn all_matches<'a, T>(
    candidates: &'a [T],
    accepts: impl Fn(&T, &T) -> bool,
    specificity: impl Fn(&T) -> usize,
    canonical_key: impl Fn(&T) -> String,
    request: &T,
) -> Vec<&'a T> {
    let mut matched: Vec<&T> = candidates.iter().filter(|c| accepts(c, request)).collect();
    matched.sort_by(|a, b| {
        specificity(b)
            .cmp(&specificity(a))
            .then_with(|| canonical_key(a).cmp(&canonical_key(b)))
    });
    matched
}
