use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use crate::db::Profile;

/// Jaccard similarity between two tag sets. An empty union scores 0.
pub fn score(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Orders candidates by tag overlap with `me`, best first, ties broken
/// by ascending id so the feed is deterministic. `excluded` carries
/// already-liked and already-matched ids; self is dropped regardless.
pub fn rank(me: &Profile, candidates: Vec<Profile>, excluded: &HashSet<Uuid>) -> Vec<(Profile, f64)> {
    let mut ranked: Vec<(Profile, f64)> = candidates
        .into_iter()
        .filter(|c| c.id != me.id && !excluded.contains(&c.id))
        .map(|c| {
            let s = score(&me.tags, &c.tags);
            (c, s)
        })
        .collect();
    ranked.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
}
