use std::collections::HashSet;

use decoy_common::Message;

const SIMILARITY_FLOOR: f64 = 0.7;

/// True when the last `threshold` scammer turns all say roughly the same thing.
///
/// Needs at least `threshold` scammer messages; each consecutive pair among
/// the last `threshold` must have word-set Jaccard similarity of at least 0.7.
pub fn is_repetitive(history: &[Message], threshold: usize) -> bool {
    let scammer: Vec<&Message> = history.iter().filter(|m| m.is_from_scammer()).collect();
    if threshold == 0 || scammer.len() < threshold {
        return false;
    }

    let recent: Vec<HashSet<String>> = scammer[scammer.len() - threshold..]
        .iter()
        .map(|m| word_set(&m.text))
        .collect();

    recent
        .windows(2)
        .all(|pair| jaccard_similarity(&pair[0], &pair[1]) >= SIMILARITY_FLOOR)
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
