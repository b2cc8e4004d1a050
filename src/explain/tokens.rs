//! Global token statistics: frequency per group and mutual information with the label.

use std::collections::{BTreeMap, BTreeSet};

use crate::digestibles::FeatureScore;

/// Sort best first; ties broken alphabetically. Keeps the top `k`.
fn top_k(scores: BTreeMap<String, f64>, k: usize) -> Vec<FeatureScore> {
    let mut ranked: Vec<FeatureScore> = scores
        .into_iter()
        .map(|(token, score)| FeatureScore { token, score })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.token.cmp(&b.token)));
    ranked.truncate(k);
    ranked
}

/// Most frequent tokens over `documents` (already tokenized).
pub fn frequency<'a, I>(documents: I, k: usize) -> Vec<FeatureScore>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    for tokens in documents {
        for token in tokens {
            *counts.entry(token.clone()).or_default() += 1.0;
        }
    }
    top_k(counts, k)
}

/// Tokens whose presence carries the most information about the label.
///
/// Each document is `(tokens, label)`; scores are mutual information in nats
/// between "token occurs in the document" and the label.
pub fn information(documents: &[(Vec<String>, String)], k: usize) -> Vec<FeatureScore> {
    let n = documents.len() as f64;
    if documents.is_empty() {
        return Vec::new();
    }

    let mut label_counts: BTreeMap<&str, f64> = BTreeMap::new();
    // token → label → documents containing token with that label
    let mut joint: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for (tokens, label) in documents {
        *label_counts.entry(label.as_str()).or_default() += 1.0;
        let present: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
        for token in present {
            *joint.entry(token).or_default().entry(label.as_str()).or_default() += 1.0;
        }
    }

    let term = |n_xy: f64, n_x: f64, n_y: f64| {
        if n_xy == 0.0 {
            0.0
        } else {
            (n_xy / n) * ((n * n_xy) / (n_x * n_y)).ln()
        }
    };

    let scores = joint
        .into_iter()
        .map(|(token, per_label)| {
            let with_token: f64 = per_label.values().sum();
            let without_token = n - with_token;
            let mi = label_counts
                .iter()
                .map(|(label, &n_y)| {
                    let n_ty = per_label.get(label).copied().unwrap_or(0.0);
                    term(n_ty, with_token, n_y) + term(n_y - n_ty, without_token, n_y)
                })
                .sum::<f64>();
            (token.to_string(), mi.max(0.0))
        })
        .collect();
    top_k(scores, k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn frequency_ranks_by_count_then_token() {
        let docs = [toks("a b a"), toks("b c")];
        let ranked = frequency(docs.iter().map(Vec::as_slice), 2);
        let tokens: Vec<&str> = ranked.iter().map(|f| f.token.as_str()).collect();
        assert_eq!(tokens, vec!["a", "b"]);
        assert_eq!(ranked[0].score, 2.0);
    }

    #[test]
    fn perfectly_predictive_token_scores_highest() {
        let docs = vec![
            (toks("great film"), "pos".to_string()),
            (toks("great plot"), "pos".to_string()),
            (toks("bad film"), "neg".to_string()),
            (toks("bad plot"), "neg".to_string()),
        ];
        let ranked = information(&docs, 4);
        assert_eq!(ranked[0].token, "bad");
        assert_eq!(ranked[1].token, "great");
        assert!((ranked[0].score - std::f64::consts::LN_2).abs() < 1e-12);
        assert!(ranked[3].score.abs() < 1e-12);
    }

    #[test]
    fn joined_label_sets_are_their_own_class() {
        let docs = vec![
            (toks("both"), "a,b".to_string()),
            (toks("both"), "a,b".to_string()),
            (toks("one"), "a".to_string()),
            (toks("one"), "a".to_string()),
        ];
        let ranked = information(&docs, 2);
        assert!(ranked.iter().all(|f| (f.score - std::f64::consts::LN_2).abs() < 1e-12));
    }

    #[test]
    fn no_documents() {
        assert!(information(&[], 3).is_empty());
    }
}
