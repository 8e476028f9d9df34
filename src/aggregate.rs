use serde::Serialize;

use crate::config::CategoryWeights;
use crate::map::OrderedMap;

/// One entry of a ranking list; serializes as a `[category, score]` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCategory(pub String, pub f64);

impl RankedCategory {
    pub fn category(&self) -> &str {
        &self.0
    }

    pub fn score(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub overall_score: f64,
    pub top_categories: Vec<RankedCategory>,
    pub bottom_categories: Vec<RankedCategory>,
}

// ---------------------------------------------------------------------------
// Overall score
// ---------------------------------------------------------------------------

/// Weighted mean of category scores, normalized by the absolute weights.
///
/// The numerator covers scored categories that carry a weight. The
/// denominator is every configured weight, so a weighted category the protocol
/// does not define still dilutes the result. Negative weights pull the result
/// down. The result is rounded to two decimals and clamped to [0, 100]; an
/// empty weight table scores 0.
pub fn overall_score(scores: &OrderedMap<f64>, weights: &CategoryWeights) -> f64 {
    let weighted_sum: f64 = scores
        .iter()
        .filter_map(|(category, score)| weights.get(category).map(|w| score * w))
        .sum();
    let total_weight = weights.absolute_sum();
    if total_weight <= f64::EPSILON {
        return 0.0;
    }
    let raw = ((weighted_sum / total_weight) * 100.0).round() / 100.0;
    raw.clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// Highest-scoring categories first. The sort is stable, so ties keep protocol order.
pub fn top(scores: &OrderedMap<f64>, n: usize) -> Vec<RankedCategory> {
    let mut ranked = ranked(scores);
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(n);
    ranked
}

/// Lowest-scoring categories first, ties in protocol order.
pub fn bottom(scores: &OrderedMap<f64>, n: usize) -> Vec<RankedCategory> {
    let mut ranked = ranked(scores);
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(n);
    ranked
}

fn ranked(scores: &OrderedMap<f64>) -> Vec<RankedCategory> {
    scores
        .iter()
        .map(|(k, v)| RankedCategory(k.to_string(), *v))
        .collect()
}

pub fn aggregate(
    scores: &OrderedMap<f64>,
    weights: &CategoryWeights,
    ranking_size: usize,
) -> Aggregate {
    Aggregate {
        overall_score: overall_score(scores, weights),
        top_categories: top(scores, ranking_size),
        bottom_categories: bottom(scores, ranking_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> OrderedMap<f64> {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn negative_weight_pulls_score_down() {
        let s = scores(&[("Greeting", 100.0), ("Misbehavior", 20.0)]);
        let w: CategoryWeights = vec![("Greeting", 1.0), ("Misbehavior", -1.0)]
            .into_iter()
            .collect();
        // (100 - 20) / 2
        assert_eq!(overall_score(&s, &w), 40.0);
    }

    #[test]
    fn dominant_negative_clamps_to_zero() {
        let s = scores(&[("Greeting", 10.0), ("Misbehavior", 90.0)]);
        let w: CategoryWeights = vec![("Greeting", 0.5), ("Misbehavior", -1.0)]
            .into_iter()
            .collect();
        assert_eq!(overall_score(&s, &w), 0.0);
    }

    #[test]
    fn no_weighted_categories_scores_zero() {
        let s = scores(&[("Greeting", 100.0)]);
        assert_eq!(overall_score(&s, &CategoryWeights::empty()), 0.0);
    }

    #[test]
    fn weights_missing_from_scores_still_dilute() {
        let s = scores(&[("Greeting", 100.0)]);
        let w: CategoryWeights = vec![
            ("Greeting", 0.10),
            ("Step by Step", 0.40),
            ("Misbehavior", -0.25),
        ]
        .into_iter()
        .collect();
        // 100 * 0.10 / 0.75
        assert_eq!(overall_score(&s, &w), 13.33);
    }

    #[test]
    fn default_table_with_one_matched_category() {
        let s = scores(&[("Communication - Greeting the Student", 100.0)]);
        // 100 * 0.10 / 1.75
        assert_eq!(overall_score(&s, &CategoryWeights::default()), 5.71);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let s = scores(&[("A", 33.333), ("B", 66.667), ("C", 50.0)]);
        let w: CategoryWeights = vec![("A", 1.0), ("B", 1.0), ("C", 1.0)].into_iter().collect();
        assert_eq!(overall_score(&s, &w), 50.0);
        let s = scores(&[("A", 12.345), ("B", 0.0)]);
        let w: CategoryWeights = vec![("A", 2.0), ("B", 1.0)].into_iter().collect();
        assert_eq!(overall_score(&s, &w), 8.23);
    }

    #[test]
    fn ties_keep_protocol_order() {
        let s = scores(&[("A", 50.0), ("B", 80.0), ("C", 50.0), ("D", 50.0), ("E", 10.0)]);
        let names = |v: Vec<RankedCategory>| v.into_iter().map(|r| r.0).collect::<Vec<_>>();
        assert_eq!(names(top(&s, 3)), vec!["B", "A", "C"]);
        assert_eq!(names(bottom(&s, 3)), vec!["E", "A", "C"]);
    }

    #[test]
    fn short_lists_hold_every_category() {
        let s = scores(&[("A", 1.0), ("B", 2.0)]);
        assert_eq!(top(&s, 3).len(), 2);
        assert_eq!(bottom(&s, 3).len(), 2);
    }
}
