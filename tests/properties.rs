use proptest::prelude::*;

use protocol_guard::aggregate::{bottom, overall_score, top};
use protocol_guard::{normalize, CategoryWeights, OrderedMap, ProtocolDefinition};

fn scored_categories() -> impl Strategy<Value = Vec<(f64, Option<f64>)>> {
    prop::collection::vec(
        (0.0f64..=100.0, prop::option::of(-1.0f64..=1.0)),
        1..20,
    )
}

fn split(entries: &[(f64, Option<f64>)]) -> (OrderedMap<f64>, CategoryWeights) {
    let scores = entries
        .iter()
        .enumerate()
        .map(|(i, (s, _))| (format!("cat{i}"), *s))
        .collect();
    let weights = entries
        .iter()
        .enumerate()
        .filter_map(|(i, (_, w))| w.map(|w| (format!("cat{i}"), w)))
        .collect();
    (scores, weights)
}

proptest! {
    #[test]
    fn overall_score_stays_in_bounds(entries in scored_categories()) {
        let (scores, weights) = split(&entries);
        let overall = overall_score(&scores, &weights);
        prop_assert!((0.0..=100.0).contains(&overall), "overall {overall} out of range");
    }

    #[test]
    fn unweighted_scores_do_not_matter(entries in scored_categories(), bump in 0.0f64..=100.0) {
        let (scores, weights) = split(&entries);
        let before = overall_score(&scores, &weights);

        let mut perturbed = scores.clone();
        perturbed.insert("unweighted", bump);
        prop_assert_eq!(before, overall_score(&perturbed, &weights));
    }

    #[test]
    fn rankings_are_sorted(entries in scored_categories()) {
        let (scores, _) = split(&entries);
        let hi = top(&scores, 3);
        let lo = bottom(&scores, 3);
        prop_assert_eq!(hi.len(), scores.len().min(3));
        prop_assert_eq!(lo.len(), scores.len().min(3));
        prop_assert!(hi.windows(2).all(|w| w[0].score() >= w[1].score()));
        prop_assert!(lo.windows(2).all(|w| w[0].score() <= w[1].score()));
    }

    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,80}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(once.trim(), once.as_str());
    }

    #[test]
    fn phrase_in_shouting_text_is_exact_match(
        prefix in "[a-z ]{0,20}",
        suffix in "[a-z ]{0,20}",
    ) {
        let protocol = ProtocolDefinition::from_pairs(vec![
            ("Misbehavior", vec!["dont yell"]),
        ]).unwrap();
        let category = &protocol.categories()[0];
        let text = normalize(&format!("{prefix} Don't Yell!! {suffix}"));
        prop_assert!(category.has_exact_match(&text));
    }
}
