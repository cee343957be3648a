//! Property-based tests for the comparison engine
//!
//! Covers benchmark classification, rank-based tests, correlation and
//! reliability over random score vectors.

use egrastats::analysis::{
    classify, correlate, cronbach_alpha, kruskal_wallis, mann_whitney_u, test_partition,
    BenchmarkStatus, CorrelationPair,
};
use egrastats::catalog::MetricCatalog;
use egrastats::dataset::{Dataset, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn scores(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0u32..60).prop_map(f64::from), 1..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_classify_is_total_and_ordered(score in -10.0f64..200.0) {
        let catalog = MetricCatalog::builtin();
        for metric in catalog.iter() {
            let status = classify(score, metric);
            prop_assert_eq!(status == BenchmarkStatus::Mastery, score >= metric.mastery);
            prop_assert_eq!(classify(score, metric), status);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_significance_matches_level(
        a in scores(15),
        b in scores(15),
        level in 0.01f64..0.5,
    ) {
        let mut groups = BTreeMap::new();
        groups.insert("A".to_string(), a);
        groups.insert("B".to_string(), b);

        let result = test_partition("clpm", &groups, level).unwrap();
        prop_assert!((0.0..=1.0).contains(&result.p_value()));
        prop_assert_eq!(result.significant(), result.p_value() < level);
        prop_assert_eq!(result.groups_compared(), 2);
    }

    #[test]
    fn prop_mann_whitney_symmetric(x in scores(12), y in scores(12)) {
        let forward = mann_whitney_u(&x, &y);
        let backward = mann_whitney_u(&y, &x);

        prop_assert!((forward.p_value - backward.p_value).abs() < 1e-9);
        let n1n2 = (x.len() * y.len()) as f64;
        prop_assert!((forward.u1 + backward.u1 - n1n2).abs() < 1e-9);
    }

    #[test]
    fn prop_kruskal_wallis_non_negative(a in scores(10), b in scores(10), c in scores(10)) {
        let result = kruskal_wallis(&[a.as_slice(), b.as_slice(), c.as_slice()]);
        prop_assert!(result.h >= 0.0);
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert_eq!(result.df, 2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_r_squared_is_pearson_squared(
        pairs in prop::collection::vec((0u32..100, 0u32..100), 3..30),
    ) {
        let x: Vec<f64> = pairs.iter().map(|p| f64::from(p.0)).collect();
        let y: Vec<f64> = pairs.iter().map(|p| f64::from(p.1)).collect();
        let pair = CorrelationPair::compute("clpm", "orf", &x, &y);

        if let (Some(r), Some(r2)) = (pair.pearson_r, pair.r_squared) {
            prop_assert!(r.abs() <= 1.0 + 1e-9);
            prop_assert!((r2 - r * r).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_no_mirrored_pairs(k in 2usize..6, rows in 3usize..12) {
        let names: Vec<String> = (0..k).map(|i| format!("m{}", i)).collect();
        let columns: Vec<(&str, Vec<Value>)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values = (0..rows).map(|r| Value::from(((r * (i + 1)) % 7) as f64)).collect();
                (name.as_str(), values)
            })
            .collect();
        let ds = Dataset::from_columns(columns).unwrap();

        let matrix = correlate(&ds, &names);
        prop_assert_eq!(matrix.pairs.len(), k * (k - 1) / 2);
        for pair in &matrix.pairs {
            prop_assert_ne!(&pair.metric_a, &pair.metric_b);
            let mirrored = matrix
                .pairs
                .iter()
                .filter(|p| p.metric_a == pair.metric_b && p.metric_b == pair.metric_a)
                .count();
            prop_assert_eq!(mirrored, 0);
        }
    }

    #[test]
    fn prop_identical_items_alpha_is_one(base in prop::collection::vec(0u32..50, 3..20)) {
        prop_assume!(base.iter().any(|v| *v != base[0]));
        let values: Vec<Value> = base.iter().map(|v| Value::from(f64::from(*v))).collect();
        let ds = Dataset::from_columns(vec![
            ("a", values.clone()),
            ("b", values.clone()),
            ("c", values),
        ])
        .unwrap();

        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = cronbach_alpha(&ds, &items).unwrap();
        let alpha = result.alpha.unwrap();
        prop_assert!((alpha - 1.0).abs() < 1e-9);
    }
}
