use park_atlas::aggregate::{CategoryCounts, aggregate, stack_keys};
use park_atlas::observations::Observation;
use park_atlas::scale::{ChartFrame, category_ordering, derive_simple, derive_stacked, stack_series};
use proptest::prelude::*;

fn arb_observation() -> impl Strategy<Value = Observation> {
    (
        prop::sample::select(vec!["X", "Y", "Z"]),
        prop::sample::select(vec!["Bird", "Fish", "Mammal", "Vascular Plant", "Reptile"]),
        prop::sample::select(vec!["Endangered", "Threatened", "Species of Concern", "No Concern"]),
    )
        .prop_map(|(p, c, s)| Observation::new(p, c, s))
}

fn arb_records() -> impl Strategy<Value = Vec<Observation>> {
    prop::collection::vec(arb_observation(), 0..200)
}

fn arb_counts() -> impl Strategy<Value = CategoryCounts> {
    prop::collection::vec(0u64..20, 0..12).prop_map(|vs| {
        vs.into_iter().enumerate().map(|(i, v)| (format!("c{}", i), v)).collect()
    })
}

proptest! {
    #[test]
    fn category_total_matches_park_records(records in arb_records()) {
        let agg = aggregate(&records, "X").unwrap();
        let expected = records.iter().filter(|r| r.park == "X").count() as u64;
        prop_assert_eq!(agg.total(), expected);

        let nested: u64 = agg.category_status_counts.values().flat_map(|m| m.values()).sum();
        prop_assert_eq!(nested, expected);
    }

    #[test]
    fn absent_park_is_empty(records in arb_records()) {
        let agg = aggregate(&records, "Nowhere").unwrap();
        prop_assert!(agg.category_counts.is_empty());
        prop_assert!(agg.category_status_counts.is_empty());
    }

    #[test]
    fn aggregation_is_idempotent(records in arb_records()) {
        prop_assert_eq!(aggregate(&records, "Y").unwrap(), aggregate(&records, "Y").unwrap());
    }

    #[test]
    fn ordering_is_a_stable_descending_permutation(counts in arb_counts()) {
        let ordering = category_ordering(&counts);
        prop_assert_eq!(ordering.len(), counts.len());
        for pair in ordering.windows(2) {
            let (a, b) = (counts[&pair[0]], counts[&pair[1]]);
            prop_assert!(a >= b);
            if a == b {
                prop_assert!(counts.get_index_of(&pair[0]) < counts.get_index_of(&pair[1]));
            }
        }
    }

    #[test]
    fn domain_runs_from_zero_to_max(counts in arb_counts()) {
        let s = derive_simple(&counts, &ChartFrame::default());
        prop_assert_eq!(s.domain[0], 0.0);
        prop_assert_eq!(s.domain[1], counts.values().copied().max().unwrap_or(0) as f64);
    }

    #[test]
    fn bands_are_increasing_and_in_range(counts in arb_counts()) {
        let frame = ChartFrame::default();
        let s = derive_simple(&counts, &frame);
        let [lo, hi] = frame.y_range();
        let positions: Vec<f64> = s.ordering.iter().map(|c| s.y.position(c).unwrap()).collect();
        for pair in positions.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for p in positions {
            prop_assert!(p >= lo - 1e-9);
            prop_assert!(p + s.y.bandwidth() <= hi + 1e-9);
        }
    }

    #[test]
    fn stacks_are_contiguous_and_top_out_at_domain(records in arb_records()) {
        let agg = aggregate(&records, "X").unwrap();
        let keys = stack_keys(&agg.statuses, &["No Concern".to_string()]);
        let st = derive_stacked(&agg.category_counts, &agg.category_status_counts, &keys, &ChartFrame::default());
        let series = stack_series(&agg.category_status_counts, &st.ordering, &keys);
        prop_assert_eq!(&series, &st.series);

        for (i, category) in st.ordering.iter().enumerate() {
            let mut top = 0;
            for layer in &series {
                let seg = &layer.segments[i];
                prop_assert_eq!(&seg.category, category);
                prop_assert_eq!(seg.lower, top);
                top = seg.upper;
            }
            prop_assert!(top as f64 <= st.domain[1]);
        }
    }
}

#[test]
fn ties_keep_insertion_order() {
    let counts: CategoryCounts = [("A", 3), ("B", 5), ("C", 3)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(category_ordering(&counts), vec!["B", "A", "C"]);
    assert_eq!(derive_simple(&counts, &ChartFrame::default()).domain, [0.0, 5.0]);
}
