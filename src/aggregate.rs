//! Per-park species tallies.
//!
//! Both tables keep categories (and statuses within a category) in the order
//! they first appear in the observation set. Sorting by count is left to
//! [`crate::scale`].

use indexmap::{IndexMap, IndexSet};

use crate::error::{AtlasError, Result};
use crate::observations::Observation;

/// category -> number of observations
pub type CategoryCounts = IndexMap<String, u64>;

/// category -> status -> number of observations
pub type CategoryStatusCounts = IndexMap<String, IndexMap<String, u64>>;

/// Both tallies for a single park.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParkAggregate {
    pub park: String,
    pub category_counts: CategoryCounts,
    pub category_status_counts: CategoryStatusCounts,
    /// Every status of this park, in the order the records first show it.
    pub statuses: IndexSet<String>,
    /// Matching records that were skipped for missing fields.
    pub skipped: usize,
}

impl ParkAggregate {
    /// Total of all category counts.
    pub fn total(&self) -> u64 {
        self.category_counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.category_counts.is_empty()
    }
}

/// Tallies `records` for `park` in a single pass.
///
/// Records belonging to other parks are ignored. Records of this park with
/// an empty category or status are skipped and counted in `skipped`.
pub fn aggregate(records: &[Observation], park: &str) -> Result<ParkAggregate> {
    if park.is_empty() {
        return Err(AtlasError::EmptyPark);
    }

    let mut out = ParkAggregate {
        park: park.to_string(),
        ..Default::default()
    };

    for record in records.iter().filter(|r| r.park == park) {
        if !record.is_complete() {
            out.skipped += 1;
            continue;
        }
        *out.category_counts.entry(record.category.clone()).or_insert(0) += 1;
        *out
            .category_status_counts
            .entry(record.category.clone())
            .or_default()
            .entry(record.status.clone())
            .or_insert(0) += 1;
        if !out.statuses.contains(&record.status) {
            out.statuses.insert(record.status.clone());
        }
    }

    if out.skipped > 0 {
        log::debug!("{}: skipped {} incomplete observations", park, out.skipped);
    }
    Ok(out)
}

/// Stack keys for the status chart: all statuses minus the baseline ones.
pub fn stack_keys(statuses: &IndexSet<String>, baseline: &[String]) -> Vec<String> {
    statuses
        .iter()
        .filter(|k| !baseline.contains(k))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<Observation> {
        vec![
            Observation::new("X", "Bird", "Endangered"),
            Observation::new("X", "Bird", "No Concern"),
            Observation::new("X", "Fish", "No Concern"),
            Observation::new("Y", "Bird", "Endangered"),
        ]
    }

    #[test]
    fn counts_only_the_selected_park() {
        let agg = aggregate(&scenario(), "X").unwrap();

        let cats: Vec<_> = agg.category_counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(cats, vec![("Bird", 2), ("Fish", 1)]);

        let bird = &agg.category_status_counts["Bird"];
        assert_eq!(bird["Endangered"], 1);
        assert_eq!(bird["No Concern"], 1);
        let fish = &agg.category_status_counts["Fish"];
        assert_eq!(fish.len(), 1);
        assert_eq!(fish["No Concern"], 1);
    }

    #[test]
    fn unknown_park_gives_empty_tables() {
        let agg = aggregate(&scenario(), "Z").unwrap();
        assert!(agg.category_counts.is_empty());
        assert!(agg.category_status_counts.is_empty());
    }

    #[test]
    fn empty_park_is_rejected() {
        assert!(matches!(aggregate(&scenario(), ""), Err(AtlasError::EmptyPark)));
    }

    #[test]
    fn incomplete_records_are_skipped() {
        let mut records = scenario();
        records.push(Observation::new("X", "", "Endangered"));
        records.push(Observation::new("X", "Fish", ""));
        let agg = aggregate(&records, "X").unwrap();
        assert_eq!(agg.skipped, 2);
        assert_eq!(agg.total(), 3);
    }

    #[test]
    fn absent_statuses_are_not_zero_filled() {
        let agg = aggregate(&scenario(), "X").unwrap();
        assert!(agg.category_status_counts["Fish"].get("Endangered").is_none());
    }

    #[test]
    fn status_keys_follow_first_occurrence() {
        let records = vec![
            Observation::new("X", "Fish", "Threatened"),
            Observation::new("X", "Bird", "No Concern"),
            Observation::new("X", "Bird", "Endangered"),
            Observation::new("X", "Fish", "Endangered"),
        ];
        let agg = aggregate(&records, "X").unwrap();
        let statuses: Vec<&str> = agg.statuses.iter().map(String::as_str).collect();
        assert_eq!(statuses, vec!["Threatened", "No Concern", "Endangered"]);
        assert_eq!(
            stack_keys(&agg.statuses, &["No Concern".to_string()]),
            vec!["Threatened", "Endangered"]
        );
    }

    #[test]
    fn repeated_calls_are_equal() {
        let records = scenario();
        assert_eq!(aggregate(&records, "X").unwrap(), aggregate(&records, "X").unwrap());
    }
}
