use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

use crate::error::{AtlasError, Result};

const REQUIRED_COLUMNS: [&str; 3] = ["Park Name", "Category", "Conservation Status"];

/// One species sighting: which park, which group, how threatened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub park: String,
    pub category: String,
    pub status: String,
}

impl Observation {
    pub fn new(park: &str, category: &str, status: &str) -> Self {
        Self {
            park: park.to_string(),
            category: category.to_string(),
            status: status.to_string(),
        }
    }

    /// A record missing any of its three fields cannot be aggregated.
    pub fn is_complete(&self) -> bool {
        !self.park.is_empty() && !self.category.is_empty() && !self.status.is_empty()
    }
}

// Columns of merged_data.csv; everything else in the file is ignored.
#[derive(Debug, Deserialize)]
struct ObservationRow {
    #[serde(rename = "Park Name", default)]
    park: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Conservation Status", default)]
    status: String,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Self {
            park: row.park.trim().to_string(),
            category: row.category.trim().to_string(),
            status: row.status.trim().to_string(),
        }
    }
}

/// Loaded once at startup, never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct ObservationSet {
    records: Vec<Observation>,
}

impl ObservationSet {
    pub fn new(records: Vec<Observation>) -> Self {
        Self { records }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let set = Self::from_reader(File::open(path)?)?;
        log::info!("Loaded {} observations from {}", set.len(), path.display());
        Ok(set)
    }

    /// Rows the CSV reader cannot decode are dropped; rows with empty
    /// fields are kept and left to the aggregator to skip.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers()?;
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !headers.iter().any(|h| h == **c)) {
            return Err(AtlasError::MissingColumn(missing.to_string()));
        }

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in reader.deserialize::<ObservationRow>() {
            match row {
                Ok(row) => records.push(row.into()),
                Err(e) => {
                    dropped += 1;
                    log::debug!("Skipping observation row: {}", e);
                }
            }
        }
        if dropped > 0 {
            log::warn!("{} observation rows could not be read", dropped);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Species ID,Park Name,Category,Order,Conservation Status
ACAD-1000,Acadia National Park,Mammal,Artiodactyla,No Concern
ACAD-1001,Acadia National Park,Bird,Anseriformes,Endangered
ACAD-1002,Acadia National Park,,Anseriformes,Endangered
";

    #[test]
    fn reads_named_columns_and_ignores_the_rest() {
        let set = ObservationSet::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.records()[1],
            Observation::new("Acadia National Park", "Bird", "Endangered")
        );
    }

    #[test]
    fn keeps_incomplete_rows_for_the_aggregator() {
        let set = ObservationSet::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(!set.records()[2].is_complete());
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv = "Park Name,Category\nZion National Park,Fish\n";
        let err = ObservationSet::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AtlasError::MissingColumn(c) if c == "Conservation Status"));
    }

    #[test]
    fn empty_fields_are_preserved() {
        let csv = "Park Name,Category,Conservation Status\nZion National Park, Fish ,\n";
        let set = ObservationSet::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].category, "Fish");
        assert_eq!(set.records()[0].status, "");
    }
}
