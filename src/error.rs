use thiserror::Error;

/// Errors raised while loading data or configuration.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing column `{0}` in observations")]
    MissingColumn(String),

    /// Aggregation needs a park to scope to
    #[error("Park identifier must not be empty")]
    EmptyPark,
}

pub type Result<T> = std::result::Result<T, AtlasError>;
