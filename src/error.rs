use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a [`PolygonStore`](crate::PolygonStore). Fatal: nothing can be resolved without it.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset could not be read from disk.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid JSON.
    #[error("failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The shapefile reader rejected the dataset.
    #[error("failed to read shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// The file extension does not name a supported format.
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    /// Top-level JSON is not a `FeatureCollection`.
    #[error("dataset is not a FeatureCollection (found {0})")]
    NotFeatureCollection(String),

    /// A geometry could not be decoded at all.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Parsing succeeded but no usable division survived.
    #[error("dataset contains no usable divisions ({dropped} features dropped)")]
    Empty { dropped: usize },
}

/// A reason a [`DamageRecord`](crate::DamageRecord) is excluded from aggregation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordIssue {
    #[error("damage level must be between 1 and 10 (got {0})")]
    DamageLevel(i64),

    #[error("estimated damage must be a non-negative number (got {0})")]
    DamageAmount(f64),

    #[error("property category is required")]
    PropertyCategory,

    /// The element could not be read as a record at all.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Per-record outcome of a failed re-resolution. Counted, logged, never propagated.
#[derive(Error, Debug)]
pub enum RefreshFailure {
    #[error("malformed pending record: {0}")]
    Malformed(String),

    #[error("record has no coordinate")]
    MissingCoordinate,

    #[error("coordinate ({lat}, {lng}) is out of range")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("coordinate ({lat}, {lng}) lies outside every division")]
    Unresolved { lat: f64, lng: f64 },

    #[error("failed to store assignment: {0:#}")]
    Storage(anyhow::Error),
}
