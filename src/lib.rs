#![doc = "gndmap public API: division polygons, point resolution and damage aggregation"]
mod aggregate;
mod config;
mod division;
mod error;
mod geom;
mod normalize;
mod refresh;
mod resolve;

#[doc(inline)]
pub use aggregate::{
    aggregate, aggregate_par, aggregate_values, aggregate_values_par, fold, AggregateBucket, Aggregation,
    AggregationReport, Aggregator, BucketView, DamageRecord, Ingested, Severity, HIGH_AVG_LEVEL, HIGH_TOTAL_DAMAGE, MEDIUM_AVG_LEVEL, MEDIUM_TOTAL_DAMAGE,
};

#[doc(inline)]
pub use config::{AggregationConfig, DatasetConfig, GndConfig, RefreshConfig};

#[doc(inline)]
pub use division::{DirectoryEntry, DivisionPolygon, LoadReport, PolygonStore, CODE_KEYS, NAME_KEYS};

#[doc(inline)]
pub use error::{DatasetError, RecordIssue, RefreshFailure};

#[doc(inline)]
pub use normalize::normalize;

#[doc(inline)]
pub use refresh::{
    Assignment, AssignmentSink, JobProgress, MemorySink, PendingRecord, ReResolutionJob, ReResolutionReport,
    Refreshed,
};

#[doc(inline)]
pub use resolve::{resolve, Coordinate, DivisionRef, PointResolver, Resolution, Via};
