mod bucket;
mod engine;
mod record;
mod severity;

pub use bucket::{fold, AggregateBucket, BucketView};
pub use engine::{aggregate, aggregate_par, aggregate_values, aggregate_values_par, Aggregation, AggregationReport, Aggregator, Ingested};
pub use record::DamageRecord;
pub use severity::{Severity, HIGH_AVG_LEVEL, HIGH_TOTAL_DAMAGE, MEDIUM_AVG_LEVEL, MEDIUM_TOTAL_DAMAGE};
