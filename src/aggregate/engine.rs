use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::aggregate::{fold, AggregateBucket, BucketView, DamageRecord};
use crate::division::{DivisionPolygon, PolygonStore};
use crate::error::RecordIssue;
use crate::normalize::normalize;
use crate::resolve::{DivisionRef, PointResolver, Via};

/// Result of one aggregation run.
///
/// `total` counts every record offered. Records that could not be tied to a
/// division name are `unassigned`, records failing validation are
/// `rejected`; neither contributes to any bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    buckets: BTreeMap<String, AggregateBucket>,
    total: u64,
    unassigned: u64,
    rejected: u64,
}

/// Serializable summary of an [`Aggregation`].
#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    pub aggregated: BTreeMap<String, BucketView>,
    pub total: u64,
    pub unassigned: u64,
    pub rejected: u64,
}

impl Aggregation {
    /// Get the buckets, keyed by normalized division name.
    #[inline] pub fn buckets(&self) -> &BTreeMap<String, AggregateBucket> { &self.buckets }

    /// Get the bucket for a division name (any spelling that normalizes to the same key).
    #[inline] pub fn bucket(&self, name: &str) -> Option<&AggregateBucket> { self.buckets.get(&normalize(name)) }

    /// Get the bucket a dataset division's figures live in.
    ///
    /// Matches the division's name key first, then its code against bucket
    /// codes (exact, then ASCII case-insensitive), so a division whose
    /// reports used another spelling of its name still finds them.
    pub fn bucket_for(&self, division: &DivisionPolygon) -> Option<&AggregateBucket> {
        if let Some(bucket) = self.buckets.get(division.key()) {
            return Some(bucket);
        }
        let code = division.code()?.trim();
        let mut coded = self.buckets.values().filter_map(|bucket| Some((bucket.code()?.trim(), bucket)));
        coded.clone().find(|&(c, _)| c == code)
            .or_else(|| coded.find(|&(c, _)| c.eq_ignore_ascii_case(code)))
            .map(|(_, bucket)| bucket)
    }

    #[inline] pub fn len(&self) -> usize { self.buckets.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.buckets.is_empty() }
    #[inline] pub fn total(&self) -> u64 { self.total }
    #[inline] pub fn unassigned(&self) -> u64 { self.unassigned }
    #[inline] pub fn rejected(&self) -> u64 { self.rejected }

    /// Fold a record already tied to a division. Returns the bucket key.
    pub fn fold_into(&mut self, record: &DamageRecord, division: &DivisionRef<'_>) -> String {
        let key = normalize(division.name);
        self.total += 1;
        let bucket = self.buckets.remove(&key);
        self.buckets.insert(key.clone(), fold(bucket, record, division));
        key
    }

    /// Combine with an aggregation over records that came after this one's.
    pub fn merge(&mut self, other: Aggregation) {
        self.total += other.total;
        self.unassigned += other.unassigned;
        self.rejected += other.rejected;
        for (key, bucket) in other.buckets {
            match self.buckets.get_mut(&key) {
                Some(existing) => existing.merge(bucket),
                None => { self.buckets.insert(key, bucket); }
            }
        }
    }

    /// Output mapping from normalized name to bucket view.
    pub fn views(&self) -> BTreeMap<String, BucketView> {
        self.buckets.iter().map(|(key, bucket)| (key.clone(), bucket.view())).collect()
    }

    pub fn report(&self) -> AggregationReport {
        AggregationReport {
            aggregated: self.views(),
            total: self.total,
            unassigned: self.unassigned,
            rejected: self.rejected,
        }
    }

    /// The output mapping as JSON.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.views())
    }
}

/// What happened to one ingested record.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// Folded into the bucket with this key.
    Folded { key: String, via: Via },
    /// No division name could be found.
    Unassigned,
    /// The record failed validation.
    Rejected(Vec<RecordIssue>),
}

/// Runs records through identification and folding.
///
/// Without a store only records that declare a division name can be
/// assigned; with one, declared codes and coordinates are resolved too.
#[derive(Debug, Default)]
pub struct Aggregator<'a> {
    resolver: Option<PointResolver<'a>>,
    aggregation: Aggregation,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a PolygonStore) -> Self {
        Self { resolver: Some(PointResolver::new(store)), aggregation: Aggregation::default() }
    }

    /// An aggregator that only uses the names records declare.
    pub fn without_store() -> Self { Self::default() }

    fn with_resolver(resolver: Option<PointResolver<'a>>) -> Self {
        Self { resolver, aggregation: Aggregation::default() }
    }

    fn reject(&mut self, issues: Vec<RecordIssue>) -> Ingested {
        debug!(?issues, "rejected damage record");
        self.aggregation.total += 1;
        self.aggregation.rejected += 1;
        Ingested::Rejected(issues)
    }

    /// Identify, validate and fold one record.
    pub fn ingest(&mut self, record: &DamageRecord) -> Ingested {
        if let Err(issues) = record.validate() {
            return self.reject(issues);
        }

        let code = record.division_code.as_deref();
        let name = record.division_name.as_deref();
        let division = match &self.resolver {
            Some(resolver) => resolver.identify(code, name, record.coordinate),
            None => name.filter(|n| !n.trim().is_empty()).map(|name| DivisionRef { code, name, via: Via::Name }),
        };

        match division {
            Some(division) => {
                let key = self.aggregation.fold_into(record, &division);
                Ingested::Folded { key, via: division.via }
            }
            None => {
                self.aggregation.total += 1;
                self.aggregation.unassigned += 1;
                Ingested::Unassigned
            }
        }
    }

    /// Ingest every record in order.
    pub fn ingest_all<'r>(&mut self, records: impl IntoIterator<Item = &'r DamageRecord>) {
        for record in records {
            self.ingest(record);
        }
    }

    /// Read one element of a JSON batch and ingest it. An unreadable element is rejected.
    pub fn ingest_value(&mut self, value: &Value) -> Ingested {
        match DamageRecord::from_value(value) {
            Ok(record) => self.ingest(&record),
            Err(issue) => self.reject(vec![issue]),
        }
    }

    #[inline] pub fn aggregation(&self) -> &Aggregation { &self.aggregation }

    #[inline] pub fn finish(self) -> Aggregation { self.aggregation }
}

/// Aggregate records sequentially. `store` is optional; see [`Aggregator`].
pub fn aggregate(records: &[DamageRecord], store: Option<&PolygonStore>) -> Aggregation {
    let mut aggregator = Aggregator::with_resolver(store.map(PointResolver::new));
    aggregator.ingest_all(records);
    aggregator.finish()
}

/// Aggregate records across worker threads, `chunk_size` records per partition.
///
/// Partitions are folded independently and merged in record order, so the
/// result matches [`aggregate`] (floating-point totals up to summation order).
pub fn aggregate_par(records: &[DamageRecord], store: Option<&PolygonStore>, chunk_size: usize) -> Aggregation {
    merge_chunks(records, chunk_size, |chunk| aggregate(chunk, store))
}

/// Aggregate a raw JSON batch sequentially. Elements that are not records are rejected, not fatal.
pub fn aggregate_values(values: &[Value], store: Option<&PolygonStore>) -> Aggregation {
    let mut aggregator = Aggregator::with_resolver(store.map(PointResolver::new));
    for value in values {
        aggregator.ingest_value(value);
    }
    aggregator.finish()
}

/// Parallel form of [`aggregate_values`], partitioned like [`aggregate_par`].
pub fn aggregate_values_par(values: &[Value], store: Option<&PolygonStore>, chunk_size: usize) -> Aggregation {
    merge_chunks(values, chunk_size, |chunk| aggregate_values(chunk, store))
}

fn merge_chunks<T: Sync>(items: &[T], chunk_size: usize, run: impl Fn(&[T]) -> Aggregation + Sync + Send) -> Aggregation {
    items
        .par_chunks(chunk_size.max(1))
        .map(run)
        .reduce(Aggregation::default, |mut left, right| {
            left.merge(right);
            left
        })
}
