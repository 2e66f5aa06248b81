use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregate::{DamageRecord, Severity};
use crate::resolve::DivisionRef;

/// Running aggregate of every record matched to one division.
///
/// Only the summed fields are state; average and severity are derived on read.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateBucket {
    code: Option<String>,
    name: String,
    count: u64,
    total_damage: f64,
    sum_damage_level: u64,
    total_affected: u64,
    histogram: BTreeMap<String, u64>,
}

/// Output row for one division, with the derived fields filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketView {
    pub code: Option<String>,
    pub name: String,
    pub count: u64,
    pub total_damage: f64,
    pub avg_damage_level: f64,
    pub total_affected: u64,
    pub property_category_histogram: BTreeMap<String, u64>,
    pub severity: Severity,
}

impl AggregateBucket {
    /// Start a bucket from its first record.
    fn first(record: &DamageRecord, division: &DivisionRef<'_>) -> Self {
        let mut bucket = Self {
            code: None,
            name: division.name.trim().to_string(),
            count: 0,
            total_damage: 0.0,
            sum_damage_level: 0,
            total_affected: 0,
            histogram: BTreeMap::new(),
        };
        bucket.absorb(record, division.code);
        bucket
    }

    /// Fold one record in. The first non-blank code seen is kept; later codes are ignored.
    /// Counters saturate at `u64::MAX`.
    pub fn absorb(&mut self, record: &DamageRecord, code: Option<&str>) {
        self.backfill_code(code);
        let level = u64::try_from(record.damage_level).unwrap_or(0);
        self.count = self.count.saturating_add(1);
        self.total_damage += record.estimated_damage_amount;
        self.sum_damage_level = self.sum_damage_level.saturating_add(level);
        self.total_affected = self.total_affected.saturating_add(record.affected_count);
        let n = self.histogram.entry(record.property_category.trim().to_string()).or_default();
        *n = n.saturating_add(1);
    }

    /// Combine with a bucket built from records that came after this one's.
    ///
    /// Summed fields add, histograms union; name and code keep this bucket's
    /// values unless its code is still unknown.
    pub fn merge(&mut self, other: AggregateBucket) {
        self.backfill_code(other.code.as_deref());
        self.count = self.count.saturating_add(other.count);
        self.total_damage += other.total_damage;
        self.sum_damage_level = self.sum_damage_level.saturating_add(other.sum_damage_level);
        self.total_affected = self.total_affected.saturating_add(other.total_affected);
        for (category, n) in other.histogram {
            let total = self.histogram.entry(category).or_default();
            *total = total.saturating_add(n);
        }
    }

    fn backfill_code(&mut self, code: Option<&str>) {
        if self.code.is_none() {
            self.code = code.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        }
    }

    #[inline] pub fn code(&self) -> Option<&str> { self.code.as_deref() }
    #[inline] pub fn name(&self) -> &str { &self.name }
    #[inline] pub fn count(&self) -> u64 { self.count }
    #[inline] pub fn total_damage(&self) -> f64 { self.total_damage }
    #[inline] pub fn sum_damage_level(&self) -> u64 { self.sum_damage_level }
    #[inline] pub fn total_affected(&self) -> u64 { self.total_affected }
    #[inline] pub fn histogram(&self) -> &BTreeMap<String, u64> { &self.histogram }

    /// Mean damage level over the bucket's records.
    pub fn avg_damage_level(&self) -> f64 {
        // count >= 1 for every bucket that exists
        self.sum_damage_level as f64 / self.count.max(1) as f64
    }

    /// Severity tier from the current average level and total damage.
    #[inline]
    pub fn severity(&self) -> Severity { Severity::classify(self.avg_damage_level(), self.total_damage) }

    /// Snapshot with derived fields.
    pub fn view(&self) -> BucketView {
        BucketView {
            code: self.code.clone(),
            name: self.name.clone(),
            count: self.count,
            total_damage: self.total_damage,
            avg_damage_level: self.avg_damage_level(),
            total_affected: self.total_affected,
            property_category_histogram: self.histogram.clone(),
            severity: self.severity(),
        }
    }
}

/// Fold `record` into `bucket`, creating the bucket if it does not exist yet.
pub fn fold(bucket: Option<AggregateBucket>, record: &DamageRecord, division: &DivisionRef<'_>) -> AggregateBucket {
    match bucket {
        Some(mut bucket) => {
            bucket.absorb(record, division.code);
            bucket
        }
        None => AggregateBucket::first(record, division),
    }
}

#[cfg(test)]
mod tests {
    use super::fold;
    use crate::aggregate::{DamageRecord, Severity};
    use crate::resolve::{DivisionRef, Via};

    fn named<'a>(name: &'a str, code: Option<&'a str>) -> DivisionRef<'a> {
        DivisionRef { code, name, via: Via::Name }
    }

    #[test]
    fn kandy_north_scenario() {
        let a = DamageRecord::named("Kandy North", 8, 100_000.0, 5, "house");
        let b = DamageRecord::named(" kandy north ", 6, 50_000.0, 3, "house");

        let bucket = fold(None, &a, &named("Kandy North", None));
        let bucket = fold(Some(bucket), &b, &named(" kandy north ", None));

        let view = bucket.view();
        assert_eq!(view.count, 2);
        assert_eq!(view.total_damage, 150_000.0);
        assert_eq!(view.avg_damage_level, 7.0);
        assert_eq!(view.total_affected, 8);
        assert_eq!(view.severity, Severity::High);
        assert_eq!(view.name, "Kandy North");
        assert_eq!(view.property_category_histogram.get("house"), Some(&2));
    }

    #[test]
    fn code_backfill_keeps_first_useful_value() {
        let r = DamageRecord::named("Galle", 2, 10.0, 0, "shop");
        let mut bucket = fold(None, &r, &named("Galle", None));
        assert_eq!(bucket.code(), None);

        bucket = fold(Some(bucket), &r, &named("Galle", Some("  ")));
        assert_eq!(bucket.code(), None);

        bucket = fold(Some(bucket), &r, &named("Galle", Some("G-1")));
        assert_eq!(bucket.code(), Some("G-1"));

        bucket = fold(Some(bucket), &r, &named("Galle", Some("G-2")));
        assert_eq!(bucket.code(), Some("G-1"));
    }

    #[test]
    fn merge_equals_sequential_fold() {
        let records = [
            DamageRecord::named("Matara", 3, 1_000.0, 1, "house"),
            DamageRecord::named("Matara", 9, 2_500_000.0, 40, "school"),
            DamageRecord::named("Matara", 5, 30_000.0, 2, "house"),
            DamageRecord::named("Matara", 1, 0.0, 0, "road"),
        ];
        let division = named("Matara", Some("MT"));

        let sequential = records.iter().fold(None, |b, r| Some(fold(b, r, &division))).unwrap();

        let mut left = records[..1].iter().fold(None, |b, r| Some(fold(b, r, &division))).unwrap();
        let right = records[1..].iter().fold(None, |b, r| Some(fold(b, r, &division))).unwrap();
        left.merge(right);

        assert_eq!(left, sequential);
        assert_eq!(left.severity(), Severity::Medium);
    }

    #[test]
    fn merge_backfills_missing_code() {
        let r = DamageRecord::named("Jaffna", 4, 10.0, 0, "house");
        let mut left = fold(None, &r, &named("Jaffna", None));
        let right = fold(None, &r, &named("Jaffna", Some("JF")));
        left.merge(right);
        assert_eq!(left.code(), Some("JF"));
        assert_eq!(left.count(), 2);
    }

    #[test]
    fn low_severity_bucket() {
        let r = DamageRecord::named("Ella", 2, 5_000.0, 0, "farm");
        let bucket = fold(None, &r, &named("Ella", None));
        assert_eq!(bucket.severity(), Severity::Low);
        assert_eq!(bucket.avg_damage_level(), 2.0);
    }

    #[test]
    fn affected_totals_saturate() {
        let r = DamageRecord::named("Ratnapura", 5, 1.0, u64::MAX, "house");
        let division = named("Ratnapura", None);
        let bucket = fold(Some(fold(None, &r, &division)), &r, &division);
        assert_eq!(bucket.total_affected(), u64::MAX);
        assert_eq!(bucket.count(), 2);

        let mut merged = bucket.clone();
        merged.merge(bucket);
        assert_eq!(merged.total_affected(), u64::MAX);
        assert_eq!(merged.count(), 4);
    }
}
