use std::borrow::Cow;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::division::PolygonStore;
use crate::error::RefreshFailure;
use crate::refresh::{Assignment, AssignmentSink};
use crate::resolve::{deserialize_location, Coordinate, PointResolver};

/// A stored record considered for re-resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord {
    /// Storage key; numeric ids are read as their decimal text.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "location", deserialize_with = "deserialize_location")]
    pub coordinate: Option<Coordinate>,
    #[serde(default, alias = "gnd_code")]
    pub division_code: Option<String>,
    #[serde(default, alias = "gnd_name")]
    pub division_name: Option<String>,
}

impl PendingRecord {
    pub fn new(id: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self { id: id.into(), coordinate, division_code: None, division_name: None }
    }

    /// Read one element of a JSON batch.
    pub fn from_value(value: &Value) -> Result<Self, RefreshFailure> {
        Self::deserialize(value).map_err(|e| RefreshFailure::Malformed(e.to_string()))
    }

    /// Whether the record already carries a division code or name.
    ///
    /// A name alone counts: divisions without a code are stored that way.
    pub fn is_assigned(&self) -> bool {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.division_code) || present(&self.division_name)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("record id must be a string or number, got {other}"))),
    }
}

/// Checkpointable position and tallies of a re-resolution run.
///
/// Serialize it between runs; passing it back to [`ReResolutionJob::resume`]
/// continues at `next_index` without revisiting earlier records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub next_index: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl JobProgress {
    /// Summarize against a backlog of `total` records.
    pub fn report(&self, total: usize) -> ReResolutionReport {
        ReResolutionReport {
            updated: self.updated,
            failed: self.failed,
            skipped: self.skipped,
            total,
            complete: self.next_index >= total,
        }
    }
}

/// Outcome of a re-resolution run. `total` is the backlog size at job start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReResolutionReport {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
    pub complete: bool,
}

/// Successful handling of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refreshed {
    Updated(Assignment),
    /// Already assigned; left untouched.
    Skipped,
}

/// Re-runs point resolution over records lacking a division and hands results to a sink.
///
/// A failure on one record is counted and logged; the batch always continues.
pub struct ReResolutionJob<'a, S> {
    resolver: PointResolver<'a>,
    sink: S,
}

impl<'a, S: AssignmentSink> ReResolutionJob<'a, S> {
    pub fn new(store: &'a PolygonStore, sink: S) -> Self {
        Self { resolver: PointResolver::new(store), sink }
    }

    /// Process the whole backlog.
    pub fn run(&mut self, records: &[PendingRecord]) -> ReResolutionReport {
        self.resume(JobProgress::default(), records, |_| false).report(records.len())
    }

    /// Continue from `progress`, checking `should_stop` before each record.
    pub fn resume(
        &mut self,
        progress: JobProgress,
        records: &[PendingRecord],
        should_stop: impl FnMut(&JobProgress) -> bool,
    ) -> JobProgress {
        self.drive(progress, records.len(), |idx| Ok(Cow::Borrowed(&records[idx])), should_stop)
    }

    /// Like [`ReResolutionJob::resume`] over raw JSON elements. An element
    /// that is not a pending record counts as failed; the batch goes on.
    pub fn resume_values(
        &mut self,
        progress: JobProgress,
        values: &[Value],
        should_stop: impl FnMut(&JobProgress) -> bool,
    ) -> JobProgress {
        self.drive(progress, values.len(), |idx| PendingRecord::from_value(&values[idx]).map(Cow::Owned), should_stop)
    }

    fn drive<'r>(
        &mut self,
        mut progress: JobProgress,
        total: usize,
        mut fetch: impl FnMut(usize) -> Result<Cow<'r, PendingRecord>, RefreshFailure>,
        mut should_stop: impl FnMut(&JobProgress) -> bool,
    ) -> JobProgress {
        while progress.next_index < total {
            if should_stop(&progress) {
                info!(next_index = progress.next_index, "re-resolution stopped at checkpoint");
                break;
            }
            let outcome = fetch(progress.next_index).and_then(|record| {
                self.refresh(&record).map_err(|failure| {
                    warn!(record = %record.id, %failure, "re-resolution failed");
                    failure
                })
            });
            match outcome {
                Ok(Refreshed::Updated(_)) => progress.updated += 1,
                Ok(Refreshed::Skipped) => progress.skipped += 1,
                Err(failure @ RefreshFailure::Malformed(_)) => {
                    warn!(index = progress.next_index, %failure, "skipping unreadable pending record");
                    progress.failed += 1;
                }
                Err(_) => progress.failed += 1,
            }
            progress.next_index += 1;
        }
        progress
    }

    /// Resolve one record and store the assignment.
    pub fn refresh(&mut self, record: &PendingRecord) -> Result<Refreshed, RefreshFailure> {
        if record.is_assigned() {
            return Ok(Refreshed::Skipped);
        }
        let coordinate = record.coordinate.ok_or(RefreshFailure::MissingCoordinate)?;
        let Coordinate { lat, lng } = coordinate;
        if !coordinate.is_valid() {
            return Err(RefreshFailure::InvalidCoordinate { lat, lng });
        }

        let division = self.resolver.resolve(lat, lng).division()
            .ok_or(RefreshFailure::Unresolved { lat, lng })?;
        let assignment = Assignment {
            code: division.code().map(str::to_string),
            name: division.name().to_string(),
        };
        self.sink.write_assignment(&record.id, &assignment).map_err(RefreshFailure::Storage)?;

        debug!(record = %record.id, name = %assignment.name, "assigned division");
        Ok(Refreshed::Updated(assignment))
    }

    #[inline] pub fn sink(&self) -> &S { &self.sink }

    #[inline] pub fn into_sink(self) -> S { self.sink }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use geo::{polygon, MultiPolygon};
    use serde_json::json;

    use super::{JobProgress, PendingRecord, ReResolutionJob, Refreshed};
    use crate::division::{DivisionPolygon, PolygonStore};
    use crate::error::RefreshFailure;
    use crate::refresh::{Assignment, MemorySink};
    use crate::resolve::Coordinate;

    fn store() -> PolygonStore {
        let square = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        PolygonStore::from_divisions(vec![DivisionPolygon::new(Some("SQ".into()), "Square", square)]).unwrap()
    }

    fn pending(id: &str, lat: f64, lng: f64) -> PendingRecord {
        PendingRecord::new(id, Some(Coordinate::new(lat, lng)))
    }

    #[test]
    fn per_record_failures_do_not_abort() {
        let store = store();
        let records = vec![
            pending("a", 0.5, 0.5),
            PendingRecord::new("b", None),
            pending("c", 95.0, 0.5),
            pending("d", 5.0, 5.0),
            pending("e", 0.25, 0.75),
        ];
        let mut job = ReResolutionJob::new(&store, MemorySink::new());
        let report = job.run(&records);

        assert_eq!((report.updated, report.failed, report.total), (2, 3, 5));
        assert!(report.complete);
        assert_eq!(job.sink().get("e"), Some(&Assignment { code: Some("SQ".into()), name: "Square".into() }));
        assert!(job.sink().get("b").is_none());
    }

    #[test]
    fn failure_kinds() {
        let store = store();
        let mut job = ReResolutionJob::new(&store, MemorySink::new());
        assert!(matches!(job.refresh(&PendingRecord::new("x", None)), Err(RefreshFailure::MissingCoordinate)));
        assert!(matches!(job.refresh(&pending("x", f64::NAN, 0.0)), Err(RefreshFailure::InvalidCoordinate { .. })));
        assert!(matches!(job.refresh(&pending("x", 3.0, 3.0)), Err(RefreshFailure::Unresolved { .. })));
    }

    #[test]
    fn storage_failure_is_isolated() {
        let store = store();
        let sink = |id: &str, _: &Assignment| -> anyhow::Result<()> {
            if id == "bad" { bail!("write rejected") }
            Ok(())
        };
        let records = vec![pending("ok-1", 0.5, 0.5), pending("bad", 0.5, 0.5), pending("ok-2", 0.5, 0.5)];
        let report = ReResolutionJob::new(&store, sink).run(&records);
        assert_eq!((report.updated, report.failed, report.total), (2, 1, 3));
    }

    #[test]
    fn assigned_records_are_skipped() {
        let store = store();
        let mut record = pending("a", 0.5, 0.5);
        record.division_code = Some("SQ".into());
        let mut job = ReResolutionJob::new(&store, MemorySink::new());
        assert_eq!(job.refresh(&record).unwrap(), Refreshed::Skipped);
        assert!(job.sink().is_empty());
    }

    #[test]
    fn stop_and_resume_visits_each_record_once() {
        let store = store();
        let records: Vec<_> = (0..6).map(|i| pending(&format!("r{i}"), 0.5, 0.5)).collect();
        let mut writes = Vec::new();
        let mut job = ReResolutionJob::new(&store, |id: &str, _: &Assignment| -> anyhow::Result<()> {
            writes.push(id.to_string());
            Ok(())
        });

        let checkpoint = job.resume(JobProgress::default(), &records, |p| p.next_index == 4);
        assert_eq!(checkpoint.next_index, 4);
        assert!(!checkpoint.report(records.len()).complete);

        let done = job.resume(checkpoint, &records, |_| false);
        let report = done.report(records.len());
        assert_eq!((report.updated, report.failed, report.total, report.complete), (6, 0, 6, true));

        drop(job);
        assert_eq!(writes, ["r0", "r1", "r2", "r3", "r4", "r5"]);
    }

    #[test]
    fn rerun_is_idempotent() {
        let store = store();
        let records = vec![pending("a", 0.5, 0.5), pending("b", 0.7, 0.1)];
        let mut job = ReResolutionJob::new(&store, MemorySink::new());
        job.run(&records);
        let first = job.sink().clone();
        job.run(&records);
        assert_eq!(job.sink(), &first);
    }

    #[test]
    fn name_only_assignment_is_not_redone() {
        let square = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
        ]]);
        let store = PolygonStore::from_divisions(vec![DivisionPolygon::new(None, "Uncoded", square)]).unwrap();
        let mut job = ReResolutionJob::new(&store, MemorySink::new());

        let mut record = pending("a", 0.5, 0.5);
        let Ok(Refreshed::Updated(assignment)) = job.refresh(&record) else { panic!("expected an assignment") };
        assert_eq!(assignment, Assignment { code: None, name: "Uncoded".into() });

        record.division_name = Some(assignment.name);
        assert_eq!(job.refresh(&record).unwrap(), Refreshed::Skipped);
    }

    #[test]
    fn unreadable_elements_fail_alone() {
        let store = store();
        let values = vec![
            json!({ "id": 42, "location": "POINT(0.5 0.5)" }),
            json!({ "id": null, "location": "POINT(0.5 0.5)" }),
            json!({ "location": "POINT(0.5 0.5)" }),
            json!("r-3"),
            json!({ "id": "r-4", "location": { "lat": 0.25, "lng": 0.25 } }),
        ];
        let mut job = ReResolutionJob::new(&store, MemorySink::new());
        let report = job.resume_values(JobProgress::default(), &values, |_| false).report(values.len());

        assert_eq!((report.updated, report.failed, report.total, report.complete), (2, 3, 5, true));
        assert!(job.sink().get("42").is_some());
        assert!(job.sink().get("r-4").is_some());
    }

    #[test]
    fn value_batches_resume_at_the_checkpoint() {
        let store = store();
        let values: Vec<_> = (0..4).map(|i| json!({ "id": i, "location": "POINT(0.5 0.5)" })).collect();
        let mut job = ReResolutionJob::new(&store, MemorySink::new());

        let checkpoint = job.resume_values(JobProgress::default(), &values, |p| p.next_index == 2);
        assert_eq!((checkpoint.next_index, checkpoint.updated), (2, 2));
        let done = job.resume_values(checkpoint, &values, |_| false);
        assert_eq!((done.next_index, done.updated), (4, 4));
        assert_eq!(job.sink().len(), 4);
    }
}
