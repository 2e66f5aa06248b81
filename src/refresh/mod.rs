mod job;
mod sink;

pub use job::{JobProgress, PendingRecord, ReResolutionJob, ReResolutionReport, Refreshed};
pub use sink::{Assignment, AssignmentSink, MemorySink};
