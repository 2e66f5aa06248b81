use std::path::Path;

use anyhow::Result;
use gndmap::{JobProgress, MemorySink, ReResolutionJob};
use serde_json::Value;
use tracing::info;

use crate::{cli::RefreshArgs, Context};

/// A checkpointed run spans invocations, so its assignments must accumulate in a file.
fn check_outputs(checkpoint: Option<&Path>, output: Option<&Path>) -> Result<()> {
    anyhow::ensure!(
        checkpoint.is_none() || output.is_some(),
        "--output is required when [refresh] checkpoint is set",
    );
    Ok(())
}

pub fn run(ctx: &Context, args: &RefreshArgs) -> Result<()> {
    let settings = &ctx.config.refresh;
    let checkpoint = settings.checkpoint.as_deref();
    let output = args.output.as_deref();
    check_outputs(checkpoint, output)?;

    let records: Vec<Value> = super::read_json(&args.pending)?;
    let limit = args.limit.or(settings.batch_limit);

    let progress: JobProgress = match checkpoint {
        Some(path) if path.exists() => super::read_json(path)?,
        _ => JobProgress::default(),
    };
    let sink: MemorySink = match output {
        Some(path) if progress.next_index > 0 && path.exists() => super::read_json(path)?,
        _ => MemorySink::new(),
    };
    info!(pending = records.len(), start = progress.next_index, ?limit, "starting re-resolution");

    let store = ctx.store()?;
    let mut job = ReResolutionJob::new(&store, sink);
    let start = progress.next_index;
    let progress = job.resume_values(progress, &records, |p| limit.is_some_and(|n| p.next_index - start >= n));
    let report = progress.report(records.len());

    if let Some(path) = checkpoint {
        super::write_json(&serde_json::to_value(progress)?, Some(path))?;
    }
    super::write_json(&serde_json::to_value(job.sink())?, output)?;

    info!(
        updated = report.updated,
        failed = report.failed,
        skipped = report.skipped,
        total = report.total,
        complete = report.complete,
        "re-resolution finished",
    );
    eprintln!("{}", serde_json::to_string(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::check_outputs;

    #[test]
    fn checkpointed_runs_need_an_output_file() {
        let checkpoint = Some(Path::new("progress.json"));
        assert!(check_outputs(checkpoint, None).is_err());
        assert!(check_outputs(checkpoint, Some(Path::new("assignments.json"))).is_ok());
        assert!(check_outputs(None, None).is_ok());
    }
}
