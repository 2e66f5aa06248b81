use anyhow::Result;
use gndmap::{aggregate_values, aggregate_values_par};
use serde_json::Value;
use tracing::info;

use crate::{cli::AggregateArgs, Context};

pub fn run(ctx: &Context, args: &AggregateArgs) -> Result<()> {
    let records: Vec<Value> = super::read_json(&args.records)?;
    let store = if args.names_only { None } else { Some(ctx.store()?) };
    let store = store.as_deref();

    let settings = &ctx.config.aggregation;
    let aggregation = if settings.parallel {
        aggregate_values_par(&records, store, settings.chunk_size)
    } else {
        aggregate_values(&records, store)
    };
    info!(
        divisions = aggregation.len(),
        total = aggregation.total(),
        unassigned = aggregation.unassigned(),
        rejected = aggregation.rejected(),
        "aggregation finished",
    );

    let value = if args.report {
        serde_json::to_value(aggregation.report())?
    } else {
        aggregation.to_json()?
    };
    super::write_json(&value, None)
}
