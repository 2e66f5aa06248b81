use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let report = store.report();
    info!(loaded = report.loaded, dropped = report.dropped, "dataset ready");

    let value = json!({
        "divisions": store.directory(),
        "loaded": report.loaded,
        "dropped": report.dropped,
    });
    super::write_json(&value, None)
}
