use anyhow::Result;
use gndmap::{Coordinate, PointResolver};
use serde_json::{json, Value};

use crate::{cli::ResolveArgs, Context};

pub fn run(ctx: &Context, args: &ResolveArgs) -> Result<()> {
    let coordinate = Coordinate::new(args.lat, args.lng);
    anyhow::ensure!(coordinate.is_valid(), "coordinate out of range: lat={} lng={}", args.lat, args.lng);

    let store = ctx.store()?;
    let value = match PointResolver::new(&store).resolve_coordinate(coordinate).division() {
        Some(division) => json!({ "code": division.code(), "name": division.name() }),
        None => Value::Null,
    };
    super::write_json(&value, None)
}
