use std::path::PathBuf;

/// Grama Niladhari division lookup and damage aggregation
#[derive(clap::Parser, Debug)]
#[command(name = "gndmap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML settings file
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Division dataset, overrides [dataset] path from the config
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub dataset: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// List every division in the dataset as JSON
    Divisions,

    /// Find the division containing a point
    Resolve(ResolveArgs),

    /// Aggregate damage records per division
    Aggregate(AggregateArgs),

    /// Assign divisions to stored records that lack one
    Refresh(RefreshArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Latitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub lng: f64,
}

#[derive(clap::Args, Debug)]
pub struct AggregateArgs {
    /// JSON array of damage records
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub records: PathBuf,

    /// Only use declared division names, do not load the dataset
    #[arg(long)]
    pub names_only: bool,

    /// Print totals alongside the per-division mapping
    #[arg(long)]
    pub report: bool,
}

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {
    /// JSON array of pending records (id, location, gnd_code, gnd_name)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub pending: PathBuf,

    /// Assignment output file, defaults to stdout; required with a [refresh] checkpoint
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Maximum records to process this invocation, overrides [refresh] batch_limit
    #[arg(short, long)]
    pub limit: Option<usize>,
}
