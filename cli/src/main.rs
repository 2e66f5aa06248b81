mod cli;
mod commands;

use anyhow::Result;
use gndmap::{GndConfig, PolygonStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{aggregate, divisions, refresh, resolve};

/// Resolved settings plus lazy dataset access shared by all subcommands.
pub struct Context {
    pub config: GndConfig,
}

impl Context {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => GndConfig::load_from_file(path)?,
            None => GndConfig::default(),
        };
        if let Some(dataset) = &cli.dataset {
            config.dataset.path = dataset.clone();
        }
        Ok(Self { config })
    }

    pub fn store(&self) -> Result<Arc<PolygonStore>> {
        Ok(PolygonStore::load(&self.config.dataset.path)?)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "gndmap=warn",
        1 => "gndmap=info",
        _ => "gndmap=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = Context::new(&cli)?;
    match &cli.command {
        Commands::Divisions => divisions::run(&ctx),
        Commands::Resolve(args) => resolve::run(&ctx, args),
        Commands::Aggregate(args) => aggregate::run(&ctx, args),
        Commands::Refresh(args) => refresh::run(&ctx, args),
    }
}

fn main() -> Result<()> { run() }
