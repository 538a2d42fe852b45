use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as _;
use log::{debug, info, LevelFilter};
use usage_data::{Mode, Reporter, UsageRecords};

mod cli;
mod client;
mod config;

use cli::Args;
use client::AmieUsageClient;
use config::Settings;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbosity);

    let settings = read_config(&args)?;
    debug!("Using {settings:?}");

    let client = AmieUsageClient::new(&settings).context("creating usage api client")?;
    let mode = match args.dryrun {
        true => Mode::DryRun,
        false => Mode::Live,
    };

    let records = UsageRecords::open(&args.filename, settings.resource.as_str())
        .with_context(|| format!("reading sacct log {}", args.filename.display()))?;
    let mut reporter = Reporter::new(client, mode, io::stdout().lock());

    for record in records {
        let record = record.context("parsing sacct log")?;
        reporter
            .report(&record)
            .with_context(|| format!("reporting job {}", record.local_record_id))?;
    }

    reporter.finish().context("querying usage api status")?;
    Ok(())
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}

fn read_config(args: &Args) -> Result<Settings> {
    info!("Loading config section [{}] from {}", args.site, args.amieconfig.display());
    Settings::new(&args.amieconfig, &args.site)
        .map_err(anyhow::Error::new)
        .context("parsing config file")
}
