use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

const DEFAULT_CONFIG: &str = "/lustre/projects/hpc_support_ookami/AMIE/config.ini";
const DEFAULT_SITE: &str = "StonyBrook";

const SACCT_HELP: &str = r#"Slurm logs should be generated with the following command:

module load slurm
SLURM_TIME_FORMAT="%Y-%m-%dT%H:%M:%S" TZ=UTC sacct --allclusters --allusers \
    --parsable2 --noheader --allocations --duplicates \
    --format JobID,User,Account,Submit,Start,End,NNodes,ncpus,ElapsedRaw,partition,jobname \
    --starttime 2024-06-07T00:00:00 --endtime 2024-09-07T23:59:59 \
  > slurm_jobs.log

where the starttime and endtime should be set to the desired value.

Then load this into the Allocations Usage database with:

reporter slurm_jobs.log"#;

/// Read a slurm job log and use the data to send to the Allocations usage API.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(version, after_long_help = SACCT_HELP)]
pub struct Args {
    /// Name of the file containing sacct log records
    #[arg(value_name = "FILENAME")]
    pub filename: PathBuf,

    /// Operate in dry run mode. This will parse the file and process it but not send data to the usage API.
    #[arg(long)]
    pub dryrun: bool,

    /// Path to the AMIE usage client configuration file
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub amieconfig: PathBuf,

    /// Name of the AMIE configuration file section to use
    #[arg(long, default_value = DEFAULT_SITE)]
    pub site: String,

    /// Log verbosity level such as WARNING, INFO, DEBUG
    #[arg(short = 'v', default_value = "INFO", value_parser = parse_level)]
    pub verbosity: LevelFilter,
}

/// Accepts the usual level names plus `WARNING` and `CRITICAL`, case doesn't matter.
fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.to_ascii_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::Warn),
        "CRITICAL" | "FATAL" => Ok(LevelFilter::Error),
        other => other
            .parse()
            .map_err(|_| format!("unknown log level `{level}` (expected DEBUG, INFO, WARNING or ERROR)")),
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn Args__parse__defaults() {
        let args = Args::try_parse_from(["reporter", "slurm_jobs.log"]).unwrap();
        assert_eq!(args.filename, PathBuf::from("slurm_jobs.log"));
        assert!(!args.dryrun);
        assert_eq!(args.amieconfig, PathBuf::from(DEFAULT_CONFIG));
        assert_eq!(args.site, DEFAULT_SITE);
        assert_eq!(args.verbosity, LevelFilter::Info);
    }

    #[test]
    fn Args__parse__all_options() {
        let args = Args::try_parse_from([
            "reporter",
            "--dryrun",
            "--amieconfig",
            "/etc/amie.ini",
            "--site",
            "Test",
            "-v",
            "DEBUG",
            "jobs.log",
        ])
        .unwrap();
        assert!(args.dryrun);
        assert_eq!(args.amieconfig, PathBuf::from("/etc/amie.ini"));
        assert_eq!(args.site, "Test");
        assert_eq!(args.verbosity, LevelFilter::Debug);
    }

    #[test]
    fn Args__parse__filename_required() {
        assert!(Args::try_parse_from(["reporter"]).is_err());
    }

    #[test]
    fn parse_level__names() {
        assert_eq!(parse_level("WARNING"), Ok(LevelFilter::Warn));
        assert_eq!(parse_level("warn"), Ok(LevelFilter::Warn));
        assert_eq!(parse_level("ERROR"), Ok(LevelFilter::Error));
        assert_eq!(parse_level("CRITICAL"), Ok(LevelFilter::Error));
        assert_eq!(parse_level("debug"), Ok(LevelFilter::Debug));
        assert!(parse_level("LOUD").is_err());
    }
}
