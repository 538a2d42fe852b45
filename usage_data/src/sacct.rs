use std::{fs::File, io, num::ParseIntError, path::Path};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::usage::{ComputeAttributes, ComputeUsageRecord};

/// Only ACCESS allocations get reported, every other account is local to the site.
static ACCESS_PROJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^pn_[a-z]{3}[0-9]{6}$").expect("ACCESS project regex is valid"));

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Field order of the sacct `--format` option. There is no header line, so this is all we go by.
pub const SACCT_FIELDS: [&str; 11] = [
    "JobID", "User", "Account", "Submit", "Start", "End", "NNodes", "ncpus", "ElapsedRaw", "partition", "jobname",
];

/// One line of
///
/// ```sh
/// sacct --parsable2 --noheader --format JobID,User,Account,Submit,Start,End,NNodes,ncpus,ElapsedRaw,partition,jobname
/// ```
///
/// Everything stays a string here; numbers are only parsed once a row survived the filters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SacctRow {
    pub job_id: String,
    pub user: String,
    pub account: String,
    pub submit: String,
    pub start: String,
    pub end: String,
    pub nnodes: String,
    pub ncpus: String,
    pub elapsed_raw: String,
    pub partition: String,
    pub job_name: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("opening {path}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("reading sacct log")]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected {} `|`-separated fields, got {got}", SACCT_FIELDS.len())]
    FieldCount { line: u64, got: usize },
    #[error("job {job_id}: {field} is not an integer (got `{value}`)")]
    InvalidNumber {
        job_id: String,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Why a row did not make it into the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NonAccessProject,
    NoUsage,
}

impl SacctRow {
    fn parse_u32(&self, field: &'static str, value: &str) -> Result<u32, ExtractError> {
        value.parse().map_err(|source| ExtractError::InvalidNumber {
            job_id: self.job_id.clone(),
            field,
            value: value.to_owned(),
            source,
        })
    }

    pub fn elapsed_seconds(&self) -> Result<i64, ExtractError> {
        self.elapsed_raw.parse().map_err(|source| ExtractError::InvalidNumber {
            job_id: self.job_id.clone(),
            field: "ElapsedRaw",
            value: self.elapsed_raw.clone(),
            source,
        })
    }

    /// Account check comes first, so rows of foreign accounts are dropped without looking at their numbers.
    pub fn skip_reason(&self) -> Result<Option<SkipReason>, ExtractError> {
        if !is_access_project(&self.account) {
            return Ok(Some(SkipReason::NonAccessProject));
        }
        if self.elapsed_seconds()? <= 0 {
            return Ok(Some(SkipReason::NoUsage));
        }
        Ok(None)
    }

    /// `pn_abc123456` => `ABC123456`
    pub fn local_project_id(&self) -> String {
        self.account.to_uppercase().chars().skip(3).collect()
    }

    pub fn into_usage_record(self, resource: &str) -> Result<ComputeUsageRecord, ExtractError> {
        let node_count = self.parse_u32("NNodes", &self.nnodes)?;
        let cpu_core_count = self.parse_u32("ncpus", &self.ncpus)?;
        let elapsed = self.elapsed_seconds()?;
        let local_project_id = self.local_project_id();

        // sacct was run with TZ=UTC, so the naive timestamps only need the designator
        Ok(ComputeUsageRecord {
            resource: resource.to_owned(),
            local_record_id: self.job_id,
            username: self.user,
            local_project_id,
            submit_time: self.submit + "Z",
            start_time: self.start + "Z",
            end_time: self.end + "Z",
            // only nodes are charged, cores are informational
            charge: f64::from(node_count) * elapsed as f64 / SECONDS_PER_HOUR,
            attributes: ComputeAttributes {
                node_count,
                cpu_core_count,
                queue: self.partition,
                job_name: self.job_name,
            },
        })
    }
}

fn is_access_project(account: &str) -> bool {
    ACCESS_PROJECT.is_match(account)
}

fn parse_row(record: csv::StringRecord) -> Result<SacctRow, ExtractError> {
    if record.len() != SACCT_FIELDS.len() {
        return Err(ExtractError::FieldCount {
            line: record.position().map_or(0, |pos| pos.line()),
            got: record.len(),
        });
    }
    Ok(record.deserialize(None)?)
}

/// Lazy, forward-only stream of [`ComputeUsageRecord`]s read from a sacct log.
///
/// The first error ends the stream. To start over, open the file again.
pub struct UsageRecords<R> {
    rows: csv::StringRecordsIntoIter<R>,
    resource: String,
    failed: bool,
}

impl UsageRecords<File> {
    pub fn open(path: impl AsRef<Path>, resource: impl Into<String>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ExtractError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(file, resource))
    }
}

impl<R: io::Read> UsageRecords<R> {
    pub fn from_reader(reader: R, resource: impl Into<String>) -> Self {
        let rows = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        UsageRecords {
            rows,
            resource: resource.into(),
            failed: false,
        }
    }

    fn next_record(&mut self) -> Option<Result<ComputeUsageRecord, ExtractError>> {
        for row in self.rows.by_ref() {
            let record = match row {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            // foreign rows are dropped whatever their shape, the field count only matters for ACCESS rows
            if !record.get(2).is_some_and(is_access_project) {
                debug!("Skip {} due to non-ACCESS project.", record.get(0).unwrap_or_default());
                continue;
            }
            let row = match parse_row(record) {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            match row.skip_reason() {
                Ok(Some(SkipReason::NonAccessProject)) => {
                    debug!("Skip {} due to non-ACCESS project.", row.job_id);
                }
                Ok(Some(SkipReason::NoUsage)) => {
                    debug!("Skip {} due to non-usage.", row.job_id);
                }
                Ok(None) => return Some(row.into_usage_record(&self.resource)),
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

impl<R: io::Read> Iterator for UsageRecords<R> {
    type Item = Result<ComputeUsageRecord, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_record();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}
