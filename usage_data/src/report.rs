use std::io::Write;

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::usage::{ComputeUsageRecord, UsageResponse, UsageStatus};

/// Every this many records a progress line is logged.
pub const PROGRESS_INTERVAL: usize = 100;

/// The remote accounting service.
///
/// One submission may come back as several responses (the service pages internally), so `send` returns all
/// of them.
pub trait UsageApi {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&self, record: &ComputeUsageRecord) -> Result<Vec<UsageResponse>, Self::Error>;
    fn status(&self) -> Result<UsageStatus, Self::Error>;
}

#[derive(Debug, Error)]
pub enum ReportError<E: std::error::Error + 'static> {
    #[error("usage api")]
    Api(#[source] E),
    #[error("serializing record {0}")]
    Serialize(String, #[source] serde_json::Error),
    #[error("writing dry run output")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    /// print records instead of sending them
    DryRun,
}

impl Mode {
    /// what happened to the records, for the progress lines
    fn verb(self) -> &'static str {
        match self {
            Mode::Live => "Sent",
            Mode::DryRun => "Processed",
        }
    }
}

/// Counts processed records and tells when a progress line is due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    count: usize,
}

impl Progress {
    /// Returns the new count if it hit a multiple of [`PROGRESS_INTERVAL`].
    pub fn advance(&mut self) -> Option<usize> {
        self.count += 1;
        (self.count % PROGRESS_INTERVAL == 0).then_some(self.count)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub validation_failures: usize,
    pub status: UsageStatus,
}

/// Pushes usage records to a [`UsageApi`] one at a time.
pub struct Reporter<A, W> {
    api: A,
    mode: Mode,
    /// where dry run records go
    out: W,
    progress: Progress,
    validation_failures: usize,
}

impl<A: UsageApi, W: Write> Reporter<A, W> {
    pub fn new(api: A, mode: Mode, out: W) -> Self {
        Reporter {
            api,
            mode,
            out,
            progress: Progress::default(),
            validation_failures: 0,
        }
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn report(&mut self, record: &ComputeUsageRecord) -> Result<(), ReportError<A::Error>> {
        match self.mode {
            Mode::DryRun => {
                let json = record
                    .to_json()
                    .map_err(|e| ReportError::Serialize(record.local_record_id.clone(), e))?;
                writeln!(self.out, "{json}")?;
            }
            Mode::Live => {
                for response in self.api.send(record).map_err(ReportError::Api)? {
                    self.log_failures(&response.validation_failed_records);
                }
            }
        }

        if let Some(count) = self.progress.advance() {
            info!("{} {count} records.", self.mode.verb());
        }
        Ok(())
    }

    fn log_failures(&mut self, failures: &[Value]) {
        for failed in failures {
            warn!("{failed}");
        }
        self.validation_failures += failures.len();
    }

    /// Logs the total and asks the service how it is doing.
    pub fn finish(self) -> Result<Summary, ReportError<A::Error>> {
        let records = self.progress.count();
        info!("{} {records} records.", self.mode.verb());

        let status = self.api.status().map_err(ReportError::Api)?;
        info!("{status}");

        Ok(Summary {
            records,
            validation_failures: self.validation_failures,
            status,
        })
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn Progress__advance__every_hundred() {
        let mut progress = Progress::default();
        let reported: Vec<usize> = (0..250).filter_map(|_| progress.advance()).collect();
        assert_eq!(reported, vec![100, 200]);
        assert_eq!(progress.count(), 250);
    }

    #[test]
    fn Progress__advance__nothing_below_interval() {
        let mut progress = Progress::default();
        assert!((0..99).all(|_| progress.advance().is_none()));
        assert_eq!(progress.advance(), Some(100));
    }
}
