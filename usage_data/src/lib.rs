pub mod report;
pub mod sacct;
pub mod usage;

pub use report::{Mode, Reporter, Summary, UsageApi};
pub use sacct::{ExtractError, UsageRecords};
pub use usage::{ComputeAttributes, ComputeUsageRecord, UsageResponse, UsageStatus};
