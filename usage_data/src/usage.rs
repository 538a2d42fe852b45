use derive_more::derive::{Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A finished compute job, in the shape the AMIE usage API expects.
///
/// Serializes to the wire format directly (PascalCase keys, `"UsageType": "compute"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "UsageType", rename = "compute", rename_all = "PascalCase")]
pub struct ComputeUsageRecord {
    pub resource: String,
    #[serde(rename = "LocalRecordID")]
    pub local_record_id: String,
    pub username: String,
    #[serde(rename = "LocalProjectID")]
    pub local_project_id: String,
    pub submit_time: String,
    pub start_time: String,
    pub end_time: String,
    /// node-hours
    pub charge: f64,
    pub attributes: ComputeAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputeAttributes {
    pub node_count: u32,
    pub cpu_core_count: u32,
    pub queue: String,
    pub job_name: String,
}

impl ComputeUsageRecord {
    /// One line of JSON, as printed in dry run mode.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Request body for `POST usage/`
#[derive(Debug, Serialize)]
pub struct UsageSubmission<'a> {
    #[serde(rename = "UsageRecords")]
    pub usage_records: Vec<&'a ComputeUsageRecord>,
}

impl<'a> From<&'a ComputeUsageRecord> for UsageSubmission<'a> {
    fn from(record: &'a ComputeUsageRecord) -> Self {
        UsageSubmission { usage_records: vec![record] }
    }
}

/// What the service answers to a submission. Only the rejected records are of interest to us, everything else
/// is kept around untouched for debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageResponse {
    #[serde(rename = "ValidationFailedRecords", default)]
    pub validation_failed_records: Vec<Value>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

impl UsageResponse {
    pub fn with_failures(failures: impl IntoIterator<Item = Value>) -> Self {
        UsageResponse {
            validation_failed_records: failures.into_iter().collect(),
            other: Default::default(),
        }
    }
}

/// Opaque status report of the usage API, logged as is.
#[derive(Debug, Clone, PartialEq, Default, Deref, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageStatus(pub Value);
