#![allow(dead_code)]

use std::{cell::RefCell, fmt};

use serde_json::json;
use usage_data::{ComputeAttributes, ComputeUsageRecord, UsageApi, UsageResponse, UsageStatus};

#[derive(Debug)]
pub struct FakeError;

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service unavailable")
    }
}

impl std::error::Error for FakeError {}

/// Answers every submission with the same canned responses and remembers what it was sent.
#[derive(Default)]
pub struct FakeApi {
    pub responses: Vec<UsageResponse>,
    pub fail_on: Option<String>,
    pub sent: RefCell<Vec<String>>,
    pub status_calls: RefCell<usize>,
}

impl UsageApi for &FakeApi {
    type Error = FakeError;

    fn send(&self, record: &ComputeUsageRecord) -> Result<Vec<UsageResponse>, FakeError> {
        if self.fail_on.as_deref() == Some(record.local_record_id.as_str()) {
            return Err(FakeError);
        }
        self.sent.borrow_mut().push(record.local_record_id.clone());
        Ok(self.responses.clone())
    }

    fn status(&self) -> Result<UsageStatus, FakeError> {
        *self.status_calls.borrow_mut() += 1;
        Ok(UsageStatus(json!({"Status": "ok"})))
    }
}

pub fn record(id: usize) -> ComputeUsageRecord {
    ComputeUsageRecord {
        resource: "ookami".to_owned(),
        local_record_id: id.to_string(),
        username: "alice".to_owned(),
        local_project_id: "ABC123456".to_owned(),
        submit_time: "2024-06-07T10:00:00Z".to_owned(),
        start_time: "2024-06-07T10:00:00Z".to_owned(),
        end_time: "2024-06-07T11:00:00Z".to_owned(),
        charge: 1.0,
        attributes: ComputeAttributes {
            node_count: 1,
            cpu_core_count: 48,
            queue: "short".to_owned(),
            job_name: "run.sh".to_owned(),
        },
    }
}
