//! Seam to the host CRM: the logged-in actor and the system log.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity of a system log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
}

/// One entry for the host's audit/system log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemLogRecord {
    pub level: LogLevel,
    pub message: String,
    pub contact_id: Option<i64>,
}

/// Services the adapter needs from the CRM it runs inside.
pub trait CrmHost {
    /// Contact id of the user on whose behalf calls are made, if any.
    fn logged_in_contact_id(&self) -> Option<i64>;

    fn create_system_log(&self, record: SystemLogRecord);
}

/// Host that writes system log records to `tracing` and has a fixed actor.
#[derive(Debug, Clone, Default)]
pub struct TracingHost {
    contact_id: Option<i64>,
}

impl TracingHost {
    pub fn new(contact_id: Option<i64>) -> Self {
        Self { contact_id }
    }
}

impl CrmHost for TracingHost {
    fn logged_in_contact_id(&self) -> Option<i64> {
        self.contact_id
    }

    fn create_system_log(&self, record: SystemLogRecord) {
        tracing::error!(
            level = ?record.level,
            contact_id = ?record.contact_id,
            "{}",
            record.message
        );
    }
}

/// Host that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingHost {
    contact_id: Option<i64>,
    records: Mutex<Vec<SystemLogRecord>>,
}

impl RecordingHost {
    pub fn new(contact_id: Option<i64>) -> Self {
        Self {
            contact_id,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the records written so far.
    pub fn records(&self) -> Vec<SystemLogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CrmHost for RecordingHost {
    fn logged_in_contact_id(&self) -> Option<i64> {
        self.contact_id
    }

    fn create_system_log(&self, record: SystemLogRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

impl<H: CrmHost + ?Sized> CrmHost for &H {
    fn logged_in_contact_id(&self) -> Option<i64> {
        (**self).logged_in_contact_id()
    }

    fn create_system_log(&self, record: SystemLogRecord) {
        (**self).create_system_log(record)
    }
}
