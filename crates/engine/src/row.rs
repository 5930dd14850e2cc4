//! Output rows
//!
//! [`LogRow`] is the flat shape handed to external consumers: one row per
//! scanned record, numeric fields first, then the text fields in canonical
//! order. Absent values serialize as `null`.

use chrono::{DateTime, Utc};
use logring_core::severity;
use logring_core::sqlstate;
use logring_core::{LogRecord, Result, TextField};
use serde::{Deserialize, Serialize};

/// One scanned record, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    /// Time of the event
    pub logtime: DateTime<Utc>,
    /// Start time of the producing session
    pub session_start: Option<DateTime<Utc>>,
    /// Numeric severity
    pub severity: i32,
    /// Saved `errno`
    pub saved_errno: i32,
    /// Packed SQLSTATE
    pub error_code: i32,
    /// Database identifier
    pub database_id: Option<u32>,
    /// Producing process id
    pub pid: i32,
    /// Per-producer sequence number
    pub sequence: u64,
    /// Absent when the record's internal position is 0
    pub internal_position: Option<i32>,
    /// Cursor position inside the query text
    pub query_position: i32,
    /// Starting offset of the record; pass it back to resume here
    pub position: u32,
    /// Transaction identifier
    pub transaction_id: Option<u32>,
    /// User identifier
    pub user_id: Option<u32>,
    /// `message` text
    pub message: Option<String>,
    /// `detail` text
    pub detail: Option<String>,
    /// `detail_log` text
    pub detail_log: Option<String>,
    /// `hint` text
    pub hint: Option<String>,
    /// `context` text
    pub context: Option<String>,
    /// `domain` text
    pub domain: Option<String>,
    /// `context_domain` text
    pub context_domain: Option<String>,
    /// `internal_query` text
    pub internal_query: Option<String>,
    /// `error_state` text
    pub error_state: Option<String>,
    /// `application_name` text
    pub application_name: Option<String>,
    /// `remote_host` text
    pub remote_host: Option<String>,
    /// `command_tag` text
    pub command_tag: Option<String>,
    /// `vxid` text
    pub vxid: Option<String>,
    /// `query` text
    pub query: Option<String>,
}

impl LogRow {
    /// Flatten a record read at `position`.
    pub fn from_record(position: u32, mut record: LogRecord) -> Self {
        let mut text = |field: TextField| record.texts.take(field);
        let message = text(TextField::Message);
        let detail = text(TextField::Detail);
        let detail_log = text(TextField::DetailLog);
        let hint = text(TextField::Hint);
        let context = text(TextField::Context);
        let domain = text(TextField::Domain);
        let context_domain = text(TextField::ContextDomain);
        let internal_query = text(TextField::InternalQuery);
        let error_state = text(TextField::ErrorStateName);
        let application_name = text(TextField::ApplicationName);
        let remote_host = text(TextField::RemoteHost);
        let command_tag = text(TextField::CommandTag);
        let vxid = text(TextField::VirtualTransactionId);
        let query = text(TextField::QueryText);

        LogRow {
            logtime: record.logtime,
            session_start: record.session_start,
            severity: record.severity.code(),
            saved_errno: record.saved_errno,
            error_code: record.error_code,
            database_id: record.database_id,
            pid: record.pid,
            sequence: record.sequence,
            internal_position: Some(record.internal_position).filter(|p| *p != 0),
            query_position: record.query_position,
            position,
            transaction_id: record.transaction_id,
            user_id: record.user_id,
            message,
            detail,
            detail_log,
            hint,
            context,
            domain,
            context_domain,
            internal_query,
            error_state,
            application_name,
            remote_host,
            command_tag,
            vxid,
            query,
        }
    }

    /// Symbolic name of the row's severity.
    ///
    /// # Errors
    ///
    /// `UnknownSeverityCode` when no name owns the stored code.
    pub fn severity_name(&self) -> Result<&'static str> {
        severity::name_for(self.severity)
    }

    /// The stored error code as a five-character SQLSTATE
    pub fn sqlstate(&self) -> String {
        sqlstate::unpack(self.error_code)
    }
}
