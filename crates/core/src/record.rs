//! Log record model
//!
//! A [`LogRecord`] is one finished diagnostic event as it travels through
//! the region: fixed numeric fields plus up to fourteen text fields kept in
//! one canonical order. The order is part of the wire format.

use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text fields of a record, in canonical wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextField {
    /// Primary message
    Message,
    /// Detail shown to the client
    Detail,
    /// Detail written only to the server log
    DetailLog,
    /// Hint
    Hint,
    /// Context (call stack of the event)
    Context,
    /// Message domain
    Domain,
    /// Context message domain
    ContextDomain,
    /// Internally generated query
    InternalQuery,
    /// Symbolic SQLSTATE name
    ErrorStateName,
    /// Application name of the session
    ApplicationName,
    /// Remote host of the session
    RemoteHost,
    /// Command tag of the running statement
    CommandTag,
    /// Virtual transaction id
    VirtualTransactionId,
    /// Original query text
    QueryText,
}

impl TextField {
    /// Number of text fields
    pub const COUNT: usize = 14;

    /// All fields in canonical order
    pub const ALL: [TextField; TextField::COUNT] = [
        TextField::Message,
        TextField::Detail,
        TextField::DetailLog,
        TextField::Hint,
        TextField::Context,
        TextField::Domain,
        TextField::ContextDomain,
        TextField::InternalQuery,
        TextField::ErrorStateName,
        TextField::ApplicationName,
        TextField::RemoteHost,
        TextField::CommandTag,
        TextField::VirtualTransactionId,
        TextField::QueryText,
    ];

    /// Position of this field in canonical order
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name used in output rows
    pub const fn column_name(self) -> &'static str {
        match self {
            TextField::Message => "message",
            TextField::Detail => "detail",
            TextField::DetailLog => "detail_log",
            TextField::Hint => "hint",
            TextField::Context => "context",
            TextField::Domain => "domain",
            TextField::ContextDomain => "context_domain",
            TextField::InternalQuery => "internal_query",
            TextField::ErrorStateName => "error_state",
            TextField::ApplicationName => "application_name",
            TextField::RemoteHost => "remote_host",
            TextField::CommandTag => "command_tag",
            TextField::VirtualTransactionId => "vxid",
            TextField::QueryText => "query",
        }
    }
}

/// The text fields of one record, indexed by [`TextField`].
///
/// Empty strings are not representable: setting `""` clears the field,
/// matching the wire format where length 0 means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFields([Option<String>; TextField::COUNT]);

impl TextFields {
    /// Get a field's text
    pub fn get(&self, field: TextField) -> Option<&str> {
        self.0[field.index()].as_deref()
    }

    /// Set a field's text; `None` or an empty string clears it
    pub fn set(&mut self, field: TextField, text: Option<String>) {
        self.0[field.index()] = text.filter(|t| !t.is_empty());
    }

    /// Take a field's text, leaving it absent
    pub fn take(&mut self, field: TextField) -> Option<String> {
        self.0[field.index()].take()
    }

    /// Byte length of a field as stored (0 when absent)
    pub fn stored_len(&self, field: TextField) -> usize {
        self.0[field.index()].as_ref().map_or(0, String::len)
    }

    /// Iterate fields in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (TextField, Option<&str>)> + '_ {
        TextField::ALL.iter().map(move |f| (*f, self.get(*f)))
    }
}

/// One diagnostic event.
///
/// Zero-valued optional identifiers are not representable on the wire;
/// `Some(0)` reads back as `None`. Timestamps keep microsecond precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Wall-clock time of the event
    pub logtime: DateTime<Utc>,
    /// Start time of the producing session
    ///
    /// Encoded as microseconds with 0 meaning absent, so a start exactly at
    /// the Unix epoch reads back as `None`, like a `Some(0)` identifier.
    pub session_start: Option<DateTime<Utc>>,
    /// Severity level
    pub severity: Severity,
    /// `errno` saved when the event was raised
    pub saved_errno: i32,
    /// Packed SQLSTATE (see [`crate::sqlstate`])
    pub error_code: i32,
    /// Per-producer monotonically increasing sequence number
    pub sequence: u64,
    /// Producing process id
    pub pid: i32,
    /// Database identifier
    pub database_id: Option<u32>,
    /// User identifier
    pub user_id: Option<u32>,
    /// Transaction identifier
    pub transaction_id: Option<u32>,
    /// Cursor position inside the query text
    pub query_position: i32,
    /// Cursor position inside the internal query (0 = none)
    pub internal_position: i32,
    /// Variable-length text fields
    pub texts: TextFields,
}

impl LogRecord {
    /// Create a record with the given time, severity and message; every
    /// other field is empty.
    pub fn new(logtime: DateTime<Utc>, severity: Severity, message: impl Into<String>) -> Self {
        let mut texts = TextFields::default();
        texts.set(TextField::Message, Some(message.into()));
        LogRecord {
            logtime,
            session_start: None,
            severity,
            saved_errno: 0,
            error_code: 0,
            sequence: 0,
            pid: 0,
            database_id: None,
            user_id: None,
            transaction_id: None,
            query_position: 0,
            internal_position: 0,
            texts,
        }
    }

    /// Set a text field (builder pattern)
    pub fn with_text(mut self, field: TextField, text: impl Into<String>) -> Self {
        self.texts.set(field, Some(text.into()));
        self
    }

    /// Set the sequence number (builder pattern)
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the producing process id (builder pattern)
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    /// Get a text field
    pub fn text(&self, field: TextField) -> Option<&str> {
        self.texts.get(field)
    }

    /// Primary message
    pub fn message(&self) -> Option<&str> {
        self.texts.get(TextField::Message)
    }
}
