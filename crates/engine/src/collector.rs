//! Capture collector
//!
//! The producer side: the host hands every finished diagnostic event to a
//! [`Collector`], which filters it, numbers it, encodes it, and appends it
//! to the shared region. Producers never wait for consumers; see the
//! region's overrun policy.

use chrono::{DateTime, Utc};
use logring_core::{LogRecord, Result, Severity, TextField, TextFields};
use logring_storage::{Region, RegionConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::CollectorConfig;

/// Message prefixes of statement echo events
const STATEMENT_PREFIXES: [&str; 2] = ["statement: ", "duration: "];

/// A finished diagnostic event as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    /// Time of the event
    pub logtime: DateTime<Utc>,
    /// Start time of the reporting session
    pub session_start: Option<DateTime<Utc>>,
    /// Severity level
    pub severity: Severity,
    /// Saved `errno`
    pub saved_errno: i32,
    /// Packed SQLSTATE
    pub error_code: i32,
    /// Reporting process id
    pub pid: i32,
    /// Database identifier
    pub database_id: Option<u32>,
    /// User identifier
    pub user_id: Option<u32>,
    /// Transaction identifier
    pub transaction_id: Option<u32>,
    /// Cursor position inside the query text
    pub query_position: i32,
    /// Cursor position inside the internal query
    pub internal_position: i32,
    /// Text fields
    pub texts: TextFields,
}

impl HostEvent {
    /// Event raised now by this process.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let mut texts = TextFields::default();
        texts.set(TextField::Message, Some(message.into()));
        HostEvent {
            logtime: Utc::now(),
            session_start: None,
            severity,
            saved_errno: 0,
            error_code: 0,
            pid: std::process::id() as i32,
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

    /// Set the packed SQLSTATE (builder pattern)
    pub fn with_error_code(mut self, error_code: i32) -> Self {
        self.error_code = error_code;
        self
    }

    /// Primary message
    pub fn message(&self) -> Option<&str> {
        self.texts.get(TextField::Message)
    }

    fn is_statement_echo(&self) -> bool {
        self.message()
            .map_or(false, |m| STATEMENT_PREFIXES.iter().any(|p| m.starts_with(p)))
    }

    fn into_record(self, sequence: u64) -> LogRecord {
        LogRecord {
            logtime: self.logtime,
            session_start: self.session_start,
            severity: self.severity,
            saved_errno: self.saved_errno,
            error_code: self.error_code,
            sequence,
            pid: self.pid,
            database_id: self.database_id,
            user_id: self.user_id,
            transaction_id: self.transaction_id,
            query_position: self.query_position,
            internal_position: self.internal_position,
            texts: self.texts,
        }
    }
}

/// Counters kept by a collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Events appended to the region
    pub captured: u64,
    /// Events dropped by the filters
    pub filtered: u64,
    /// Events rejected by the region (too large, I/O)
    pub rejected: u64,
}

/// Turns host events into records in a shared region.
pub struct Collector {
    region: Arc<Region>,
    config: CollectorConfig,
    threshold: Severity,
    next_sequence: AtomicU64,
    captured: AtomicU64,
    filtered: AtomicU64,
    rejected: AtomicU64,
}

impl Collector {
    /// Attach a collector to an existing region.
    ///
    /// `buffer_size` is not applied here; the region keeps its capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(region: Arc<Region>, config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        let threshold = config.severity_threshold()?;
        debug!(
            target: "logring::collector",
            enabled = config.enabled,
            min_level = %threshold,
            "Collector attached"
        );
        Ok(Collector {
            region,
            config,
            threshold,
            next_sequence: AtomicU64::new(1),
            captured: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    /// Create a private region sized by `buffer_size` and attach to it.
    pub fn with_private_region(config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        let region = Region::anonymous(&RegionConfig::new().with_capacity(config.buffer_size))?;
        Self::new(Arc::new(region), config)
    }

    /// The region events are appended to
    pub fn region(&self) -> &Arc<Region> {
        &self.region
    }

    /// Active configuration
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Whether `event` passes the filters.
    pub fn accepts(&self, event: &HostEvent) -> bool {
        self.config.enabled
            && event.severity >= self.threshold
            && !(self.config.ignore_statements && event.is_statement_echo())
    }

    /// Capture one event.
    ///
    /// Returns the record's starting offset, or `None` when the event was
    /// filtered out. Sequence numbers start at 1 and increase by one per
    /// event that passes the filters; an event the region rejects still
    /// uses its number.
    ///
    /// # Errors
    ///
    /// `RecordTooLarge` when the encoded event exceeds the region; nothing
    /// is appended.
    pub fn capture(&self, event: &HostEvent) -> Result<Option<u32>> {
        if !self.accepts(event) {
            self.filtered.fetch_add(1, Ordering::Relaxed);
            trace!(target: "logring::collector", severity = %event.severity, "Event filtered");
            return Ok(None);
        }

        let mut event = event.clone();
        if !self.config.set_query_fields {
            event.texts.set(TextField::QueryText, None);
            event.query_position = 0;
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let record = event.into_record(sequence);
        match self.region.append_record(&record) {
            Ok(position) => {
                self.captured.fetch_add(1, Ordering::Relaxed);
                trace!(target: "logring::collector", sequence, position, "Event captured");
                Ok(Some(position))
            }
            Err(e) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(target: "logring::collector", sequence, error = %e, "Event rejected");
                Err(e)
            }
        }
    }

    /// Current counters
    pub fn stats(&self) -> CollectorStats {
        CollectorStats {
            captured: self.captured.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
