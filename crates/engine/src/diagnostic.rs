//! Diagnostic pass-through
//!
//! A [`DiagnosticSink`] is the host's own reporting facility. The
//! [`test_report`] entry point raises an event through it, which exercises
//! the whole producer path when the sink is a [`Collector`].

use logring_core::sqlstate::FEATURE_NOT_SUPPORTED;
use logring_core::{Result, Severity, TextField};
use tracing::{debug, error, info, warn};

use crate::collector::{Collector, HostEvent};

/// Where the host reports diagnostic events.
pub trait DiagnosticSink {
    /// Report one event.
    fn report(&self, event: &HostEvent) -> Result<()>;
}

impl DiagnosticSink for Collector {
    fn report(&self, event: &HostEvent) -> Result<()> {
        self.capture(event).map(|_| ())
    }
}

/// Forwards events to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, event: &HostEvent) -> Result<()> {
        let message = event.message().unwrap_or_default();
        let detail = event.texts.get(TextField::Detail);
        let hint = event.texts.get(TextField::Hint);
        let severity = event.severity;
        if severity >= Severity::ERROR {
            error!(target: "logring::diagnostic", %severity, ?detail, ?hint, "{}", message);
        } else if severity >= Severity::WARNING {
            warn!(target: "logring::diagnostic", %severity, ?detail, ?hint, "{}", message);
        } else if severity >= Severity::LOG {
            info!(target: "logring::diagnostic", %severity, ?detail, ?hint, "{}", message);
        } else {
            debug!(target: "logring::diagnostic", %severity, ?detail, ?hint, "{}", message);
        }
        Ok(())
    }
}

/// Raise a test event with SQLSTATE `0A000` through `sink`.
///
/// Empty `detail` or `hint` are left absent.
pub fn test_report<S: DiagnosticSink + ?Sized>(
    sink: &S,
    severity: Severity,
    message: &str,
    detail: &str,
    hint: &str,
) -> Result<()> {
    let event = HostEvent::new(severity, message)
        .with_error_code(FEATURE_NOT_SUPPORTED)
        .with_text(TextField::Detail, detail)
        .with_text(TextField::Hint, hint);
    sink.report(&event)
}
