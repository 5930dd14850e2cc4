//! Severity lookup
//!
//! Records carry severity as a numeric code; callers want the symbolic name.
//! The table is static and names are matched case-insensitively.
//!
//! Several names may share one code (`log_server_only` and `commerror`);
//! [`name_for`] returns the first name in table order that owns the code.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name/code pairs, in lookup order.
const LEVELS: &[(&str, i32)] = &[
    ("debug5", 10),
    ("debug4", 11),
    ("debug3", 12),
    ("debug2", 13),
    ("debug1", 14),
    ("log", 15),
    ("log_server_only", 16),
    ("commerror", 16),
    ("info", 17),
    ("notice", 18),
    ("warning", 19),
    ("error", 20),
    ("fatal", 21),
    ("panic", 22),
];

/// Look up the numeric code for a severity name.
///
/// # Errors
///
/// `InvalidConfiguration` for an empty name, `UnknownSeverity` for a name
/// that is not in the table.
pub fn code_for(name: &str) -> Result<i32> {
    if name.is_empty() {
        return Err(Error::invalid_config("empty severity name"));
    }
    let lowered = name.to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|(text, _)| *text == lowered)
        .map(|(_, code)| *code)
        .ok_or(Error::UnknownSeverity(lowered))
}

/// Look up the symbolic name for a numeric code.
pub fn name_for(code: i32) -> Result<&'static str> {
    LEVELS
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(text, _)| *text)
        .ok_or(Error::UnknownSeverityCode(code))
}

/// A numeric severity level.
///
/// Ordering follows the numeric code, so `Severity::WARNING > Severity::LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Severity(i32);

impl Severity {
    /// Most verbose debug level
    pub const DEBUG5: Severity = Severity(10);
    /// Server log message
    pub const LOG: Severity = Severity(15);
    /// Informational message
    pub const INFO: Severity = Severity(17);
    /// Notice
    pub const NOTICE: Severity = Severity(18);
    /// Warning
    pub const WARNING: Severity = Severity(19);
    /// Error that aborts the current operation
    pub const ERROR: Severity = Severity(20);
    /// Error that ends the session
    pub const FATAL: Severity = Severity(21);
    /// Error that takes down every session
    pub const PANIC: Severity = Severity(22);

    /// Wrap a raw code without checking it against the table.
    ///
    /// Records read back from the region may carry any code.
    pub const fn from_code(code: i32) -> Self {
        Severity(code)
    }

    /// Raw numeric code
    pub const fn code(self) -> i32 {
        self.0
    }

    /// Symbolic name for this level
    pub fn name(self) -> Result<&'static str> {
        name_for(self.0)
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        code_for(s).map(Severity)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match name_for(self.0) {
            Ok(name) => f.write_str(name),
            Err(_) => write!(f, "level({})", self.0),
        }
    }
}
