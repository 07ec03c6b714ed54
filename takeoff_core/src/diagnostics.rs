//! # Diagnostics
//!
//! Soft failures. Every batch operation in the engine completes and hands back
//! two channels: the data it could produce and the list of things it had to
//! skip. The same failures are also pushed to a [`DiagnosticSink`] so a host
//! can surface them as they happen (a message box, a log line, a status bar).
//!
//! ```rust
//! use takeoff_core::diagnostics::{CollectingSink, DiagnosticSink};
//!
//! let mut sink = CollectingSink::default();
//! sink.report("Conduit Weight", "No weight tabulated for PVC 5\"");
//! assert_eq!(sink.diagnostics().len(), 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single fire-and-continue message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub header: String,
    pub message: String,
}

/// Receiver for non-fatal failures.
pub trait DiagnosticSink {
    fn report(&mut self, header: &str, message: &str);

    /// Report a lookup miss using its table name as the header.
    fn report_miss(&mut self, miss: &LookupMiss) {
        self.report(miss.table.display_name(), &miss.to_string());
    }
}

/// Keeps every diagnostic in memory, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, header: &str, message: &str) {
        self.diagnostics.push(Diagnostic {
            header: header.to_string(),
            message: message.to_string(),
        });
    }
}

/// Forwards diagnostics to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, header: &str, message: &str) {
        warn!(header, "{}", message);
    }
}

/// Discards everything. Handy in tests and for callers that only read the
/// failure lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _header: &str, _message: &str) {}
}

/// Which static table a lookup missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupTable {
    ConduitWeight,
    WireWeight,
    StrutCapacity,
    BreakerAmperage,
    GroundSize,
    Fitting,
}

impl LookupTable {
    pub fn display_name(&self) -> &'static str {
        match self {
            LookupTable::ConduitWeight => "Conduit Weight",
            LookupTable::WireWeight => "Wire Weight",
            LookupTable::StrutCapacity => "Strut Capacity",
            LookupTable::BreakerAmperage => "Breaker Amperage",
            LookupTable::GroundSize => "Ground Size",
            LookupTable::Fitting => "Fitting",
        }
    }
}

/// A key that had no entry in a static table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupMiss {
    pub table: LookupTable,
    /// The key as shown to the user (e.g. `EMT 1"` or `#12 Copper`)
    pub key: String,
    /// Run the miss belongs to, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl LookupMiss {
    pub fn new(table: LookupTable, key: impl Into<String>) -> Self {
        LookupMiss {
            table,
            key: key.into(),
            run_id: None,
        }
    }

    pub fn for_run(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.run_id {
            Some(run) => write!(f, "{} not tabulated for '{}' (run {})", self.table.display_name(), self.key, run),
            None => write!(f, "{} not tabulated for '{}'", self.table.display_name(), self.key),
        }
    }
}

/// Two-channel result: the data that could be produced plus every skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    pub failures: Vec<LookupMiss>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, failures: Vec<LookupMiss>) -> Self {
        Outcome { value, failures }
    }

    pub fn clean(value: T) -> Self {
        Outcome {
            value,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_keeps_order() {
        let mut sink = CollectingSink::default();
        sink.report("A", "first");
        sink.report("B", "second");
        let headers: Vec<_> = sink.diagnostics().iter().map(|d| d.header.as_str()).collect();
        assert_eq!(headers, ["A", "B"]);
    }

    #[test]
    fn test_report_miss_uses_table_header() {
        let mut sink = CollectingSink::default();
        sink.report_miss(&LookupMiss::new(LookupTable::WireWeight, "#18 Aluminum").for_run("R-7"));
        let d = &sink.diagnostics()[0];
        assert_eq!(d.header, "Wire Weight");
        assert!(d.message.contains("R-7"));
        assert!(d.message.contains("#18 Aluminum"));
    }

    #[test]
    fn test_outcome_clean() {
        let outcome = Outcome::clean(5);
        assert!(outcome.is_clean());
        let dirty = Outcome::new(5, vec![LookupMiss::new(LookupTable::Fitting, "F-1")]);
        assert!(!dirty.is_clean());
    }
}
