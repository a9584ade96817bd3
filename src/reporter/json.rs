//! JSON reporter for machine-readable output

use crate::ProjectReport;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Serialize a project report as JSON
    pub fn report(&self, report: &ProjectReport) -> String {
        if self.pretty {
            serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}
