//! Engine Report
//!
//! The raw report shape produced by the linting engine, parsed so that every
//! field is optional, and the translation of a report into diagnostics.

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::lsp_types::Diagnostic;

use super::diagnostic::build_diagnostic;
use crate::lenient::lenient;

/// Top level of an engine report
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, deserialize_with = "lenient")]
    pub error_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub warning_count: Option<u64>,
    /// Kept as raw values so one malformed entry cannot hide the others
    #[serde(default, deserialize_with = "lenient")]
    pub results: Option<Vec<Value>>,
}

/// Findings for one linted document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    #[serde(default, deserialize_with = "lenient")]
    pub file_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub warning_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages: Option<Vec<Value>>,
}

/// A single finding. Line and column are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default, deserialize_with = "lenient")]
    pub line: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub column: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub rule_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

impl Report {
    /// Parse a raw report. Anything that is not an object yields an empty report.
    pub fn from_value(value: &Value) -> Self {
        Report::deserialize(value).unwrap_or_default()
    }

    /// The report for the linted document.
    ///
    /// The engine is always handed exactly one text, so only the first
    /// result is meaningful.
    pub fn first_result(&self) -> Option<DocumentReport> {
        let first = self.results.as_ref()?.first()?;
        DocumentReport::deserialize(first).ok()
    }
}

impl DocumentReport {
    /// Problems in report order, skipping null and non-object entries
    pub fn problems(&self) -> impl Iterator<Item = Problem> + '_ {
        self.messages
            .iter()
            .flatten()
            .filter(|message| message.is_object())
            .filter_map(|message| Problem::deserialize(message).ok())
    }
}

/// Translate an engine report into diagnostics for one document.
///
/// Never fails: a missing or malformed report produces no diagnostics.
pub fn translate(report: Option<&Value>, source: &str) -> Vec<Diagnostic> {
    let Some(report) = report.map(Report::from_value) else {
        return Vec::new();
    };

    let Some(document) = report.first_result() else {
        return Vec::new();
    };

    log::debug!(
        "engine report for {}: {} error(s), {} warning(s)",
        document.file_path.as_deref().unwrap_or("<text>"),
        document.error_count.or(report.error_count).unwrap_or(0),
        document.warning_count.or(report.warning_count).unwrap_or(0),
    );

    document
        .problems()
        .map(|problem| build_diagnostic(&problem, source))
        .collect()
}
