//! Diagnostic construction from engine problems.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

use super::report::Problem;

/// Engine severity code for warnings
pub const ENGINE_WARNING: i64 = 1;
/// Engine severity code for errors
pub const ENGINE_ERROR: i64 = 2;

/// Map an engine severity code onto a protocol severity.
///
/// Unknown or missing codes are reported as errors.
pub fn map_severity(code: Option<i64>) -> DiagnosticSeverity {
    match code {
        Some(ENGINE_WARNING) => DiagnosticSeverity::WARNING,
        Some(ENGINE_ERROR) => DiagnosticSeverity::ERROR,
        _ => DiagnosticSeverity::ERROR,
    }
}

/// Convert a 1-based engine coordinate into a 0-based protocol one.
///
/// Protocol positions are unsigned: anything below 1 lands on 0.
fn zero_based(value: Option<i64>) -> u32 {
    let value = value.unwrap_or(0).saturating_sub(1);
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// Build a point diagnostic for one engine problem
pub fn build_diagnostic(problem: &Problem, source: &str) -> Diagnostic {
    let position = Position::new(zero_based(problem.line), zero_based(problem.column));

    Diagnostic {
        range: Range::new(position, position),
        severity: Some(map_severity(problem.severity)),
        code: problem.rule_id.clone().map(NumberOrString::String),
        source: Some(source.to_string()),
        message: problem.message.clone().unwrap_or_default(),
        ..Default::default()
    }
}
