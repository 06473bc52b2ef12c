//! Validation
//!
//! Pure translation from engine output to protocol diagnostics, and the
//! shaping of validation failures into user-facing messages.

pub mod diagnostic;
pub mod errors;
pub mod report;

pub use diagnostic::{build_diagnostic, map_severity};
pub use errors::{user_message, ErrorMessageTracker};
pub use report::{translate, DocumentReport, Problem, Report};
