//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Timing analysis reports user-actionable problems (an unmet requirement,
//! sinks that could not be traced, malformed delay data) as structured
//! [`Diagnostic`] values. The thread-safe [`DiagnosticSink`] collects them
//! while graph construction runs on worker threads, and a
//! [`DiagnosticRenderer`] formats them for the terminal.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::{Diagnostic, Location};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
