//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// General errors, prefixed with `E`.
    Error,
    /// General warnings, prefixed with `W`.
    Warning,
    /// Timing results and graph construction, prefixed with `T`.
    Timing,
    /// Delay data files, prefixed with `D`.
    Data,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Timing => 'T',
            Category::Data => 'D',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `T101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Timing requirement not met.
    pub const REQUIREMENT_VIOLATED: Self = Self::new(Category::Timing, 10);
    /// Sinks skipped during graph construction.
    pub const SKIPPED_SINKS: Self = Self::new(Category::Timing, 101);
    /// Nets skipped during graph construction.
    pub const SKIPPED_NETS: Self = Self::new(Category::Timing, 102);
    /// Delay lookups that failed on an unknown scope or configuration.
    pub const LOOKUP_ERRORS: Self = Self::new(Category::Timing, 103);
    /// A delay data file could not be parsed.
    pub const DATA_PARSE: Self = Self::new(Category::Data, 1);
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
        assert_eq!(Category::Timing.prefix(), 'T');
        assert_eq!(Category::Data.prefix(), 'D');
    }

    #[test]
    fn display_format() {
        assert_eq!(DiagnosticCode::REQUIREMENT_VIOLATED.to_string(), "T010");
        assert_eq!(DiagnosticCode::SKIPPED_SINKS.to_string(), "T101");
        assert_eq!(DiagnosticCode::DATA_PARSE.to_string(), "D001");
        assert_eq!(DiagnosticCode::new(Category::Warning, 3).to_string(), "W003");
    }

    #[test]
    fn serde_json_form() {
        let json = serde_json::to_string(&DiagnosticCode::LOOKUP_ERRORS).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DiagnosticCode::LOOKUP_ERRORS);
    }
}
