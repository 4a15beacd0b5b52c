//! Common result and error types for the Kairos toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable condition inside the analysis (a cyclic
/// timing graph, an empty wire group), not a problem the user can fix by
/// editing input. Recoverable problems such as unroutable sinks are counted
/// and reported through a `DiagnosticSink` while the operation returns `Ok`.
pub type KairosResult<T> = Result<T, InternalError>;

/// An internal timing error. Seeing one means the graph or the estimator
/// reached a state its invariants forbid.
#[derive(Debug, thiserror::Error)]
#[error("internal timing error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("cycle through a/O");
        assert_eq!(format!("{err}"), "internal timing error: cycle through a/O");
    }

    #[test]
    fn question_mark_propagates() {
        fn inner() -> KairosResult<u32> {
            Err(InternalError::new("empty group"))
        }
        fn outer() -> KairosResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer().unwrap_err().message, "empty group");
    }

    #[test]
    fn from_string() {
        let err: InternalError = format!("vertex {} duplicated", 7).into();
        assert_eq!(err.message, "vertex 7 duplicated");
    }
}
