//! Error types for delay data loading, table lookups, and route tracing.

use kairos_design::NodeId;
use std::path::PathBuf;

/// Errors raised while loading delay data files.
///
/// All of these are fatal: a timing model cannot be built from malformed
/// data. Each variant names the file, and every variant that concerns a
/// specific line carries its 1-based number.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The file could not be read.
    #[error("failed to read delay data {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A line could not be parsed.
    #[error("{path}:{line}: {message}")]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// An interconnect term name is not recognised.
    #[error("{path}:{line}: unknown delay term '{name}'")]
    UnknownTerm {
        /// The file being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The unrecognised name.
        name: String,
    },

    /// The same intra-site arc is defined twice.
    #[error("{path}:{line}: duplicate entry {from} -> {to} in scope '{scope}'")]
    DuplicateEntry {
        /// The file being parsed.
        path: PathBuf,
        /// 1-based line number of the second definition.
        line: usize,
        /// Scope name.
        scope: String,
        /// Source pin.
        from: String,
        /// Destination pin.
        to: String,
    },

    /// A `bel` header declares more configuration values than fit in a mask.
    #[error("{path}:{line}: scope '{scope}' has more than 64 configuration values")]
    TooManyConfigValues {
        /// The file being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Scope name.
        scope: String,
    },
}

/// A delay-table query that names something the table does not know.
///
/// Lookup errors are never fatal; graph construction counts them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The BEL or site name maps to no scope.
    #[error("unknown delay scope '{0}'")]
    UnknownScope(String),

    /// A configuration value was not declared for the scope.
    #[error("unknown configuration '{config}' for scope '{scope}'")]
    UnknownConfig {
        /// The scope queried.
        scope: String,
        /// The `NAME:VALUE` string.
        config: String,
    },
}

/// A routed net whose PIPs do not connect the source to a sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The chain of PIPs back from the sink stops before the source.
    #[error("net '{net}': route to sink breaks at node {node}")]
    Unreachable {
        /// Net name.
        net: String,
        /// The node with no driving PIP.
        node: NodeId,
    },

    /// The chain of PIPs back from the sink visits a node twice.
    #[error("net '{net}': route loops through node {node}")]
    Loop {
        /// Net name.
        net: String,
        /// The revisited node.
        node: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_file_and_line() {
        let err = DataError::Parse {
            path: PathBuf::from("data/intrasite_delay_terms.txt"),
            line: 12,
            message: "invalid delay 'x'".into(),
        };
        assert_eq!(
            err.to_string(),
            "data/intrasite_delay_terms.txt:12: invalid delay 'x'"
        );
    }

    #[test]
    fn unknown_term_display() {
        let err = DataError::UnknownTerm {
            path: PathBuf::from("t.txt"),
            line: 3,
            name: "K9_DIAGONAL".into(),
        };
        assert_eq!(err.to_string(), "t.txt:3: unknown delay term 'K9_DIAGONAL'");
    }

    #[test]
    fn lookup_error_display() {
        let err = LookupError::UnknownConfig {
            scope: "CARRY8".into(),
            config: "CYINIT_BOT:VCC".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown configuration 'CYINIT_BOT:VCC' for scope 'CARRY8'"
        );
    }

    #[test]
    fn route_error_display() {
        let err = RouteError::Unreachable {
            net: "n0".into(),
            node: NodeId::from_raw(4),
        };
        assert_eq!(err.to_string(), "net 'n0': route to sink breaks at node 4");
    }
}
