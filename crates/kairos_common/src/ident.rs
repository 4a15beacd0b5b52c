//! Interned pin and cell names.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Serialize};

/// An interned pin name such as `"u_core/add0/CO[7]"`.
///
/// Equal names intern to equal identifiers, so the timing graph keys its
/// vertex table by `Ident` rather than by string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(Spur);

/// Pin names are hierarchical paths; a leading `/` is not significant.
fn canonical(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Per-graph name table.
///
/// `"/a/b"` and `"a/b"` intern to the same [`Ident`], and resolving gives
/// back the form without the leading `/`.
pub struct Interner {
    names: ThreadedRodeo<Spur>,
}

impl Interner {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            names: ThreadedRodeo::new(),
        }
    }

    /// The identifier of `name`, interning it on first use.
    pub fn get_or_intern(&self, name: &str) -> Ident {
        Ident(self.names.get_or_intern(canonical(name)))
    }

    /// The identifier of `name` if it was interned before.
    pub fn get(&self, name: &str) -> Option<Ident> {
        self.names.get(canonical(name)).map(Ident)
    }

    /// The name behind an identifier.
    ///
    /// # Panics
    ///
    /// Panics if `ident` came from a different table.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.names.resolve(&ident.0)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no name has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
