//! Shared foundational types used across the Kairos timing toolchain.
//!
//! This crate provides interned names, content hashing, time values with
//! unit parsing, and the common internal-error result type.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;
pub mod time;

pub use hash::{ContentHash, ContentHasher};
pub use ident::{Ident, Interner};
pub use result::{InternalError, KairosResult};
pub use time::{ParseTimeError, TimeValue};
