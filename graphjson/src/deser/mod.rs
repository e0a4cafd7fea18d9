/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Deserialization entry points and types.

[`decode`] rebuilds an object graph from bytes in two passes: the input is
parsed to the intermediate tree (recording every `@id` in the reference
table), then the tree is walked iteratively, instantiating target values,
coercing primitives, and queueing forward references for the patch pass.
[`decode_tree`] stops after the first pass and hands back the intermediate
tree itself, uninstantiated.

Failures are surfaced as a single [`Error`] kind: lexical and structural
variants carry the 1-based byte position of the offending character,
semantic and instantiation variants the offending tag or type, and a
reference that is still unresolved once patching ends is fatal.

All state lives for exactly one top-level call; decoding runs to
completion on the calling thread.

*/

use std::path::Path;

use crate::graph::Value;
use crate::json::{parser, Elem};
use crate::meta::Registry;

mod build;
mod coerce;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// Errors that can happen during deserialization.
pub enum Error {
    /// [`load`] could not open the provided file.
    #[error("Error opening file during graphjson deserialization: {0}")]
    FileOpenError(std::io::Error),
    /// A character that cannot start or continue a token, an unterminated
    /// string, or an over-long number.
    #[error("{reason} at position {pos}")]
    Lexical { reason: String, pos: usize },
    /// Malformed JSON structure, e.g. a missing `:` or an unclosed
    /// object.
    #[error("{reason} at position {pos}")]
    Structural { reason: String, pos: usize },
    /// Input that parses but cannot be mapped onto the expected types.
    #[error("{0}")]
    Semantic(String),
    /// A `@type` tag naming no registered class.
    #[error("Unknown type tag '{0}'")]
    UnknownType(String),
    /// A target value could not be constructed.
    #[error("Cannot instantiate {0}")]
    Instantiation(String),
    /// References still dangling after the patch pass.
    #[error("{count} unresolved reference(s) after patching, first missing id {first}")]
    UnresolvedRefs { count: usize, first: i64 },
}

bitflags::bitflags! {
    /// Reader options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReadFlags: u32 {
        /// Fail when a `@type` tag names no registered class. When
        /// cleared, such objects degrade to a generic mapping of their
        /// fields.
        const FAIL_ON_UNKNOWN_TYPE = 1 << 0;
    }
}

impl Default for ReadFlags {
    fn default() -> Self {
        ReadFlags::FAIL_ON_UNKNOWN_TYPE
    }
}

/// Rebuilds an object graph from UTF-8 JSON bytes.
pub fn decode(bytes: &[u8], registry: &Registry, flags: ReadFlags) -> Result<Value> {
    let src = core::str::from_utf8(bytes).map_err(|e| Error::Lexical {
        reason: "invalid UTF-8".into(),
        pos: e.valid_up_to() + 1,
    })?;
    let parsed = parser::parse(src)?;
    build::build(parsed, registry, flags)
}

/// Parses the input to the intermediate tree without instantiating
/// anything.
pub fn decode_tree(bytes: &[u8]) -> Result<Elem> {
    let src = core::str::from_utf8(bytes).map_err(|e| Error::Lexical {
        reason: "invalid UTF-8".into(),
        pos: e.valid_up_to() + 1,
    })?;
    Ok(parser::parse(src)?.root)
}

/// Convenience method to decode a file.
pub fn load(path: impl AsRef<Path>, registry: &Registry, flags: ReadFlags) -> anyhow::Result<Value> {
    let bytes = std::fs::read(path).map_err(Error::FileOpenError)?;
    Ok(decode(&bytes, registry, flags)?)
}
