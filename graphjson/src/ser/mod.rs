/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Serialization traits and types.

[`Serialize`] is the serialization entry point, implemented for
[`Value`]: it runs the reference-tracing pass over the graph, then the
emission pass, into a generic [`WriteNoStd`] backend. The convenience
function [`encode`] serializes into a fresh byte vector, and
[`Serialize::store`] into a file.

A [`JsonWriter`] performs exactly one top-level write per call, moving
through `Idle → Tracing → Emitting → Flushed` and back; its identity
tables live for that one call. A writer is not meant to be shared: all
work runs to completion on the calling thread.

*/

use std::path::Path;

use crate::graph::Value;
use crate::meta::TypeSpec;

mod emit;
mod trace;
pub mod write;
pub use write::{write_json_string, WriteNoStd, WriteWithPos};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// Errors that can happen during serialization.
pub enum Error {
    /// The underlying writer returned an error.
    #[error("Write error during graphjson serialization")]
    WriteError,
    /// [`Serialize::store`] could not open the provided file.
    #[error("Error opening file during graphjson serialization: {0}")]
    FileOpenError(std::io::Error),
    /// A custom write hook reported a failure.
    #[error("Custom writer for type '{0}' failed: {1}")]
    CustomWrite(String, String),
}

bitflags::bitflags! {
    /// Writer options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WriteFlags: u32 {
        /// Leave null record fields out of the output entirely.
        const SKIP_NULL_FIELDS = 1 << 0;
    }
}

/// Where a writer stands in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Tracing,
    Emitting,
    Flushed,
}

/// One-shot graph writer over a byte sink.
pub struct JsonWriter<W: WriteNoStd> {
    backend: WriteWithPos<W>,
    flags: WriteFlags,
    phase: Phase,
}

impl<W: WriteNoStd> JsonWriter<W> {
    pub fn new(backend: W) -> Self {
        Self::with_flags(backend, WriteFlags::default())
    }

    pub fn with_flags(backend: W, flags: WriteFlags) -> Self {
        Self {
            backend: WriteWithPos::new(backend),
            flags,
            phase: Phase::Idle,
        }
    }

    /// Writes one graph and returns the number of bytes emitted. The
    /// identity tables are per-call; the writer is reusable afterwards.
    pub fn write(&mut self, root: &Value) -> Result<usize> {
        debug_assert_eq!(self.phase, Phase::Idle);
        self.phase = Phase::Tracing;
        let trace = trace::trace(root);
        self.phase = Phase::Emitting;
        let start = self.backend.pos();
        let res = if root.is_null() {
            // A top-level null has no enclosing slot to be null in.
            self.backend.write_all(b"{}")
        } else {
            let mut emitter = emit::Emitter {
                out: &mut self.backend,
                trace: &trace,
                defined: Default::default(),
                flags: self.flags,
            };
            emitter.value(root, &TypeSpec::Any)
        };
        let res = res.and_then(|()| {
            self.phase = Phase::Flushed;
            self.backend.flush()
        });
        self.phase = Phase::Idle;
        res?;
        Ok(self.backend.pos() - start)
    }
}

/// Main serialization trait, implemented for [`Value`].
pub trait Serialize {
    /// Serialize the graph into the given backend.
    fn serialize<F: WriteNoStd>(&self, backend: F) -> Result<usize> {
        self.serialize_with_flags(backend, WriteFlags::default())
    }

    /// Serialize with explicit writer options.
    fn serialize_with_flags<F: WriteNoStd>(&self, backend: F, flags: WriteFlags) -> Result<usize>;

    /// Commodity method to serialize to a file.
    fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path).map_err(Error::FileOpenError)?;
        let mut buf_writer = std::io::BufWriter::new(file);
        self.serialize(&mut buf_writer)?;
        Ok(())
    }
}

impl Serialize for Value {
    fn serialize_with_flags<F: WriteNoStd>(&self, backend: F, flags: WriteFlags) -> Result<usize> {
        JsonWriter::with_flags(backend, flags).write(self)
    }
}

/// Serializes a graph into a fresh byte vector.
pub fn encode(root: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    root.serialize(&mut buf)?;
    Ok(buf)
}

/// [`encode`] with explicit writer options.
pub fn encode_with_flags(root: &Value, flags: WriteFlags) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    root.serialize_with_flags(&mut buf, flags)?;
    Ok(buf)
}
