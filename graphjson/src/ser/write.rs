/*
 * SPDX-FileCopyrightText: 2026 The graphjson developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Byte sinks for serialization.

*/

use super::{Error, Result};

/// [`std::io::Write`]-like trait for serialization.
///
/// The user does not need to use this trait directly, as we provide a
/// blanket implementation for all types implementing [`std::io::Write`];
/// in particular, you can serialize into a [`Vec<u8>`] or a
/// [`std::io::Cursor`] for in-memory serialization.
pub trait WriteNoStd {
    /// Write some bytes and return the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Flush all changes to the underlying storage if applicable.
    fn flush(&mut self) -> Result<()>;

    /// Write all bytes in `buf`.
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let written = self.write(buf)?;
            if written == 0 {
                return Err(Error::WriteError);
            }
            buf = &buf[written..];
        }
        Ok(())
    }
}

use std::io::Write;
impl<W: Write> WriteNoStd for W {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Write::write(self, buf).map_err(|_| Error::WriteError)
    }
    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        Write::flush(self).map_err(|_| Error::WriteError)
    }
}

/// A little wrapper around a writer that keeps track of how many bytes
/// have been written.
pub struct WriteWithPos<F: WriteNoStd> {
    backend: F,
    pos: usize,
}

impl<F: WriteNoStd> WriteWithPos<F> {
    #[inline(always)]
    pub fn new(backend: F) -> Self {
        Self { backend, pos: 0 }
    }

    /// Bytes written since creation.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn into_inner(self) -> F {
        self.backend
    }
}

impl<F: WriteNoStd> WriteNoStd for WriteWithPos<F> {
    #[inline(always)]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let res = self.backend.write(buf)?;
        self.pos += res;
        Ok(res)
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        self.backend.flush()
    }
}

/// Writes a string as a JSON literal, quotes included: control characters
/// below 0x20 become their short escapes or `\u00XX`, backslash and double
/// quote are escaped, everything else passes through as UTF-8.
pub fn write_json_string<W: WriteNoStd + ?Sized>(out: &mut W, s: &str) -> Result<()> {
    out.write_all(b"\"")?;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        let escape: Option<&[u8]> = match c {
            '"' => Some(b"\\\""),
            '\\' => Some(b"\\\\"),
            '\u{8}' => Some(b"\\b"),
            '\t' => Some(b"\\t"),
            '\n' => Some(b"\\n"),
            '\u{c}' => Some(b"\\f"),
            '\r' => Some(b"\\r"),
            c if (c as u32) < 0x20 => None,
            _ => continue,
        };
        out.write_all(s[start..i].as_bytes())?;
        match escape {
            Some(e) => out.write_all(e)?,
            None => out.write_all(format!("\\u{:04x}", c as u32).as_bytes())?,
        }
        start = i + 1;
    }
    out.write_all(s[start..].as_bytes())?;
    out.write_all(b"\"")
}
