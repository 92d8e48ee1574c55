use crate::decimal::DECIMAL;
use crate::{Dialect, FormatError};
use std::io::{self, Read, Write};
use tracing::debug;

/// Input is pulled in chunks of this size.
const READ_CHUNK: usize = 16 * 1024;

/// Formatted text is staged here before reaching the output; a byte renders to
/// at most five characters (", 255").
const SCRATCH: usize = 5 * READ_CHUNK;

/// Streams bytes into one array declaration.
///
/// The header goes out on [`begin`](Self::begin), each [`push`](Self::push)
/// appends comma separated decimals, and [`finish`](Self::finish) closes the
/// initializer. The writer never flushes `out`; that stays with the caller.
pub struct ArrayWriter<W: Write> {
    out: W,
    scratch: Vec<u8>,
    dialect: Dialect,
    count: u64,
}

impl<W: Write> ArrayWriter<W> {
    pub fn begin(mut out: W, varname: &str, dialect: Dialect) -> Result<Self, FormatError> {
        write!(out, "const char {varname}{}", dialect.opening()).map_err(FormatError::Output)?;
        Ok(Self {
            out,
            scratch: Vec::with_capacity(SCRATCH),
            dialect,
            count: 0,
        })
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        for chunk in bytes.chunks(READ_CHUNK) {
            self.scratch.clear();
            let mut iter = chunk.iter();
            if self.count == 0 {
                if let Some(&b) = iter.next() {
                    self.scratch.extend_from_slice(DECIMAL[b as usize].as_bytes());
                }
            }
            for &b in iter {
                self.scratch.extend_from_slice(b", ");
                self.scratch.extend_from_slice(DECIMAL[b as usize].as_bytes());
            }
            self.count += chunk.len() as u64;
            self.out
                .write_all(&self.scratch)
                .map_err(FormatError::Output)?;
        }
        Ok(())
    }

    /// Bytes formatted so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Writes the closing brace and hands the output back.
    ///
    /// An array with no elements is not valid in either dialect, so finishing
    /// without a single pushed byte is [`FormatError::NoData`].
    pub fn finish(mut self) -> Result<W, FormatError> {
        if self.count == 0 {
            return Err(FormatError::NoData);
        }
        self.out
            .write_all(self.dialect.closing().as_bytes())
            .map_err(FormatError::Output)?;
        debug!(bytes = self.count, dialect = %self.dialect, "array emitted");
        Ok(self.out)
    }
}

fn read_some<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<usize, FormatError> {
    loop {
        match input.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FormatError::Input(e)),
        }
    }
}

/// Formats everything `input` yields until EOF and returns the byte count.
///
/// Nothing is written when `input` is empty from the start.
pub fn emit_array<R: Read, W: Write>(
    input: &mut R,
    output: W,
    varname: &str,
    dialect: Dialect,
) -> Result<u64, FormatError> {
    let mut buf = vec![0u8; READ_CHUNK];
    let n = read_some(input, &mut buf)?;
    if n == 0 {
        return Err(FormatError::NoData);
    }

    let mut writer = ArrayWriter::begin(output, varname, dialect)?;
    writer.push(&buf[..n])?;
    loop {
        let n = read_some(input, &mut buf)?;
        if n == 0 {
            break;
        }
        writer.push(&buf[..n])?;
    }
    let count = writer.count();
    writer.finish()?;
    Ok(count)
}

/// Same as [`emit_array`] for input that is already in memory.
pub fn emit_slice<W: Write>(
    bytes: &[u8],
    output: W,
    varname: &str,
    dialect: Dialect,
) -> Result<u64, FormatError> {
    if bytes.is_empty() {
        return Err(FormatError::NoData);
    }
    let mut writer = ArrayWriter::begin(output, varname, dialect)?;
    writer.push(bytes)?;
    let count = writer.count();
    writer.finish()?;
    Ok(count)
}
