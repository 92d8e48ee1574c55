//! Byte-array literal emission.
//!
//! Turns a byte stream into a single source line declaring a `const char`
//! array, e.g. `const char data[] = { 104, 105 };` for C. Bytes are printed as
//! unsigned decimals from a precomputed table.

mod decimal;
mod dialect;
mod writer;

pub use dialect::Dialect;
pub use writer::{ArrayWriter, emit_array, emit_slice};

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("no data received, language requires data")]
    NoData,

    #[error("input from stdin failed")]
    Input(#[source] io::Error),

    #[error("output to stdout failed")]
    Output(#[source] io::Error),

    #[error("invalid language '{0}'")]
    UnknownDialect(String),
}
