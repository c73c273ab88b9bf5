//! The error currency shared by every component in this crate.
//!
//! Every fallible library function returns `Result<T, Error>`. The three
//! binaries convert this into `anyhow::Error` only at the point where it is
//! printed to the user (see `src/bin/*.rs`), so the library itself never
//! depends on `anyhow`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer of length {len} is not 8-byte aligned")]
    BadAlignment { len: usize },

    #[error("{path}:{line}: {msg}")]
    BadManifest {
        path: String,
        line: usize,
        msg: String,
    },

    #[error("truncated read at {where_}: expected {expected} bytes, got {got}")]
    Truncated {
        where_: String,
        expected: usize,
        got: usize,
    },

    #[error("could not seek to offset {offset:#x}")]
    NoSeek { offset: u64 },

    #[error("CRC mismatch: expected {expected:#010x}, got {got:#010x}")]
    CrcMismatch { expected: u32, got: u32 },

    #[error("no NAND geometry known for tag {tag:?}")]
    UnknownNandTag { tag: String },

    #[error("inflate error: {detail}")]
    InflateError { detail: String },

    #[error("binary layout error: {detail}")]
    Codec { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
