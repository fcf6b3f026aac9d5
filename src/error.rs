//! Error type shared by `BinaryReader`, `BinaryWriter` and the collection codecs.

use std::io;
use thiserror::Error;

/// Errors produced while encoding or decoding values.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream reached its end before the value was complete.
    ///
    /// The reader consumes exactly `available` bytes before reporting this, so the stream
    /// position is not restored. Callers should not assume the stream is usable afterwards.
    #[error("stream ended early: needed {needed} bytes, but only {available} were available")]
    Truncated {
        /// Number of bytes the value requires.
        needed: usize,
        /// Number of bytes that were actually read.
        available: usize,
    },

    /// An explicit byte count is outside `1..=width`.
    #[error("byte count {size} is outside the valid range 1..={width}")]
    SizeOutOfRange {
        /// The requested byte count.
        size: usize,
        /// The full byte width of the integer type.
        width: usize,
    },

    /// A present value equals the null sentinel of its type, so it would read back as `None`.
    #[error("value is the null sentinel of its type and cannot be written as a present value")]
    SentinelValue,

    /// A `char` outside the Basic Multilingual Plane cannot be stored in one UTF-16 code unit.
    #[error("character U+{0:04X} does not fit in a single UTF-16 code unit")]
    CharOutOfRange(u32),

    /// A caller-supplied scratch buffer is smaller than the encoded value.
    #[error("scratch buffer holds {len} bytes, but {needed} are required")]
    ScratchTooSmall {
        /// Encoded width of the value.
        needed: usize,
        /// Length of the buffer that was passed in.
        len: usize,
    },

    /// A strict collection read found a key that was already present.
    ///
    /// Entries read before `index` have already been inserted.
    #[error("duplicate key at entry {index}")]
    DuplicateKey {
        /// Zero-based position of the offending pair within the collection.
        index: usize,
    },

    /// The input is malformed.
    #[error("invalid data: {0}")]
    Invalid(&'static str),

    /// A value cannot be encoded, typically because a length or count does not fit in the
    /// wire's `i32`.
    #[error("the data cannot be encoded: {0}")]
    CannotEncode(&'static str),

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` for the errors caused by an argument outside the range the wire format
    /// can represent: [`Error::SizeOutOfRange`], [`Error::SentinelValue`],
    /// [`Error::CharOutOfRange`] and [`Error::ScratchTooSmall`].
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            Self::SizeOutOfRange { .. }
                | Self::SentinelValue
                | Self::CharOutOfRange(_)
                | Self::ScratchTooSmall { .. }
        )
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
