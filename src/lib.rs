//! Reads and writes fixed-width primitives and keyed collections over byte streams, using the
//! encoding rules of .NET's `System.IO.BinaryWriter` plus a few extensions.
//!
//! * Integers of 8, 16, 32 and 64 bits, and truncated integers of any byte count up to the
//!   native width (24, 40, 48 and 56 bits have named helpers). Truncated signed values are
//!   sign-extended when read back.
//! * `bool`, `char` (one UTF-16 code unit), `f32`, `f64` and [`DateTime`] ticks.
//! * Nullable values, where the type's minimum value stands for `None`.
//! * Length-prefixed UTF-8 and UTF-16 strings.
//! * Count-prefixed dictionaries and sequences, optionally preceded by
//!   [`VALIDITY_MARKER`].
//!
//! Everything is little-endian regardless of the host. No type information is written, so the
//! reader must know what it expects.
//!
//! # References
//! * <https://learn.microsoft.com/en-us/dotnet/api/system.io.binarywriter.write?view=net-9.0>

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]
#![warn(missing_docs)]

mod codec;
mod collection;
mod datetime;
mod error;
mod primitive;
mod reader;
mod writer;


pub use codec::BinaryCodec;
pub use collection::{DictOutcome, DictSink, VALIDITY_MARKER};
pub use datetime::{DateTime, TICKS_PER_SECOND};
pub use error::{Error, Result};
pub use primitive::{FixedWidth, Nullable, SizedInt};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Byte order of every multi-byte value on the wire.
pub type WireOrder = zerocopy::byteorder::LittleEndian;
