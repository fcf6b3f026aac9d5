//! The pluggable codec used for collection keys and values.

use std::io::{Read, Write};

use crate::{BinaryReader, BinaryWriter, DateTime, Nullable, Result};

/// A type that can write itself to a stream and read itself back.
///
/// All primitives implement this with their fixed-width encoding, `String` with the
/// length-prefixed UTF-8 encoding, and `Option<T>` with the null sentinel of `T`. Implement it
/// for your own types to use them as keys or values in the collection codecs.
///
/// ```
/// use dotnet_stream_codec::{BinaryCodec, BinaryReader, BinaryWriter, Result};
/// use std::io::{Read, Write};
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl BinaryCodec for Point {
///     fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
///         Ok(Point {
///             x: reader.read_i32()?,
///             y: reader.read_i32()?,
///         })
///     }
///
///     fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
///         writer.write_i32(self.x)?;
///         writer.write_i32(self.y)
///     }
/// }
///
/// let mut w = BinaryWriter::new();
/// w.write_value(&Point { x: 1, y: -2 }).unwrap();
/// let mut r = BinaryReader::new(w.out.as_slice());
/// assert_eq!(r.read_value::<Point>().unwrap(), Point { x: 1, y: -2 });
/// ```
pub trait BinaryCodec: Sized {
    /// Reads a value from `reader`.
    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self>;

    /// Writes `self` to `writer`.
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()>;
}

macro_rules! impl_fixed_codec {
    ($($ty:ty),*) => {
        $(
            impl BinaryCodec for $ty {
                #[inline]
                fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
                    reader.read()
                }

                #[inline]
                fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
                    writer.write(*self)
                }
            }
        )*
    };
}

impl_fixed_codec!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, bool, char, DateTime);

impl BinaryCodec for String {
    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_utf8_string()
    }

    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_utf8_str(self)
    }
}

impl<T: Nullable> BinaryCodec for Option<T> {
    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        reader.read_nullable()
    }

    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_nullable(*self)
    }
}

impl<R: Read> BinaryReader<R> {
    /// Reads any value that implements `BinaryCodec`.
    pub fn read_value<T: BinaryCodec>(&mut self) -> Result<T> {
        T::decode(self)
    }
}

impl<W: Write> BinaryWriter<W> {
    /// Writes any value that implements `BinaryCodec`.
    pub fn write_value<T: BinaryCodec>(&mut self, value: &T) -> Result<()> {
        value.encode(self)
    }
}
