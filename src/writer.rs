use std::io::Write;

use zerocopy::byteorder::U16;
use zerocopy::IntoBytes;

use crate::primitive::check_size;
use crate::{DateTime, Error, FixedWidth, Nullable, Result, SizedInt, WireOrder};

/// Encodes binary values, using the same rules as .NET's `System.IO.BinaryWriter`, extended
/// with truncated integers, nullable sentinels and `DateTime` ticks.
pub struct BinaryWriter<T> {
    /// The output stream.
    pub out: T,
}

impl<T: Write> BinaryWriter<T> {
    /// Constructor
    pub fn wrap(out: T) -> Self {
        Self { out }
    }

    /// Extracts the inner stream
    pub fn into_inner(self) -> T {
        self.out
    }

    /// Accesses the inner stream
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.out
    }

    /// Writes `bytes` to the output.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    /// Writes a small, fixed-size array of bytes.
    pub fn write_cbytes<const N: usize>(&mut self, value: [u8; N]) -> Result<()> {
        self.write_bytes(&value)
    }

    /// Writes any fixed-width value.
    #[inline]
    pub fn write<V: FixedWidth>(&mut self, value: V) -> Result<()> {
        let bytes = value.to_wire()?;
        self.write_bytes(bytes.as_ref())
    }

    /// Writes any fixed-width value, staging the encoded bytes in `scratch`.
    ///
    /// `scratch` must hold at least `V::WIDTH` bytes. The bytes written are the same as the
    /// ones `write` produces.
    pub fn write_with<V: FixedWidth>(&mut self, value: V, scratch: &mut [u8]) -> Result<()> {
        if scratch.len() < V::WIDTH {
            return Err(Error::ScratchTooSmall {
                needed: V::WIDTH,
                len: scratch.len(),
            });
        }
        let staged = &mut scratch[..V::WIDTH];
        staged.copy_from_slice(value.to_wire()?.as_ref());
        self.out.write_all(staged)?;
        Ok(())
    }

    /// Writes the low `size` bytes of an integer.
    ///
    /// High bytes are dropped without checking that they are redundant, so values that do
    /// not fit in `size` bytes do not read back unchanged. `size` must be in `1..=V::WIDTH`.
    pub fn write_sized<V: SizedInt>(&mut self, value: V, size: usize) -> Result<()> {
        check_size::<V>(size)?;
        self.write_bytes(&value.to_bits().to_le_bytes()[..size])
    }

    /// Writes a value that may be null. `None` is written as the type's sentinel (its
    /// minimum value). Writing `Some` of the sentinel fails with `Error::SentinelValue`,
    /// because it would read back as `None`.
    pub fn write_nullable<V: Nullable>(&mut self, value: Option<V>) -> Result<()> {
        match value {
            None => self.write(V::NULL),
            Some(v) if v == V::NULL => Err(Error::SentinelValue),
            Some(v) => self.write(v),
        }
    }

    /// Writes a single `u8` value
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `i8` value
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `u16` value
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `u32` value
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `u64` value
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `i16` value
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `i32` value
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write(value)
    }

    /// Writes a single `i64` value
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write(value)
    }

    /// Writes the low 3 bytes of an `i32`.
    pub fn write_i24(&mut self, value: i32) -> Result<()> {
        self.write_sized(value, 3)
    }

    /// Writes the low 3 bytes of a `u32`.
    pub fn write_u24(&mut self, value: u32) -> Result<()> {
        self.write_sized(value, 3)
    }

    /// Writes the low 5 bytes of an `i64`.
    pub fn write_i40(&mut self, value: i64) -> Result<()> {
        self.write_sized(value, 5)
    }

    /// Writes the low 5 bytes of a `u64`.
    pub fn write_u40(&mut self, value: u64) -> Result<()> {
        self.write_sized(value, 5)
    }

    /// Writes the low 6 bytes of an `i64`.
    pub fn write_i48(&mut self, value: i64) -> Result<()> {
        self.write_sized(value, 6)
    }

    /// Writes the low 6 bytes of a `u64`.
    pub fn write_u48(&mut self, value: u64) -> Result<()> {
        self.write_sized(value, 6)
    }

    /// Writes the low 7 bytes of an `i64`.
    pub fn write_i56(&mut self, value: i64) -> Result<()> {
        self.write_sized(value, 7)
    }

    /// Writes the low 7 bytes of a `u64`.
    pub fn write_u56(&mut self, value: u64) -> Result<()> {
        self.write_sized(value, 7)
    }

    /// Writes a `bool` value. True is encoded as 1. False is encoded as 0.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write(value)
    }

    /// Writes a `char` as a single UTF-16 code unit. Characters outside the Basic
    /// Multilingual Plane fail with `Error::CharOutOfRange`.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.write(value)
    }

    /// Writes an `f32` value. The value is encoded using its 4-byte little-endian IEEE-754
    /// representation.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write(value)
    }

    /// Writes an `f64` value. The value is encoded using its 8-byte little-endian IEEE-754
    /// representation.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write(value)
    }

    /// Writes a `DateTime` as its `i64` tick count.
    pub fn write_datetime(&mut self, value: DateTime) -> Result<()> {
        self.write(value)
    }

    /// Encodes an `i32` value using a variable-length encoding.
    ///
    /// Although this function takes `i32` values, applications should avoid using this for
    /// negative values. This function can correctly encode negative values, but most "small"
    /// negative value (e.g. `-10`) will be encoded with the maximum number of bytes, which wastes
    /// space.
    pub fn write_7bit_encoded_i32(&mut self, value: i32) -> Result<()> {
        const MORE: u8 = 0x80; // bit indicating there are more bits
        const MASK: u8 = 0x7f;

        let w0: u8 = value as u8 & MASK; // 7 significant bits
        let w1: u8 = (value >> 7) as u8 & MASK; // 7 significant bits
        let w2: u8 = (value >> 14) as u8 & MASK; // 7 significant bits
        let w3: u8 = (value >> 21) as u8 & MASK; // 7 significant bits
        let w4: u8 = (value >> 28) as u8 & 0xF; // only 4 significant bits

        if w4 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2 | MORE, w3 | MORE, w4])
        } else if w3 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2 | MORE, w3])
        } else if w2 != 0 {
            self.write_cbytes([w0 | MORE, w1 | MORE, w2])
        } else if w1 != 0 {
            self.write_cbytes([w0 | MORE, w1])
        } else {
            self.write_cbytes([w0])
        }
    }

    /// Encodes an `i64` value using a variable-length encoding.
    ///
    /// Negative values always take the maximum of 10 bytes.
    pub fn write_7bit_encoded_i64(&mut self, value: i64) -> Result<()> {
        let mut n: u64 = value as u64;

        loop {
            if n < 0x80 {
                return self.write_u8(n as u8);
            }
            self.write_u8((n & 0x7f) as u8 | 0x80)?;
            n >>= 7;
        }
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len_i32 = i32::try_from(len)
            .map_err(|_| Error::CannotEncode("length does not fit in an i32 prefix"))?;
        self.write_7bit_encoded_i32(len_i32)
    }

    /// Writes a UTF-8 string in length-prefixed form.
    pub fn write_utf8_str(&mut self, s: &str) -> Result<()> {
        self.write_utf8_bytes(s.as_bytes())
    }

    /// Writes a UTF-8 string in length-prefixed form.
    ///
    /// This function does not validate that the input string is well-formed UTF-8.
    pub fn write_utf8_bytes(&mut self, s: &[u8]) -> Result<()> {
        self.write_len(s.len())?;
        self.write_bytes(s)
    }

    /// Writes a UTF-16 string in length-prefixed form.
    ///
    /// This function does not validate that the input string is well-formed UTF-16.
    pub fn write_utf16_units(&mut self, s: &[u16]) -> Result<()> {
        let wire: Vec<U16<WireOrder>> = s.iter().map(|&c| U16::new(c)).collect();
        let s_bytes = wire.as_bytes();
        self.write_len(s_bytes.len())?;
        self.write_bytes(s_bytes)
    }

    /// Converts a UTF-8 string into UTF-16 and writes it in length-prefixed form.
    pub fn write_utf16_encode(&mut self, s: &str) -> Result<()> {
        let units: Vec<u16> = s.encode_utf16().collect();
        self.write_utf16_units(&units)
    }
}

impl BinaryWriter<Vec<u8>> {
    /// Creates a new `BinaryWriter` over a `Vec<u8>`
    pub fn new() -> Self {
        Self { out: Vec::new() }
    }

    /// Creates a new `BinaryWriter` over a `Vec<u8>` with the given capacity.
    pub fn with_capacity(len: usize) -> Self {
        Self {
            out: Vec::with_capacity(len),
        }
    }
}

impl Default for BinaryWriter<Vec<u8>> {
    fn default() -> Self {
        Self::new()
    }
}
