use std::io::{self, Read};

use zerocopy::byteorder::U16;
use zerocopy::FromBytes;

use crate::primitive::{check_size, widen};
use crate::{DateTime, Error, FixedWidth, Nullable, Result, SizedInt, WireOrder};

/// Upper bound on the capacity reserved up front from an untrusted length or count.
pub(crate) const MAX_PREALLOC: usize = 4096;

/// Reads values from a byte stream. The values are encoded using the rules defined by .NET's
/// `System.IO.BinaryWriter`, extended with truncated integers, nullable sentinels and
/// `DateTime` ticks.
///
/// Most simple fixed-size types are simply encoded using their little-endian byte
/// representation. Variable-length types, such as strings and variable-length integers, have
/// different encodings. Each of the methods that decodes such a type describes its
/// representation.
///
/// `BinaryReader` does not buffer. Every read goes straight to `input`, so wrap slow streams
/// in `std::io::BufReader` first. A `&[u8]` works as `input`, and after each read it points
/// at the remaining data.
///
/// If a read fails, the stream has still been advanced past whatever bytes were consumed. The
/// caller should not assume the stream is positioned at a value boundary after an error.
pub struct BinaryReader<R> {
    /// The stream being decoded.
    pub input: R,
}

impl<'a> BinaryReader<&'a [u8]> {
    /// Creates a reader over an in-memory buffer. After each read, `input` points at the
    /// remaining data.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { input: data }
    }
}

impl<R: Read> BinaryReader<R> {
    /// Constructor
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// Extracts the inner stream
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Accesses the inner stream
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.input
    }

    /// Fills `buf` completely, or fails with `Error::Truncated` after consuming every byte the
    /// stream had left.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.input.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::Truncated {
                        needed: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }

    /// Reads any fixed-width value.
    #[inline]
    pub fn read<T: FixedWidth>(&mut self) -> Result<T> {
        let mut bytes = T::Bytes::default();
        self.fill(bytes.as_mut())?;
        T::from_wire(bytes)
    }

    /// Reads any fixed-width value, staging the bytes in `scratch` instead of a local buffer.
    ///
    /// `scratch` must hold at least `T::WIDTH` bytes. The decoded value is the same as the
    /// one `read` returns. Fixed-width values never allocate, so this saves nothing over
    /// `read`; it exists for callers that already thread a reusable buffer through their
    /// decoding, and mirrors `BinaryWriter::write_with`. On success `scratch[..T::WIDTH]`
    /// holds the raw wire bytes.
    pub fn read_with<T: FixedWidth>(&mut self, scratch: &mut [u8]) -> Result<T> {
        if scratch.len() < T::WIDTH {
            return Err(Error::ScratchTooSmall {
                needed: T::WIDTH,
                len: scratch.len(),
            });
        }
        let staged = &mut scratch[..T::WIDTH];
        self.fill(staged)?;
        let mut bytes = T::Bytes::default();
        bytes.as_mut().copy_from_slice(staged);
        T::from_wire(bytes)
    }

    /// Reads an integer that was written with only its low `size` bytes.
    ///
    /// Unsigned types are zero-extended. Signed types are sign-extended from bit 7 of the
    /// last byte read, so `[0xfb, 0xff, 0xff]` read as a 3-byte `i32` is `-5`.
    ///
    /// `size` must be in `1..=T::WIDTH`.
    pub fn read_sized<T: SizedInt>(&mut self, size: usize) -> Result<T> {
        check_size::<T>(size)?;
        let mut buf = [0u8; 8];
        self.fill(&mut buf[..size])?;
        Ok(widen(buf, size))
    }

    /// Reads a value that may be null. The type's sentinel (its minimum value) decodes as
    /// `None`.
    pub fn read_nullable<T: Nullable>(&mut self) -> Result<Option<T>> {
        let value: T = self.read()?;
        Ok(if value == T::NULL { None } else { Some(value) })
    }

    /// Reads exactly `len` bytes into a new vector.
    ///
    /// `len` often comes from an untrusted length prefix, so the vector grows as bytes arrive
    /// instead of being sized up front. If the stream ends early, every remaining byte is
    /// consumed and the result is `Error::Truncated`.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOC));
        self.input.by_ref().take(len as u64).read_to_end(&mut bytes)?;
        if bytes.len() < len {
            return Err(Error::Truncated {
                needed: len,
                available: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Reads a small array of bytes, with a constant length.
    #[inline(always)]
    pub fn read_cbytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.fill(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads a single `u8` value.
    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    /// Reads a single `i8` value.
    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read()
    }

    /// Reads a `u16` in little-endian byte order.
    #[inline(always)]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read()
    }

    /// Reads a `u32` in little-endian byte order.
    #[inline(always)]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()
    }

    /// Reads a `u64` in little-endian byte order.
    #[inline(always)]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read()
    }

    /// Reads a `i16` in little-endian byte order.
    #[inline(always)]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read()
    }

    /// Reads a `i32` in little-endian byte order.
    #[inline(always)]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()
    }

    /// Reads a `i64` in little-endian byte order.
    #[inline(always)]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read()
    }

    /// Reads a 3-byte signed integer.
    pub fn read_i24(&mut self) -> Result<i32> {
        self.read_sized(3)
    }

    /// Reads a 3-byte unsigned integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        self.read_sized(3)
    }

    /// Reads a 5-byte signed integer.
    pub fn read_i40(&mut self) -> Result<i64> {
        self.read_sized(5)
    }

    /// Reads a 5-byte unsigned integer.
    pub fn read_u40(&mut self) -> Result<u64> {
        self.read_sized(5)
    }

    /// Reads a 6-byte signed integer.
    pub fn read_i48(&mut self) -> Result<i64> {
        self.read_sized(6)
    }

    /// Reads a 6-byte unsigned integer.
    pub fn read_u48(&mut self) -> Result<u64> {
        self.read_sized(6)
    }

    /// Reads a 7-byte signed integer.
    pub fn read_i56(&mut self) -> Result<i64> {
        self.read_sized(7)
    }

    /// Reads a 7-byte unsigned integer.
    pub fn read_u56(&mut self) -> Result<u64> {
        self.read_sized(7)
    }

    /// Reads a `bool`. Any nonzero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read()
    }

    /// Reads a `char` stored as one UTF-16 code unit. Surrogate code units are rejected with
    /// `Error::Invalid`.
    pub fn read_char(&mut self) -> Result<char> {
        self.read()
    }

    /// Reads an `f32` from its IEEE-754 bits.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read()
    }

    /// Reads an `f64` from its IEEE-754 bits.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read()
    }

    /// Reads a `DateTime` from its `i64` tick count.
    pub fn read_datetime(&mut self) -> Result<DateTime> {
        self.read()
    }

    /// Reads a variable-length integer and returns the value in `i32`.
    pub fn read_7bit_encoded_i32(&mut self) -> Result<i32> {
        // Each byte encodes 7 bits of the integer and 1 bit indicating whether there are
        // more bytes following this one. Because 32 is not evenly divisible by 7, the last
        // byte has some meaningless bits in them. .NET does not validate those bits, so
        // neither do we.

        const MORE: u8 = 0x80;

        let mut shift: u32 = 0;
        let mut n: u32 = 0;

        loop {
            let b = self.read_u8()?;
            n |= ((b & 0x7f) as u32) << shift;

            if (b & MORE) == 0 {
                break;
            }

            shift += 7;
            if shift >= 32 {
                return Err(Error::Invalid("7-bit encoded i32 is too long"));
            }
        }

        Ok(n as i32)
    }

    /// Reads a variable-length integer and returns the value in `i64`.
    pub fn read_7bit_encoded_i64(&mut self) -> Result<i64> {
        const MORE: u8 = 0x80;

        let mut shift: u32 = 0;
        let mut n: u64 = 0;

        loop {
            let b = self.read_u8()?;
            n |= ((b & 0x7f) as u64) << shift;

            if (b & MORE) == 0 {
                break;
            }

            shift += 7;
            if shift >= 64 {
                return Err(Error::Invalid("7-bit encoded i64 is too long"));
            }
        }

        Ok(n as i64)
    }

    /// Reads a 7-bit encoded length and checks that it is not negative.
    fn read_len(&mut self) -> Result<usize> {
        let len_i32 = self.read_7bit_encoded_i32()?;
        usize::try_from(len_i32).map_err(|_| Error::Invalid("negative length prefix"))
    }

    /// Reads a length-prefixed UTF-8 string as raw bytes.
    ///
    /// The caller must handle validating that the string is well-formed UTF-8, if necessary.
    pub fn read_utf8_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Reads a length-prefixed UTF-8 string and returns it as a `bstr::BString`.
    ///
    /// The encoded stream does not contain any information that distinguishes UTF-8 strings and
    /// UTF-16 strings, so applications will need to make sure that they call the correct
    /// `read_utf8_*` or `read_utf16_*` function.
    #[cfg(feature = "bstr")]
    pub fn read_utf8_bstring(&mut self) -> Result<bstr::BString> {
        Ok(bstr::BString::from(self.read_utf8_bytes()?))
    }

    /// Reads a length-prefixed UTF-8 string. This is the encoding .NET's
    /// `BinaryWriter.Write(string)` produces.
    ///
    /// Contents that are not well-formed UTF-8 are rejected with `Error::Invalid`.
    pub fn read_utf8_string(&mut self) -> Result<String> {
        let bytes = self.read_utf8_bytes()?;
        String::from_utf8(bytes).map_err(|_| Error::Invalid("string is not well-formed UTF-8"))
    }

    /// Reads a length-prefixed UTF-8 string, replacing ill-formed sequences with the Unicode
    /// replacement character.
    pub fn read_utf8_string_lossy(&mut self) -> Result<String> {
        let bytes = self.read_utf8_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads a length-prefixed UTF-16 string and returns its code units.
    ///
    /// The length prefix counts bytes, and must be a multiple of 2. If it is not, then this
    /// function consumes the string and returns `Err(Error::Invalid)`.
    pub fn read_utf16_units(&mut self) -> Result<Vec<u16>> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        let Ok(wchars) = <[U16<WireOrder>]>::ref_from_bytes(&bytes) else {
            return Err(Error::Invalid("UTF-16 byte length is odd"));
        };

        Ok(wchars.iter().map(|c| c.get()).collect())
    }

    /// Reads a length-prefixed UTF-16 string and returns it as `String`.
    ///
    /// The input string is required to be well-formed UTF-16; if it contains illegal UTF-16 code
    /// points or illegal surrogate sequences, then this function will return
    /// `Err(Error::Invalid)`.
    pub fn read_utf16_string(&mut self) -> Result<String> {
        let units = self.read_utf16_units()?;
        String::from_utf16(&units).map_err(|_| Error::Invalid("string is not well-formed UTF-16"))
    }

    /// Reads a length-prefixed UTF-16 string and returns it as `String`.
    ///
    /// If the input sequence contains illegal UTF-16 code points or illegal surrogate sequences,
    /// then this function will replace the illegal code units with the Unicode replacement
    /// character.
    pub fn read_utf16_string_lossy(&mut self) -> Result<String> {
        let units = self.read_utf16_units()?;
        Ok(String::from_utf16_lossy(&units))
    }
}
