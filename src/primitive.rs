//! Per-type wire rules for fixed-width primitives.
//!
//! Every encoding here is little-endian, independent of the host byte order.

use crate::{DateTime, Error, Result};

/// A value with a fixed-size wire representation.
///
/// The reader and writer are generic over this trait, so `read::<T>()` and `write::<T>()`
/// cover every primitive type with one code path.
pub trait FixedWidth: Sized + Copy {
    /// Number of bytes in the encoded form.
    const WIDTH: usize;

    /// Byte array holding exactly `WIDTH` bytes.
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// Encodes `self` into its wire bytes.
    fn to_wire(self) -> Result<Self::Bytes>;

    /// Decodes a value from its wire bytes.
    fn from_wire(bytes: Self::Bytes) -> Result<Self>;
}

/// An integer that may be written with fewer bytes than its native width.
///
/// Decoding a truncated value zero-fills the missing high bytes of unsigned types and
/// sign-extends signed types from bit 7 of the highest byte that was read.
pub trait SizedInt: FixedWidth {
    /// Whether the missing high bytes are reconstructed by sign extension.
    const SIGNED: bool;

    /// Returns the two's complement bit pattern, sign-extended to 64 bits for signed types.
    fn to_bits(self) -> u64;

    /// Takes the low bits of `bits` as a value of this type.
    fn from_bits(bits: u64) -> Self;
}

/// A type whose minimum value doubles as the wire encoding of "no value".
///
/// Because the sentinel means `None`, `Some(NULL)` cannot be written.
pub trait Nullable: FixedWidth + PartialEq {
    /// The sentinel written for `None`.
    const NULL: Self;
}

macro_rules! impl_int {
    ($($ty:ty => $width:literal, $signed:literal, $wide:ty;)*) => {
        $(
            impl FixedWidth for $ty {
                const WIDTH: usize = $width;
                type Bytes = [u8; $width];

                #[inline(always)]
                fn to_wire(self) -> Result<[u8; $width]> {
                    Ok(self.to_le_bytes())
                }

                #[inline(always)]
                fn from_wire(bytes: [u8; $width]) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(bytes))
                }
            }

            impl SizedInt for $ty {
                const SIGNED: bool = $signed;

                #[inline(always)]
                fn to_bits(self) -> u64 {
                    self as $wide as u64
                }

                #[inline(always)]
                fn from_bits(bits: u64) -> Self {
                    bits as $ty
                }
            }

            impl Nullable for $ty {
                const NULL: Self = <$ty>::MIN;
            }
        )*
    };
}

impl_int! {
    u8 => 1, false, u64;
    i8 => 1, true, i64;
    u16 => 2, false, u64;
    i16 => 2, true, i64;
    u32 => 4, false, u64;
    i32 => 4, true, i64;
    u64 => 8, false, u64;
    i64 => 8, true, i64;
}

impl FixedWidth for f32 {
    const WIDTH: usize = 4;
    type Bytes = [u8; 4];

    fn to_wire(self) -> Result<[u8; 4]> {
        Ok(self.to_bits().to_le_bytes())
    }

    fn from_wire(bytes: [u8; 4]) -> Result<Self> {
        Ok(f32::from_bits(u32::from_le_bytes(bytes)))
    }
}

impl FixedWidth for f64 {
    const WIDTH: usize = 8;
    type Bytes = [u8; 8];

    fn to_wire(self) -> Result<[u8; 8]> {
        Ok(self.to_bits().to_le_bytes())
    }

    fn from_wire(bytes: [u8; 8]) -> Result<Self> {
        Ok(f64::from_bits(u64::from_le_bytes(bytes)))
    }
}

/// True is encoded as 1, false as 0. Any nonzero byte decodes as true.
impl FixedWidth for bool {
    const WIDTH: usize = 1;
    type Bytes = [u8; 1];

    fn to_wire(self) -> Result<[u8; 1]> {
        Ok([self as u8])
    }

    fn from_wire(bytes: [u8; 1]) -> Result<Self> {
        Ok(bytes[0] != 0)
    }
}

/// A `char` is stored as a single UTF-16 code unit, using the `i16` encoding.
impl FixedWidth for char {
    const WIDTH: usize = 2;
    type Bytes = [u8; 2];

    fn to_wire(self) -> Result<[u8; 2]> {
        let Ok(unit) = u16::try_from(u32::from(self)) else {
            return Err(Error::CharOutOfRange(self.into()));
        };
        (unit as i16).to_wire()
    }

    fn from_wire(bytes: [u8; 2]) -> Result<Self> {
        let unit = i16::from_wire(bytes)? as u16;
        char::from_u32(u32::from(unit)).ok_or(Error::Invalid("unpaired UTF-16 surrogate"))
    }
}

impl FixedWidth for DateTime {
    const WIDTH: usize = 8;
    type Bytes = [u8; 8];

    fn to_wire(self) -> Result<[u8; 8]> {
        self.ticks().to_wire()
    }

    fn from_wire(bytes: [u8; 8]) -> Result<Self> {
        DateTime::from_ticks(i64::from_wire(bytes)?)
            .ok_or(Error::Invalid("DateTime ticks out of range"))
    }
}

impl Nullable for DateTime {
    const NULL: Self = DateTime::MIN;
}

/// Checks that `size` is a usable byte count for `T`.
pub(crate) fn check_size<T: SizedInt>(size: usize) -> Result<()> {
    if size == 0 || size > T::WIDTH {
        Err(Error::SizeOutOfRange {
            size,
            width: T::WIDTH,
        })
    } else {
        Ok(())
    }
}

/// Rebuilds a value from its low `size` bytes, stored at the front of `buf`.
pub(crate) fn widen<T: SizedInt>(mut buf: [u8; 8], size: usize) -> T {
    if T::SIGNED && buf[size - 1] & 0x80 != 0 {
        buf[size..].fill(0xff);
    }
    T::from_bits(u64::from_le_bytes(buf))
}
