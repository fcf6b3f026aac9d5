//! Count-prefixed collections of keyed pairs and homogeneous values.
//!
//! # Wire format
//!
//! ```text
//! [marker: i64]     optional, always VALIDITY_MARKER
//! [count: i32]      number of entries, never negative
//! count × entry     each entry is (key, value) for dictionaries, or one value for sequences
//! ```
//!
//! Keys and values are encoded with their `BinaryCodec` implementation, back to back with no
//! padding. Nothing in the stream records the key or value types.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::{Read, Write};

use log::{debug, trace, warn};

use crate::reader::MAX_PREALLOC;
use crate::{BinaryCodec, BinaryReader, BinaryWriter, Error, Result};

/// Marker that may precede a collection, used to detect a misaligned or corrupted stream.
pub const VALIDITY_MARKER: i64 = 0x0212_DF45_5DFA_BE3C;

/// A mutable map that collection reads insert into.
pub trait DictSink<K, V> {
    /// Inserts the pair if `key` is absent. Returns `false`, leaving the map unchanged, if
    /// `key` is already present.
    fn insert_new(&mut self, key: K, value: V) -> bool;

    /// Called once with the entry count before any insertions.
    fn reserve_hint(&mut self, _additional: usize) {}
}

impl<K: Eq + Hash, V, S: BuildHasher> DictSink<K, V> for HashMap<K, V, S> {
    fn insert_new(&mut self, key: K, value: V) -> bool {
        match self.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(value);
                true
            }
        }
    }

    fn reserve_hint(&mut self, additional: usize) {
        self.reserve(additional.min(MAX_PREALLOC));
    }
}

impl<K: Ord, V> DictSink<K, V> for BTreeMap<K, V> {
    fn insert_new(&mut self, key: K, value: V) -> bool {
        match self.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(value);
                true
            }
        }
    }
}

/// How a dictionary read ended, when it did not fail.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DictOutcome {
    /// Every entry in the stream was read.
    Complete {
        /// Pairs added to the map.
        inserted: usize,
        /// Pairs dropped because their key was already present. Always 0 for strict reads.
        skipped: usize,
    },

    /// A validity check was requested and the marker did not match. Only the 8 marker bytes
    /// were consumed and the map was not touched.
    MarkerMismatch {
        /// The value found where the marker was expected.
        found: i64,
    },
}

impl DictOutcome {
    /// Returns `true` if the marker check failed.
    pub fn is_marker_mismatch(&self) -> bool {
        matches!(self, Self::MarkerMismatch { .. })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Duplicates {
    Reject,
    Skip,
}

impl<R: Read> BinaryReader<R> {
    /// Reads the optional marker and the entry count. Returns `Ok(Err(found))` if the marker
    /// did not match.
    fn read_collection_header(
        &mut self,
        validity_check: bool,
    ) -> Result<core::result::Result<usize, i64>> {
        if validity_check {
            let found = self.read_i64()?;
            if found != VALIDITY_MARKER {
                warn!(
                    "collection validity marker mismatch: expected {VALIDITY_MARKER:#018x}, found {found:#018x}; skipping collection"
                );
                return Ok(Err(found));
            }
        }

        let count = self.read_i32()?;
        let Ok(count) = usize::try_from(count) else {
            return Err(Error::Invalid("negative collection count"));
        };
        debug!("reading collection of {count} entries");
        Ok(Ok(count))
    }

    fn read_dict_impl<K, V, M>(
        &mut self,
        out: &mut M,
        validity_check: bool,
        duplicates: Duplicates,
    ) -> Result<DictOutcome>
    where
        K: BinaryCodec,
        V: BinaryCodec,
        M: DictSink<K, V> + ?Sized,
    {
        let count = match self.read_collection_header(validity_check)? {
            Ok(count) => count,
            Err(found) => return Ok(DictOutcome::MarkerMismatch { found }),
        };

        out.reserve_hint(count);

        let mut inserted = 0;
        let mut skipped = 0;
        for index in 0..count {
            let key = K::decode(self)?;
            let value = V::decode(self)?;
            if out.insert_new(key, value) {
                inserted += 1;
            } else {
                match duplicates {
                    Duplicates::Reject => {
                        trace!("duplicate key at entry {index} of {count}; aborting");
                        return Err(Error::DuplicateKey { index });
                    }
                    Duplicates::Skip => {
                        debug!("skipping duplicate key at entry {index} of {count}");
                        skipped += 1;
                    }
                }
            }
        }

        Ok(DictOutcome::Complete { inserted, skipped })
    }

    /// Reads a dictionary into `out`, failing on a repeated key.
    ///
    /// If `validity_check` is set, the collection must be preceded by [`VALIDITY_MARKER`]. A
    /// wrong marker is not an error: nothing further is read, `out` is left untouched, and the
    /// result is [`DictOutcome::MarkerMismatch`].
    ///
    /// A key that is already in `out`, whether from this stream or from before the call, fails
    /// with `Error::DuplicateKey`. Pairs read before it stay inserted.
    pub fn read_dict<K, V, M>(&mut self, out: &mut M, validity_check: bool) -> Result<DictOutcome>
    where
        K: BinaryCodec,
        V: BinaryCodec,
        M: DictSink<K, V> + ?Sized,
    {
        self.read_dict_impl(out, validity_check, Duplicates::Reject)
    }

    /// Reads a dictionary into `out`, keeping the first value for a repeated key.
    ///
    /// Identical to [`read_dict`](Self::read_dict), except that a pair whose key is already in
    /// `out` is dropped and reading continues.
    pub fn read_dict_try_add<K, V, M>(
        &mut self,
        out: &mut M,
        validity_check: bool,
    ) -> Result<DictOutcome>
    where
        K: BinaryCodec,
        V: BinaryCodec,
        M: DictSink<K, V> + ?Sized,
    {
        self.read_dict_impl(out, validity_check, Duplicates::Skip)
    }

    /// Reads a count-prefixed sequence of values.
    ///
    /// Returns `Ok(None)` if `validity_check` is set and the marker did not match.
    pub fn read_seq<T: BinaryCodec>(&mut self, validity_check: bool) -> Result<Option<Vec<T>>> {
        let count = match self.read_collection_header(validity_check)? {
            Ok(count) => count,
            Err(_) => return Ok(None),
        };

        let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(Some(items))
    }
}

impl<W: Write> BinaryWriter<W> {
    fn write_collection_header(&mut self, len: usize, validity_marker: bool) -> Result<()> {
        let count = i32::try_from(len)
            .map_err(|_| Error::CannotEncode("collection has more than i32::MAX entries"))?;
        if validity_marker {
            self.write_i64(VALIDITY_MARKER)?;
        }
        self.write_i32(count)
    }

    /// Writes a dictionary in the layout `read_dict` expects.
    ///
    /// `entries` can be any exact-size iterator over key/value references, such as
    /// `&HashMap<K, V>` or `&BTreeMap<K, V>`.
    pub fn write_dict<'a, K, V, I>(&mut self, entries: I, validity_marker: bool) -> Result<()>
    where
        K: BinaryCodec + 'a,
        V: BinaryCodec + 'a,
        I: IntoIterator<Item = (&'a K, &'a V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        self.write_collection_header(entries.len(), validity_marker)?;
        for (key, value) in entries {
            key.encode(self)?;
            value.encode(self)?;
        }
        Ok(())
    }

    /// Writes a count-prefixed sequence of values in the layout `read_seq` expects.
    pub fn write_seq<T: BinaryCodec>(&mut self, items: &[T], validity_marker: bool) -> Result<()> {
        self.write_collection_header(items.len(), validity_marker)?;
        for item in items {
            item.encode(self)?;
        }
        Ok(())
    }
}
