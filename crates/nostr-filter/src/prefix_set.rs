//! Compacted byte-string sets with prefix matching
//!
//! A `PrefixSet` holds a sorted set of byte strings packed into one
//! contiguous buffer and answers "is any stored item a prefix of this
//! candidate" in O(log n) comparisons. Construction collapses duplicates and
//! redundant longer items so the retained set is an antichain: no item is a
//! prefix of another. The sorted items are also handed to the storage layer
//! as probe bounds for range iteration, so `at`/`len` order is a stable
//! contract.

use crate::error::{FilterError, Result};

/// Offsets into the packed buffer are stored as u16.
const MAX_BUF_LEN: usize = u16::MAX as usize;

/// Item sizes are stored as u8.
const MAX_ITEM_LEN: usize = u8::MAX as usize;

/// Slice descriptor into the shared buffer. The first byte is cached so most
/// binary-search comparisons resolve without touching the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Item {
    offset: u16,
    size: u8,
    first_byte: u8,
}

fn item_bytes<'a>(buf: &'a [u8], item: &Item) -> &'a [u8] {
    let start = usize::from(item.offset);
    &buf[start..start + usize::from(item.size)]
}

/// Sorted, prefix-free set of byte strings.
///
/// Immutable after construction; matching is pure and safe to run from any
/// number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSet {
    items: Vec<Item>,
    buf: Vec<u8>,
}

impl PrefixSet {
    /// Build a set from string items.
    ///
    /// Items are hex-decoded first when `hex_decode` is set; size bounds are
    /// checked post-decode. Sorting is by unsigned byte value. An item that
    /// starts with an already retained item is redundant under prefix
    /// matching and is dropped, which also collapses exact duplicates.
    pub fn new<I, S>(values: I, hex_decode: bool, min_size: usize, max_size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Empty items are never valid: they would prefix everything.
        let min_size = min_size.max(1);
        let max_size = max_size.min(MAX_ITEM_LEN);

        let mut decoded: Vec<Vec<u8>> = Vec::new();
        for value in values {
            let value = value.as_ref();
            let bytes = if hex_decode {
                hex::decode(value).map_err(|_| FilterError::InvalidHex(value.to_string()))?
            } else {
                value.as_bytes().to_vec()
            };

            if bytes.len() < min_size {
                return Err(FilterError::ItemTooSmall {
                    size: bytes.len(),
                    min: min_size,
                });
            }
            if bytes.len() > max_size {
                return Err(FilterError::ItemTooLarge {
                    size: bytes.len(),
                    max: max_size,
                });
            }

            decoded.push(bytes);
        }

        decoded.sort();

        let mut items: Vec<Item> = Vec::with_capacity(decoded.len());
        let mut buf: Vec<u8> = Vec::new();

        for bytes in &decoded {
            if let Some(last) = items.last()
                && bytes.starts_with(item_bytes(&buf, last))
            {
                continue;
            }

            let Ok(offset) = u16::try_from(buf.len()) else {
                return Err(FilterError::SetTooLarge { total: buf.len() });
            };

            items.push(Item {
                offset,
                size: bytes.len() as u8,
                first_byte: bytes[0],
            });
            buf.extend_from_slice(bytes);
        }

        if buf.len() > MAX_BUF_LEN {
            return Err(FilterError::SetTooLarge { total: buf.len() });
        }

        Ok(Self { items, buf })
    }

    /// Check whether any retained item is a prefix of `candidate`.
    pub fn matches(&self, candidate: &[u8]) -> Result<bool> {
        if candidate.is_empty() {
            return Err(FilterError::EmptyCandidate);
        }

        // Upper bound: index of the first retained item strictly greater
        // than the candidate.
        let first = self.items.partition_point(|item| {
            if item.first_byte != candidate[0] {
                item.first_byte < candidate[0]
            } else {
                item_bytes(&self.buf, item) <= candidate
            }
        });

        // The antichain invariant guarantees at most one retained item can
        // prefix the candidate, and it can only be the upper bound's
        // predecessor.
        if first == 0 {
            return Ok(false);
        }

        Ok(candidate.starts_with(item_bytes(&self.buf, &self.items[first - 1])))
    }

    /// The n-th retained item in sorted order.
    ///
    /// Panics when `n >= len()`: descriptor indices are a construction
    /// invariant, so going out of bounds is a programming error.
    pub fn at(&self, n: usize) -> &[u8] {
        item_bytes(&self.buf, &self.items[n])
    }

    /// Number of retained items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items were retained.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
