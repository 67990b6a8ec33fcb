//! Probe sequences over a control byte array.
//!
//! Probing is the process of walking candidate groups of control bytes until
//! the slot a lookup or insertion is after has been found. This module owns
//! the walk order ([`ProbeSeq`]) and the insertion-side scan
//! ([`find_first_non_full`]); the group scanning itself lives in the
//! width-specific [`Group`] implementations.

use crate::Group;
use crate::bitmask::BitMask;
use crate::ctrl::ctrl_bytes_len;
#[cfg(feature = "insert-entropy")]
use crate::ctrl::is_small;

/// State for one probe sequence over a table's control bytes.
///
/// The sequence is the triangular progression
///
/// ```text
/// offset(k) = (hash + W * (k * (k + 1)) / 2) mod (mask + 1)
/// ```
///
/// computed incrementally: each [`advance`](ProbeSeq::advance) lengthens the
/// stride by one group width and wraps at `mask + 1`. Because table sizes are
/// powers of two, the progression visits every group exactly once per cycle
/// (proof: <https://fgiesen.wordpress.com/2015/02/22/triangular-numbers-mod-2n/>),
/// and stepping by whole group widths keeps consecutive probe positions from
/// re-reading bytes a previous group already covered.
///
/// Wrapping at `mask + 1` matters for a second reason. The head of the
/// control byte array is mirrored past its logical end so a group read
/// starting near the end sees correct wraparound data, but those cloned bytes
/// have no slots of their own. Candidate positions are therefore always
/// reduced modulo `mask + 1` before they are used as slot indices.
#[derive(Clone, Debug)]
pub struct ProbeSeq {
    mask: usize,
    offset: usize,
    index: usize,
}

impl ProbeSeq {
    /// Creates a probe sequence starting at `hash & mask`.
    ///
    /// `mask` is the table's capacity and must be of the form `2^n - 1`; that
    /// is guaranteed by whoever sized the table and is not re-checked here. A
    /// mask of 0 degenerates to a single-slot table whose sequence stays at
    /// offset 0.
    #[inline(always)]
    pub fn new(hash: usize, mask: usize) -> Self {
        ProbeSeq {
            mask,
            offset: hash & mask,
            index: 0,
        }
    }

    /// The current group-aligned candidate position.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total slots stepped over so far; grows by [`Group::WIDTH`] per
    /// [`advance`](ProbeSeq::advance).
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The slot `i` positions ahead of the current offset, wrapped into
    /// `[0, mask]`. Pure query; does not advance the sequence.
    #[inline(always)]
    pub fn offset_at(&self, i: usize) -> usize {
        (self.offset + i) & self.mask
    }

    /// Moves to the next group in the progression.
    #[inline(always)]
    pub fn advance(&mut self) {
        self.index += Group::WIDTH;
        self.offset += self.index;
        self.offset &= self.mask;
    }
}

/// The result of a [`find_first_non_full`] scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FindResult {
    /// The chosen slot position, already wrapped into `[0, capacity]`.
    pub offset: usize,
    /// Slots examined before the winning group was reached: the sequence's
    /// final index, always a multiple of [`Group::WIDTH`]. Callers typically
    /// feed this into max-probe-length statistics.
    pub probe_length: usize,
}

/// Derives the starting probe position from a raw 64-bit hash.
///
/// The control array's base address is folded in so that distinct tables walk
/// distinct probe orders even when handed identical hashes. A table layer
/// applies this once per operation, before constructing a probe sequence;
/// everything downstream treats the result as opaque.
#[inline(always)]
pub fn h1(hash: u64, ctrl: &[u8]) -> usize {
    ((hash >> 7) as usize) ^ (ctrl.as_ptr() as usize >> 12)
}

/// The 7-bit fragment of `hash` that an occupied control byte stores.
#[inline(always)]
pub fn h2(hash: u64) -> u8 {
    (hash & 0x7F) as u8
}

/// Decides whether an insertion should land at the back of its group instead
/// of the front.
///
/// Deterministic given its inputs: the same hash probing the same control
/// array always answers the same way, so a failure found under
/// `insert-entropy` stays reproducible.
#[cfg(feature = "insert-entropy")]
#[inline(always)]
fn should_insert_backwards(hash: usize, ctrl: &[u8]) -> bool {
    (hash ^ (ctrl.as_ptr() as usize >> 12)) % 13 > 6
}

/// Picks the insertion candidate within a group's empty-or-deleted mask.
///
/// The production rule takes the lowest matching position, which keeps
/// insertions packed toward the front of a group. Under the `insert-entropy`
/// feature, large tables sometimes take the highest position instead. Small
/// tables never do: their cloned tail bytes can alias slots that are not
/// actually free, so a backward pick there is meaningless.
#[cfg_attr(not(feature = "insert-entropy"), allow(unused_variables))]
#[inline(always)]
fn select_insert_slot(mask: BitMask, hash: usize, ctrl: &[u8], capacity: usize) -> Option<usize> {
    #[cfg(feature = "insert-entropy")]
    if !is_small(capacity) && should_insert_backwards(hash, ctrl) {
        return mask.highest_set_bit();
    }
    mask.lowest_set_bit()
}

/// Probes `ctrl` with a sequence derived from `hash` and returns the first
/// empty or deleted slot in probe order, together with the number of slots
/// stepped over to reach its group.
///
/// `hash` is a probe-ready value: a table layer derives it from its raw
/// 64-bit hashes via [`h1`] once, up front. `ctrl` must be a complete control
/// byte array for `capacity` as laid out by
/// [`CtrlBytes`](crate::ctrl::CtrlBytes), so `capacity + 1` is a power of two
/// and `ctrl.len()` equals [`ctrl_bytes_len`]`(capacity)`.
///
/// The table must hold at least one reachable empty or deleted slot. Probing
/// a completely full table is a caller bug — the capacity policy failed to
/// keep headroom — and loops forever in release builds; debug builds trip an
/// assertion once the scan has covered the whole table. Empty and deleted
/// slots may coexist within one group and both are fair candidates, which is
/// what lets tombstones be reused.
///
/// # Examples
///
/// ```rust
/// use swiss_probe::CtrlBytes;
/// use swiss_probe::ctrl::DELETED;
/// use swiss_probe::find_first_non_full;
/// use swiss_probe::probe::h2;
///
/// let mut table = CtrlBytes::new(3);
/// table.set(0, h2(0xABCD));
/// table.set(1, h2(0xBEEF));
/// table.set(2, DELETED);
///
/// // Slots 0 and 1 are occupied and slot 2 is a tombstone: probing from
/// // hash 0 reuses the tombstone without leaving the first group.
/// let found = find_first_non_full(table.as_bytes(), 0, table.capacity());
/// assert_eq!(found.offset, 2);
/// assert_eq!(found.probe_length, 0);
/// ```
#[inline]
pub fn find_first_non_full(ctrl: &[u8], hash: usize, capacity: usize) -> FindResult {
    debug_assert_eq!(ctrl.len(), ctrl_bytes_len(capacity));

    let mut seq = ProbeSeq::new(hash, capacity);
    loop {
        // SAFETY: `seq.offset() <= capacity`, and the array carries
        // `Group::WIDTH - 1` mirrored bytes past index `capacity`, so a full
        // group is readable at every offset the sequence can produce.
        let group = unsafe { Group::load(ctrl.as_ptr().add(seq.offset())) };
        if let Some(bit) = select_insert_slot(group.match_empty_or_deleted(), hash, ctrl, capacity)
        {
            return FindResult {
                offset: seq.offset_at(bit),
                probe_length: seq.index(),
            };
        }
        seq.advance();
        debug_assert!(seq.index() <= capacity, "probing a table with no free slots");
    }
}
