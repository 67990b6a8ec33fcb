#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

cfg_if::cfg_if! {
    // Scan 16 control bytes per probe step where SSE2 is available. The
    // portable fallback works a 64-bit word at a time; it halves the group
    // width but keeps identical matching semantics, so everything above the
    // group boundary is width-agnostic. Miri gets the portable version since
    // it cannot execute vendor intrinsics.
    if #[cfg(all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
        not(miri)
    ))] {
        mod sse2;
        use sse2 as imp;
    } else {
        mod generic;
        use generic as imp;
    }
}

mod bitmask;

pub mod ctrl;
pub mod probe;

pub use bitmask::BitMask;
pub use ctrl::CtrlBytes;
pub use imp::Group;
pub use probe::FindResult;
pub use probe::ProbeSeq;
pub use probe::find_first_non_full;
