//! A weighted position index for variable-height virtualized lists.
//!
//! [`PositionIndex`] maps an ordered sequence of `(item, length)` pairs to index-based and
//! cumulative-distance-based lookups in logarithmic time. It is the bookkeeping core of the
//! `vlist-window` controller, which keeps a bounded window of a long list attached to a render
//! surface:
//! - "which item sits at pixel offset `d`?" → [`PositionIndex::get_by_distance`]
//! - "how far from the top does item `i` start?" → [`PositionIndex::get_by_index`]
//! - lengths are patched in with [`PositionIndex::update_length`] once items are measured
//!
//! The crate is UI-agnostic and `no_std` compatible (with `alloc`).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod index;
mod types;

#[cfg(test)]
mod tests;

pub use error::RangeError;
pub use index::{Iter, PositionIndex};
pub use types::{Direction, Located, Rect, Window};
