use core::fmt;

/// An out-of-bounds query against a [`crate::PositionIndex`].
///
/// Only the strict (`try_*`) query variants produce this error; the default variants clamp to
/// the nearest valid element instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeError {
    /// An ordinal position at or past the number of items.
    Index { index: usize, len: usize },
    /// A distance at or past the total length of all items.
    Distance { distance: u64, total: u64 },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index { index, len } => {
                write!(f, "index {index} out of range for {len} items")
            }
            Self::Distance { distance, total } => {
                write!(f, "distance {distance} out of range for total length {total}")
            }
        }
    }
}

impl core::error::Error for RangeError {}
