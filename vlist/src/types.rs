/// Travel direction along the list axis.
///
/// `Forward` points towards the end of the sequence (downwards in a vertical list).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// `1` for `Forward`, `-1` for `Backward`.
    pub fn sign(self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Viewport geometry.
///
/// `main` is the list axis (height for vertical lists), `cross` the other axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub main: u32,
    pub cross: u32,
}

impl Rect {
    pub fn new(main: u32, cross: u32) -> Self {
        Self { main, cross }
    }
}

/// A contiguous, half-open range of sequence positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub start: usize,
    pub end: usize, // exclusive
}

impl Window {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Moves both bounds by `delta` positions.
    pub fn shift(self, delta: usize) -> Self {
        Self {
            start: self.start.saturating_add(delta),
            end: self.end.saturating_add(delta),
        }
    }
}

/// The result of a [`crate::PositionIndex`] lookup.
#[derive(Debug, PartialEq, Eq)]
pub struct Located<'a, T> {
    pub item: &'a T,
    pub length: u32,
    pub index: usize,
    /// Sum of the lengths of all items strictly before `index`.
    pub outer_distance: u64,
    /// Offset of the queried distance inside the item (always 0 for index lookups).
    pub inner_distance: u64,
}

impl<T> Located<'_, T> {
    pub fn end(&self) -> u64 {
        self.outer_distance.saturating_add(self.length as u64)
    }
}

impl<T> Clone for Located<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Located<'_, T> {}
