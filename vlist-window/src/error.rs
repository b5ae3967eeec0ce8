use core::fmt;

use vlist::RangeError;

/// Errors raised by [`crate::WindowController`].
///
/// None of these are transient: they signal a misconfigured controller or a renderer that
/// breaks its contract, and are propagated to the caller as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The options carry no renderer.
    MissingRenderer,
    /// The options carry no item sequence.
    MissingItems,
    /// An element inside the active window measured 0 along the list axis.
    ZeroHeight { index: usize },
    /// A position index query went out of range.
    Range(RangeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRenderer => f.write_str("controller options are missing a renderer"),
            Self::MissingItems => f.write_str("controller options are missing an item sequence"),
            Self::ZeroHeight { index } => {
                write!(f, "element at index {index} measured zero height inside the window")
            }
            Self::Range(err) => write!(f, "position index: {err}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Range(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RangeError> for Error {
    fn from(err: RangeError) -> Self {
        Self::Range(err)
    }
}
