use vlist::{Rect, Window};

/// A lightweight snapshot of a controller's windowing state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowState {
    /// Attached range of the current order.
    pub window: Window,
    /// Scroll offset, measured from the top of the first attached element.
    pub scroll_offset: u64,
    /// Total height of the attached elements.
    pub scroll_height: u64,
    pub viewport: Rect,
    pub len: usize,
    pub locked: bool,
    pub has_pending_update: bool,
    pub is_animating: bool,
}
