/// Where an element is attached.
///
/// `parent` is a group wrapper (or `None` for the list container itself). `before` is a sibling
/// inside that parent; `None` appends at the end.
#[derive(Debug)]
pub struct Placement<'a, E> {
    pub parent: Option<&'a E>,
    pub before: Option<&'a E>,
}

impl<E> Clone for Placement<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Placement<'_, E> {}

/// How a translate offset is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Instant,
    Animated { duration_ms: u64 },
}

/// The render surface a [`crate::WindowController`] drives.
///
/// Implemented by the host: a DOM container, a retained-mode widget tree, or a recording double
/// in tests. The surface only ever contains the current window; its scroll offset is measured
/// from the top of the first attached element.
pub trait Surface<E> {
    fn attach(&mut self, element: &E, placement: Placement<'_, E>);

    fn detach(&mut self, element: &E);

    /// Size of an attached element along the list axis, after layout.
    fn measure(&mut self, element: &E) -> u32;

    /// Applies a visual offset (transform) along the list axis without affecting layout.
    fn translate(&mut self, element: &E, offset: i64, transition: Transition);

    fn highlight(&mut self, element: &E, on: bool) {
        let _ = (element, on);
    }

    /// The scroll offset as the surface actually applied it.
    fn scroll_offset(&self) -> u64;

    fn set_scroll_offset(&mut self, offset: u64);
}
