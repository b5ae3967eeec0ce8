use vlist::{PositionIndex, Window};

/// A scroll anchor that preserves visual position across an order change.
///
/// It records where an item sat relative to the viewport so the scroll offset can be re-derived
/// once the item has moved inside the content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScrollAnchor<K> {
    pub key: K,
    pub index: usize,
    /// Item top minus scroll offset (negative when the item starts above the viewport).
    pub offset_in_viewport: i64,
}

/// Captures the first visible item accepted by `keep`, scanning from the pivot edge.
pub(crate) fn capture_anchor<K: Clone>(
    index: &PositionIndex<K>,
    window: Window,
    visible: Window,
    scroll_offset: u64,
    pivot_bottom: bool,
    keep: impl Fn(&K) -> bool,
) -> Option<ScrollAnchor<K>> {
    let base = index.offset_of(window.start);
    let pick = |at: usize| {
        let found = index.try_get_by_index(at).ok()?;
        keep(found.item).then(|| ScrollAnchor {
            key: found.item.clone(),
            index: at,
            offset_in_viewport: (found.outer_distance - base) as i64 - scroll_offset as i64,
        })
    };
    if pivot_bottom {
        (visible.start..visible.end).rev().find_map(pick)
    } else {
        (visible.start..visible.end).find_map(pick)
    }
}

/// The scroll offset that puts an anchored item, now at content offset `top`, back where it was.
pub(crate) fn anchored_offset<K>(anchor: &ScrollAnchor<K>, top: u64, max_offset: u64) -> u64 {
    (top as i64 - anchor.offset_in_viewport).clamp(0, max_offset as i64) as u64
}
