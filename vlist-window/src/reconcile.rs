use alloc::vec;
use alloc::vec::Vec;

use vlist::Window;

/// Marks the elements that can stay where they are during a reorder.
///
/// `ranks[i]` is the previous relative position of the element now at slot `i` (`None` for new
/// elements). The result marks a longest strictly increasing run of ranks: those elements keep
/// their relative order, every other survivor has to move.
pub(crate) fn stable_mask(ranks: &[Option<usize>]) -> Vec<bool> {
    // tails[k]: slot of the smallest rank ending an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; ranks.len()];

    for (slot, rank) in ranks.iter().enumerate() {
        let Some(rank) = *rank else {
            continue;
        };
        let at = tails.partition_point(|&t| ranks[t].is_some_and(|r| r < rank));
        if at > 0 {
            prev[slot] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(slot);
        } else {
            tails[at] = slot;
        }
    }

    let mut mask = vec![false; ranks.len()];
    let mut cursor = tails.last().copied();
    while let Some(slot) = cursor {
        mask[slot] = true;
        cursor = prev[slot];
    }
    mask
}

/// Where the previous window sat relative to the content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The viewport touched the pivot edge of the whole sequence.
    AtPivotEdge,
    /// An item that survives the update: its previous and next positions.
    Anchored { before: usize, after: usize },
    /// Nothing visible survives.
    Detached,
}

/// Computes the window for a new order of `len` items.
///
/// The window keeps its size (at least one batch). Anchored windows keep the anchor at the same
/// rank inside the window; otherwise the window keeps its distance from the pivot edge.
pub(crate) fn next_window(
    previous: Window,
    previous_len: usize,
    len: usize,
    batch: usize,
    pivot_bottom: bool,
    placement: Placement,
) -> Window {
    if len == 0 {
        return Window::default();
    }
    let size = previous.len().max(batch.max(1)).min(len);

    let start = match placement {
        Placement::Anchored { before, after } if !pivot_bottom => {
            after.saturating_sub(before.saturating_sub(previous.start))
        }
        Placement::Anchored { before, after } => {
            let tail = previous.end.saturating_sub(before);
            (after + tail).min(len).max(size) - size
        }
        Placement::AtPivotEdge if pivot_bottom => len - size,
        Placement::AtPivotEdge => 0,
        Placement::Detached if pivot_bottom => {
            let tail = previous_len.saturating_sub(previous.end);
            len.saturating_sub(tail).max(size) - size
        }
        Placement::Detached => previous.start,
    };
    let start = start.min(len - size);
    Window::new(start, start + size)
}
