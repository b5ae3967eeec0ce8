use alloc::vec::Vec;
use core::fmt;

use vlist::{Direction, PositionIndex, Rect, Window};

use crate::anchor::{anchored_offset, capture_anchor};
use crate::frame::{FrameQueue, FrameTask};
use crate::key::{KeyMap, ListKey};
use crate::reconcile::{self, next_window, stable_mask};
use crate::{
    ControllerOptions, Easing, Error, Placement, Renderer, Subscription, Surface, Transition,
    Tween, WindowState,
};

/// Scroll offsets within this many pixels of the expected value are not re-snapped.
pub const SCROLL_TOLERANCE: u64 = 2;

/// Largest difference between a written offset and the surface's report of it that is still
/// treated as rounding (and re-snapped) rather than as a user scroll.
pub const MAX_SCROLL_DRIFT: u64 = 8;

/// Edge callbacks fire once the window is this many batches away from a sequence edge.
const REACH_BATCHES: usize = 2;

#[derive(Clone, Debug)]
struct GroupSlot<E> {
    wrapper: E,
    members: usize,
}

/// Keeps a bounded, contiguous slice of a long item sequence attached to a render surface.
///
/// The controller owns the windowing state and drives a host-provided [`Surface`]:
/// - `on_scroll` / `on_resize` when the UI reports scroll or viewport changes
/// - `update` (or `pump`, for the subscribed [`crate::Sequence`]) when the item order changes
/// - `focus` to bring an item into view, smoothly or through a virtualized jump
/// - `tick(now_ms)` once per animation frame: deferred layout reads, FLIP/jump animations,
///   focus tweens and lock release all happen there
///
/// Item lengths live in a [`PositionIndex`] covering the whole order; items that were never
/// attached have length 0. The surface only contains the window, so scroll offsets are measured
/// from the top of the first attached element.
///
/// While a structural update is in flight the controller is *locked*: further order updates
/// are parked in a single pending slot (the latest wins) and applied when the lock is released.
pub struct WindowController<K, E, S, G = ()> {
    options: ControllerOptions<K, E, G>,
    items: Subscription<K>,
    renderer: Renderer<K, E>,
    surface: S,

    order: Vec<K>,
    positions: KeyMap<K, usize>,
    index: PositionIndex<K>,
    lengths: KeyMap<K, u32>,
    elements: KeyMap<K, E>,
    groups: KeyMap<G, GroupSlot<E>>,

    window: Window,
    scroll_offset: u64,
    scroll_generation: u64,
    /// Last written offset whose re-snap has not run yet.
    unsnapped: Option<u64>,
    viewport: Rect,

    locked: bool,
    pending: Option<Vec<K>>,
    pending_focus: Option<(K, Option<Direction>)>,

    frames: FrameQueue<K>,
    tween: Option<Tween>,
    highlight: Option<(K, u64)>,
    now_ms: u64,
}

impl<K: ListKey, E: Clone, S: Surface<E>, G: ListKey> WindowController<K, E, S, G> {
    /// Creates a controller and applies the sequence's current order, if any.
    ///
    /// Fails with [`Error::MissingRenderer`] / [`Error::MissingItems`] when a required option is
    /// absent.
    pub fn new(mut options: ControllerOptions<K, E, G>, surface: S) -> Result<Self, Error> {
        let renderer = options.renderer.take().ok_or(Error::MissingRenderer)?;
        let items = options.items.take().ok_or(Error::MissingItems)?;
        vdebug!(
            batch = options.batch,
            threshold = options.threshold,
            pivot_bottom = options.pivot_bottom,
            "WindowController::new"
        );
        let mut controller = Self {
            viewport: options.initial_rect.unwrap_or_default(),
            options,
            items,
            renderer,
            surface,
            order: Vec::new(),
            positions: KeyMap::new(),
            index: PositionIndex::new(),
            lengths: KeyMap::new(),
            elements: KeyMap::new(),
            groups: KeyMap::new(),
            window: Window::default(),
            scroll_offset: 0,
            scroll_generation: 0,
            unsnapped: None,
            locked: false,
            pending: None,
            pending_focus: None,
            frames: FrameQueue::new(),
            tween: None,
            highlight: None,
            now_ms: 0,
        };
        controller.pump()?;
        Ok(controller)
    }

    pub fn options(&self) -> &ControllerOptions<K, E, G> {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn index(&self) -> &PositionIndex<K> {
        &self.index
    }

    /// The current item order.
    pub fn order(&self) -> &[K] {
        &self.order
    }

    /// Attached range of the current order.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Attached items, top to bottom.
    pub fn attached(&self) -> &[K] {
        &self.order[self.window.start..self.window.end]
    }

    pub fn is_attached(&self, item: &K) -> bool {
        self.positions
            .get(item)
            .is_some_and(|&at| self.window.contains(at))
    }

    /// The cached element for `item`, attached or not.
    pub fn element(&self, item: &K) -> Option<&E> {
        self.elements.get(item)
    }

    pub fn cached_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    /// Total height of the attached elements.
    pub fn scroll_height(&self) -> u64 {
        self.index.span(self.window.start, self.window.end)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.scroll_height()
            .saturating_sub(self.viewport.main as u64)
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_focus(&self) -> Option<&K> {
        self.pending_focus.as_ref().map(|(item, _)| item)
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some() || self.frames.has_animation()
    }

    /// The attached range that intersects the viewport.
    pub fn visible(&self) -> Window {
        if self.window.is_empty() {
            return Window::default();
        }
        let base = self.index.offset_of(self.window.start);
        let top = base + self.scroll_offset;
        let bottom = top + (self.viewport.main as u64).max(1) - 1;
        let last = self.window.end - 1;

        let first = self
            .index
            .get_by_distance(top)
            .map_or(self.window.start, |found| found.index)
            .clamp(self.window.start, last);
        let end = self
            .index
            .get_by_distance(bottom)
            .map_or(last, |found| found.index)
            .clamp(first, last);
        Window::new(first, end + 1)
    }

    pub fn state(&self) -> WindowState {
        WindowState {
            window: self.window,
            scroll_offset: self.scroll_offset,
            scroll_height: self.scroll_height(),
            viewport: self.viewport,
            len: self.order.len(),
            locked: self.locked,
            has_pending_update: self.pending.is_some(),
            is_animating: self.is_animating(),
        }
    }

    /// Applies the latest order delivered to the item subscription, if any.
    pub fn pump(&mut self) -> Result<(), Error> {
        match self.items.take() {
            Some(next) => self.update(next),
            None => Ok(()),
        }
    }

    /// Reconciles the window against a new item order.
    ///
    /// - identical order: no-op
    /// - items appended at the pivot edge (suffix for top-pivoted lists, prefix for
    ///   bottom-pivoted ones): indices are shifted in place and the window grows only if the
    ///   viewport needs it, without reflow animation
    /// - anything else: full reconciliation with minimal attach/detach/move churn, scroll
    ///   re-anchoring and a FLIP animation on the next frame
    ///
    /// While locked, `next` replaces any earlier pending update.
    pub fn update(&mut self, next: Vec<K>) -> Result<(), Error> {
        if self.locked {
            vtrace!(len = next.len(), "update parked while locked");
            self.pending = Some(next);
            return Ok(());
        }
        if next == self.order {
            return Ok(());
        }
        debug_assert!(
            next.len() <= 1 || {
                let unique: KeyMap<&K, ()> = next.iter().map(|k| (k, ())).collect();
                unique.len() == next.len()
            },
            "item keys must be unique"
        );

        if next.is_empty() {
            self.empty_out();
        } else if self.window.is_empty() {
            self.populate(next)?;
        } else if let Some(added) = self.grown_at_pivot(&next) {
            self.extend(next, added)?;
        } else {
            self.reconcile(next)?;
        }
        self.resolve_pending_focus()
    }

    /// Handles a scroll offset reported by the surface.
    ///
    /// A user scroll supersedes any in-flight focus tween, FLIP or jump animation. Echoes of
    /// offsets the controller wrote itself are ignored, including rounded ones reported before
    /// the next frame re-snaps them.
    pub fn on_scroll(&mut self, offset: u64) -> Result<(), Error> {
        self.pump()?;
        let drifted = self
            .unsnapped
            .is_some_and(|written| offset.abs_diff(written) <= MAX_SCROLL_DRIFT);
        let echo = offset == self.scroll_offset
            || drifted
            || (self.is_animating() && offset.abs_diff(self.scroll_offset) <= SCROLL_TOLERANCE);
        if echo {
            return Ok(());
        }
        vtrace!(offset, "on_scroll");
        self.unsnapped = None;
        self.tween = None;
        self.frames.cancel_tween();
        self.scroll_generation += 1;
        self.scroll_offset = offset;
        if self.locked {
            self.settle()?;
        }
        self.virtualize()
    }

    pub fn on_resize(&mut self, rect: Rect) -> Result<(), Error> {
        self.pump()?;
        if self.viewport == rect {
            return Ok(());
        }
        vtrace!(main = rect.main, cross = rect.cross, "on_resize");
        self.viewport = rect;
        self.virtualize()
    }

    /// Brings `item` into view.
    ///
    /// Attached items are scrolled to with an eased animation. Items outside the window trigger
    /// a virtualized jump: the window is replaced by one centered on the target and the new
    /// elements slide in from `direction` (inferred from the target position when `None`).
    /// Unknown items are remembered and focused once an update introduces them.
    pub fn focus(&mut self, item: &K, direction: Option<Direction>) -> Result<(), Error> {
        self.pump()?;
        if self.locked {
            self.settle()?;
        }
        if !self.positions.contains_key(item) {
            vtrace!("focus parked until the item arrives");
            self.pending_focus = Some((item.clone(), direction));
            return Ok(());
        }
        self.pending_focus = None;
        self.focus_present(item, direction)
    }

    /// Detaches every element and drops all cached state.
    ///
    /// The next non-empty update starts over with an initial population.
    pub fn clear(&mut self) {
        vdebug!(
            attached = self.window.len(),
            cached = self.elements.len(),
            "clear"
        );
        self.clear_highlight();
        self.detach_window();
        for slot in core::mem::take(&mut self.groups).into_values() {
            self.surface.detach(&slot.wrapper);
        }
        self.elements.clear();
        self.lengths.clear();
        self.index.clear();
        self.order.clear();
        self.positions.clear();
        self.window = Window::default();
        self.pending = None;
        self.pending_focus = None;
        self.tween = None;
        self.frames.clear();
        self.locked = false;
        self.scroll_generation += 1;
        self.unsnapped = None;
        self.scroll_offset = 0;
        self.surface.set_scroll_offset(0);
    }

    /// Re-measures an attached item whose content changed size.
    ///
    /// When the item starts above the viewport, the scroll offset follows the size change so
    /// visible content does not move. Returns the length delta.
    pub fn resize_item(&mut self, item: &K) -> Result<i64, Error> {
        self.pump()?;
        let Some(&at) = self.positions.get(item) else {
            return Ok(0);
        };
        if !self.window.contains(at) {
            return Ok(0);
        }
        let Some(element) = self.elements.get(item) else {
            return Ok(0);
        };
        let length = self.surface.measure(element);
        if length == 0 {
            vwarn!(index = at, "attached element measured zero height");
            return Err(Error::ZeroHeight { index: at });
        }
        let top = self.content_top(at);
        self.lengths.insert(item.clone(), length);
        let delta = self.index.try_update_length(at, length)?;
        if delta != 0 && top < self.scroll_offset {
            let offset = (self.scroll_offset as i64 + delta).max(0) as u64;
            self.write_scroll(offset);
        }
        self.virtualize()?;
        Ok(delta)
    }

    /// Runs one animation frame.
    ///
    /// Executes the work queued since the previous frame, expires highlights and advances the
    /// focus tween. While a tween runs, returns the scroll offset as of the end of the frame
    /// (after any refill the finished tween triggered).
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<u64>, Error> {
        self.now_ms = now_ms;
        self.pump()?;
        if self
            .highlight
            .as_ref()
            .is_some_and(|(_, until)| now_ms >= *until)
        {
            self.clear_highlight();
        }
        for task in self.frames.take() {
            self.run(task)?;
        }

        let Some(tween) = self.tween else {
            return Ok(None);
        };
        let offset = tween.sample(now_ms).min(self.max_scroll_offset());
        self.write_scroll(offset);
        if tween.is_done(now_ms) {
            self.tween = None;
            self.virtualize()?;
        }
        Ok(Some(self.scroll_offset))
    }

    fn run(&mut self, task: FrameTask<K>) -> Result<(), Error> {
        match task {
            FrameTask::Play { items, duration_ms } => {
                self.play(&items, Transition::Animated { duration_ms });
                Ok(())
            }
            FrameTask::Commit => self.unlock(),
            FrameTask::Resnap { offset, generation } => {
                self.resnap(offset, generation);
                Ok(())
            }
            FrameTask::Tween { to } => {
                self.tween = Some(Tween::new(
                    self.scroll_offset,
                    to,
                    self.now_ms,
                    self.options.focus_duration_ms,
                    Easing::EaseInOutCubic,
                ));
                Ok(())
            }
        }
    }

    /// Finishes queued animations immediately and releases the lock.
    fn settle(&mut self) -> Result<(), Error> {
        vtrace!("settle");
        for task in self.frames.take() {
            match task {
                FrameTask::Play { items, .. } => self.play(&items, Transition::Instant),
                FrameTask::Commit => self.unlock()?,
                FrameTask::Resnap { .. } | FrameTask::Tween { .. } => {}
            }
        }
        Ok(())
    }

    fn lock(&mut self) {
        vtrace!("lock");
        self.locked = true;
    }

    fn unlock(&mut self) -> Result<(), Error> {
        vtrace!(pending = self.pending.is_some(), "unlock");
        self.locked = false;
        if let Some(next) = self.pending.take() {
            self.update(next)?;
        }
        if self.locked {
            return Ok(());
        }
        self.resolve_pending_focus()?;
        self.virtualize()
    }

    fn resolve_pending_focus(&mut self) -> Result<(), Error> {
        if self.locked {
            return Ok(());
        }
        let arrived = self
            .pending_focus
            .as_ref()
            .is_some_and(|(item, _)| self.positions.contains_key(item));
        if !arrived {
            return Ok(());
        }
        match self.pending_focus.take() {
            Some((item, direction)) => self.focus_present(&item, direction),
            None => Ok(()),
        }
    }

    fn focus_present(&mut self, item: &K, direction: Option<Direction>) -> Result<(), Error> {
        let Some(&at) = self.positions.get(item) else {
            return Ok(());
        };
        self.tween = None;
        self.frames.cancel_tween();
        if !self.window.contains(at) {
            return self.jump(at, direction);
        }
        let to = self.content_top(at).min(self.max_scroll_offset());
        vtrace!(index = at, to, "focus: smooth scroll");
        self.frames.push(FrameTask::Tween { to });
        self.highlight_item(item);
        Ok(())
    }

    fn jump(&mut self, target: usize, direction: Option<Direction>) -> Result<(), Error> {
        let direction = direction.unwrap_or(if target >= self.window.end {
            Direction::Forward
        } else {
            Direction::Backward
        });
        let half = (self.batch() / 2).max(1);
        let end = (target + half).min(self.order.len()).max(target + 1);
        let window = Window::new(target.saturating_sub(half), end);
        vdebug!(
            target,
            start = window.start,
            end = window.end,
            "focus: virtualized jump"
        );

        self.lock();
        self.detach_window();
        self.window = window;
        for at in window.start..window.end {
            self.attach(at, None)?;
        }
        let offset = self.content_top(target).min(self.max_scroll_offset());
        self.write_scroll(offset);

        // Start one viewport away in the travel direction, then slide in on the next frame.
        let shift = direction.sign() * self.viewport.main as i64;
        let items = self.attached().to_vec();
        for item in &items {
            if let Some(element) = self.elements.get(item) {
                self.surface.translate(element, shift, Transition::Instant);
            }
        }
        self.frames.push(FrameTask::Play {
            items,
            duration_ms: self.options.jump_duration_ms,
        });
        self.frames.push(FrameTask::Commit);

        let item = self.order[target].clone();
        self.highlight_item(&item);
        Ok(())
    }

    fn populate(&mut self, next: Vec<K>) -> Result<(), Error> {
        self.set_order(next);
        let len = self.order.len();
        let batch = self.batch();
        self.window = if self.options.pivot_bottom {
            Window::new(len.saturating_sub(batch), len)
        } else {
            Window::new(0, batch.min(len))
        };
        vdebug!(
            len,
            start = self.window.start,
            end = self.window.end,
            "initial population"
        );
        for at in self.window.start..self.window.end {
            self.attach(at, None)?;
        }
        let offset = if self.options.pivot_bottom {
            self.max_scroll_offset()
        } else {
            0
        };
        self.write_scroll(offset);
        self.lock();
        self.frames.push(FrameTask::Commit);
        Ok(())
    }

    fn grown_at_pivot(&self, next: &[K]) -> Option<usize> {
        let len = self.order.len();
        if next.len() <= len {
            return None;
        }
        let grown = if self.options.pivot_bottom {
            next.ends_with(&self.order)
        } else {
            next.starts_with(&self.order)
        };
        grown.then(|| next.len() - len)
    }

    fn extend(&mut self, next: Vec<K>, added: usize) -> Result<(), Error> {
        vdebug!(added, pivot_bottom = self.options.pivot_bottom, "extend");
        if self.options.pivot_bottom {
            for (at, item) in next[..added].iter().enumerate() {
                let length = self.lengths.get(item).copied().unwrap_or(0);
                self.index.insert(at, item.clone(), length);
            }
            self.window = self.window.shift(added);
        } else {
            for item in &next[self.order.len()..] {
                let length = self.lengths.get(item).copied().unwrap_or(0);
                self.index.push_back(item.clone(), length);
            }
        }
        self.positions = positions_of(&next);
        self.order = next;
        self.virtualize()
    }

    fn reconcile(&mut self, next: Vec<K>) -> Result<(), Error> {
        let previous = self.window;
        let next_positions = positions_of(&next);

        // First: where every attached element sits in the viewport before the change.
        let first: Vec<(K, i64)> = (previous.start..previous.end)
            .map(|at| (self.order[at].clone(), self.viewport_top(at)))
            .collect();

        let at_edge = self.at_pivot_edge();
        let anchor = if at_edge {
            None
        } else {
            capture_anchor(
                &self.index,
                previous,
                self.visible(),
                self.scroll_offset,
                self.options.pivot_bottom,
                |item| next_positions.contains_key(item),
            )
        };
        let placement = match &anchor {
            _ if at_edge => reconcile::Placement::AtPivotEdge,
            Some(anchor) => match next_positions.get(&anchor.key) {
                Some(&after) => reconcile::Placement::Anchored {
                    before: anchor.index,
                    after,
                },
                None => reconcile::Placement::Detached,
            },
            None => reconcile::Placement::Detached,
        };
        let window = next_window(
            previous,
            self.order.len(),
            next.len(),
            self.batch(),
            self.options.pivot_bottom,
            placement,
        );

        let stays = |item: &K| next_positions.get(item).is_some_and(|&at| window.contains(at));
        let previous_rank: KeyMap<K, usize> = first
            .iter()
            .filter(|(item, _)| stays(item))
            .enumerate()
            .map(|(rank, (item, _))| (item.clone(), rank))
            .collect();
        for (item, _) in &first {
            if !stays(item) {
                self.detach_key(item);
            }
        }
        self.elements.retain(|item, _| next_positions.contains_key(item));
        self.lengths.retain(|item, _| next_positions.contains_key(item));
        if self
            .highlight
            .as_ref()
            .is_some_and(|(item, _)| !next_positions.contains_key(item))
        {
            self.highlight = None;
        }

        self.set_order(next);
        self.window = window;

        // Survivors keeping their relative order stay put; walk backwards so that every
        // element's successor is already in place.
        let ranks: Vec<Option<usize>> = self
            .attached()
            .iter()
            .map(|item| previous_rank.get(item).copied())
            .collect();
        let stable = stable_mask(&ranks);
        let mut successor: Option<K> = None;
        for at in (window.start..window.end).rev() {
            let slot = at - window.start;
            let item = self.order[at].clone();
            if !stable[slot] {
                if ranks[slot].is_some() {
                    self.detach_key(&item);
                }
                self.attach(at, successor.clone())?;
            }
            successor = Some(item);
        }

        let max = self.max_scroll_offset();
        let offset = match &anchor {
            Some(anchor) => match self.positions.get(&anchor.key) {
                Some(&at) => anchored_offset(anchor, self.content_top(at), max),
                None => 0,
            },
            None if self.options.pivot_bottom => max,
            None => 0,
        };
        self.write_scroll(offset);

        // Last + Invert: survivors that moved on screen start from their old position.
        let mut flipped = Vec::new();
        for (item, top) in first {
            let Some(&at) = self.positions.get(&item) else {
                continue;
            };
            if !self.window.contains(at) {
                continue;
            }
            let delta = top - self.viewport_top(at);
            if delta == 0 {
                continue;
            }
            if let Some(element) = self.elements.get(&item) {
                self.surface.translate(element, delta, Transition::Instant);
                flipped.push(item);
            }
        }
        vdebug!(
            start = window.start,
            end = window.end,
            flipped = flipped.len(),
            offset,
            "reconcile"
        );

        self.lock();
        if !flipped.is_empty() {
            self.frames.push(FrameTask::Play {
                items: flipped,
                duration_ms: self.options.flip_duration_ms,
            });
        }
        self.frames.push(FrameTask::Commit);
        Ok(())
    }

    fn empty_out(&mut self) {
        vdebug!(attached = self.window.len(), "sequence emptied");
        self.clear_highlight();
        self.detach_window();
        self.elements.clear();
        self.lengths.clear();
        self.set_order(Vec::new());
        self.window = Window::default();
        self.tween = None;
        self.frames.cancel_tween();
        if self.scroll_offset != 0 {
            self.write_scroll(0);
        }
    }

    /// Scroll-driven virtualization: refills the window towards whichever edge runs short of
    /// rendered content and trims the opposite edge, keeping the viewport content still.
    fn virtualize(&mut self) -> Result<(), Error> {
        if self.locked || self.window.is_empty() {
            return Ok(());
        }
        let view = self.viewport.main as u64;
        let reserve = self.reserve();
        let reach = self.batch().saturating_mul(REACH_BATCHES);
        let (mut near_top, mut near_bottom) = (false, false);

        loop {
            let above = self.scroll_offset;
            let below = self
                .scroll_height()
                .saturating_sub(self.scroll_offset + view);
            if above < reserve && self.window.start > 0 {
                self.grow_top(reserve)?;
                near_top |= self.window.start < reach;
            } else if below < reserve && self.window.end < self.order.len() {
                self.grow_bottom(reserve)?;
                near_bottom |= self.order.len() - self.window.end < reach;
            } else {
                near_top |= above < reserve;
                near_bottom |= below < reserve;
                break;
            }
        }

        if near_top {
            if let Some(cb) = &self.options.on_reach_top {
                cb();
            }
        }
        if near_bottom {
            if let Some(cb) = &self.options.on_reach_bottom {
                cb();
            }
        }
        self.report();
        Ok(())
    }

    fn grow_top(&mut self, reserve: u64) -> Result<(), Error> {
        let start = self.window.start;
        let from = start.saturating_sub(self.batch());
        let mut added = 0u64;
        for at in (from..start).rev() {
            let successor = self.order[at + 1].clone();
            self.window.start = at;
            added += self.attach(at, Some(successor))? as u64;
        }
        let offset = self.scroll_offset + added;

        let keep_until = offset + self.viewport.main as u64 + reserve;
        let mut removed = 0u64;
        while removed < added && self.window.len() > 1 {
            let last = self.window.end - 1;
            if self.content_top(last) < keep_until {
                break;
            }
            removed += self.attached_length(last)? as u64;
            let item = self.order[last].clone();
            self.detach_key(&item);
            self.window.end = last;
        }
        vtrace!(
            start = self.window.start,
            end = self.window.end,
            added,
            removed,
            "grow_top"
        );
        self.write_scroll(offset);
        Ok(())
    }

    fn grow_bottom(&mut self, reserve: u64) -> Result<(), Error> {
        let end = self.window.end;
        let to = (end + self.batch()).min(self.order.len());
        let mut added = 0u64;
        for at in end..to {
            self.window.end = at + 1;
            added += self.attach(at, None)? as u64;
        }

        let mut offset = self.scroll_offset;
        let mut removed = 0u64;
        while removed < added && self.window.len() > 1 {
            let first = self.window.start;
            let length = self.attached_length(first)? as u64;
            if offset < length + reserve {
                break;
            }
            let item = self.order[first].clone();
            self.detach_key(&item);
            self.window.start = first + 1;
            removed += length;
            offset -= length;
        }
        vtrace!(
            start = self.window.start,
            end = self.window.end,
            added,
            removed,
            "grow_bottom"
        );
        if offset != self.scroll_offset {
            self.write_scroll(offset);
        }
        Ok(())
    }

    fn attach(&mut self, at: usize, successor: Option<K>) -> Result<u32, Error> {
        let item = self.order[at].clone();
        let element = self.element_for(&item);
        let (parent, before) = self.enter_group(&item, successor.as_ref());
        self.surface.attach(
            &element,
            Placement {
                parent: parent.as_ref(),
                before: before.as_ref(),
            },
        );
        let length = self.surface.measure(&element);
        if length == 0 {
            vwarn!(index = at, "attached element measured zero height");
            return Err(Error::ZeroHeight { index: at });
        }
        self.lengths.insert(item, length);
        self.index.try_update_length(at, length)?;
        Ok(length)
    }

    fn attached_length(&self, at: usize) -> Result<u32, Error> {
        match self.index.try_get_by_index(at)?.length {
            0 => Err(Error::ZeroHeight { index: at }),
            length => Ok(length),
        }
    }

    fn element_for(&mut self, item: &K) -> E {
        if let Some(element) = self.elements.get(item) {
            return element.clone();
        }
        let element = (self.renderer)(item);
        self.elements.insert(item.clone(), element.clone());
        element
    }

    /// Joins the item's group, creating the wrapper on first use.
    ///
    /// Returns the parent wrapper and the sibling to insert before (only when `successor` is in
    /// the same group).
    fn enter_group(&mut self, item: &K, successor: Option<&K>) -> (Option<E>, Option<E>) {
        let Some(grouping) = self.options.group.clone() else {
            let before = successor.and_then(|next| self.elements.get(next).cloned());
            return (None, before);
        };
        let group = (grouping.select)(item);
        let successor_group = successor.map(|next| (grouping.select)(next));
        let before = match (successor, &successor_group) {
            (Some(next), Some(next_group)) if *next_group == group => {
                self.elements.get(next).cloned()
            }
            _ => None,
        };

        if let Some(slot) = self.groups.get_mut(&group) {
            slot.members += 1;
            return (Some(slot.wrapper.clone()), before);
        }

        let wrapper = (grouping.render)(&group);
        let next_wrapper = successor_group
            .and_then(|next_group| self.groups.get(&next_group))
            .map(|slot| slot.wrapper.clone());
        self.surface.attach(
            &wrapper,
            Placement {
                parent: None,
                before: next_wrapper.as_ref(),
            },
        );
        self.groups.insert(
            group,
            GroupSlot {
                wrapper: wrapper.clone(),
                members: 1,
            },
        );
        (Some(wrapper), None)
    }

    fn leave_group(&mut self, item: &K) {
        let Some(grouping) = self.options.group.as_ref() else {
            return;
        };
        let group = (grouping.select)(item);
        let emptied = match self.groups.get_mut(&group) {
            Some(slot) => {
                slot.members = slot.members.saturating_sub(1);
                slot.members == 0
            }
            None => false,
        };
        if emptied {
            if let Some(slot) = self.groups.remove(&group) {
                self.surface.detach(&slot.wrapper);
            }
        }
    }

    fn detach_key(&mut self, item: &K) {
        if let Some(element) = self.elements.get(item) {
            self.surface.detach(element);
        }
        self.leave_group(item);
    }

    fn detach_window(&mut self) {
        for at in self.window.start..self.window.end {
            let item = self.order[at].clone();
            self.detach_key(&item);
        }
        self.window = Window::new(self.window.start, self.window.start);
    }

    fn set_order(&mut self, next: Vec<K>) {
        self.positions = positions_of(&next);
        self.index = next
            .iter()
            .map(|item| (item.clone(), self.lengths.get(item).copied().unwrap_or(0)))
            .collect();
        self.order = next;
    }

    fn play(&mut self, items: &[K], transition: Transition) {
        for item in items {
            if !self.is_attached(item) {
                continue;
            }
            if let Some(element) = self.elements.get(item) {
                self.surface.translate(element, 0, transition);
            }
        }
    }

    fn highlight_item(&mut self, item: &K) {
        if !self.options.highlight_focused {
            return;
        }
        self.clear_highlight();
        if let Some(element) = self.elements.get(item) {
            self.surface.highlight(element, true);
            self.highlight = Some((item.clone(), self.now_ms + self.options.highlight_ms));
        }
    }

    fn clear_highlight(&mut self) {
        let Some((item, _)) = self.highlight.take() else {
            return;
        };
        if let Some(element) = self.elements.get(&item) {
            self.surface.highlight(element, false);
        }
    }

    fn write_scroll(&mut self, offset: u64) {
        self.scroll_offset = offset;
        self.unsnapped = Some(offset);
        self.surface.set_scroll_offset(offset);
        self.frames.push(FrameTask::Resnap {
            offset,
            generation: self.scroll_generation,
        });
    }

    /// Some engines round sub-pixel scroll offsets; re-apply ours if the surface drifted.
    fn resnap(&mut self, offset: u64, generation: u64) {
        self.unsnapped = None;
        if generation != self.scroll_generation
            || offset != self.scroll_offset
            || self.tween.is_some()
        {
            return;
        }
        let actual = self.surface.scroll_offset();
        if actual.abs_diff(offset) > SCROLL_TOLERANCE {
            vwarn!(expected = offset, actual, "scroll offset drifted; re-snapping");
            self.surface.set_scroll_offset(offset);
        }
    }

    fn report(&self) {
        let visible = self.visible();
        if visible.is_empty() {
            return;
        }
        let top = &self.order[visible.start];
        let bottom = &self.order[visible.end - 1];
        if let Some(cb) = &self.options.on_focus {
            cb(if self.options.pivot_bottom { bottom } else { top });
        }
        if let Some(cb) = &self.options.on_trace {
            cb(top, bottom);
        }
    }

    fn at_pivot_edge(&self) -> bool {
        if self.options.pivot_bottom {
            self.window.end == self.order.len()
                && self.scroll_offset + SCROLL_TOLERANCE >= self.max_scroll_offset()
        } else {
            self.window.start == 0 && self.scroll_offset <= SCROLL_TOLERANCE
        }
    }

    /// Offset of `at` from the top of the first attached element.
    fn content_top(&self, at: usize) -> u64 {
        self.index.span(self.window.start, at)
    }

    fn viewport_top(&self, at: usize) -> i64 {
        self.content_top(at) as i64 - self.scroll_offset as i64
    }

    fn reserve(&self) -> u64 {
        (self.viewport.main as f32 * self.options.threshold.max(0.0)) as u64
    }

    fn batch(&self) -> usize {
        self.options.batch.max(1)
    }
}

fn positions_of<K: ListKey>(order: &[K]) -> KeyMap<K, usize> {
    order
        .iter()
        .enumerate()
        .map(|(at, item)| (item.clone(), at))
        .collect()
}

impl<K, E, S, G> fmt::Debug for WindowController<K, E, S, G>
where
    K: ListKey,
    E: Clone,
    S: Surface<E>,
    G: ListKey,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowController")
            .field("state", &self.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
