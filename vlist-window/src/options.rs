use alloc::sync::Arc;

use vlist::Rect;

use crate::Subscription;

/// Produces the element for an item. Called at most once per cached item.
pub type Renderer<K, E> = Arc<dyn Fn(&K) -> E + Send + Sync>;

/// Maps an item to its group key.
pub type GroupSelector<K, G> = Arc<dyn Fn(&K) -> G + Send + Sync>;

/// Produces the wrapper element for a group.
pub type GroupRenderer<G, E> = Arc<dyn Fn(&G) -> E + Send + Sync>;

/// Fired when the window nears an edge of the sequence; the host should load more items.
pub type EdgeCallback = Arc<dyn Fn() + Send + Sync>;

/// Receives the item currently at the pivot edge of the viewport.
pub type FocusCallback<K> = Arc<dyn Fn(&K) + Send + Sync>;

/// Receives the topmost and bottommost visible items.
pub type TraceCallback<K> = Arc<dyn Fn(&K, &K) + Send + Sync>;

pub const DEFAULT_BATCH: usize = 20;
pub const DEFAULT_THRESHOLD: f32 = 1.5;
pub const DEFAULT_HIGHLIGHT_MS: u64 = 1500;
pub const DEFAULT_FOCUS_DURATION_MS: u64 = 300;
pub const DEFAULT_FLIP_DURATION_MS: u64 = 200;
pub const DEFAULT_JUMP_DURATION_MS: u64 = 300;

/// Optional grouping: items are attached inside a wrapper element per group key.
///
/// A wrapper is created when its first member is attached and detached when its last member
/// leaves the window. Members of one group are expected to be contiguous in the item order.
pub struct Grouping<K, E, G> {
    pub select: GroupSelector<K, G>,
    pub render: GroupRenderer<G, E>,
}

impl<K, E, G> Clone for Grouping<K, E, G> {
    fn clone(&self) -> Self {
        Self {
            select: Arc::clone(&self.select),
            render: Arc::clone(&self.render),
        }
    }
}

/// Configuration for [`crate::WindowController`].
///
/// `items` and `renderer` are required; [`crate::WindowController::new`] fails without them.
/// Everything else has a default.
pub struct ControllerOptions<K, E, G = ()> {
    pub items: Option<Subscription<K>>,
    pub renderer: Option<Renderer<K, E>>,
    pub group: Option<Grouping<K, E, G>>,

    /// Items attached per virtualization step.
    pub batch: usize,
    /// Refill once less than `threshold × viewport height` of rendered content remains beyond
    /// the viewport edge.
    pub threshold: f32,
    /// `false`: the list grows from the top. `true`: it grows from the bottom (chat-style).
    pub pivot_bottom: bool,

    pub highlight_focused: bool,
    pub highlight_ms: u64,
    pub focus_duration_ms: u64,
    pub flip_duration_ms: u64,
    pub jump_duration_ms: u64,

    /// Viewport geometry known before the first layout pass.
    pub initial_rect: Option<Rect>,

    pub on_reach_top: Option<EdgeCallback>,
    pub on_reach_bottom: Option<EdgeCallback>,
    pub on_focus: Option<FocusCallback<K>>,
    pub on_trace: Option<TraceCallback<K>>,
}

impl<K, E> ControllerOptions<K, E, ()> {
    pub fn new() -> Self {
        Self {
            items: None,
            renderer: None,
            group: None,
            batch: DEFAULT_BATCH,
            threshold: DEFAULT_THRESHOLD,
            pivot_bottom: false,
            highlight_focused: false,
            highlight_ms: DEFAULT_HIGHLIGHT_MS,
            focus_duration_ms: DEFAULT_FOCUS_DURATION_MS,
            flip_duration_ms: DEFAULT_FLIP_DURATION_MS,
            jump_duration_ms: DEFAULT_JUMP_DURATION_MS,
            initial_rect: None,
            on_reach_top: None,
            on_reach_bottom: None,
            on_focus: None,
            on_trace: None,
        }
    }
}

impl<K, E> Default for ControllerOptions<K, E, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E, G> ControllerOptions<K, E, G> {
    pub fn with_items(mut self, items: Subscription<K>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Fn(&K) -> E + Send + Sync + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Attaches items inside per-group wrapper elements.
    pub fn with_grouping<G2>(
        self,
        select: impl Fn(&K) -> G2 + Send + Sync + 'static,
        render: impl Fn(&G2) -> E + Send + Sync + 'static,
    ) -> ControllerOptions<K, E, G2> {
        ControllerOptions {
            items: self.items,
            renderer: self.renderer,
            group: Some(Grouping {
                select: Arc::new(select),
                render: Arc::new(render),
            }),
            batch: self.batch,
            threshold: self.threshold,
            pivot_bottom: self.pivot_bottom,
            highlight_focused: self.highlight_focused,
            highlight_ms: self.highlight_ms,
            focus_duration_ms: self.focus_duration_ms,
            flip_duration_ms: self.flip_duration_ms,
            jump_duration_ms: self.jump_duration_ms,
            initial_rect: self.initial_rect,
            on_reach_top: self.on_reach_top,
            on_reach_bottom: self.on_reach_bottom,
            on_focus: self.on_focus,
            on_trace: self.on_trace,
        }
    }

    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_pivot_bottom(mut self, pivot_bottom: bool) -> Self {
        self.pivot_bottom = pivot_bottom;
        self
    }

    pub fn with_highlight_focused(mut self, highlight_focused: bool) -> Self {
        self.highlight_focused = highlight_focused;
        self
    }

    pub fn with_highlight_ms(mut self, highlight_ms: u64) -> Self {
        self.highlight_ms = highlight_ms;
        self
    }

    pub fn with_focus_duration_ms(mut self, duration_ms: u64) -> Self {
        self.focus_duration_ms = duration_ms;
        self
    }

    pub fn with_flip_duration_ms(mut self, duration_ms: u64) -> Self {
        self.flip_duration_ms = duration_ms;
        self
    }

    pub fn with_jump_duration_ms(mut self, duration_ms: u64) -> Self {
        self.jump_duration_ms = duration_ms;
        self
    }

    pub fn with_initial_rect(mut self, initial_rect: Option<Rect>) -> Self {
        self.initial_rect = initial_rect;
        self
    }

    pub fn with_on_reach_top(mut self, f: Option<impl Fn() + Send + Sync + 'static>) -> Self {
        self.on_reach_top = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_reach_bottom(mut self, f: Option<impl Fn() + Send + Sync + 'static>) -> Self {
        self.on_reach_bottom = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_focus(mut self, f: Option<impl Fn(&K) + Send + Sync + 'static>) -> Self {
        self.on_focus = f.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_trace(mut self, f: Option<impl Fn(&K, &K) + Send + Sync + 'static>) -> Self {
        self.on_trace = f.map(|f| Arc::new(f) as _);
        self
    }
}

impl<K, E, G> core::fmt::Debug for ControllerOptions<K, E, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("has_items", &self.items.is_some())
            .field("has_renderer", &self.renderer.is_some())
            .field("grouped", &self.group.is_some())
            .field("batch", &self.batch)
            .field("threshold", &self.threshold)
            .field("pivot_bottom", &self.pivot_bottom)
            .field("highlight_focused", &self.highlight_focused)
            .field("highlight_ms", &self.highlight_ms)
            .field("focus_duration_ms", &self.focus_duration_ms)
            .field("flip_duration_ms", &self.flip_duration_ms)
            .field("jump_duration_ms", &self.jump_duration_ms)
            .field("initial_rect", &self.initial_rect)
            .finish_non_exhaustive()
    }
}
