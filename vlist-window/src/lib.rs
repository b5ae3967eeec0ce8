//! Window controller for virtualized, variable-height lists.
//!
//! `vlist` keeps the lengths of every item in a [`PositionIndex`]; this crate decides which
//! contiguous slice of the sequence is attached to a render surface at any time and keeps that
//! slice in step with scrolling, resizing, focus requests and changes to the item order.
//!
//! It is framework-neutral: the host implements [`Surface`] (attach, detach, measure, translate,
//! scroll) and forwards scroll/resize events and animation frames to a [`WindowController`].
//!
//! - Scroll-driven virtualization with batched refill and scroll anchoring
//! - Reconciliation of reordered sequences with minimal element churn and FLIP animations
//! - Focus by smooth scroll, or by a virtualized jump when the target is far away
//! - Optional grouping of items into per-group wrapper elements
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod controller;
mod error;
mod frame;
mod key;
mod options;
mod reconcile;
mod sequence;
mod state;
mod surface;
mod tween;


pub use controller::{MAX_SCROLL_DRIFT, SCROLL_TOLERANCE, WindowController};
pub use error::Error;
pub use key::ListKey;
pub use options::{
    ControllerOptions, DEFAULT_BATCH, DEFAULT_FLIP_DURATION_MS, DEFAULT_FOCUS_DURATION_MS,
    DEFAULT_HIGHLIGHT_MS, DEFAULT_JUMP_DURATION_MS, DEFAULT_THRESHOLD, EdgeCallback,
    FocusCallback, GroupRenderer, GroupSelector, Grouping, Renderer, TraceCallback,
};
pub use sequence::{Sequence, Subscription};
pub use state::WindowState;
pub use surface::{Placement, Surface, Transition};
pub use tween::{Easing, Tween};

pub use vlist::{Direction, PositionIndex, RangeError, Rect, Window};
