#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

/// Identity of a list item (and of a group).
///
/// Keys must be unique within one item sequence.
#[cfg(feature = "std")]
pub trait ListKey: Clone + core::hash::Hash + Eq {}
#[cfg(feature = "std")]
impl<T: Clone + core::hash::Hash + Eq> ListKey for T {}

#[cfg(not(feature = "std"))]
pub trait ListKey: Clone + Ord {}
#[cfg(not(feature = "std"))]
impl<T: Clone + Ord> ListKey for T {}
