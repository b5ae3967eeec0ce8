#[cfg(feature = "tracing")]
macro_rules! vtrace {
    ($($tt:tt)*) => {
        tracing::trace!(target: "vlist_window", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! vtrace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! vdebug {
    ($($tt:tt)*) => {
        tracing::debug!(target: "vlist_window", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! vdebug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! vwarn {
    ($($tt:tt)*) => {
        tracing::warn!(target: "vlist_window", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! vwarn {
    ($($tt:tt)*) => {};
}
