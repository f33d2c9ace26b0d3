//! Switches the owner slot onto loom's instrumented primitives when built
//! with `--cfg loom`, so acquisition and release interleavings can be model
//! checked.

#[cfg(loom)]
pub(crate) use ::loom::sync;

#[cfg(not(loom))]
pub(crate) use ::std::sync;
