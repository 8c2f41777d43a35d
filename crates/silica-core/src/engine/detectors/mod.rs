//! Concrete detector model implementations.

pub mod silicon_tracker;
