//! # Silica Core Library
//!
//! A library for building pluggable detector subsystems: named, independently
//! configurable units that construct a piece of detector geometry, record
//! simulated hits, and publish their per-run output into a shared node tree
//! for downstream analysis components.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models: the typed
//!   [`ParameterStore`](core::params::ParameterStore), the geometry
//!   [`VolumeSelector`](core::volume::VolumeSelector), the shared
//!   [`NodeTree`](core::tree::NodeTree), and hit containers.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the subsystem
//!   lifecycle: one-time run initialization, detector and stepping-action
//!   construction, and the per-event processing hook, all driven through an
//!   explicit [`RunContext`](engine::runtime::RunContext).
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute a complete simulation run
//!   and summarize the recorded output.

pub mod core;
pub mod engine;
pub mod workflows;
