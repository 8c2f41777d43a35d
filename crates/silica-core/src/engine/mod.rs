//! # Engine Module
//!
//! This module implements the stateful detector-subsystem lifecycle: one-time
//! run initialization, detector construction, hit-container publication, and
//! the per-event processing hook invoked by the run loop.
//!
//! ## Overview
//!
//! A subsystem is configured any number of times before a run (parameters,
//! volume selection), joins the run exactly once through `init_run`, and is
//! then driven strictly serially through `process_event`. A subsystem either
//! fully joins the simulation for a run or the run does not proceed; there is
//! no partial-success mode.
//!
//! ## Architecture
//!
//! - **Subsystem Lifecycle** ([`subsystem`]) - The `Subsystem` trait and the
//!   parameterized `DetectorSubsystem` implementation
//! - **Action Seams** ([`actions`]) - Detector, stepping-action, and
//!   display-action interfaces plus the per-detector model factory
//! - **Run Context** ([`runtime`]) - Explicit run context owning the node tree
//!   and the registered subsystems
//! - **Detector Models** ([`detectors`]) - Concrete detector model implementations
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod actions;
pub mod detectors;
pub mod error;
pub mod progress;
pub mod runtime;
pub mod subsystem;
