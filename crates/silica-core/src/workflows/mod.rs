//! # Workflows Module
//!
//! This module provides the high-level entry point that orchestrates a
//! complete simulation run: subsystem registration, one-time initialization,
//! the serialized event loop, and output summarization.
//!
//! ## Overview
//!
//! Workflows are the top-level entry points for users of the library. They
//! encapsulate the run lifecycle behind a single call, handle progress
//! reporting, and collect the per-subsystem hit totals that downstream
//! evaluation components consume.
//!
//! - **Run Workflow** ([`run`]) - Configure subsystems, run N events,
//!   summarize the published hit containers.

pub mod run;
