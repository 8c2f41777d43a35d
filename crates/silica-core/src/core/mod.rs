//! # Core Module
//!
//! This module provides the fundamental building blocks for detector subsystem
//! configuration and run-level bookkeeping, serving as the stateless foundation
//! of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures a subsystem owns and the shared
//! structures it integrates with: a typed parameter store with declared defaults,
//! a mutually exclusive geometry volume selection, the hierarchical node tree
//! through which per-run output is published, and the hit containers that hold
//! recorded interaction data.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of subsystem configuration:
//!
//! - **Parameters** ([`params`]) - Typed key/value store with compile-time-declared defaults
//! - **Volume Selection** ([`volume`]) - Mutually exclusive assembly/logical geometry modes
//! - **Node Tree** ([`tree`]) - Shared hierarchical namespace for per-run output
//! - **Hit Data** ([`hits`]) - Per-subsystem containers of simulated interaction records
//! - **Geometry Descriptions** ([`geometry`]) - Volume definitions loaded from TOML files

pub mod geometry;
pub mod hits;
pub mod params;
pub mod tree;
pub mod volume;
