//! Data organization utilities for the health monitoring service.
//!
//! Chart-facing helpers that shape entity histories. Rendering itself is
//! handled by whatever consumes registry snapshots.
//!
//! Submodules:
//! - `history` — bounded, chronological per-entity buffers.

pub mod history;
