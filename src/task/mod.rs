//! Task Model Module
//!
//! Defines the immutable unit of work handled by the cluster: an operand plus
//! an operation kind. A task is created when parsed from input, executed by a
//! worker (a pure, deterministic, potentially expensive computation), and
//! discarded after being folded into the accumulated total or pushed back onto
//! the pending queue on failure.
//!
//! ## Submodules
//! - **`types`**: `Task`, `TaskKind`, and the deterministic execution
//!   functions with modular reduction.
//! - **`parser`**: Line-oriented input parsing (`<keyword> <operand>`), where
//!   malformed lines are diagnosed and skipped rather than failing the run.

pub mod parser;
pub mod types;
