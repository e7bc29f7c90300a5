//! Distributed Calculation Cluster Library
//!
//! This library crate defines the core modules of a fault-tolerant work
//! dispatcher: discrete calculation tasks are distributed across a dynamically
//! discovered pool of remote workers and the correct results are folded into a
//! single accumulated value. It serves as the foundation for the binary
//! executable (`main.rs`), which can start either role.
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`task`**: The unit-of-work model. Immutable `Task` values (an operand
//!   plus an operation kind), their deterministic execution functions, and the
//!   line-oriented input parser.
//! - **`registry`**: The name-resolution directory. A generic name -> service
//!   entry registry hosted by the dispatcher process, with an HTTP surface so
//!   worker processes can register and unregister themselves remotely.
//! - **`worker`**: The remote calculation service. Exposes "execute a batch"
//!   and "report capacity", may reject a batch probabilistically when its
//!   capacity is exceeded, and may be configured to silently corrupt results.
//! - **`dispatch`**: The dispatcher core. Pulls workers and tasks, launches
//!   batches concurrently, collects results, evicts dead workers, redrives
//!   rejected or errored batches, and cross-checks results when workers cannot
//!   be trusted.

pub mod config;
pub mod dispatch;
pub mod registry;
pub mod task;
pub mod worker;
