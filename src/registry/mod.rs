//! Name Registry Module
//!
//! A generic name -> service-entry directory, the discovery collaborator of
//! the dispatcher. The registry lives inside the dispatcher process; worker
//! processes register themselves remotely over HTTP when they start and
//! unregister when they shut down.
//!
//! The directory is deliberately generic: any service kind can be bound under
//! any free name. Consumers filter by naming convention (workers bind under a
//! `calculator-` prefix) and validate the advertised service kind of each
//! entry before using it.
//!
//! ## Submodules
//! - **`service`**: The in-process `NameRegistry` directory itself.
//! - **`protocol`**: HTTP API contracts (DTOs and endpoint constants).
//! - **`handlers`**: axum handlers exposing the directory to remote services.
//! - **`client`**: `reqwest` client used by worker processes to register.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod service;
