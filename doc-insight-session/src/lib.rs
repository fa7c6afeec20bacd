//! Chat session controller for doc-insight
//!
//! Owns the client-side conversation state and drives the two backend
//! operations (chat submission, key registration) with optimistic-update
//! and rollback-on-failure semantics. The backend transport and the
//! connectivity source are both injected, so the controller is fully
//! testable without a live backend.

pub mod connectivity;
pub mod controller;

pub use connectivity::{ConnectivityHandle, ConnectivityMonitor};
pub use controller::SessionController;
