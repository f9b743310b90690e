//! Session management core module.
//!
//! This module provides the authenticated session type and the gate that
//! creates, restores and clears it.

use serde::{Deserialize, Serialize};

/// Submodule for session data structures.
pub mod session;
/// Submodule for the login gate.
pub mod session_gate;

pub use session::Session;
pub use session_gate::SessionGate;

/// Role carried by a session.
///
/// Variants:
/// - `Admin`: the built-in account that manages doctors.
/// - `Doctor`: a doctor account from the doctors collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
}
