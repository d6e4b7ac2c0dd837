//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that talks to the cluster:
//! - The control plane collaborator trait and its wire types
//! - The HTTP implementation and its polling waiters

pub mod control_plane;
pub mod http_client;
pub mod waiter;

#[cfg(test)]
pub mod fake;

// Re-export commonly used types
pub use control_plane::ControlPlane;
pub use http_client::{HttpControlPlane, HttpControlPlaneConfig};
