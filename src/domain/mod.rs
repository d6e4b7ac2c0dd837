//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O beyond reading
//! template files. Types and functions here can be unit tested without a
//! control plane.

pub mod definition;
pub mod differ;
pub mod environment;
pub mod format;
pub mod plan;
pub mod resolve;
pub mod task;
pub mod template;
