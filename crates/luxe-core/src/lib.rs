//! # luxe-core
//!
//! Core types shared by the Luxe backup and restore crates.
//!
//! - [`Artifact`] and [`ArtifactFormat`]: the on-disk dump files and the
//!   suffix rule that decides which restore tool handles them
//! - Naming helpers for timestamped dump and scratch filenames
//! - Response types serialized by the admin HTTP surface

pub mod artifact;
pub mod naming;
pub mod responses;

pub use artifact::{Artifact, ArtifactFormat};
pub use responses::{DumpResult, RestoreResult, ShipmentResult};
