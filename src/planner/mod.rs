//! Build plan planning
//!
//! Turns the raw plan entries for one tool into the two decisions every
//! installer needs before touching the filesystem:
//!
//! - which version to ask the catalog for ([`resolve`])
//! - whether the resulting layer participates in the build environment,
//!   the launch environment, or both ([`merge_layer_types`])

pub mod merge;
pub mod resolve;

pub use merge::{merge_layer_types, LayerTypes};
pub use resolve::{resolve, Candidate, Resolution, DEFAULT_VERSION, UNKNOWN_SOURCE};
