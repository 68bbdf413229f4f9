//! Checksum-keyed layer reuse
//!
//! Each installer layer records the checksum of the dependency it was built
//! from. On the next build the freshly resolved checksum is compared against
//! the recorded one to decide whether the layer can be handed back as-is.
//!
//! # Layer States
//!
//! | Recorded | Resolved | Decision |
//! |----------|----------|----------|
//! | none / empty | any | rebuild |
//! | any | empty | rebuild |
//! | `abcd` | `sha256:abcd` | reuse |
//! | `sha256:abcd` | `sha512:abcd` | rebuild |
//! | `sha256:abcd` | `sha256:ef01` | rebuild |
//!
//! On reuse the layer flags are still refreshed from the current plan. On
//! rebuild the layer is reset before installation.

pub mod decision;

pub use decision::{should_reuse, CacheDecision};
