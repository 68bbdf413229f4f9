//! Build orchestration
//!
//! Runs the installers a plan asks for in a fixed order:
//! pip → pipenv → poetry → miniconda → uv → pixi. Later installers may use
//! the layers of earlier ones, so the order never follows the plan.

mod factory;
mod pipeline;

pub use factory::{create_common_parameters, create_parameters};
pub use pipeline::{run, InstallerParameters};
