//! Argument parsing, `--clusters` spec detection, and the pipeline driver
//! for the `labscaffold` binary. [`labscaffold_definitions`] owns the domain
//! model and every pipeline stage; this crate only wires argv to it.

pub mod cli;
pub mod clusters_spec;
pub mod output;
pub mod pipeline;

pub use cli::Cli;
pub use pipeline::{PipelineError, PipelineOutcome};
