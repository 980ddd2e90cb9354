//! Domain model, validators, plan builder, renderer and atomic writer for
//! the k8s lab scaffold generator (spec.md §2: `Request -> DefaultsApplier
//! -> Validators -> PlanBuilder -> Renderer -> AtomicWriter`). The CLI
//! binary (`labscaffold_cli`) owns argument parsing and wires these stages
//! together; this crate has no knowledge of argv.

pub mod config;
pub mod defaults;
pub mod errors;
pub mod fileset;
pub mod manifest;
pub mod model;
pub mod plan;
pub mod regen;
pub mod render;
pub mod validate;
pub mod write;

pub use config::Config;
pub use defaults::{apply_defaults, DefaultedRequest, DefaultsWarning};
pub use fileset::{FileEntry, FileSet};
pub use manifest::Manifest;
pub use model::{
    ClusterEntry, ClusterSpec, ClusterType, CloudProvider, CniType, Management, ModuleInfo, NetworkCidr, NodeRole,
    NodeTopology, Request, SizeProfile, Tool, VmConfig,
};
pub use plan::{PlannedVm, ScaffoldPlan};
pub use regen::RegenPolicy;
pub use render::Renderer;
pub use validate::{ValidationError, ValidationLevel, ValidationResult};
