//! Typed contexts handed to the renderer (spec.md §4.5). Each template
//! receives exactly one of these, serialised into a `tera::Context` —
//! there is no reflective/map-driven variable lookup (§9).

use crate::model::ModuleInfo;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Module identity, embedded in every template so scripts can namespace
/// themselves (lock files, kubeconfig paths, labels).
#[derive(Debug, Clone, Serialize)]
pub struct ModuleContext {
    pub num: String,
    pub type_tag: String,
    pub output_dir: String,
    pub namespace: String,
}

impl From<&ModuleInfo> for ModuleContext {
    fn from(module: &ModuleInfo) -> Self {
        ModuleContext {
            num: module.num().to_string(),
            type_tag: module.type_tag().to_string(),
            output_dir: module.output_dir(),
            namespace: module.namespace(),
        }
    }
}

/// One VM as it appears inside the Vagrantfile.
#[derive(Debug, Clone, Serialize)]
pub struct VagrantNodeContext {
    pub define_name: String,
    pub hostname: String,
    pub ip: Ipv4Addr,
    pub memory_mib: u32,
    pub vcpus: u32,
    pub vm_name: String,
    pub role: String,
    /// Relative path (from the output directory) to this node's bootstrap
    /// script, already resolved by the filename convention in spec.md §6 —
    /// templates never compute it themselves.
    pub script_path: String,
}

/// An extra host<->guest synced folder, beyond the project-root default the
/// template already wires up.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedFolderSpec {
    pub host_path: String,
    pub guest_path: String,
}

/// Context for the single Vagrant-like descriptor rendered per plan
/// (spec.md §4.5). `bastion` is populated separately from `nodes` so the
/// template can place it first/specially even though `nodes` also carries
/// every other VM in plan order.
#[derive(Debug, Clone, Serialize)]
pub struct VagrantContext {
    pub module: ModuleContext,
    pub nodes: Vec<VagrantNodeContext>,
    pub bastion: Option<VagrantNodeContext>,
    pub synced_folders: Vec<SyncedFolderSpec>,
}

/// The Azure environment block written to `/etc/azure-env` on cloud-aware
/// nodes (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct AzureEnvContext {
    pub az_location: String,
    pub az_resource_group: String,
    pub aks_name: String,
    pub acr_name: Option<String>,
}

/// Context for one role-specific bootstrap script (spec.md §4.5).
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapContext {
    pub module: ModuleContext,
    pub vm_name: String,
    pub node_role: String,
    pub lock_file_path: String,
    /// Never populated for real output; see `crate::render::render_bootstrap_scripts`.
    pub timestamp_line: Option<String>,
    pub install_commands: Vec<String>,
    pub azure_env: Option<AzureEnvContext>,
    pub next_step_hint: String,
    pub env_vars: BTreeMap<String, String>,
}
