use crate::model::{CloudProvider, ClusterType, ModuleInfo, VmConfig};
use std::collections::{BTreeMap, BTreeSet};

/// A VM together with the cluster it belongs to. `ScaffoldPlan::vms` keeps
/// these flat and ordered across all clusters (§3), while still letting the
/// renderer ask "which cluster is this VM part of".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedVm {
    pub vm: VmConfig,
    pub cluster_name: String,
    pub cluster_type: ClusterType,
}

/// The validated, fully-resolved input to the renderer (§3, §9 Open
/// Question: the richer shape with `per_vm_env`/`providers` is normative).
#[derive(Debug, Clone)]
pub struct ScaffoldPlan {
    pub module: ModuleInfo,
    pub vms: Vec<PlannedVm>,
    /// Shared environment per cluster (`CLUSTER_NAME`, `NAMESPACE_DEFAULT`,
    /// `CLUSTER_TYPE`, `K8S_VERSION`, `K8S_POD_CIDR`, `K8S_SVC_CIDR`,
    /// `CNI_TYPE`), keyed by cluster name.
    pub env_vars: BTreeMap<String, BTreeMap<String, String>>,
    /// Per-VM overrides/additions (currently just `NODE_ROLE`), keyed by vm name.
    pub per_vm_env: BTreeMap<String, BTreeMap<String, String>>,
    pub providers: BTreeSet<CloudProvider>,
}

impl ScaffoldPlan {
    /// All env vars for a given VM: its cluster's shared env merged with its
    /// own per-vm overrides (per-vm wins on key collision).
    pub fn env_for_vm(&self, planned: &PlannedVm) -> BTreeMap<String, String> {
        let mut env = self
            .env_vars
            .get(&planned.cluster_name)
            .cloned()
            .unwrap_or_default();
        if let Some(extra) = self.per_vm_env.get(&planned.vm.name) {
            env.extend(extra.clone());
        }
        env
    }
}
