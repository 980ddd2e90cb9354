//! PlanBuilder (§4.4): turns a validated, defaulted cluster set into a
//! [`ScaffoldPlan`]. Deterministic: same input, byte-identical plan.

use super::ip_allocator;
use super::scaffold_plan::{PlannedVm, ScaffoldPlan};
use crate::errors::IpError;
use crate::model::{ClusterSpec, ClusterType, ModuleInfo, NodeRole, VmConfig};
use semver::Version;
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// The Kubernetes release baked into generated bootstrap scripts. Not
/// currently exposed as a CLI flag or env override (unlike
/// `generator_version`); see DESIGN.md for the Open Question this resolves.
const DEFAULT_K8S_VERSION: &str = "1.29.4";

/// `DEFAULT_K8S_VERSION`, parsed once and re-rendered through `semver` so
/// `K8S_VERSION` in generated scripts is always a canonical `major.minor.patch`
/// string even if the constant above is ever edited to something looser
/// (e.g. with a `v` prefix or build metadata).
fn k8s_version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| {
        Version::parse(DEFAULT_K8S_VERSION)
            .expect("DEFAULT_K8S_VERSION must be valid semver")
            .to_string()
    })
}

/// The VM names a cluster will produce, without allocating IPs. Used both by
/// the builder itself and by [`crate::validate::policy`], which needs global
/// name uniqueness *before* plan construction is attempted.
pub fn predicted_vm_names(cluster: &ClusterSpec) -> Vec<String> {
    if !cluster.vms.is_empty() {
        return cluster.vms.iter().map(|v| v.name.clone()).collect();
    }
    match cluster.cluster_type {
        ClusterType::Kubeadm => {
            let mut names = Vec::with_capacity(cluster.topology.total() as usize);
            if cluster.topology.masters == 1 {
                names.push(format!("{}-master", cluster.name));
            } else {
                for i in 1..=cluster.topology.masters {
                    names.push(format!("{}-master{i}", cluster.name));
                }
            }
            for i in 1..=cluster.topology.workers {
                names.push(format!("{}-worker{i}", cluster.name));
            }
            names
        }
        ClusterType::Kind => vec!["kind".to_string()],
        ClusterType::Minikube => vec!["minikube".to_string()],
        ClusterType::None => {
            let name = cluster
                .management
                .as_ref()
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| "bastion".to_string());
            vec![name]
        }
    }
}

/// The role each predicted name plays, in the same order as
/// [`predicted_vm_names`] for the same cluster.
fn predicted_roles(cluster: &ClusterSpec) -> Vec<NodeRole> {
    cluster.topology.roles_for(cluster.cluster_type)
}

/// Resolves the ordered `(name, role, ip)` triples for one cluster,
/// allocating fresh sequential IPs unless the cluster already carries
/// explicit, pre-resolved `vms`.
fn resolve_cluster_vms(cluster: &ClusterSpec) -> Result<Vec<VmConfig>, IpError> {
    if !cluster.vms.is_empty() {
        return Ok(cluster.vms.clone());
    }
    let names = predicted_vm_names(cluster);
    let roles = predicted_roles(cluster);
    let start: Ipv4Addr = cluster
        .first_ip
        .expect("semantic validator guarantees first_ip is set before planning");
    let ips = ip_allocator::allocate(start, names.len() as u32)?;

    Ok(names
        .into_iter()
        .zip(roles)
        .zip(ips)
        .map(|((name, role), ip)| VmConfig::new(name, role, ip, cluster.size_profile))
        .collect())
}

/// Builds the shared (cluster-level) env map entries, per spec.md §4.4 step 3.
fn cluster_env(cluster: &ClusterSpec, module: &ModuleInfo) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert("CLUSTER_NAME".to_string(), cluster.name.clone());
    env.insert("NAMESPACE_DEFAULT".to_string(), module.namespace());
    env.insert("CLUSTER_TYPE".to_string(), cluster.cluster_type.id().to_string());
    env.insert("K8S_VERSION".to_string(), k8s_version().to_string());
    if let Some(pod) = cluster.pod_network {
        env.insert("K8S_POD_CIDR".to_string(), pod.to_string());
    }
    if let Some(svc) = cluster.svc_network {
        env.insert("K8S_SVC_CIDR".to_string(), svc.to_string());
    }
    if let Some(cni) = cluster.cni {
        env.insert("CNI_TYPE".to_string(), cni.id().to_string());
    }
    env
}

/// Converts the validated, defaulted cluster set into a render-ready
/// [`ScaffoldPlan`]. Clusters are expected in their final stable order
/// (bastion, if any, already first — §4.4 step 2 is satisfied upstream by
/// [`crate::defaults::apply_defaults`], which prepends the bastion cluster).
pub fn build(module: &ModuleInfo, clusters: &[ClusterSpec]) -> Result<ScaffoldPlan, IpError> {
    let mut vms = Vec::new();
    let mut env_vars = BTreeMap::new();
    let mut per_vm_env = BTreeMap::new();
    let mut providers = BTreeSet::new();

    for cluster in clusters {
        let resolved = resolve_cluster_vms(cluster)?;

        for vm in &resolved {
            let mut vm_env = BTreeMap::new();
            vm_env.insert("NODE_ROLE".to_string(), vm.role.id().to_string());
            per_vm_env.insert(vm.name.clone(), vm_env);

            vms.push(PlannedVm {
                vm: vm.clone(),
                cluster_name: cluster.name.clone(),
                cluster_type: cluster.cluster_type,
            });
        }

        env_vars.insert(cluster.name.clone(), cluster_env(cluster, module));

        if let Some(mgmt) = &cluster.management {
            providers.extend(mgmt.providers.iter().copied());
        }
    }

    Ok(ScaffoldPlan {
        module: module.clone(),
        vms,
        env_vars,
        per_vm_env,
        providers,
    })
}
