//! SemanticValidator (§4.3): per-cluster rules. Runs only once the
//! structural layer is empty (enforced by the pipeline driver, not here).

use super::error::{ValidationError, ValidationLevel, ValidationResult};
use crate::model::{ClusterSpec, ClusterType, SizeProfile, Tool};
use regex::Regex;
use std::sync::OnceLock;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap())
}

/// Tools never allowed on a `None`/bastion-style management cluster.
const FORBIDDEN_ON_MANAGEMENT: &[Tool] = &[Tool::Minikube, Tool::Kind, Tool::K3s, Tool::KubeBinaries];

pub fn check(clusters: &[ClusterSpec], is_multi_cluster: bool) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for (index, cluster) in clusters.iter().enumerate() {
        let path = |field: &str| format!("clusters[{index}].{field}");

        if !name_re().is_match(&cluster.name) {
            result.push(ValidationError::new(
                path("name"),
                ValidationLevel::Semantic,
                format!("cluster name '{}' must match [a-z][a-z0-9-]*", cluster.name),
                "use lowercase letters, digits and dashes only",
            ));
        }

        check_engine_role_consistency(&mut result, &path, cluster);

        match cluster.cluster_type {
            ClusterType::Kubeadm => {
                if cluster.topology.masters < 1 {
                    result.push(ValidationError::new(
                        path("topology"),
                        ValidationLevel::Semantic,
                        "kubeadm requires at least one master",
                        "set --nodes with at least 1 master, e.g. 1m,2w",
                    ));
                }
                if cluster.cni.is_none() {
                    result.push(ValidationError::new(
                        path("cni"),
                        ValidationLevel::Semantic,
                        "kubeadm clusters must set a CNI",
                        "pass --cni or rely on the calico default",
                    ));
                }
            }
            _ => {
                if cluster.cni.is_some() {
                    result.push(ValidationError::new(
                        path("cni"),
                        ValidationLevel::Semantic,
                        format!("CNI must not be set for engine '{}'", cluster.cluster_type),
                        "remove --cni for this engine",
                    ));
                }
            }
        }

        if is_multi_cluster && cluster.first_ip.is_none() {
            result.push(ValidationError::new(
                path("first_ip"),
                ValidationLevel::Semantic,
                "multi-cluster mode requires first_ip on every cluster",
                "add an ip to this cluster entry",
            ));
        }

        if cluster.cluster_type == ClusterType::Minikube {
            // All SizeProfile defaults already satisfy the >= 2 vCPU floor;
            // this only bites when an explicit vm overrides cpu below it.
            for vm in cluster.vms.iter().filter(|v| v.effective_cpu() < 2) {
                result.push(ValidationError::new(
                    path("vms"),
                    ValidationLevel::Semantic,
                    format!("minikube vm '{}' has {} vCPU, must be >= 2", vm.name, vm.effective_cpu()),
                    "raise cpu_override to at least 2",
                ));
            }
        }

        if let Some(mgmt) = &cluster.management {
            for tool in mgmt.tools_missing_provider() {
                result.push(ValidationError::new(
                    path("management.tools"),
                    ValidationLevel::Semantic,
                    format!("tool '{tool}' requires a matching cloud provider"),
                    format!("pass --azure/--aws/--gcp matching '{tool}'"),
                ));
            }
            if cluster.cluster_type == ClusterType::None {
                for tool in &mgmt.tools {
                    if FORBIDDEN_ON_MANAGEMENT.contains(tool) {
                        result.push(ValidationError::new(
                            path("management.tools"),
                            ValidationLevel::Semantic,
                            format!("Tool '{tool}' not allowed for engine 'none'"),
                            "remove this tool from --tools or pick a cluster engine",
                        ));
                    }
                }
            }
        }
    }
    result
}

fn check_engine_role_consistency(
    result: &mut ValidationResult,
    path: &impl Fn(&str) -> String,
    cluster: &ClusterSpec,
) {
    if cluster.vms.is_empty() {
        return; // roles haven't been expanded yet; nothing to cross check
    }
    let disallowed: &[crate::model::NodeRole] = match cluster.cluster_type {
        ClusterType::None | ClusterType::Kind | ClusterType::Minikube => {
            &[crate::model::NodeRole::Master, crate::model::NodeRole::Worker]
        }
        ClusterType::Kubeadm => &[crate::model::NodeRole::Cluster, crate::model::NodeRole::Management],
    };
    for vm in &cluster.vms {
        if disallowed.contains(&vm.role) {
            result.push(ValidationError::new(
                path("vms"),
                ValidationLevel::Semantic,
                format!("role '{}' is not allowed for engine '{}'", vm.role, cluster.cluster_type),
                "fix the role assigned to this vm",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CniType, Management, NodeTopology};

    #[test]
    fn kubeadm_without_cni_is_flagged() {
        let cluster = ClusterSpec::kubeadm(
            "dev",
            Some("192.168.56.10".parse().unwrap()),
            NodeTopology::new(1, 0),
            SizeProfile::Medium,
            None,
            None,
            None,
        )
        .unwrap();
        let result = check(&[cluster], false);
        assert!(result.errors().iter().any(|e| e.field_path.ends_with("cni")));
    }

    #[test]
    fn non_kubeadm_with_cni_is_flagged() {
        let cluster = ClusterSpec::single_node("dev", ClusterType::Kind, None, SizeProfile::Medium)
            .unwrap();
        let mut cluster = cluster;
        cluster.cni = Some(CniType::Flannel);
        let result = check(&[cluster], false);
        assert!(result.errors().iter().any(|e| e.message.contains("must not be set")));
    }

    #[test]
    fn minikube_vm_cpu_override_below_floor_is_flagged() {
        use crate::model::{NodeRole, VmConfig};
        let cluster = ClusterSpec::single_node("dev", ClusterType::Minikube, None, SizeProfile::Small)
            .unwrap()
            .with_vms(vec![VmConfig::new(
                "minikube",
                NodeRole::Cluster,
                "192.168.56.10".parse().unwrap(),
                SizeProfile::Small,
            )
            .with_cpu_override(1)]);
        let result = check(&[cluster], false);
        assert!(result.errors().iter().any(|e| e.message.contains("vCPU")));
    }

    #[test]
    fn minikube_default_size_profiles_all_satisfy_floor() {
        let cluster =
            ClusterSpec::single_node("dev", ClusterType::Minikube, None, SizeProfile::Small).unwrap();
        assert!(check(&[cluster], false).is_valid());
    }

    #[test]
    fn multi_cluster_requires_first_ip() {
        let cluster =
            ClusterSpec::single_node("dev", ClusterType::Kind, None, SizeProfile::Medium).unwrap();
        let result = check(&[cluster], true);
        assert!(result.errors().iter().any(|e| e.field_path.ends_with("first_ip")));
    }

    #[test]
    fn minikube_tool_forbidden_on_none_engine() {
        let mgmt = Management::new().with_tools([Tool::Minikube].into());
        let cluster = ClusterSpec::management("bastion", None, SizeProfile::Medium, mgmt).unwrap();
        let result = check(&[cluster], false);
        assert!(result
            .errors()
            .iter()
            .any(|e| e.message.contains("Tool 'minikube' not allowed for engine 'none'")));
    }
}
