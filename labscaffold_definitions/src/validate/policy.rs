//! PolicyValidator (§4.3): cross-cluster rules. Runs only once the semantic
//! layer is empty.

use super::error::{ValidationError, ValidationLevel, ValidationResult};
use crate::model::ClusterSpec;
use crate::plan::ip_allocator;
use std::collections::BTreeSet;

const MAX_TOTAL_VMS: u32 = 50;
const WARN_TOTAL_VMS: u32 = 40;
const MAX_VMS_PER_CLUSTER: u32 = 20;

pub fn check(clusters: &[ClusterSpec]) -> ValidationResult {
    let mut result = ValidationResult::ok();

    check_unique_cluster_names(&mut result, clusters);
    check_unique_vm_names(&mut result, clusters);
    check_ip_range_overlap(&mut result, clusters);
    check_cidr_overlap(&mut result, clusters);
    check_vm_counts(&mut result, clusters);

    result
}

fn predicted_node_count(cluster: &ClusterSpec) -> u32 {
    if !cluster.vms.is_empty() {
        cluster.vms.len() as u32
    } else {
        match cluster.cluster_type {
            crate::model::ClusterType::Kubeadm => cluster.topology.total(),
            crate::model::ClusterType::None | crate::model::ClusterType::Kind | crate::model::ClusterType::Minikube => 1,
        }
    }
}

fn check_unique_cluster_names(result: &mut ValidationResult, clusters: &[ClusterSpec]) {
    let mut seen = BTreeSet::new();
    for cluster in clusters {
        if !seen.insert(cluster.name.as_str()) {
            result.push(ValidationError::new(
                "clusters",
                ValidationLevel::Policy,
                format!("Duplicate cluster name: {}", cluster.name),
                "give each cluster entry a unique name",
            ));
        }
    }
}

fn check_unique_vm_names(result: &mut ValidationResult, clusters: &[ClusterSpec]) {
    let mut seen = BTreeSet::new();
    for cluster in clusters {
        let names = if !cluster.vms.is_empty() {
            cluster.vms.iter().map(|v| v.name.clone()).collect::<Vec<_>>()
        } else {
            crate::plan::builder::predicted_vm_names(cluster)
        };
        for name in names {
            if !seen.insert(name.clone()) {
                result.push(ValidationError::new(
                    "clusters",
                    ValidationLevel::Policy,
                    format!("Duplicate vm name across clusters: {name}"),
                    "rename the clashing vm or cluster",
                ));
            }
        }
    }
}

fn check_ip_range_overlap(result: &mut ValidationResult, clusters: &[ClusterSpec]) {
    let mut ranges: Vec<(String, std::ops::RangeInclusive<u32>)> = Vec::new();
    for cluster in clusters {
        let Some(first_ip) = cluster.first_ip else { continue };
        let total = predicted_node_count(cluster).max(1);
        let Ok(addrs) = ip_allocator::allocate(first_ip, total) else {
            continue; // IpExhausted is reported by the PlanBuilder stage, not here
        };
        let start = u32::from(*addrs.first().unwrap());
        let end = u32::from(*addrs.last().unwrap());
        ranges.push((cluster.name.clone(), start..=end));
    }
    for i in 0..ranges.len() {
        for j in (i + 1)..ranges.len() {
            let (name_a, range_a) = &ranges[i];
            let (name_b, range_b) = &ranges[j];
            if range_a.start() <= range_b.end() && range_b.start() <= range_a.end() {
                result.push(ValidationError::new(
                    "clusters",
                    ValidationLevel::Policy,
                    format!("first_ip range overlap between '{name_a}' and '{name_b}'"),
                    "pick non-overlapping --first-ip starting addresses",
                ));
            }
        }
    }
}

fn check_cidr_overlap(result: &mut ValidationResult, clusters: &[ClusterSpec]) {
    check_network_kind_overlap(result, clusters, "pod_network", |c| c.pod_network);
    check_network_kind_overlap(result, clusters, "svc_network", |c| c.svc_network);
}

fn check_network_kind_overlap(
    result: &mut ValidationResult,
    clusters: &[ClusterSpec],
    kind: &str,
    get: impl Fn(&ClusterSpec) -> Option<crate::model::NetworkCidr>,
) {
    let entries: Vec<(&str, crate::model::NetworkCidr)> = clusters
        .iter()
        .filter_map(|c| get(c).map(|net| (c.name.as_str(), net)))
        .collect();
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let (name_a, net_a) = entries[i];
            let (name_b, net_b) = entries[j];
            if net_a.overlaps(&net_b) {
                result.push(ValidationError::new(
                    "clusters",
                    ValidationLevel::Policy,
                    format!("{kind} overlap between '{name_a}' and '{name_b}'"),
                    format!("give each cluster a distinct {kind}"),
                ));
            }
        }
    }
}

fn check_vm_counts(result: &mut ValidationResult, clusters: &[ClusterSpec]) {
    let mut total = 0u32;
    for cluster in clusters {
        let count = predicted_node_count(cluster);
        total += count;
        if count > MAX_VMS_PER_CLUSTER {
            result.push(ValidationError::new(
                "clusters",
                ValidationLevel::Policy,
                format!("cluster '{}' has {count} vms, exceeding the per-cluster limit of {MAX_VMS_PER_CLUSTER}", cluster.name),
                "reduce node counts for this cluster",
            ));
        }
    }
    if total > MAX_TOTAL_VMS {
        result.push(ValidationError::new(
            "clusters",
            ValidationLevel::Policy,
            format!("total vm count {total} exceeds the hard limit of {MAX_TOTAL_VMS}"),
            "reduce the number of clusters or nodes per cluster",
        ));
    } else if total >= WARN_TOTAL_VMS {
        result.push(ValidationError::new(
            "clusters",
            ValidationLevel::Policy,
            format!("total vm count {total} is approaching the hard limit of {MAX_TOTAL_VMS}"),
            "consider a smaller size profile or fewer nodes",
        ));
    }
}
