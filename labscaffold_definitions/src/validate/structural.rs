//! StructuralValidator (§4.3). Most structural invariants already manifest
//! at construction (value-object constructors bail on malformed input); this
//! layer cross-checks invariants that span more than one field of an
//! already-constructed `ClusterSpec`.

use super::error::{ValidationError, ValidationLevel, ValidationResult};
use crate::model::{ClusterSpec, NodeRole};
use std::collections::BTreeSet;

pub fn check(clusters: Option<&[ClusterSpec]>) -> ValidationResult {
    let Some(clusters) = clusters else {
        return ValidationResult::ok().with_error(ValidationError::new(
            "cluster",
            ValidationLevel::Structural,
            "null spec",
            "supply at least one cluster",
        ));
    };

    let mut result = ValidationResult::ok();
    for (index, cluster) in clusters.iter().enumerate() {
        if cluster.vms.is_empty() {
            continue; // nothing explicit to cross-check yet; PlanBuilder fills these in
        }

        let masters = cluster.vms.iter().filter(|v| v.role == NodeRole::Master).count() as u32;
        let workers = cluster.vms.iter().filter(|v| v.role == NodeRole::Worker).count() as u32;
        if masters != cluster.topology.masters || workers != cluster.topology.workers {
            result.push(ValidationError::new(
                format!("clusters[{index}].vms"),
                ValidationLevel::Structural,
                format!(
                    "explicit vms have {masters} master(s)/{workers} worker(s) but topology declares {}m/{}w",
                    cluster.topology.masters, cluster.topology.workers
                ),
                "make the explicit vm list match the declared topology",
            ));
        }

        let mut seen = BTreeSet::new();
        for vm in &cluster.vms {
            if !seen.insert(vm.name.as_str()) {
                result.push(ValidationError::new(
                    format!("clusters[{index}].vms"),
                    ValidationLevel::Structural,
                    format!("duplicate vm name '{}' within cluster '{}'", vm.name, cluster.name),
                    "rename one of the duplicate vms",
                ));
            }
        }
    }
    result
}
