//! Three-layer validator driver (§4.3). Layers run in order; the driver only
//! advances to the next layer once the prior one is empty, so semantic
//! checks never see a structurally impossible input and policy checks never
//! see a semantically impossible one.

pub mod error;
pub mod policy;
pub mod semantic;
pub mod structural;

pub use error::{ValidationError, ValidationLevel, ValidationResult};

use crate::model::ClusterSpec;

/// Runs structural, then semantic, then policy checks, stopping at the first
/// non-empty layer.
pub fn validate(clusters: Option<&[ClusterSpec]>, is_multi_cluster: bool) -> ValidationResult {
    let structural_result = structural::check(clusters);
    if !structural_result.is_valid() {
        return structural_result;
    }

    let clusters = clusters.expect("structural::check already rejected the None case above");

    let semantic_result = semantic::check(clusters, is_multi_cluster);
    if !semantic_result.is_valid() {
        return semantic_result;
    }

    policy::check(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CniType, ClusterSpec, NodeTopology, SizeProfile};

    #[test]
    fn none_input_short_circuits_at_structural() {
        let result = validate(None, false);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].level, ValidationLevel::Structural);
    }

    #[test]
    fn semantic_errors_hide_policy_errors_on_the_same_run() {
        // Two clusters with the same (invalid) name: a semantic name-format
        // violation and a policy duplicate-name violation both exist, but the
        // driver must stop at semantic and never reach policy.
        let a = ClusterSpec::kubeadm(
            "BAD",
            Some("192.168.56.10".parse().unwrap()),
            NodeTopology::new(1, 0),
            SizeProfile::Medium,
            Some(CniType::Calico),
            None,
            None,
        )
        .unwrap();
        let b = ClusterSpec::kubeadm(
            "BAD",
            Some("192.168.56.110".parse().unwrap()),
            NodeTopology::new(1, 0),
            SizeProfile::Medium,
            Some(CniType::Calico),
            None,
            None,
        )
        .unwrap();
        let result = validate(Some(&[a, b]), false);
        assert!(result.errors().iter().all(|e| e.level == ValidationLevel::Semantic));
        assert!(!result.errors().iter().any(|e| e.message.contains("Duplicate cluster name")));
    }

    #[test]
    fn fully_valid_single_cluster_passes_all_layers() {
        let cluster = ClusterSpec::kubeadm(
            "dev",
            Some("192.168.56.10".parse().unwrap()),
            NodeTopology::new(1, 0),
            SizeProfile::Medium,
            Some(CniType::Calico),
            None,
            None,
        )
        .unwrap();
        assert!(validate(Some(&[cluster]), false).is_valid());
    }
}
