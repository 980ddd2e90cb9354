use super::cluster_type::ClusterType;
use super::cni::CniType;
use super::management::Management;
use super::network::NetworkCidr;
use super::node::NodeTopology;
use super::size::SizeProfile;
use super::vm::VmConfig;
use std::net::Ipv4Addr;

/// One cluster's worth of desired state, pre-validation.
///
/// Narrow, per-engine constructors replace a generic builder (§9): callers
/// build a `ClusterSpec` through [`ClusterSpec::kubeadm`], [`ClusterSpec::single_node`]
/// or [`ClusterSpec::management`], each of which only accepts the fields
/// relevant to that engine. Construction enforces structural invariants
/// only; cross-entity rules belong to the validators (§4.3).
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub name: String,
    pub cluster_type: ClusterType,
    pub first_ip: Option<Ipv4Addr>,
    pub topology: NodeTopology,
    pub size_profile: SizeProfile,
    pub vms: Vec<VmConfig>,
    pub cni: Option<CniType>,
    pub pod_network: Option<NetworkCidr>,
    pub svc_network: Option<NetworkCidr>,
    pub management: Option<Management>,
}

impl ClusterSpec {
    fn base(name: impl Into<String>, cluster_type: ClusterType, size_profile: SizeProfile) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("cluster name must not be empty".into());
        }
        Ok(ClusterSpec {
            name,
            cluster_type,
            first_ip: None,
            topology: NodeTopology::zero(),
            size_profile,
            vms: Vec::new(),
            cni: None,
            pod_network: None,
            svc_network: None,
            management: None,
        })
    }

    /// Build a `Kubeadm` cluster spec. `topology` must satisfy
    /// `masters + workers > 0` (checked here, structurally).
    pub fn kubeadm(
        name: impl Into<String>,
        first_ip: Option<Ipv4Addr>,
        topology: NodeTopology,
        size_profile: SizeProfile,
        cni: Option<CniType>,
        pod_network: Option<NetworkCidr>,
        svc_network: Option<NetworkCidr>,
    ) -> Result<Self, String> {
        let mut spec = ClusterSpec::base(name, ClusterType::Kubeadm, size_profile)?;
        topology.validate_for(ClusterType::Kubeadm)?;
        spec.first_ip = first_ip;
        spec.topology = topology;
        spec.cni = cni;
        spec.pod_network = pod_network;
        spec.svc_network = svc_network;
        Ok(spec)
    }

    /// Build a single-VM cluster spec for `Kind` or `Minikube`.
    pub fn single_node(
        name: impl Into<String>,
        cluster_type: ClusterType,
        first_ip: Option<Ipv4Addr>,
        size_profile: SizeProfile,
    ) -> Result<Self, String> {
        if cluster_type.supports_multi_node() {
            return Err(format!("{cluster_type} is not a single-node engine"));
        }
        let mut spec = ClusterSpec::base(name, cluster_type, size_profile)?;
        spec.first_ip = first_ip;
        Ok(spec)
    }

    /// Build a `None`-engine management/bastion-only spec.
    pub fn management(
        name: impl Into<String>,
        first_ip: Option<Ipv4Addr>,
        size_profile: SizeProfile,
        management: Management,
    ) -> Result<Self, String> {
        let mut spec = ClusterSpec::base(name, ClusterType::None, size_profile)?;
        spec.first_ip = first_ip;
        spec.management = Some(management);
        Ok(spec)
    }

    /// Explicit VM overrides, only meaningful when the caller pre-resolved
    /// names (tested/validated by [`crate::validate::structural`]).
    pub fn with_vms(mut self, vms: Vec<VmConfig>) -> Self {
        self.vms = vms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kubeadm_rejects_zero_topology() {
        let err = ClusterSpec::kubeadm(
            "dev",
            None,
            NodeTopology::zero(),
            SizeProfile::Medium,
            Some(CniType::Calico),
            None,
            None,
        )
        .unwrap_err();
        assert!(err.contains("masters + workers"));
    }

    #[test]
    fn single_node_rejects_kubeadm() {
        assert!(ClusterSpec::single_node("dev", ClusterType::Kubeadm, None, SizeProfile::Medium).is_err());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(ClusterSpec::single_node("", ClusterType::Kind, None, SizeProfile::Medium).is_err());
    }
}
