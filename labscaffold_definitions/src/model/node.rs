use super::cluster_type::ClusterType;

/// The role a VM plays within its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRole {
    Management,
    Cluster,
    Master,
    Worker,
}

impl NodeRole {
    pub fn id(&self) -> &'static str {
        match self {
            NodeRole::Management => "management",
            NodeRole::Cluster => "cluster",
            NodeRole::Master => "master",
            NodeRole::Worker => "worker",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Master/worker counts for a `Kubeadm` cluster.
///
/// Structural invariant: both fields are non-negative by type (`u32`);
/// `Kubeadm` additionally requires `masters + workers > 0`, enforced by
/// [`NodeTopology::for_cluster_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeTopology {
    pub masters: u32,
    pub workers: u32,
}

impl NodeTopology {
    pub fn new(masters: u32, workers: u32) -> Self {
        NodeTopology { masters, workers }
    }

    pub fn zero() -> Self {
        NodeTopology::default()
    }

    pub fn total(&self) -> u32 {
        self.masters + self.workers
    }

    /// Applies the per-`ClusterType` assignment rule from spec.md §3.
    ///
    /// Returns `Err` for `Kubeadm` with `masters + workers == 0`; non-kubeadm
    /// engines accept any topology structurally (semantic rejection of a
    /// non-zero topology on those engines is a [`crate::validate`] concern,
    /// not a constructor concern).
    pub fn validate_for(&self, cluster_type: ClusterType) -> Result<(), String> {
        if cluster_type == ClusterType::Kubeadm && self.total() == 0 {
            return Err("kubeadm clusters require masters + workers > 0".into());
        }
        Ok(())
    }

    /// The flat, ordered list of roles this topology expands to for `cluster_type`.
    pub fn roles_for(&self, cluster_type: ClusterType) -> Vec<NodeRole> {
        match cluster_type {
            ClusterType::None => vec![NodeRole::Management],
            ClusterType::Kind | ClusterType::Minikube => vec![NodeRole::Cluster],
            ClusterType::Kubeadm => {
                let mut roles = Vec::with_capacity(self.total() as usize);
                roles.extend(std::iter::repeat(NodeRole::Master).take(self.masters as usize));
                roles.extend(std::iter::repeat(NodeRole::Worker).take(self.workers as usize));
                roles
            }
        }
    }
}
