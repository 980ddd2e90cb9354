use super::management::Tool;
use std::collections::BTreeSet;

/// The cluster runtime kind. Re-encoded as a sealed sum type (§9) so that
/// every call site is forced to pattern-match exhaustively rather than
/// dispatching through an abstract base class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusterType {
    Kind,
    Minikube,
    Kubeadm,
    None,
}

impl ClusterType {
    /// Stable lowercase identifier, used in cluster/VM naming.
    pub fn id(&self) -> &'static str {
        match self {
            ClusterType::Kind => "kind",
            ClusterType::Minikube => "minikube",
            ClusterType::Kubeadm => "kubeadm",
            ClusterType::None => "none",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClusterType::Kind => "kind",
            ClusterType::Minikube => "Minikube",
            ClusterType::Kubeadm => "kubeadm",
            ClusterType::None => "Management only",
        }
    }

    pub fn supports_multi_node(&self) -> bool {
        matches!(self, ClusterType::Kubeadm)
    }

    pub fn supports_roles(&self) -> bool {
        matches!(self, ClusterType::Kubeadm)
    }

    /// Tools every cluster of this type requires regardless of `--tools`.
    pub fn required_tools(&self) -> BTreeSet<Tool> {
        match self {
            ClusterType::Kind => [Tool::Kubectl, Tool::Docker, Tool::Kind].into(),
            ClusterType::Minikube => [Tool::Kubectl, Tool::Docker, Tool::Minikube].into(),
            ClusterType::Kubeadm => [Tool::Kubectl, Tool::Containerd, Tool::KubeBinaries].into(),
            ClusterType::None => [Tool::Kubectl].into(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kind" => Some(ClusterType::Kind),
            "minikube" => Some(ClusterType::Minikube),
            "kubeadm" => Some(ClusterType::Kubeadm),
            "none" => Some(ClusterType::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClusterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_kubeadm_supports_roles_and_multi_node() {
        for ct in [ClusterType::Kind, ClusterType::Minikube, ClusterType::None] {
            assert!(!ct.supports_multi_node());
            assert!(!ct.supports_roles());
        }
        assert!(ClusterType::Kubeadm.supports_multi_node());
        assert!(ClusterType::Kubeadm.supports_roles());
    }

    #[test]
    fn parses_known_ids() {
        assert_eq!(ClusterType::parse("kind"), Some(ClusterType::Kind));
        assert_eq!(ClusterType::parse("bogus"), None);
    }
}
