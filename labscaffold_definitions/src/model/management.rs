use std::collections::BTreeSet;

/// A cloud provider a `Management` VM is configured to operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CloudProvider {
    Azure,
    Aws,
    Gcp,
}

impl CloudProvider {
    pub fn id(&self) -> &'static str {
        match self {
            CloudProvider::Azure => "azure",
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
        }
    }

    /// Normalises a free-form string (any case) to a known provider.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "azure" => Some(CloudProvider::Azure),
            "aws" => Some(CloudProvider::Aws),
            "gcp" => Some(CloudProvider::Gcp),
            _ => None,
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A tool the generated scripts install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    Kubectl,
    Helm,
    AzureCli,
    AwsCli,
    Gcloud,
    KubeBinaries,
    Kind,
    K3s,
    Docker,
    Containerd,
    Minikube,
}

impl Tool {
    pub fn id(&self) -> &'static str {
        match self {
            Tool::Kubectl => "kubectl",
            Tool::Helm => "helm",
            Tool::AzureCli => "azure_cli",
            Tool::AwsCli => "aws_cli",
            Tool::Gcloud => "gcloud",
            Tool::KubeBinaries => "kube_binaries",
            Tool::Kind => "kind",
            Tool::K3s => "k3s",
            Tool::Docker => "docker",
            Tool::Containerd => "containerd",
            Tool::Minikube => "minikube",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kubectl" => Some(Tool::Kubectl),
            "helm" => Some(Tool::Helm),
            "azure_cli" => Some(Tool::AzureCli),
            "aws_cli" => Some(Tool::AwsCli),
            "gcloud" => Some(Tool::Gcloud),
            "kube_binaries" => Some(Tool::KubeBinaries),
            "kind" => Some(Tool::Kind),
            "k3s" => Some(Tool::K3s),
            "docker" => Some(Tool::Docker),
            "containerd" => Some(Tool::Containerd),
            "minikube" => Some(Tool::Minikube),
            _ => None,
        }
    }

    /// Whether this tool's install script needs a matching `CloudProvider`.
    pub fn requires_cloud_provider(&self) -> bool {
        matches!(self, Tool::AzureCli | Tool::AwsCli | Tool::Gcloud)
    }

    pub fn matching_provider(&self) -> Option<CloudProvider> {
        match self {
            Tool::AzureCli => Some(CloudProvider::Azure),
            Tool::AwsCli => Some(CloudProvider::Aws),
            Tool::Gcloud => Some(CloudProvider::Gcp),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A management/bastion VM record: the set of clouds it talks to, whether it
/// aggregates kubeconfigs from the clusters it manages, and the tool set to
/// install on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Management {
    pub name: Option<String>,
    pub providers: BTreeSet<CloudProvider>,
    pub aggregate_kubeconfigs: bool,
    pub tools: BTreeSet<Tool>,
}

impl Management {
    pub fn new() -> Self {
        Management::default()
    }

    pub fn with_providers(mut self, providers: BTreeSet<CloudProvider>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_tools(mut self, tools: BTreeSet<Tool>) -> Self {
        self.tools = tools;
        self
    }

    /// Tools in this record's set that require a cloud provider but whose
    /// provider is missing from `self.providers`.
    pub fn tools_missing_provider(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .copied()
            .filter(|t| {
                t.requires_cloud_provider()
                    && !t
                        .matching_provider()
                        .map(|p| self.providers.contains(&p))
                        .unwrap_or(false)
            })
            .collect()
    }
}
