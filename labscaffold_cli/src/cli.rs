//! Command-line argument grammar (spec.md §6):
//!
//! ```text
//! program --module <mN> --type <tag> <engine> [--size small|medium|large]
//!         [--nodes <Xm,Yw>] [--cni <calico|flannel|weave|cilium|antrea>]
//!         [--first-ip <IPv4>] [--out <dir>] [--force] [--dry-run]
//!         [--azure] [--tools <csv>]
//!         [--clusters <spec>] [--bastion]
//! ```
//!
//! `<engine>` is positional. Parsing only validates shape here (unknown
//! engine/size/cni names, malformed IPs); everything cross-field belongs to
//! [`labscaffold_definitions::validate`].

use crate::clusters_spec;
use clap::Parser;
use labscaffold_definitions::{CloudProvider, ClusterType, CniType, NodeTopology, SizeProfile, Tool};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

#[derive(Parser, Debug)]
#[command(
    name = "labscaffold",
    author,
    version,
    about = "Generate a local Kubernetes learning environment from a module, type and engine"
)]
pub struct Cli {
    /// Module number, e.g. `m1`.
    #[arg(long)]
    pub module: String,

    /// Module type tag, e.g. `pt`.
    #[arg(long = "type")]
    pub type_tag: String,

    /// Cluster engine.
    #[arg(value_parser = parse_engine)]
    pub engine: ClusterType,

    /// VM resource profile.
    #[arg(long, value_parser = parse_size)]
    pub size: Option<SizeProfile>,

    /// Kubeadm node topology, e.g. `1m,2w`.
    #[arg(long, value_parser = clusters_spec::parse_topology)]
    pub nodes: Option<NodeTopology>,

    /// CNI plugin (kubeadm only).
    #[arg(long, value_parser = parse_cni)]
    pub cni: Option<CniType>,

    /// Starting IPv4 address for sequential allocation.
    #[arg(long = "first-ip")]
    pub first_ip: Option<Ipv4Addr>,

    /// Output directory; defaults to `{type}-{num}`.
    #[arg(long)]
    pub out: Option<String>,

    /// Overwrite drifted regeneratable files instead of refusing to run.
    #[arg(long)]
    pub force: bool,

    /// Render without writing anything to disk.
    #[arg(long)]
    pub dry_run: bool,

    /// Configure management tooling for Azure.
    #[arg(long)]
    pub azure: bool,

    /// Comma-separated extra tools to install on the management VM.
    #[arg(long)]
    pub tools: Option<String>,

    /// Multi-cluster spec: CSV, JSON, YAML, or `@path/to/file`.
    #[arg(long)]
    pub clusters: Option<String>,

    /// Prepend a management/bastion VM ahead of the requested engine cluster.
    #[arg(long)]
    pub bastion: bool,

    /// Increase logging verbosity (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses `--tools` into the model's [`Tool`] set, rejecting unknown names.
    pub fn tools(&self) -> Result<BTreeSet<Tool>, String> {
        let Some(raw) = &self.tools else { return Ok(BTreeSet::new()) };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Tool::parse(s).ok_or_else(|| format!("unknown tool '{s}'")))
            .collect()
    }

    /// The cloud-provider set implied by `--azure` (the only provider flag
    /// spec.md §6 exposes; `--aws`/`--gcp` are not part of this CLI's shape).
    pub fn cloud_providers(&self) -> BTreeSet<CloudProvider> {
        let mut providers = BTreeSet::new();
        if self.azure {
            providers.insert(CloudProvider::Azure);
        }
        providers
    }
}

fn parse_engine(s: &str) -> Result<ClusterType, String> {
    ClusterType::parse(s).ok_or_else(|| format!("unknown engine '{s}', expected kind|minikube|kubeadm|none"))
}

fn parse_size(s: &str) -> Result<SizeProfile, String> {
    SizeProfile::parse(s).ok_or_else(|| format!("unknown size '{s}', expected small|medium|large"))
}

fn parse_cni(s: &str) -> Result<CniType, String> {
    CniType::parse(s).ok_or_else(|| format!("unknown cni '{s}', expected calico|flannel|weave|cilium|antrea"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_parses() {
        let cli = Cli::parse_from(["labscaffold", "--module", "m1", "--type", "pt", "minikube"]);
        assert_eq!(cli.engine, ClusterType::Minikube);
        assert_eq!(cli.module, "m1");
        assert_eq!(cli.type_tag, "pt");
        assert!(!cli.force);
    }

    #[test]
    fn nodes_flag_parses_topology() {
        let cli = Cli::parse_from([
            "labscaffold", "--module", "m7", "--type", "hw", "kubeadm", "--nodes", "1m,2w",
        ]);
        assert_eq!(cli.nodes, Some(NodeTopology::new(1, 2)));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let result = Cli::try_parse_from(["labscaffold", "--module", "m1", "--type", "pt", "bogus"]);
        assert!(result.is_err());
    }

    #[test]
    fn tools_csv_is_parsed_into_a_set() {
        let cli = Cli::parse_from([
            "labscaffold", "--module", "m9", "--type", "pt", "none", "--tools", "kubectl, helm",
        ]);
        let tools = cli.tools().unwrap();
        assert!(tools.contains(&Tool::Kubectl));
        assert!(tools.contains(&Tool::Helm));
    }

    #[test]
    fn azure_flag_adds_the_provider() {
        let cli = Cli::parse_from(["labscaffold", "--module", "m1", "--type", "pt", "none", "--azure"]);
        assert!(cli.cloud_providers().contains(&CloudProvider::Azure));
    }
}
