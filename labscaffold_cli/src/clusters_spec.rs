//! `--clusters <spec>` parsing (spec.md §6): CSV, JSON, YAML, or `@file`,
//! detected from the raw string rather than a separate flag.

use labscaffold_definitions::{ClusterEntry, CniType, NodeTopology};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ClustersSpecError {
    #[error("failed to read clusters spec file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(String),
}

/// One `--clusters` entry before it is turned into a [`ClusterEntry`]. Shared
/// shape across the JSON and YAML encodings (spec.md §6's "Input spec
/// fields"): `name` (required), `cni` (required for kubeadm clusters), `ip`
/// (required), `nodes` (optional, kubeadm only).
#[derive(Debug, Deserialize)]
struct ClusterEntryDto {
    name: String,
    cni: Option<String>,
    ip: Option<String>,
    nodes: Option<String>,
}

impl ClusterEntryDto {
    fn into_entry(self) -> Result<ClusterEntry, ClustersSpecError> {
        let mut entry = ClusterEntry::new(self.name);
        if let Some(cni) = self.cni {
            entry.cni = Some(parse_cni(&cni)?);
        }
        if let Some(ip) = self.ip {
            entry.first_ip = Some(
                ip.parse()
                    .map_err(|_| ClustersSpecError::Parse(format!("'{ip}' is not a valid IPv4 address")))?,
            );
        }
        if let Some(nodes) = self.nodes {
            entry.topology = Some(parse_topology(&nodes)?);
        }
        Ok(entry)
    }
}

fn node_topology_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)m,(\d+)w$").unwrap())
}

/// Parses the `Xm,Yw` node-topology token shared by `--nodes` and the
/// `--clusters` CSV/JSON/YAML `nodes` field.
pub fn parse_topology(s: &str) -> Result<NodeTopology, String> {
    let caps = node_topology_re()
        .captures(s)
        .ok_or_else(|| format!("'{s}' does not match the Xm,Yw node topology pattern"))?;
    let masters: u32 = caps[1].parse().map_err(|_| format!("'{s}' has an invalid master count"))?;
    let workers: u32 = caps[2].parse().map_err(|_| format!("'{s}' has an invalid worker count"))?;
    Ok(NodeTopology::new(masters, workers))
}

fn parse_cni(s: &str) -> Result<CniType, ClustersSpecError> {
    CniType::parse(s).ok_or_else(|| ClustersSpecError::Parse(format!("unknown cni '{s}'")))
}

/// Parses `raw` (the literal `--clusters` argument) into a list of entries,
/// reading it from disk first if it starts with `@`.
pub fn parse_clusters(raw: &str) -> Result<Vec<ClusterEntry>, ClustersSpecError> {
    let content = if let Some(path) = raw.strip_prefix('@') {
        std::fs::read_to_string(path)?
    } else {
        raw.to_string()
    };
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        parse_json(trimmed)
    } else if trimmed.starts_with('-') || trimmed.contains('\n') {
        parse_yaml(trimmed)
    } else {
        parse_csv(trimmed)
    }
}

fn parse_json(text: &str) -> Result<Vec<ClusterEntry>, ClustersSpecError> {
    let dtos: Vec<ClusterEntryDto> =
        serde_json::from_str(text).map_err(|e| ClustersSpecError::Parse(format!("invalid clusters JSON: {e}")))?;
    dtos.into_iter().map(ClusterEntryDto::into_entry).collect()
}

fn parse_yaml(text: &str) -> Result<Vec<ClusterEntry>, ClustersSpecError> {
    let dtos: Vec<ClusterEntryDto> =
        serde_yaml::from_str(text).map_err(|e| ClustersSpecError::Parse(format!("invalid clusters YAML: {e}")))?;
    dtos.into_iter().map(ClusterEntryDto::into_entry).collect()
}

/// `name:cni:ip[:Xm,Yw]` entries separated by `,` or `;`. Entries with an
/// explicit `nodes` token must use `;` as the entry separator, since the
/// token itself contains a comma.
fn parse_csv(text: &str) -> Result<Vec<ClusterEntry>, ClustersSpecError> {
    let separator = if text.contains(';') { ';' } else { ',' };
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_csv_entry)
        .collect()
}

fn parse_csv_entry(token: &str) -> Result<ClusterEntry, ClustersSpecError> {
    let parts: Vec<&str> = token.split(':').collect();
    let Some(name) = parts.first().filter(|s| !s.is_empty()) else {
        return Err(ClustersSpecError::Parse(format!("'{token}' is missing a cluster name")));
    };
    let mut entry = ClusterEntry::new(*name);
    if let Some(cni) = parts.get(1).filter(|s| !s.is_empty()) {
        entry.cni = Some(parse_cni(cni)?);
    }
    if let Some(ip) = parts.get(2).filter(|s| !s.is_empty()) {
        entry.first_ip = Some(
            ip.parse()
                .map_err(|_| ClustersSpecError::Parse(format!("'{ip}' is not a valid IPv4 address")))?,
        );
    }
    if let Some(nodes) = parts.get(3).filter(|s| !s.is_empty()) {
        entry.topology = Some(parse_topology(nodes).map_err(ClustersSpecError::Parse)?);
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_entries_split_on_comma_when_no_nodes_token() {
        let entries = parse_clusters("dev:calico:192.168.56.110,dev:calico:192.168.56.120").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "dev");
        assert_eq!(entries[0].cni, Some(CniType::Calico));
        assert_eq!(entries[0].first_ip, Some("192.168.56.110".parse().unwrap()));
    }

    #[test]
    fn csv_entries_with_nodes_token_use_semicolon_separator() {
        let entries = parse_clusters("a:calico:192.168.56.10:1m,2w;b:flannel:192.168.56.110:1m,0w").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topology, Some(NodeTopology::new(1, 2)));
        assert_eq!(entries[1].name, "b");
    }

    #[test]
    fn json_array_of_objects_parses() {
        let entries = parse_clusters(r#"[{"name":"dev","cni":"calico","ip":"192.168.56.10"}]"#).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dev");
    }

    #[test]
    fn yaml_list_of_maps_parses() {
        let yaml = "- name: dev\n  cni: calico\n  ip: 192.168.56.10\n  nodes: 1m,2w\n";
        let entries = parse_clusters(yaml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].topology, Some(NodeTopology::new(1, 2)));
    }

    #[test]
    fn bad_ip_is_rejected() {
        let err = parse_clusters("dev:calico:not-an-ip").unwrap_err();
        assert!(matches!(err, ClustersSpecError::Parse(_)));
    }

    #[test]
    fn at_prefix_reads_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusters.yaml");
        std::fs::write(&path, "- name: dev\n  cni: calico\n  ip: 192.168.56.10\n").unwrap();
        let arg = format!("@{}", path.display());
        let entries = parse_clusters(&arg).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_file_surfaces_an_io_error() {
        let err = parse_clusters("@/nonexistent/path/clusters.yaml").unwrap_err();
        assert!(matches!(err, ClustersSpecError::Io(_)));
    }
}
