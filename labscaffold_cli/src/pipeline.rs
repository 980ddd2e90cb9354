//! End-to-end driver: CLI args -> Request -> DefaultsApplier -> Validators ->
//! PlanBuilder -> Renderer -> AtomicWriter (spec.md §2), plus the exit-code
//! mapping from spec.md §6.

use crate::cli::Cli;
use crate::clusters_spec::{self, ClustersSpecError};
use chrono::Utc;
use labscaffold_definitions::{
    apply_defaults, manifest, plan, render, validate, write, Config, DefaultsWarning, FileSet, Manifest,
    ModuleInfo, RegenPolicy, Request, ValidationError, ValidationLevel,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("drift detected in {} file(s)", .0.len())]
    Drift(Vec<PathBuf>),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Maps this failure onto the exit-code scheme spec.md §6 defines.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Validation(_) => 1,
            PipelineError::Drift(_) => 2,
            PipelineError::Io(_) => 3,
            PipelineError::Internal(_) => 4,
        }
    }
}

fn structural_error(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::new(field, ValidationLevel::Structural, message, "fix the offending CLI argument")
}

/// What a successful run produced, enough for [`crate::output`] to report
/// on without re-deriving anything from `Cli`.
pub struct PipelineOutcome {
    pub output_dir: PathBuf,
    pub warnings: Vec<DefaultsWarning>,
    pub fileset: FileSet,
    pub manifest: Option<Manifest>,
    pub dry_run: bool,
}

/// A request's content, stripped to exactly the fields that determine its
/// generated output, serialised for [`manifest::spec_hash`]. Keeping this
/// separate from [`Request`] lets the domain crate stay free of a CLI-shaped
/// "canonical form" concern.
#[derive(Serialize)]
struct CanonicalCluster {
    name: String,
    cni: Option<String>,
    first_ip: Option<String>,
    topology: Option<(u32, u32)>,
}

#[derive(Serialize)]
struct CanonicalRequest {
    module_num: String,
    module_type: String,
    engine: String,
    size_profile: String,
    topology: Option<(u32, u32)>,
    cni: Option<String>,
    first_ip: Option<String>,
    output_dir: String,
    tools: Vec<String>,
    bastion: bool,
    cloud_providers: Vec<String>,
    clusters: Vec<CanonicalCluster>,
}

fn canonicalize(request: &Request) -> CanonicalRequest {
    CanonicalRequest {
        module_num: request.module.num().to_string(),
        module_type: request.module.type_tag().to_string(),
        engine: request.engine.id().to_string(),
        size_profile: request.size_profile.unwrap_or_default().id().to_string(),
        topology: request.topology.map(|t| (t.masters, t.workers)),
        cni: request.cni.map(|cni| cni.id().to_string()),
        first_ip: request.first_ip.map(|ip| ip.to_string()),
        output_dir: request.output_dir_or_default(),
        tools: request.tools.iter().map(|t| t.id().to_string()).collect(),
        bastion: request.bastion,
        cloud_providers: request.cloud_providers.iter().map(|p| p.id().to_string()).collect(),
        clusters: request
            .clusters
            .iter()
            .map(|c| CanonicalCluster {
                name: c.name.clone(),
                cni: c.cni.map(|cni| cni.id().to_string()),
                first_ip: c.first_ip.map(|ip| ip.to_string()),
                topology: c.topology.map(|t| (t.masters, t.workers)),
            })
            .collect(),
    }
}

fn build_request(cli: &Cli) -> Result<Request, PipelineError> {
    let module = ModuleInfo::new(&cli.module, &cli.type_tag)
        .map_err(|e| PipelineError::Validation(vec![structural_error("module", e)]))?;

    let mut request = Request::new(module, cli.engine);
    request.size_profile = cli.size;
    request.topology = cli.nodes;
    request.cni = cli.cni;
    request.first_ip = cli.first_ip;
    request.output_dir = cli.out.clone();
    request.bastion = cli.bastion;
    request.dry_run = cli.dry_run;
    request.force = cli.force;
    request.cloud_providers = cli.cloud_providers();
    request.tools = cli
        .tools()
        .map_err(|e| PipelineError::Validation(vec![structural_error("tools", e)]))?;

    if let Some(raw) = &cli.clusters {
        request.clusters = clusters_spec::parse_clusters(raw).map_err(|e| match e {
            ClustersSpecError::Io(io) => PipelineError::Io(io.to_string()),
            ClustersSpecError::Parse(msg) => PipelineError::Validation(vec![structural_error("clusters", msg)]),
        })?;
    }

    Ok(request)
}

/// Runs the full pipeline for one CLI invocation.
pub fn run(cli: &Cli) -> Result<PipelineOutcome, PipelineError> {
    let config = Config::from_env();
    if config.template_override_dir.is_some() {
        log::warn!("K8S_LAB_TEMPLATE_OVERRIDE_DIR is set but the renderer never consults it for real output");
    }

    let request = build_request(cli)?;
    let module = request.module.clone();
    let output_dir = PathBuf::from(request.output_dir_or_default());

    let defaulted = apply_defaults(&request);
    for warning in &defaulted.warnings {
        log::warn!("{}: {} (suggestion: {})", warning.field_path, warning.message, warning.suggestion);
    }

    let validation = validate::validate(Some(&defaulted.clusters), request.is_multi_cluster());
    if !validation.is_valid() {
        return Err(PipelineError::Validation(validation.into_errors()));
    }

    let scaffold_plan = plan::build(&module, &defaulted.clusters).map_err(|e| PipelineError::Internal(e.to_string()))?;

    let renderer = render::Renderer::new().map_err(|e| PipelineError::Internal(e.to_string()))?;
    let fileset = render::render_plan(&renderer, &module, &defaulted.clusters, &scaffold_plan)
        .map_err(|e| PipelineError::Internal(e.to_string()))?;

    if request.dry_run {
        log::info!("dry-run: {} file(s) would be written to {}", fileset.len(), output_dir.display());
        return Ok(PipelineOutcome {
            output_dir,
            warnings: defaulted.warnings,
            fileset,
            manifest: None,
            dry_run: true,
        });
    }

    let canonical = canonicalize(&request);
    let spec_hash = manifest::spec_hash(&canonical).map_err(|e| PipelineError::Internal(e.to_string()))?;
    let policy = if request.force { RegenPolicy::Force } else { RegenPolicy::Default };

    let manifest = write::install(&output_dir, &fileset, config.generator_version, Utc::now(), spec_hash, policy)
        .map_err(|e| match e {
            labscaffold_definitions::errors::WriteError::Drift { paths } => PipelineError::Drift(paths),
            labscaffold_definitions::errors::WriteError::NotImplemented => {
                PipelineError::Internal(e.to_string())
            }
            other => PipelineError::Io(other.to_string()),
        })?;

    Ok(PipelineOutcome {
        output_dir,
        warnings: defaulted.warnings,
        fileset,
        manifest: Some(manifest),
        dry_run: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["labscaffold"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn minikube_single_node_run_succeeds_and_writes_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&[
            "--module", "m1", "--type", "pt", "minikube", "--out", out.to_str().unwrap(),
        ]);
        let outcome = run(&c).unwrap();
        assert!(!outcome.dry_run);
        assert!(outcome.manifest.is_some());
        assert!(out.join("Vagrantfile").exists());
        assert!(out.join("scripts/bootstrap.sh").exists());
    }

    #[test]
    fn dry_run_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&[
            "--module", "m1", "--type", "pt", "minikube", "--out", out.to_str().unwrap(), "--dry-run",
        ]);
        let outcome = run(&c).unwrap();
        assert!(outcome.dry_run);
        assert!(!out.exists());
    }

    #[test]
    fn single_cluster_cni_flag_is_honoured_in_the_bootstrap_script() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&[
            "--module", "m1", "--type", "pt", "kubeadm", "--cni", "flannel", "--out", out.to_str().unwrap(),
        ]);
        run(&c).unwrap();
        let bootstrap_script = std::fs::read_to_string(out.join("scripts/bootstrap.sh")).unwrap();
        assert!(bootstrap_script.contains("CNI_TYPE=flannel"));
    }

    #[test]
    fn duplicate_cluster_name_fails_validation_with_one_policy_error() {
        let c = cli(&[
            "--module", "m1", "--type", "pt", "kubeadm",
            "--clusters", "dev:calico:192.168.56.110,dev:calico:192.168.56.120",
        ]);
        let err = run(&c).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        match err {
            PipelineError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.message == "Duplicate cluster name: dev"));
            }
            _ => panic!("expected a validation error"),
        }
    }

    #[test]
    fn tools_forbidden_on_none_engine_fails_validation() {
        let c = cli(&["--module", "m9", "--type", "pt", "none", "--tools", "minikube"]);
        let err = run(&c).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn drift_without_force_yields_exit_code_two() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&["--module", "m1", "--type", "pt", "minikube", "--out", out.to_str().unwrap()]);
        run(&c).unwrap();
        std::fs::write(out.join("Vagrantfile"), b"edited-by-hand").unwrap();

        let err = run(&c).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn kubeadm_multi_node_run_writes_master_and_worker_scripts_not_a_single_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("hw-m7");
        let c = cli(&[
            "--module", "m7", "--type", "hw", "kubeadm", "--nodes", "1m,2w", "--out", out.to_str().unwrap(),
        ]);
        let outcome = run(&c).unwrap();
        assert!(!outcome.dry_run);
        assert!(out.join("scripts/bootstrap-master.sh").exists());
        assert!(out.join("scripts/bootstrap-worker.sh").exists());
        assert!(!out.join("scripts/bootstrap.sh").exists());
        let vagrantfile = std::fs::read_to_string(out.join("Vagrantfile")).unwrap();
        for ip in ["192.168.56.10", "192.168.56.11", "192.168.56.12"] {
            assert!(vagrantfile.contains(ip), "missing {ip} in Vagrantfile");
        }
        let master_script = std::fs::read_to_string(out.join("scripts/bootstrap-master.sh")).unwrap();
        assert!(master_script.contains("K8S_POD_CIDR=10.244.0.0/16"));
        assert!(master_script.contains("K8S_SVC_CIDR=10.96.0.0/12"));
        assert!(master_script.contains("CNI_TYPE=calico"));
    }

    #[test]
    fn multi_cluster_kubeadm_run_offsets_pod_cidrs_so_defaults_never_collide() {
        // The pod/svc network collision spec.md's S4 scenario describes (two
        // kubeadm clusters both defaulting to 10.244.0.0/16) is caught by
        // `validate::policy` whenever it happens (see that module's own
        // overlap tests), but under this generator's defaulting rules it can
        // only happen for hand-built `ClusterSpec`s with an explicit override
        // or for an improbable run of 128+ clusters, since each successive
        // cluster's CIDR is offset by index. This exercises the everyday
        // two-cluster case end to end and confirms it passes validation.
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&[
            "--module", "m1", "--type", "pt", "kubeadm",
            "--clusters", "a:calico:192.168.56.10;b:calico:192.168.57.10",
            "--out", out.to_str().unwrap(),
        ]);
        let outcome = run(&c).unwrap();
        let a = std::fs::read_to_string(out.join("scripts/bootstrap-a-master.sh")).unwrap();
        let b = std::fs::read_to_string(out.join("scripts/bootstrap-b-master.sh")).unwrap();
        assert!(a.contains("K8S_POD_CIDR=10.244.0.0/16"));
        assert!(b.contains("K8S_POD_CIDR=10.246.0.0/16"));
        assert!(!outcome.dry_run);
    }

    #[test]
    fn forced_rerun_converges_and_preserves_untracked_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pt-m1");
        let c = cli(&["--module", "m1", "--type", "pt", "minikube", "--out", out.to_str().unwrap()]);
        run(&c).unwrap();
        std::fs::write(out.join("Vagrantfile"), b"edited-by-hand").unwrap();
        std::fs::write(out.join("assets_my.sh"), b"keep me").unwrap();

        let forced = cli(&[
            "--module", "m1", "--type", "pt", "minikube", "--out", out.to_str().unwrap(), "--force",
        ]);
        let outcome = run(&forced).unwrap();
        assert!(!outcome.manifest.unwrap().generated.components.is_empty());
        assert!(out.join("assets_my.sh").exists());
        assert!(String::from_utf8(std::fs::read(out.join("Vagrantfile")).unwrap())
            .unwrap()
            .contains("192.168.56.10"));
    }
}
