//! TemplateSelector + Renderer (spec.md §4.5) and the file-set assembly that
//! turns a [`ScaffoldPlan`] into the output tree described in spec.md §6.
//!
//! The renderer wraps a `tera::Tera` built once from `Tera::default()` plus
//! `add_raw_template` calls over `include_str!`-embedded template bodies —
//! "precompiled" in the sense spec.md §4.5 requires, since nothing is ever
//! looked up on the filesystem at render time. This generalises the
//! teacher's own `pub mod template` (a `tera` renderer for one inlined app
//! config) to the selector-driven multi-template registry this spec needs.

pub mod context;

use crate::errors::TemplateError;
use crate::fileset::{FileEntry, FileSet};
use crate::model::{ClusterSpec, ClusterType, CloudProvider, Management, ModuleInfo, NodeRole, Tool};
use crate::plan::{PlannedVm, ScaffoldPlan};
use context::{AzureEnvContext, BootstrapContext, ModuleContext, VagrantContext, VagrantNodeContext};
use serde::Serialize;
use tera::Tera;

const AZ_DEFAULT_LOCATION: &str = "eastus";

macro_rules! embed {
    ($name:expr, $path:expr) => {
        ($name, include_str!($path))
    };
}

const VAGRANT_TEMPLATES: &[(&str, &str)] = &[
    embed!("vagrant/kind", "templates/vagrant/kind.tera"),
    embed!("vagrant/minikube", "templates/vagrant/minikube.tera"),
    embed!("vagrant/kubeadm", "templates/vagrant/kubeadm.tera"),
    embed!("vagrant/multi_kubeadm", "templates/vagrant/multi_kubeadm.tera"),
    embed!("vagrant/bastion", "templates/vagrant/bastion.tera"),
    embed!("vagrant/aks", "templates/vagrant/aks.tera"),
];

const BOOTSTRAP_TEMPLATES: &[(&str, &str)] = &[
    embed!("bootstrap/_body", "templates/bootstrap/_body.tera"),
    embed!("bootstrap/master", "templates/bootstrap/master.tera"),
    embed!("bootstrap/worker", "templates/bootstrap/worker.tera"),
    embed!("bootstrap/minikube", "templates/bootstrap/minikube.tera"),
    embed!("bootstrap/kind", "templates/bootstrap/kind.tera"),
    embed!("bootstrap/bastion", "templates/bootstrap/bastion.tera"),
    embed!("bootstrap/aks", "templates/bootstrap/aks.tera"),
];

/// `(Tool, install script body)`, copied verbatim (spec.md §4.5: "copied
/// verbatim from a fixed set of resources"); never passed through `tera`.
const INSTALL_SCRIPTS: &[(Tool, &str)] = &[
    (Tool::Kubectl, include_str!("templates/install/kubectl.sh")),
    (Tool::Helm, include_str!("templates/install/helm.sh")),
    (Tool::AzureCli, include_str!("templates/install/azure_cli.sh")),
    (Tool::AwsCli, include_str!("templates/install/aws_cli.sh")),
    (Tool::Gcloud, include_str!("templates/install/gcloud.sh")),
    (Tool::KubeBinaries, include_str!("templates/install/kube_binaries.sh")),
    (Tool::Kind, include_str!("templates/install/kind.sh")),
    (Tool::K3s, include_str!("templates/install/k3s.sh")),
    (Tool::Docker, include_str!("templates/install/docker.sh")),
    (Tool::Containerd, include_str!("templates/install/containerd.sh")),
    (Tool::Minikube, include_str!("templates/install/minikube.sh")),
];

const BASE_PACKAGES_SCRIPT: &str = include_str!("templates/install/base_packages.sh");
const LIB_SH: &str = include_str!("templates/static/lib.sh");
const GITIGNORE: &str = include_str!("templates/static/gitignore");
const BOOTSTRAP_ENV_LOCAL: &str = include_str!("templates/static/bootstrap.env.local");
const BOOTSTRAP_PRE_LOCAL_SH: &str = include_str!("templates/static/bootstrap.pre.local.sh");
const BOOTSTRAP_POST_LOCAL_SH: &str = include_str!("templates/static/bootstrap.post.local.sh");
const PRE_D_README: &str = include_str!("templates/static/pre_d_readme.md");
const POST_D_README: &str = include_str!("templates/static/post_d_readme.md");
const ENV_CLUSTER_README: &str = include_str!("templates/static/env_cluster_readme.md");
const ENV_ROLE_README: &str = include_str!("templates/static/env_role_readme.md");
const ENV_CLUSTER_ROLE_README: &str = include_str!("templates/static/env_cluster_role_readme.md");

/// A precompiled `tera` registry. Built once per pipeline run; never
/// searches the filesystem (§4.5, §5 "Templates are read-only and loaded
/// once at startup").
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        for (name, body) in VAGRANT_TEMPLATES.iter().chain(BOOTSTRAP_TEMPLATES.iter()) {
            tera.add_raw_template(name, body).map_err(|e| TemplateError::RenderFailure {
                template: (*name).to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(Renderer { tera })
    }

    fn render(&self, template_id: &str, ctx: &impl Serialize) -> Result<String, TemplateError> {
        if self.tera.get_template_names().all(|n| n != template_id) {
            return Err(TemplateError::MissingTemplate(template_id.to_string()));
        }
        let context = tera::Context::from_serialize(ctx).map_err(|e| TemplateError::RenderFailure {
            template: template_id.to_string(),
            message: e.to_string(),
        })?;
        self.tera.render(template_id, &context).map_err(|e| TemplateError::RenderFailure {
            template: template_id.to_string(),
            message: e.to_string(),
        })
    }
}

/// Selects the single Vagrant-like descriptor template for the whole plan
/// (spec.md §4.5: "one per engine (kind, minikube, kubeadm, aks, bastion,
/// multi-kubeadm)"), deterministically from the cluster composition.
fn select_vagrant_template(clusters: &[ClusterSpec]) -> &'static str {
    let kubeadm_count = clusters.iter().filter(|c| c.cluster_type == ClusterType::Kubeadm).count();
    if kubeadm_count > 1 {
        return "vagrant/multi_kubeadm";
    }
    if kubeadm_count == 1 {
        return "vagrant/kubeadm";
    }
    if let Some(engine_cluster) = clusters.iter().find(|c| c.cluster_type != ClusterType::None) {
        return match engine_cluster.cluster_type {
            ClusterType::Kind => "vagrant/kind",
            ClusterType::Minikube => "vagrant/minikube",
            ClusterType::Kubeadm | ClusterType::None => unreachable!("filtered above"),
        };
    }
    let any_azure = clusters
        .iter()
        .any(|c| c.management.as_ref().is_some_and(|m| m.providers.contains(&CloudProvider::Azure)));
    if any_azure {
        "vagrant/aks"
    } else {
        "vagrant/bastion"
    }
}

/// Selects the bootstrap template for one (engine, role) pair (spec.md
/// §4.5: "bastion, master, worker, minikube, kind, aks").
fn bootstrap_template_id(cluster_type: ClusterType, role: NodeRole, management: Option<&Management>) -> &'static str {
    match (cluster_type, role) {
        (ClusterType::None, NodeRole::Management) => {
            let is_azure = management.is_some_and(|m| m.providers.contains(&CloudProvider::Azure));
            if is_azure {
                "bootstrap/aks"
            } else {
                "bootstrap/bastion"
            }
        }
        (ClusterType::Kind, NodeRole::Cluster) => "bootstrap/kind",
        (ClusterType::Minikube, NodeRole::Cluster) => "bootstrap/minikube",
        (ClusterType::Kubeadm, NodeRole::Master) => "bootstrap/master",
        (ClusterType::Kubeadm, NodeRole::Worker) => "bootstrap/worker",
        _ => unreachable!("engine/role combination already rejected by the semantic validator"),
    }
}

fn role_token(template_id: &str) -> &str {
    template_id.rsplit('/').next().unwrap_or(template_id)
}

/// The relative `scripts/bootstrap*.sh` path for one VM (spec.md §6):
/// `bootstrap.sh` when the whole plan is a single node, `bootstrap-{role}.sh`
/// when there is exactly one cluster with more than one node, and
/// `bootstrap-{cluster}-{role}.sh` once more than one cluster is present.
fn bootstrap_script_path(template_id: &str, cluster_name: &str, total_vms: usize, cluster_count: usize) -> String {
    let role = role_token(template_id);
    if total_vms == 1 {
        "scripts/bootstrap.sh".to_string()
    } else if cluster_count == 1 {
        format!("scripts/bootstrap-{role}.sh")
    } else {
        format!("scripts/bootstrap-{cluster_name}-{role}.sh")
    }
}

fn next_step_hint(template_id: &str, cluster_name: &str) -> String {
    match template_id {
        "bootstrap/master" | "bootstrap/worker" => {
            "run `kubectl get nodes` once every master and worker has joined".to_string()
        }
        "bootstrap/minikube" => "run `minikube status` to confirm the cluster is ready".to_string(),
        "bootstrap/kind" => format!("run `kubectl cluster-info --context kind-{cluster_name}` to confirm the cluster is ready"),
        "bootstrap/bastion" => "use the aggregated kubeconfigs under ~/.kube/ to reach your clusters".to_string(),
        "bootstrap/aks" => "run `az aks get-credentials` to fetch the remote cluster's kubeconfig".to_string(),
        _ => "bootstrap complete".to_string(),
    }
}

/// The tool set a single cluster's nodes install: the engine's fixed
/// required set unioned with its `Management` record's tools, if any
/// (spec.md §3: only `Management` carries an explicit tool set).
fn cluster_tools(cluster: &ClusterSpec) -> std::collections::BTreeSet<Tool> {
    let mut tools = cluster.cluster_type.required_tools();
    if let Some(mgmt) = &cluster.management {
        tools.extend(mgmt.tools.iter().copied());
    }
    tools
}

fn install_commands_for(cluster: &ClusterSpec) -> Vec<String> {
    let mut commands = vec!["install_base_packages.sh".to_string()];
    commands.extend(cluster_tools(cluster).into_iter().map(|t| format!("install_{}.sh", t.id())));
    commands
}

fn azure_env_for(template_id: &str, cluster: &ClusterSpec, module: &ModuleInfo) -> Option<AzureEnvContext> {
    if !matches!(template_id, "bootstrap/bastion" | "bootstrap/aks") {
        return None;
    }
    let mgmt = cluster.management.as_ref()?;
    if !mgmt.providers.contains(&CloudProvider::Azure) {
        return None;
    }
    Some(AzureEnvContext {
        az_location: AZ_DEFAULT_LOCATION.to_string(),
        az_resource_group: format!("rg-{}", module.namespace()),
        aks_name: cluster.name.clone(),
        // No field in the domain model currently drives an ACR; see
        // DESIGN.md's Open Question resolution for `AzureEnvContext`.
        acr_name: None,
    })
}

/// Renders the whole plan into an in-memory [`FileSet`] (spec.md §4.5, §6).
pub fn render_plan(renderer: &Renderer, module: &ModuleInfo, clusters: &[ClusterSpec], plan: &ScaffoldPlan) -> Result<FileSet, TemplateError> {
    let mut fileset = FileSet::new();
    let module_ctx = ModuleContext::from(module);

    let cluster_names: std::collections::BTreeSet<&str> = plan.vms.iter().map(|v| v.cluster_name.as_str()).collect();
    let cluster_count = cluster_names.len();
    let total_vms = plan.vms.len();

    render_vagrantfile(renderer, &module_ctx, clusters, plan, cluster_count, total_vms, &mut fileset)?;
    render_bootstrap_scripts(renderer, &module_ctx, module, clusters, plan, cluster_count, total_vms, &mut fileset)?;
    render_install_scripts(clusters, &mut fileset);
    render_static_files(&mut fileset);

    Ok(fileset)
}

#[allow(clippy::too_many_arguments)]
fn render_vagrantfile(
    renderer: &Renderer,
    module_ctx: &ModuleContext,
    clusters: &[ClusterSpec],
    plan: &ScaffoldPlan,
    cluster_count: usize,
    total_vms: usize,
    fileset: &mut FileSet,
) -> Result<(), TemplateError> {
    let template_id = select_vagrant_template(clusters);

    let uses_bastion_slot = matches!(template_id, "vagrant/kubeadm" | "vagrant/multi_kubeadm");
    let mut nodes = Vec::with_capacity(plan.vms.len());
    let mut bastion = None;
    for planned in &plan.vms {
        let node = vagrant_node_context(planned, clusters, cluster_count, total_vms);
        let is_bastion_node = planned.cluster_type == ClusterType::None && planned.vm.role == NodeRole::Management;
        if uses_bastion_slot && is_bastion_node && bastion.is_none() {
            bastion = Some(node);
        } else {
            nodes.push(node);
        }
    }

    let ctx = VagrantContext {
        module: module_ctx.clone(),
        nodes,
        bastion,
        synced_folders: Vec::new(),
    };
    let body = renderer.render(template_id, &ctx)?;
    fileset.push(FileEntry::new("Vagrantfile", body.into_bytes()).from_template(template_id));
    Ok(())
}

fn vagrant_node_context(planned: &PlannedVm, clusters: &[ClusterSpec], cluster_count: usize, total_vms: usize) -> VagrantNodeContext {
    let cluster = clusters
        .iter()
        .find(|c| c.name == planned.cluster_name)
        .expect("every planned vm belongs to a cluster in the validated set");
    let template_id = bootstrap_template_id(planned.cluster_type, planned.vm.role, cluster.management.as_ref());
    let script_path = bootstrap_script_path(template_id, &planned.cluster_name, total_vms, cluster_count);
    VagrantNodeContext {
        define_name: planned.vm.name.clone(),
        hostname: planned.vm.name.clone(),
        ip: planned.vm.ip,
        memory_mib: planned.vm.effective_memory_mib(),
        vcpus: planned.vm.effective_cpu(),
        vm_name: planned.vm.name.clone(),
        role: planned.vm.role.id().to_string(),
        script_path,
    }
}

#[allow(clippy::too_many_arguments)]
fn render_bootstrap_scripts(
    renderer: &Renderer,
    module_ctx: &ModuleContext,
    module: &ModuleInfo,
    clusters: &[ClusterSpec],
    plan: &ScaffoldPlan,
    cluster_count: usize,
    total_vms: usize,
    fileset: &mut FileSet,
) -> Result<(), TemplateError> {
    let mut seen_paths = std::collections::BTreeSet::new();
    for planned in &plan.vms {
        let cluster = clusters
            .iter()
            .find(|c| c.name == planned.cluster_name)
            .expect("every planned vm belongs to a cluster in the validated set");
        let template_id = bootstrap_template_id(planned.cluster_type, planned.vm.role, cluster.management.as_ref());
        let path = bootstrap_script_path(template_id, &planned.cluster_name, total_vms, cluster_count);

        // Multiple VMs of the same role within one cluster (e.g. two
        // workers) share a single rendered script; only render once.
        if !seen_paths.insert(path.clone()) {
            continue;
        }

        let ctx = BootstrapContext {
            module: module_ctx.clone(),
            vm_name: planned.vm.name.clone(),
            node_role: planned.vm.role.id().to_string(),
            lock_file_path: format!("/var/lock/{}-{}.lock", module.output_dir(), planned.vm.name),
            timestamp_line: None,
            install_commands: install_commands_for(cluster),
            azure_env: azure_env_for(template_id, cluster, module),
            next_step_hint: next_step_hint(template_id, &planned.cluster_name),
            env_vars: plan.env_for_vm(planned),
        };
        let body = renderer.render(template_id, &ctx)?;
        fileset.push(
            FileEntry::new(path, body.into_bytes())
                .executable(true)
                .from_template(template_id),
        );
    }
    Ok(())
}

fn render_install_scripts(clusters: &[ClusterSpec], fileset: &mut FileSet) {
    let mut needed = std::collections::BTreeSet::new();
    for cluster in clusters {
        needed.extend(cluster_tools(cluster));
    }

    fileset.push(
        FileEntry::new("scripts/install_base_packages.sh", BASE_PACKAGES_SCRIPT.as_bytes().to_vec()).executable(true),
    );
    for tool in needed {
        let (_, body) = INSTALL_SCRIPTS
            .iter()
            .find(|(t, _)| *t == tool)
            .expect("every Tool variant has a matching install script resource");
        fileset.push(FileEntry::new(format!("scripts/install_{}.sh", tool.id()), body.as_bytes().to_vec()).executable(true));
    }
}

fn render_static_files(fileset: &mut FileSet) {
    fileset.push(FileEntry::new("scripts/lib.sh", LIB_SH.as_bytes().to_vec()));
    fileset.push(FileEntry::new(".gitignore", GITIGNORE.as_bytes().to_vec()));
    fileset.push(
        FileEntry::new("scripts/bootstrap.env.local", BOOTSTRAP_ENV_LOCAL.as_bytes().to_vec()).regeneratable(false),
    );
    fileset.push(
        FileEntry::new("scripts/bootstrap.pre.local.sh", BOOTSTRAP_PRE_LOCAL_SH.as_bytes().to_vec())
            .executable(true)
            .regeneratable(false),
    );
    fileset.push(
        FileEntry::new("scripts/bootstrap.post.local.sh", BOOTSTRAP_POST_LOCAL_SH.as_bytes().to_vec())
            .executable(true)
            .regeneratable(false),
    );
    fileset.push(FileEntry::new("scripts/bootstrap.pre.d/README.md", PRE_D_README.as_bytes().to_vec()));
    fileset.push(FileEntry::new("scripts/bootstrap.post.d/README.md", POST_D_README.as_bytes().to_vec()));
    fileset.push(FileEntry::new("scripts/env/cluster/README.md", ENV_CLUSTER_README.as_bytes().to_vec()));
    fileset.push(FileEntry::new("scripts/env/role/README.md", ENV_ROLE_README.as_bytes().to_vec()));
    fileset.push(FileEntry::new("scripts/env/cluster-role/README.md", ENV_CLUSTER_ROLE_README.as_bytes().to_vec()));
}
