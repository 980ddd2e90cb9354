use super::node::NodeRole;
use super::size::SizeProfile;
use std::net::Ipv4Addr;

/// A single VM: name, role, resolved IP and effective resources.
///
/// `cpu_override`/`memory_mib_override` normalise the teacher's historical
/// split between `Optional<Integer>` and bare `Integer` override fields
/// across versions (§9 Open Question) to a single optional-valued pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub name: String,
    pub role: NodeRole,
    pub ip: Ipv4Addr,
    pub size_profile: SizeProfile,
    pub cpu_override: Option<u32>,
    pub memory_mib_override: Option<u32>,
}

impl VmConfig {
    pub fn new(name: impl Into<String>, role: NodeRole, ip: Ipv4Addr, size_profile: SizeProfile) -> Self {
        VmConfig {
            name: name.into(),
            role,
            ip,
            size_profile,
            cpu_override: None,
            memory_mib_override: None,
        }
    }

    pub fn with_cpu_override(mut self, cpu: u32) -> Self {
        self.cpu_override = Some(cpu);
        self
    }

    pub fn with_memory_override(mut self, mib: u32) -> Self {
        self.memory_mib_override = Some(mib);
        self
    }

    /// Effective vCPU count: override if present, else the profile default.
    pub fn effective_cpu(&self) -> u32 {
        self.cpu_override.unwrap_or_else(|| self.size_profile.vcpu())
    }

    /// Effective memory in MiB: override if present, else the profile default.
    pub fn effective_memory_mib(&self) -> u32 {
        self.memory_mib_override
            .unwrap_or_else(|| self.size_profile.memory_mib())
    }
}
