use regex::Regex;
use std::sync::OnceLock;

fn module_num_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^m\d+$").unwrap())
}

fn module_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap())
}

/// `{num, type}` identity for a piece of coursework, e.g. `m1/pt`.
///
/// Construction enforces the structural invariants only (§3); `num` must
/// match `m\d+` and `type` must match `[a-z][a-z0-9-]*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleInfo {
    num: String,
    type_tag: String,
}

impl ModuleInfo {
    pub fn new(num: impl Into<String>, type_tag: impl Into<String>) -> Result<Self, String> {
        let num = num.into();
        let type_tag = type_tag.into();
        if !module_num_re().is_match(&num) {
            return Err(format!("module number '{num}' must match m\\d+"));
        }
        if !module_type_re().is_match(&type_tag) {
            return Err(format!(
                "module type '{type_tag}' must match [a-z][a-z0-9-]*"
            ));
        }
        Ok(ModuleInfo { num, type_tag })
    }

    pub fn num(&self) -> &str {
        &self.num
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// `{type}-{num}`
    pub fn output_dir(&self) -> String {
        format!("{}-{}", self.type_tag, self.num)
    }

    /// `ns-{num}-{type}`
    pub fn namespace(&self) -> String {
        format!("ns-{}-{}", self.num, self.type_tag)
    }

    /// `clu-{num}-{type}-{engine_id}`
    pub fn cluster_name(&self, engine_id: &str) -> String {
        format!("clu-{}-{}-{}", self.num, self.type_tag, engine_id)
    }

    /// Parse an output directory name back into a `ModuleInfo` (§8.5 round-trip).
    pub fn from_output_dir(dir: &str) -> Option<Self> {
        let (type_tag, num) = dir.rsplit_once('-')?;
        ModuleInfo::new(num, type_tag).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_naming_conventions() {
        let m = ModuleInfo::new("m1", "pt").unwrap();
        assert_eq!(m.output_dir(), "pt-m1");
        assert_eq!(m.namespace(), "ns-m1-pt");
        assert_eq!(m.cluster_name("minikube"), "clu-m1-pt-minikube");
    }

    #[test]
    fn rejects_bad_num() {
        assert!(ModuleInfo::new("1", "pt").is_err());
        assert!(ModuleInfo::new("m1", "PT").is_err());
    }

    #[test]
    fn round_trips_from_output_dir() {
        let m = ModuleInfo::new("m7", "hw").unwrap();
        let back = ModuleInfo::from_output_dir(&m.output_dir()).unwrap();
        assert_eq!(m, back);
    }
}
