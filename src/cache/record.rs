use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};
use crate::session::Package;

/// Repo field of identity strings for packages with no candidate.
pub const INSTALLED_REPO: &str = "installed";

/// One package name in the cache, joining the version available from the
/// repositories (`candidate`) with the version on the system (`installed`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PackageRecord {
    name: String,
    candidate: Option<Package>,
    installed: Option<Package>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    records: Map<String, Value>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_candidate(candidate: Package) -> Self {
        Self {
            name: candidate.name.clone(),
            candidate: Some(candidate),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn shortname(&self) -> &str {
        &self.name
    }

    pub fn candidate(&self) -> Option<&Package> {
        self.candidate.as_ref()
    }

    pub fn set_candidate(&mut self, candidate: Option<Package>) {
        self.candidate = candidate;
    }

    pub fn installed(&self) -> Option<&Package> {
        self.installed.as_ref()
    }

    pub fn set_installed(&mut self, installed: Option<Package>) {
        self.installed = installed;
    }

    pub fn is_installed(&self) -> bool {
        self.installed.is_some()
    }

    /// Candidate summary; `None` when the package is only installed.
    pub fn summary(&self) -> Option<&str> {
        self.candidate.as_ref().map(|p| p.summary.as_str())
    }

    /// Candidate version; `None` when the package is only installed.
    pub fn version(&self) -> Option<&str> {
        self.candidate.as_ref().map(|p| p.version.as_str())
    }

    /// Extra value stored with [`record_set`](Self::record_set).
    pub fn record(&self, name: &str) -> Result<&Value> {
        self.records
            .get(name)
            .ok_or_else(|| Error::RecordNotFound(name.to_string()))
    }

    pub fn has_record(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn record_set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.records.insert(name.into(), value.into());
    }

    pub fn records(&self) -> &Map<String, Value> {
        &self.records
    }

    /// `name;version-release;arch;repo`
    pub fn pkname(&self) -> Result<String> {
        let (pkg, repo) = self.identity()?;
        Ok(format!(
            "{};{}-{};{};{}",
            self.name, pkg.version, pkg.release, pkg.arch, repo
        ))
    }

    /// `name,epoch,version,release,arch,repo`
    pub fn cname(&self) -> Result<String> {
        let (pkg, repo) = self.identity()?;
        Ok(format!(
            "{},{},{},{},{},{}",
            self.name, pkg.epoch, pkg.version, pkg.release, pkg.arch, repo
        ))
    }

    /// Package supplying the version fields plus the repo field.
    fn identity(&self) -> Result<(&Package, &str)> {
        match (&self.candidate, &self.installed) {
            (Some(candidate), _) => Ok((candidate, candidate.repoid.as_str())),
            (None, Some(installed)) => Ok((installed, INSTALLED_REPO)),
            (None, None) => Err(Error::NoPackage(self.name.clone())),
        }
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::package;
    use serde_json::json;

    #[test]
    fn test_pkname_with_candidate() {
        let record = PackageRecord::with_candidate(package("curl", "7.61.1", "18.el8", "base"));
        assert_eq!(record.pkname().unwrap(), "curl;7.61.1-18.el8;x86_64;base");
        assert_eq!(record.cname().unwrap(), "curl,0,7.61.1,18.el8,x86_64,base");
    }

    #[test]
    fn test_identity_prefers_candidate_repo_when_also_installed() {
        let mut record = PackageRecord::with_candidate(package("curl", "7.61.1", "18.el8", "base"));
        record.set_installed(Some(package("curl", "7.61.1", "14.el8", "@System")));
        assert_eq!(record.pkname().unwrap(), "curl;7.61.1-18.el8;x86_64;base");
    }

    #[test]
    fn test_identity_installed_only() {
        let mut installed = package("kernel", "4.18.0", "80.el8", "@System");
        installed.epoch = 1;
        let mut record = PackageRecord::new("kernel");
        record.set_installed(Some(installed));

        assert_eq!(record.pkname().unwrap(), "kernel;4.18.0-80.el8;x86_64;installed");
        assert_eq!(record.cname().unwrap(), "kernel,1,4.18.0,80.el8,x86_64,installed");
    }

    #[test]
    fn test_identity_without_any_package() {
        let record = PackageRecord::new("ghost");
        assert!(matches!(record.pkname(), Err(Error::NoPackage(name)) if name == "ghost"));
        assert!(record.cname().is_err());
    }

    #[test]
    fn test_summary_and_version_need_candidate() {
        let mut record = PackageRecord::new("bash");
        record.set_installed(Some(package("bash", "5.2.26", "3.fc40", "@System")));
        assert_eq!(record.summary(), None);
        assert_eq!(record.version(), None);

        record.set_candidate(Some(package("bash", "5.2.32", "1.fc40", "updates")));
        assert_eq!(record.version(), Some("5.2.32"));
        assert_eq!(record.summary(), Some("bash package"));
    }

    #[test]
    fn test_records() {
        let mut record = PackageRecord::new("akmod-nvidia");
        assert!(!record.has_record("modaliases"));
        assert!(matches!(
            record.record("modaliases"),
            Err(Error::RecordNotFound(name)) if name == "modaliases"
        ));

        record.record_set("modaliases", json!(["pci:v000010DEd*sv*sd*bc03sc*i*"]));
        record.record_set("free", false);
        assert!(record.has_record("modaliases"));
        assert_eq!(
            record.record("modaliases").unwrap(),
            &json!(["pci:v000010DEd*sv*sd*bc03sc*i*"])
        );
        assert_eq!(record.record("free").unwrap(), &Value::Bool(false));

        // Overwrite
        record.record_set("free", true);
        assert_eq!(record.record("free").unwrap(), &Value::Bool(true));
        assert_eq!(record.records().len(), 2);
    }

    #[test]
    fn test_name_display_and_installed_flag() {
        let mut record = PackageRecord::new("vim");
        assert_eq!(record.to_string(), "vim");
        assert_eq!(record.shortname(), "vim");
        assert!(!record.is_installed());

        record.set_name("vim-enhanced");
        record.set_installed(Some(package("vim-enhanced", "9.1", "1.fc40", "@System")));
        assert_eq!(record.name(), "vim-enhanced");
        assert!(record.is_installed());

        record.set_installed(None);
        assert!(!record.is_installed());
    }

    #[test]
    fn test_serialize_skips_empty_records() {
        let record = PackageRecord::with_candidate(package("curl", "7.61.1", "18.el8", "base"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "curl");
        assert_eq!(value["candidate"]["repoid"], "base");
        assert!(value["installed"].is_null());
        assert!(value.get("records").is_none());
    }
}
