// src/db/models.rs

//! Package records read from the pacman databases

use crate::error::{Error, Result};
use crate::packages::PackageRecord;
use serde::Serialize;
use std::collections::HashMap;

/// An installed or repository package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    /// Owning sync repository; `None` for installed packages
    pub repository: Option<String>,
    pub depends: Vec<String>,
    pub conflicts: Vec<String>,
    pub replaces: Vec<String>,
    pub provides: Vec<String>,
    pub groups: Vec<String>,
}

impl PackageInfo {
    /// Create a record with only name and version set
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the owning repository
    pub fn in_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Build a record from parsed `%FIELD%` blocks
    pub fn from_fields(
        fields: &HashMap<String, Vec<String>>,
        repository: Option<&str>,
    ) -> Result<Self> {
        let first = |key: &str| fields.get(key).and_then(|v| v.first()).cloned();
        let list = |key: &str| fields.get(key).cloned().unwrap_or_default();

        let name = first("NAME").ok_or_else(|| Error::Database("Missing %NAME% field".to_string()))?;
        let version = first("VERSION")
            .ok_or_else(|| Error::Database(format!("Missing %VERSION% field for {}", name)))?;

        Ok(Self {
            name,
            version,
            description: first("DESC"),
            repository: repository.map(str::to_string),
            depends: list("DEPENDS"),
            conflicts: list("CONFLICTS"),
            replaces: list("REPLACES"),
            provides: list("PROVIDES"),
            groups: list("GROUPS"),
        })
    }
}

impl PackageRecord for PackageInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    fn replaces(&self) -> &[String] {
        &self.replaces
    }

    fn provides(&self) -> &[String] {
        &self.provides
    }
}

/// One package satisfying a provided name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderEntry {
    /// Name of the providing package
    pub package: String,
    /// Version attached to the provides line (`name=version`), if any
    pub version: Option<String>,
}

/// Split a provides line into the provided name and its optional version
pub fn split_provides(line: &str) -> Result<(String, Option<String>)> {
    let (name, version) = match line.split_once('=') {
        Some((name, version)) => (name.trim(), Some(version.trim())),
        None => (line.trim(), None),
    };

    if name.is_empty() {
        return Err(Error::InvalidDependency(line.to_string()));
    }

    Ok((
        name.to_string(),
        version.filter(|v| !v.is_empty()).map(str::to_string),
    ))
}
