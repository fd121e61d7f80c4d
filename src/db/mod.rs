// src/db/mod.rs

//! Local package database layer
//!
//! This module handles:
//! - The `PackageDatabase` interface the resolver consumes
//! - Loading the installed set and sync repositories from pacman's dbpath
//! - An in-memory database for callers that already hold package records

pub mod desc;
pub mod models;
pub mod pacman_conf;

pub use models::{PackageInfo, ProviderEntry};

use crate::config::PacmanSection;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Installed packages, sync packages and repository ranking
pub trait PackageDatabase: Send + Sync {
    /// Installed packages keyed by name
    fn local_packages(&self) -> &BTreeMap<String, PackageInfo>;

    /// Sync repository packages keyed by name
    fn repo_packages(&self) -> &BTreeMap<String, PackageInfo>;

    /// Rank of a repository; lower numbers take precedence
    fn repo_priority(&self, repository: &str) -> Result<i32>;

    /// Map of provided names to the installed packages providing them
    fn local_provides(&self) -> Result<HashMap<String, Vec<ProviderEntry>>> {
        let mut provides: HashMap<String, Vec<ProviderEntry>> = HashMap::new();

        for pkg in self.local_packages().values() {
            for line in &pkg.provides {
                let (name, version) = models::split_provides(line)?;
                provides.entry(name).or_default().push(ProviderEntry {
                    package: pkg.name.clone(),
                    version,
                });
            }
        }

        Ok(provides)
    }
}

/// Package database held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    local: BTreeMap<String, PackageInfo>,
    repo: BTreeMap<String, PackageInfo>,
    priorities: HashMap<String, i32>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a repository with its rank
    pub fn add_repository(&mut self, name: impl Into<String>, priority: i32) {
        self.priorities.insert(name.into(), priority);
    }

    /// Add an installed package
    pub fn add_local(&mut self, pkg: PackageInfo) {
        self.local.insert(pkg.name.clone(), pkg);
    }

    /// Add a sync package unless a package of the same name is already known
    pub fn add_repo(&mut self, pkg: PackageInfo) {
        self.repo.entry(pkg.name.clone()).or_insert(pkg);
    }

    pub fn with_repository(mut self, name: impl Into<String>, priority: i32) -> Self {
        self.add_repository(name, priority);
        self
    }

    pub fn with_local(mut self, pkg: PackageInfo) -> Self {
        self.add_local(pkg);
        self
    }

    pub fn with_repo(mut self, pkg: PackageInfo) -> Self {
        self.add_repo(pkg);
        self
    }
}

impl PackageDatabase for MemoryDatabase {
    fn local_packages(&self) -> &BTreeMap<String, PackageInfo> {
        &self.local
    }

    fn repo_packages(&self) -> &BTreeMap<String, PackageInfo> {
        &self.repo
    }

    fn repo_priority(&self, repository: &str) -> Result<i32> {
        self.priorities
            .get(repository)
            .copied()
            .ok_or_else(|| Error::RepositoryNotFound(repository.to_string()))
    }
}

/// Database loaded from a pacman dbpath and pacman.conf
#[derive(Debug, Clone)]
pub struct PacmanDatabase {
    inner: MemoryDatabase,
    repositories: Vec<String>,
}

impl PacmanDatabase {
    /// Load the installed set and every configured sync database
    ///
    /// Repositories are ranked by their position in pacman.conf. A repository
    /// whose sync database has not been downloaded yet is skipped with a
    /// warning; it keeps its rank.
    pub fn open(config: &PacmanSection) -> Result<Self> {
        let repositories = pacman_conf::read_repositories(&config.config_file)?;
        debug!("Configured repositories: {:?}", repositories);

        let mut inner = MemoryDatabase::new();

        for pkg in desc::read_local_db(&config.db_path.join("local"))? {
            inner.add_local(pkg);
        }

        for (position, repository) in repositories.iter().enumerate() {
            let priority = i32::try_from(position).unwrap_or(i32::MAX);
            inner.add_repository(repository.clone(), priority);

            let path = config.db_path.join("sync").join(format!("{}.db", repository));
            if !path.is_file() {
                warn!("Sync database for {} not found at {}", repository, path.display());
                continue;
            }

            for pkg in desc::read_sync_db(&path, repository)? {
                inner.add_repo(pkg);
            }
        }

        info!(
            "Loaded {} installed and {} repository packages",
            inner.local.len(),
            inner.repo.len()
        );

        Ok(Self { inner, repositories })
    }

    /// Repository names in priority order
    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }
}

impl PackageDatabase for PacmanDatabase {
    fn local_packages(&self) -> &BTreeMap<String, PackageInfo> {
        self.inner.local_packages()
    }

    fn repo_packages(&self) -> &BTreeMap<String, PackageInfo> {
        self.inner.repo_packages()
    }

    fn repo_priority(&self, repository: &str) -> Result<i32> {
        self.inner.repo_priority(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sync_db(dir: &std::path::Path, repository: &str, entries: &[(&str, &str)]) {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        fs::write(
            dir.join(format!("{}.db", repository)),
            builder.into_inner().unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_local_provides() {
        let mut bash = PackageInfo::new("bash", "5.2.037-1");
        bash.provides = vec!["sh".to_string()];
        let mut zsh = PackageInfo::new("zsh", "5.9-5");
        zsh.provides = vec!["sh=1.0".to_string()];

        let db = MemoryDatabase::new().with_local(bash).with_local(zsh);
        let provides = db.local_provides().unwrap();

        assert_eq!(
            provides["sh"],
            vec![
                ProviderEntry {
                    package: "bash".to_string(),
                    version: None
                },
                ProviderEntry {
                    package: "zsh".to_string(),
                    version: Some("1.0".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_unknown_repository() {
        let db = MemoryDatabase::new().with_repository("core", 0);
        assert_eq!(db.repo_priority("core").unwrap(), 0);
        assert!(matches!(
            db.repo_priority("testing"),
            Err(Error::RepositoryNotFound(name)) if name == "testing"
        ));
    }

    #[test]
    fn test_open_pacman_database() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("db");
        let local = db_path.join("local").join("vim-9.1-1");
        let sync = db_path.join("sync");
        fs::create_dir_all(&local).unwrap();
        fs::create_dir_all(&sync).unwrap();

        fs::write(local.join("desc"), "%NAME%\nvim\n\n%VERSION%\n9.1-1\n").unwrap();
        write_sync_db(
            &sync,
            "core",
            &[("vim-9.1-2/desc", "%NAME%\nvim\n\n%VERSION%\n9.1-2\n")],
        );
        write_sync_db(
            &sync,
            "extra",
            &[
                ("vim-9.0-1/desc", "%NAME%\nvim\n\n%VERSION%\n9.0-1\n"),
                ("gvim-9.0-1/desc", "%NAME%\ngvim\n\n%VERSION%\n9.0-1\n"),
            ],
        );

        let conf = temp.path().join("pacman.conf");
        fs::write(&conf, "[options]\n[core]\n[extra]\n[multilib]\n").unwrap();

        let db = PacmanDatabase::open(&PacmanSection {
            db_path,
            config_file: conf,
        })
        .unwrap();

        assert_eq!(db.repositories(), ["core", "extra", "multilib"]);
        assert_eq!(db.local_packages().len(), 1);
        assert_eq!(db.repo_packages().len(), 2);
        assert_eq!(db.repo_packages()["vim"].version, "9.1-2");
        assert_eq!(db.repo_packages()["vim"].repository.as_deref(), Some("core"));
        assert_eq!(db.repo_priority("extra").unwrap(), 1);
        assert_eq!(db.repo_priority("multilib").unwrap(), 2);
    }
}
