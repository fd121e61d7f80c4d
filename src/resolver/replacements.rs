// src/resolver/replacements.rs

//! Sync packages that supersede installed ones

use super::{ReplaceMap, record};
use crate::db::{PackageDatabase, PackageInfo};
use crate::error::{Error, Result};
use crate::version::ConflictSpec;
use tracing::{debug, warn};

/// Find installed packages that sync packages declare to replace
///
/// A sync package `R` replaces an installed `X` when `X` is not itself
/// available from any repository, or when `R`'s repository ranks at least
/// as high as `X`'s (lower or equal priority number).
pub fn find_replacements<D>(db: &D) -> Result<ReplaceMap>
where
    D: PackageDatabase + ?Sized,
{
    let local = db.local_packages();
    let repo = db.repo_packages();
    let mut result = ReplaceMap::new();

    for replacer in repo.values().filter(|pkg| !pkg.replaces.is_empty()) {
        for line in &replacer.replaces {
            let spec = ConflictSpec::parse(line).inspect_err(|e| {
                warn!("Invalid replaces line in {}: {}", replacer.name, e);
            })?;
            if spec.name == replacer.name {
                continue;
            }

            let Some(installed) = local.get(&spec.name) else {
                continue;
            };
            if !spec.matches(&installed.version) {
                continue;
            }

            let replaces = match repo.get(&spec.name) {
                None => true,
                Some(replaced) => priority_of(db, replacer)? <= priority_of(db, replaced)?,
            };

            if replaces {
                debug!("{} replaces {}", replacer.name, spec.name);
                record(&mut result, &replacer.name, &spec.name);
            }
        }
    }

    Ok(result)
}

fn priority_of<D>(db: &D, pkg: &PackageInfo) -> Result<i32>
where
    D: PackageDatabase + ?Sized,
{
    let repository = pkg
        .repository
        .as_deref()
        .ok_or_else(|| Error::Database(format!("{} has no owning repository", pkg.name)))?;
    db.repo_priority(repository)
}
