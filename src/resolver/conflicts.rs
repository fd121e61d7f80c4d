// src/resolver/conflicts.rs

//! Conflict detection between new and installed packages
//!
//! Three kinds of collision are reported for a new package `P`:
//! - `P` declares a conflict (or replace) line naming another known package
//! - `P` declares a line naming something an installed package provides
//! - an installed package declares a line naming `P`
//!
//! Every predicate is evaluated against the version a package will have
//! once the transaction is done.

use super::{ConflictMap, record};
use crate::aur::{AurClient, AurPackage};
use crate::db::{PackageDatabase, PackageInfo};
use crate::error::Result;
use crate::packages::PackageRecord;
use crate::rpc::RpcTransport;
use crate::version::ConflictSpec;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Find conflicts for a transaction of sync and AUR packages
///
/// AUR names are resolved through the client's cache. Names the AUR does
/// not know are logged and left out of the analysis.
pub async fn find_conflicts<T, D>(
    db: &D,
    aur: &AurClient<T>,
    repo_packages: &[PackageInfo],
    aur_names: &[String],
) -> Result<ConflictMap>
where
    T: RpcTransport,
    D: PackageDatabase + ?Sized,
{
    let lookup = aur.lookup_by_names(aur_names).await?;
    for name in &lookup.not_found {
        warn!("AUR package not found: {}", name);
    }

    conflicts_between(db, repo_packages, &lookup.found)
}

/// Find conflicts for already resolved new packages
pub fn conflicts_between<D>(
    db: &D,
    repo_packages: &[PackageInfo],
    aur_packages: &[AurPackage],
) -> Result<ConflictMap>
where
    D: PackageDatabase + ?Sized,
{
    let local = db.local_packages();
    let provides = db.local_provides()?;

    // Post-transaction version of every known package: a new sync version
    // wins over a new AUR version, which wins over the installed one
    let mut versions: HashMap<&str, &str> = HashMap::new();
    for pkg in local.values() {
        versions.insert(pkg.name(), pkg.version());
    }
    for pkg in aur_packages {
        versions.insert(pkg.name(), pkg.version());
    }
    for pkg in repo_packages {
        versions.insert(pkg.name(), pkg.version());
    }

    let mut new_packages: Vec<&dyn PackageRecord> = Vec::new();
    new_packages.extend(repo_packages.iter().map(|p| p as &dyn PackageRecord));
    new_packages.extend(aur_packages.iter().map(|p| p as &dyn PackageRecord));

    let mut result = ConflictMap::new();

    for pkg in &new_packages {
        let new_name = pkg.name();

        for spec in parse_lines(new_name, &pkg.conflict_lines())? {
            if spec.name == new_name {
                continue;
            }

            if let Some(version) = versions.get(spec.name.as_str())
                && spec.matches(version)
            {
                debug!("{} conflicts with {}", new_name, spec.name);
                record(&mut result, new_name, &spec.name);
            }

            for provider in provides.get(&spec.name).into_iter().flatten() {
                if provider.package == new_name {
                    continue;
                }

                let version = provider
                    .version
                    .as_deref()
                    .or_else(|| versions.get(provider.package.as_str()).copied());
                let hit = match version {
                    Some(version) => spec.matches(version),
                    None => spec.constraint.is_none(),
                };

                if hit {
                    debug!(
                        "{} conflicts with {} (provides {})",
                        new_name, provider.package, spec.name
                    );
                    record(&mut result, new_name, &provider.package);
                }
            }
        }
    }

    // Conflicts declared only by the installed side
    for installed in local.values() {
        let lines = installed.conflict_lines();
        if lines.is_empty() {
            continue;
        }
        let specs = parse_lines(&installed.name, &lines)?;

        for pkg in &new_packages {
            let new_name = pkg.name();
            if new_name == installed.name {
                continue;
            }

            let version = versions.get(new_name).copied().unwrap_or(pkg.version());
            if specs
                .iter()
                .any(|spec| spec.name == new_name && spec.matches(version))
            {
                debug!("Installed {} conflicts with {}", installed.name, new_name);
                record(&mut result, new_name, &installed.name);
            }
        }
    }

    info!(
        "Found conflicts for {} of {} new packages",
        result.len(),
        new_packages.len()
    );
    Ok(result)
}

/// Parse every conflict line of one package, failing on the first bad line
fn parse_lines(owner: &str, lines: &[String]) -> Result<Vec<ConflictSpec>> {
    lines
        .iter()
        .map(|line| {
            ConflictSpec::parse(line).inspect_err(|e| {
                warn!("Invalid conflict line in {}: {}", owner, e);
            })
        })
        .collect()
}
