// src/db/pacman_conf.rs

//! Repository order from pacman.conf

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Repository names in the order they are declared
///
/// Every `[section]` except `[options]` names a repository. Directives
/// inside sections, `Include` lines among them, are not followed.
pub fn parse_repositories(content: &str) -> Vec<String> {
    let mut repositories: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }

        let Some(section) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .map(str::trim)
        else {
            continue;
        };

        if section.is_empty() || section == "options" {
            continue;
        }
        if !repositories.iter().any(|repo| repo == section) {
            repositories.push(section.to_string());
        }
    }

    repositories
}

/// Read repository order from a pacman.conf file
pub fn read_repositories(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Database(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(parse_repositories(&content))
}
