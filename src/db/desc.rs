// src/db/desc.rs

//! Readers for pacman's on-disk package databases
//!
//! Both the local database (`<dbpath>/local/<pkg>/desc`) and the sync
//! databases (`<dbpath>/sync/<repo>.db`, a possibly compressed tarball of
//! `<pkg>/desc` and `<pkg>/depends` files) use the same text format: a
//! `%FIELD%` marker line followed by one value per line.

use super::models::PackageInfo;
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::{debug, warn};
use xz2::read::XzDecoder;

/// Parsed `%FIELD%` blocks
pub type DescFields = HashMap<String, Vec<String>>;

/// Parse a desc or depends file
pub fn parse_desc(content: &str) -> DescFields {
    let mut fields = HashMap::new();
    let mut current_field: Option<String> = None;
    let mut values: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.len() > 2 && trimmed.starts_with('%') && trimmed.ends_with('%') {
            if let Some(field) = current_field.take() {
                fields.insert(field, std::mem::take(&mut values));
            }
            current_field = Some(trimmed[1..trimmed.len() - 1].to_string());
        } else if !trimmed.is_empty() && current_field.is_some() {
            values.push(trimmed.to_string());
        }
    }

    if let Some(field) = current_field {
        fields.insert(field, values);
    }

    fields
}

/// Read every installed package from a local database directory
pub fn read_local_db(dir: &Path) -> Result<Vec<PackageInfo>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::Database(format!("Failed to read local database {}: {}", dir.display(), e))
    })?;

    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let desc_path = entry.path().join("desc");
        if !desc_path.is_file() {
            debug!("Skipping {} without desc file", entry.path().display());
            continue;
        }

        let content = fs::read_to_string(&desc_path)?;
        packages.push(PackageInfo::from_fields(&parse_desc(&content), None)?);
    }

    debug!("Read {} installed packages from {}", packages.len(), dir.display());
    Ok(packages)
}

/// Read every package from one sync database file
pub fn read_sync_db(path: &Path, repository: &str) -> Result<Vec<PackageInfo>> {
    let data = fs::read(path)?;
    let tarball = decompress(&data)
        .map_err(|e| Error::Database(format!("{}: {}", path.display(), e)))?;

    // desc and depends live side by side under one directory per package
    let mut by_dir: BTreeMap<String, DescFields> = BTreeMap::new();
    let mut archive = Archive::new(tarball.as_slice());

    for entry in archive.entries()? {
        let mut entry =
            entry.map_err(|e| Error::Database(format!("Failed to read tarball entry: {}", e)))?;
        let entry_path = entry
            .path()
            .map_err(|e| Error::Database(format!("Invalid path in tarball: {}", e)))?
            .to_string_lossy()
            .into_owned();

        let Some((dir, file)) = entry_path.rsplit_once('/') else {
            continue;
        };
        if file != "desc" && file != "depends" {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| Error::Database(format!("Failed to read {}: {}", entry_path, e)))?;

        by_dir
            .entry(dir.to_string())
            .or_default()
            .extend(parse_desc(&content));
    }

    let mut packages = Vec::with_capacity(by_dir.len());
    for (dir, fields) in by_dir {
        if !fields.contains_key("NAME") {
            warn!("{}: entry {} has no desc file", repository, dir);
            continue;
        }
        packages.push(PackageInfo::from_fields(&fields, Some(repository))?);
    }

    debug!("Read {} packages from {} database", packages.len(), repository);
    Ok(packages)
}

/// Decompress a sync database according to its magic bytes
fn decompress(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::new();

    if data.starts_with(&[0x1F, 0x8B]) {
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| format!("gzip: {}", e))?;
    } else if data.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]) {
        XzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| format!("xz: {}", e))?;
    } else if data.starts_with(&[0x28, 0xB5, 0x2F, 0xFD]) {
        out = zstd::decode_all(data).map_err(|e| format!("zstd: {}", e))?;
    } else {
        // Uncompressed tar
        out.extend_from_slice(data);
    }

    Ok(out)
}
