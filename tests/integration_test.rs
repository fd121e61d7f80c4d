// tests/integration_test.rs

//! Integration tests for Aurum
//!
//! These tests drive the AUR client and the resolver together against a
//! scripted transport and a pacman database laid out in a temp directory.

use async_trait::async_trait;
use aurum::aur::{AurClient, MetadataCache};
use aurum::config::PacmanSection;
use aurum::db::{PackageDatabase, PacmanDatabase};
use aurum::resolver;
use aurum::rpc::{QueryResult, RpcTransport, codec};
use aurum::{Error, Result};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Serves info requests for a fixed set of AUR records, chunk-encoded
struct ScriptedTransport {
    records: Vec<serde_json::Value>,
    requests: AtomicUsize,
}

impl ScriptedTransport {
    fn new(records: Vec<serde_json::Value>) -> Self {
        Self {
            records,
            requests: AtomicUsize::new(0),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Encode `body` with one chunk per 7 bytes
fn chunked_response(body: &str) -> Vec<u8> {
    let mut raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for chunk in body.as_bytes().chunks(7) {
        raw.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        raw.extend_from_slice(chunk);
        raw.extend_from_slice(b"\r\n");
    }
    raw.extend_from_slice(b"0\r\n\r\n");
    raw
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    fn host(&self) -> &str {
        "aur.archlinux.org"
    }

    async fn fetch(&self, path: &str) -> Result<QueryResult> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let results: Vec<&serde_json::Value> = self
            .records
            .iter()
            .filter(|record| {
                let name = record["Name"].as_str().unwrap_or_default();
                path.split('&').any(|arg| arg == format!("arg[]={}", name))
            })
            .collect();

        let body = json!({
            "version": 5,
            "type": "multiinfo",
            "resultcount": results.len(),
            "results": results,
        });
        codec::parse(&chunked_response(&body.to_string()))
    }
}

fn write_local(db_path: &Path, name: &str, version: &str, extra: &str) {
    let dir = db_path.join("local").join(format!("{}-{}", name, version));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("desc"),
        format!("%NAME%\n{}\n\n%VERSION%\n{}\n\n{}", name, version, extra),
    )
    .unwrap();
}

fn write_sync(db_path: &Path, repository: &str, entries: &[(&str, &str, &str)]) {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, version, extra) in entries {
        let content = format!("%NAME%\n{}\n\n%VERSION%\n{}\n\n{}", name, version, extra);
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("{}-{}/desc", name, version),
                content.as_bytes(),
            )
            .unwrap();
    }

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    std::io::Write::write_all(&mut encoder, &builder.into_inner().unwrap()).unwrap();

    let sync = db_path.join("sync");
    fs::create_dir_all(&sync).unwrap();
    fs::write(
        sync.join(format!("{}.db", repository)),
        encoder.finish().unwrap(),
    )
    .unwrap();
}

/// A small system: vim and pulseaudio installed, core and extra configured
fn pacman_fixture() -> (TempDir, PacmanSection) {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("db");

    write_local(&db_path, "vim", "9.1-1", "");
    write_local(&db_path, "pulseaudio", "17.0-1", "%CONFLICTS%\npipewire-pulse\n");
    write_local(&db_path, "mksh", "59c-1", "%PROVIDES%\nsh=59\n");
    write_local(&db_path, "netcat-openbsd", "1.226-1", "");

    write_sync(
        &db_path,
        "core",
        &[
            ("vim", "9.1-2", ""),
            ("openbsd-netcat", "1.226-2", "%REPLACES%\nnetcat-openbsd\n"),
        ],
    );
    write_sync(
        &db_path,
        "extra",
        &[
            ("gvim", "9.1-2", "%CONFLICTS%\nvim\n"),
            ("pipewire-pulse", "1.2.0-1", ""),
            ("netcat-openbsd", "1.226-1", ""),
        ],
    );

    let conf = temp.path().join("pacman.conf");
    fs::write(
        &conf,
        "[options]\nArchitecture = auto\n\n[core]\nInclude = /etc/pacman.d/mirrorlist\n\n[extra]\nInclude = /etc/pacman.d/mirrorlist\n",
    )
    .unwrap();

    (
        temp,
        PacmanSection {
            db_path,
            config_file: conf,
        },
    )
}

#[tokio::test]
async fn test_conflicts_end_to_end() {
    let (_temp, section) = pacman_fixture();
    let db = PacmanDatabase::open(&section).unwrap();

    let transport = ScriptedTransport::new(vec![json!({
        "Name": "busybox-sh",
        "Version": "1.36.1-1",
        "Conflicts": ["sh>=50"],
    })]);
    let aur = AurClient::new(transport, Arc::new(MetadataCache::new()));

    let repo_packages = vec![
        db.repo_packages()["gvim"].clone(),
        db.repo_packages()["pipewire-pulse"].clone(),
    ];
    let aur_names = vec!["busybox-sh".to_string(), "does-not-exist".to_string()];

    let conflicts = resolver::find_conflicts(&db, &aur, &repo_packages, &aur_names)
        .await
        .unwrap();

    assert_eq!(conflicts.len(), 3);
    assert_eq!(conflicts["gvim"], vec!["vim".to_string()]);
    assert_eq!(conflicts["pipewire-pulse"], vec!["pulseaudio".to_string()]);
    assert_eq!(conflicts["busybox-sh"], vec!["mksh".to_string()]);
    assert_eq!(aur.transport().request_count(), 1);

    // The AUR record is cached now; a second analysis stays offline
    resolver::find_conflicts(&db, &aur, &[], &aur_names[..1])
        .await
        .unwrap();
    assert_eq!(aur.transport().request_count(), 1);
}

#[tokio::test]
async fn test_empty_transaction() {
    let (_temp, section) = pacman_fixture();
    let db = PacmanDatabase::open(&section).unwrap();
    let aur = AurClient::new(ScriptedTransport::new(Vec::new()), Arc::new(MetadataCache::new()));

    let conflicts = resolver::find_conflicts(&db, &aur, &[], &[]).await.unwrap();
    assert!(conflicts.is_empty());
    assert_eq!(aur.transport().request_count(), 0);
}

#[test]
fn test_replacements_from_sync_databases() {
    let (_temp, section) = pacman_fixture();
    let db = PacmanDatabase::open(&section).unwrap();

    // openbsd-netcat in core (priority 0) outranks netcat-openbsd in extra (1)
    let replacements = resolver::find_replacements(&db).unwrap();
    assert_eq!(replacements.len(), 1);
    assert_eq!(
        replacements["openbsd-netcat"],
        vec!["netcat-openbsd".to_string()]
    );
}

#[test]
fn test_missing_pacman_conf() {
    let (temp, mut section) = pacman_fixture();
    section.config_file = temp.path().join("nope.conf");

    assert!(matches!(
        PacmanDatabase::open(&section),
        Err(Error::Database(_))
    ));
}

#[tokio::test]
async fn test_lookup_splits_large_requests() {
    let records: Vec<serde_json::Value> = (0..250)
        .map(|i| json!({"Name": format!("pkg{:03}", i), "Version": "1.0-1"}))
        .collect();
    let aur = AurClient::new(ScriptedTransport::new(records), Arc::new(MetadataCache::new()));

    let names: Vec<String> = (0..250).map(|i| format!("pkg{:03}", i)).collect();
    let result = aur.lookup_by_names(&names[..]).await.unwrap();

    assert_eq!(result.found.len(), 250);
    assert!(result.not_found.is_empty());
    assert_eq!(aur.transport().request_count(), 3);
    assert_eq!(aur.cache().len(), 250);
}
