use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::InputFileEntry;

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Local wall-clock stamp used in default output file names.
pub fn local_file_stamp(ts: DateTime<Local>) -> String {
    ts.format("%Y%m%d_%H%M%S").to_string()
}

/// `<stem of stem_source>_<stamp>.docx` inside `dir`.
pub fn timestamped_docx_path(stem_source: &Path, dir: &Path, stamp: &str) -> PathBuf {
    let stem = stem_source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    dir.join(format!("{stem}_{stamp}.docx"))
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn input_entry(role: &str, path: &Path) -> Result<InputFileEntry> {
    Ok(InputFileEntry {
        role: role.to_string(),
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}

/// Every `.docx` directly inside `dir`, sorted by path. Word lock files
/// (`~$name.docx`) are skipped.
pub fn discover_docx(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_docx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("docx"))
            .unwrap_or(false);
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("~$"))
            .unwrap_or(false);

        if is_docx && !is_lock_file {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scdocbuilder-util-{}-{name}", std::process::id()))
    }

    #[test]
    fn timestamped_path_uses_source_stem() {
        let path = timestamped_docx_path(
            Path::new("/in/template.docx"),
            Path::new("/out"),
            "20240102_030405",
        );
        assert_eq!(path, PathBuf::from("/out/template_20240102_030405.docx"));
    }

    #[test]
    fn discover_docx_is_sorted_and_skips_lock_files() {
        let dir = scratch_dir("discover");
        ensure_directory(&dir).expect("scratch dir created");
        for name in ["b.docx", "a.DOCX", "~$a.docx", "notes.txt"] {
            fs::write(dir.join(name), b"x").expect("scratch file writes");
        }
        ensure_directory(&dir.join("nested.docx")).expect("nested dir created");

        let found: Vec<String> = discover_docx(&dir)
            .expect("directory lists")
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .map(str::to_string)
            .collect();

        assert_eq!(found, vec!["a.DOCX", "b.docx"]);
        fs::remove_dir_all(&dir).expect("scratch dir removed");
    }

    #[test]
    fn sha256_matches_known_digest() {
        let dir = scratch_dir("hash");
        ensure_directory(&dir).expect("scratch dir created");
        let path = dir.join("abc.txt");
        fs::write(&path, b"abc").expect("scratch file writes");

        assert_eq!(
            sha256_file(&path).expect("file hashes"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        fs::remove_dir_all(&dir).expect("scratch dir removed");
    }
}
