//! File-manager collaborator: tailing `auth.log` for the operator's
//! statistics header, and generating the `known_good_binary_hashes.txt`
//! manifest. Out of the core's responsibility  ("File manager
//! (external collaborator)"), but specified by the interfaces the core
//! consumes (§6 "Persisted state").
//!
//! Modeled on `file_manager.py`'s
//! `get_last_5_auth_messages`/`format_last_5_auth_messages` and
//! `generate_known_good_hashes`/`calculate_sha256_of_binary`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const TAIL_COUNT: usize = 5;

/// Reads the last `TAIL_COUNT` lines of `auth.log` for the operator's
/// statistics header (`server_controller.py::format_last_5_auth_messages`).
pub fn tail_auth_log(path: &Path) -> Vec<String> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(TAIL_COUNT);
    lines[start..].iter().map(|line| line.to_string()).collect()
}

/// Walks `binary_paths` one level deep, hashing every regular file found and
/// writing `path:hex_digest` lines to `known_good_binary_hashes.txt`.
pub fn generate_known_good_hashes(
    binary_paths: &[PathBuf],
    out_path: &Path,
) -> std::io::Result<usize> {
    let mut manifest = String::new();
    let mut hashed = 0;

    for dir in binary_paths {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(digest) = sha256_of_file(&path) {
                manifest.push_str(&format!("{}:{}\n", path.display(), digest));
                hashed += 1;
            }
        }
    }

    std::fs::write(out_path, manifest)?;
    Ok(hashed)
}

fn sha256_of_file(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_returns_last_five_lines_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");
        let body = (1..=8)
            .map(|n| format!("{n:02}:00:00 - INFO - line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, body).unwrap();

        let tail = tail_auth_log(&path);
        assert_eq!(tail.len(), 5);
        assert!(tail[0].contains("line 4"));
        assert!(tail[4].contains("line 8"));
    }

    #[test]
    fn tail_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tail_auth_log(&dir.path().join("nope.log")).is_empty());
    }

    #[test]
    fn hashes_regular_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), b"hello").unwrap();
        std::fs::write(dir.path().join("b.bin"), b"world").unwrap();
        let out = dir.path().join("known_good_binary_hashes.txt");

        let count = generate_known_good_hashes(&[dir.path().to_path_buf()], &out).unwrap();
        assert_eq!(count, 2);
        let manifest = std::fs::read_to_string(&out).unwrap();
        assert_eq!(manifest.lines().count(), 2);
    }
}
