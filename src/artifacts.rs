//! Persists reply bodies and downloaded files to the per-command artifact
//! directories.
//!
//! Filenames for introspection dumps follow `YYYYMMDDHHMMSS_<peer-ip>_<verb>`
//! at millisecond resolution plus a monotonic per-process counter, so two
//! dumps landing in the same second never collide.
//! Modeled on `server_controller.py`'s
//! `build_filename` and its `recv_*_from_client` methods' `open(...).write(...)`.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::error::FilesystemError;

static COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy)]
pub enum ArtifactKind {
    Processes,
    SysInfo,
    Disk,
}

impl ArtifactKind {
    fn dir_name(self) -> &'static str {
        match self {
            ArtifactKind::Processes => "client_process_dumps",
            ArtifactKind::SysInfo => "client_sysinfo_dumps",
            ArtifactKind::Disk => "client_disk_dumps",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ArtifactKind::Processes => "processes",
            ArtifactKind::SysInfo => "sysinfo",
            ArtifactKind::Disk => "disk",
        }
    }
}

/// Root directory under which every artifact sink (`downloaded_files/`,
/// `client_process_dumps/`, etc.) is scaffolded.
pub struct ArtifactRoot {
    root: PathBuf,
}

impl ArtifactRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactRoot { root: root.into() }
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            "downloaded_files",
            "client_process_dumps",
            "client_sysinfo_dumps",
            "client_disk_dumps",
            "tool_box",
        ] {
            std::fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    pub fn tool_box_dir(&self) -> PathBuf {
        self.root.join("tool_box")
    }

    pub fn downloaded_files_dir(&self) -> PathBuf {
        self.root.join("downloaded_files")
    }

    fn filename_for(&self, peer_ip: IpAddr, kind: ArtifactKind) -> String {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f");
        let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{timestamp}_{peer_ip}_{}_{sequence}", kind.verb())
    }

    /// Persists an introspection reply body under the directory matching
    /// `kind`, returning the path written.
    pub fn save_dump(
        &self,
        peer_ip: IpAddr,
        kind: ArtifactKind,
        body: &str,
    ) -> Result<PathBuf, FilesystemError> {
        let path = self
            .root
            .join(kind.dir_name())
            .join(self.filename_for(peer_ip, kind));
        std::fs::write(&path, body).map_err(FilesystemError::Io)?;
        Ok(path)
    }

    /// Persists a downloaded file under `downloaded_files/<basename>` (spec
    /// §3 "Artifact": "the basename of the requested remote path").
    pub fn save_download(&self, remote_path: &str, bytes: &[u8]) -> Result<PathBuf, FilesystemError> {
        let basename = Path::new(remote_path)
            .file_name()
            .ok_or_else(|| FilesystemError::NotFound(PathBuf::from(remote_path)))?;
        let path = self.downloaded_files_dir().join(basename);
        std::fs::write(&path, bytes).map_err(FilesystemError::Io)?;
        Ok(path)
    }

    pub fn list_tool_box(&self) -> Result<Vec<String>, FilesystemError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.tool_box_dir()).map_err(FilesystemError::Io)? {
            let entry = entry.map_err(FilesystemError::Io)?;
            if entry.file_type().map_err(FilesystemError::Io)?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_dump_writes_body_under_kind_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = ArtifactRoot::new(dir.path());
        root.ensure_directories().unwrap();

        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let path = root.save_dump(ip, ArtifactKind::SysInfo, "os info here").unwrap();
        assert!(path.starts_with(dir.path().join("client_sysinfo_dumps")));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "os info here");
    }

    #[test]
    fn successive_dumps_for_same_kind_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let root = ArtifactRoot::new(dir.path());
        root.ensure_directories().unwrap();
        let ip: IpAddr = "10.0.0.5".parse().unwrap();

        let a = root.save_dump(ip, ArtifactKind::Processes, "first").unwrap();
        let b = root.save_dump(ip, ArtifactKind::Processes, "second").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn save_download_uses_basename() {
        let dir = tempfile::tempdir().unwrap();
        let root = ArtifactRoot::new(dir.path());
        root.ensure_directories().unwrap();

        let path = root.save_download("/etc/hostname", b"raspberrypi\n").unwrap();
        assert_eq!(path, dir.path().join("downloaded_files").join("hostname"));
        assert_eq!(std::fs::read(path).unwrap(), b"raspberrypi\n");
    }
}
