//! Default values for optional configuration fields and well-known on-disk
//! paths, mirrored from zeekoe's `project_dirs()` + per-binary-namespace
//! (`pub mod controller`/`pub mod agent` in place of `merchant`/`customer`)
//! shape. The teacher's zkChannel-specific constants (self-delay,
//! confirmation depth, Tezos timeouts) are replaced with this crate's own
//! (liveness period, frame size ceiling, artifact/log directory names) drawn
//! from the protocol

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

fn project_dirs() -> Result<ProjectDirs, anyhow::Error> {
    ProjectDirs::from("", shared::ORGANIZATION, shared::APPLICATION)
        .ok_or_else(|| anyhow::anyhow!("could not determine a configuration directory"))
}

pub(crate) mod shared {
    use super::*;

    pub const ORGANIZATION: &str = "Ironseam";

    pub const APPLICATION: &str = "ironseam";

    /// Port is hard-coded  "Configuration": "Port is hard-coded
    /// to 999."
    pub const fn port() -> u16 {
        999
    }

    /// Liveness probe period (the protocol: "A background task running on a
    /// fixed period (10 s)").
    pub const fn liveness_period() -> Duration {
        Duration::from_secs(10)
    }

    /// Operator-configured frame size ceiling (the protocol: "implementations
    /// should enforce an operator-configured ceiling and close the session
    /// on overflow").
    pub const fn max_frame_bytes() -> usize {
        16 * 1024 * 1024
    }

    /// Size of the buffer `FrameReader` reads into per `AsyncRead::read`
    /// call (the protocol §4.1: "reads in chunks (suggested 1024 bytes)").
    pub const fn read_chunk_bytes() -> usize {
        1024
    }
}

pub mod controller {
    use super::*;

    pub use super::shared::*;

    pub const fn address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
    }

    pub const CONFIG_FILE: &str = "config.toml";

    pub const CERT_FILE: &str = "cert.pem";

    pub const KEY_FILE: &str = "key.pem";

    pub const ALLOWLIST_FILE: &str = "authorised_ips.txt";

    pub const AUTH_LOG_FILE: &str = "auth.log";

    pub const SERVER_LOG_FILE: &str = "server.log";

    pub const KNOWN_GOOD_HASHES_FILE: &str = "known_good_binary_hashes.txt";

    pub fn config_path() -> Result<PathBuf, anyhow::Error> {
        Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
    }

    /// Root directory under which `cert.pem`/`key.pem`, the allow-list, the
    /// logs, and every artifact sink live, unless overridden by `config.toml`
    /// or a CLI flag.
    pub fn data_dir() -> PathBuf {
        match project_dirs() {
            Ok(dirs) => dirs.data_dir().to_path_buf(),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Directories the `good` command walks to build
    /// `known_good_binary_hashes.txt`, matching
    /// `file_manager.py`'s `_binary_paths = ["/usr/bin"]`.
    pub fn known_good_hash_paths() -> Vec<PathBuf> {
        vec![PathBuf::from("/usr/bin")]
    }
}

pub mod agent {
    use super::*;

    pub use super::shared::*;

    pub const fn reconnect_delay() -> Duration {
        Duration::from_secs(5)
    }
}
