//! The IP allow-list the accept loop consults on every admission decision.
//!
//! Modeled on `file_manager.py`'s
//! `get_authorised_ips` property, which re-reads `authorised_ips.txt` on
//! every access rather than caching it — the protocol "AllowList": "so the
//! operator may add entries live".

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::AuthError;

pub struct AllowList {
    path: PathBuf,
}

impl AllowList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AllowList { path: path.into() }
    }

    /// Creates an empty `authorised_ips.txt` if one doesn't exist yet (spec
    /// §6 "Persisted state").
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        if !self.path.exists() {
            std::fs::write(&self.path, "")?;
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<IpAddr>, AuthError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            AuthError::AllowListUnreadable {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(text
            .lines()
            .filter_map(|line| line.trim().parse::<IpAddr>().ok())
            .collect())
    }

    pub fn is_authorised(&self, ip: IpAddr) -> bool {
        match self.load() {
            Ok(ips) => ips.contains(&ip),
            Err(err) => {
                warn!("could not read allow-list, rejecting by default: {err}");
                false
            }
        }
    }

    /// Writes an `authorised <ip>` line to the `auth` log target, which is
    /// routed to `auth.log` (the protocol "Persisted state", §4.3).
    pub fn log_authorised(&self, ip: IpAddr) {
        info!(target: "auth", "authorised {ip}");
    }

    pub fn log_rejected(&self, ip: IpAddr) {
        info!(target: "auth", "rejected {ip}");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_creates_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authorised_ips.txt");
        let list = AllowList::new(&path);
        list.ensure_exists().unwrap();
        assert!(path.exists());
        assert!(!list.is_authorised("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn reloads_on_every_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authorised_ips.txt");
        let list = AllowList::new(&path);
        list.ensure_exists().unwrap();

        let ip = "10.0.0.5".parse().unwrap();
        assert!(!list.is_authorised(ip));

        std::fs::write(&path, "10.0.0.5\n").unwrap();
        assert!(list.is_authorised(ip));
    }
}
