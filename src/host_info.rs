//! Host-introspection collaborator: process list, OS/CPU/memory summary, and
//! disk usage.
//!
//! Out of the *core's* responsibility  ("OS-specific
//! host-introspection ... specified only by the interfaces the core
//! consumes"), but the agent binary needs a concrete implementation to
//! answer `processes`/`sysinfo`/`disk` requests end-to-end, so it is
//! implemented behind a `HostInfo` trait and supplied to the agent loop.
//! Modeled on `trungda-neon`'s `vm_monitor` use of `sysinfo.workspace =
//! true`, replacing `client.py`'s Linux-only
//! `/proc` and `/etc/os-release` scraping (that file's own structure — one
//! static method per fact — is preserved here as one trait method per fact).

use sysinfo::{Disks, System};

pub trait HostInfo {
    fn processes(&mut self) -> String;
    fn sysinfo(&mut self) -> String;
    fn disk(&mut self) -> String;
}

/// The default `HostInfo`, backed by the `sysinfo` crate for portable
/// process/CPU/memory/disk data.
pub struct SystemHostInfo {
    system: System,
}

impl Default for SystemHostInfo {
    fn default() -> Self {
        SystemHostInfo {
            system: System::new(),
        }
    }
}

impl HostInfo for SystemHostInfo {
    fn processes(&mut self) -> String {
        self.system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        self.system
            .processes()
            .iter()
            .map(|(pid, process)| format!("PID: {pid}, Name: {}", process.name().to_string_lossy()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sysinfo(&mut self) -> String {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();

        let os = format!(
            "{} {}",
            System::long_os_version().unwrap_or_else(|| "unknown OS".to_string()),
            System::kernel_version().unwrap_or_default(),
        );
        let cpu = self
            .system
            .cpus()
            .first()
            .map(|cpu| {
                format!(
                    "Model Name: {}\nCores: {}\nMhz: {:.0}",
                    cpu.brand(),
                    self.system.cpus().len(),
                    cpu.frequency()
                )
            })
            .unwrap_or_else(|| "CPU information unavailable".to_string());
        let memory = format!(
            "MemTotal: {} kB\nMemFree: {} kB\nMemAvailable: {} kB",
            self.system.total_memory() / 1024,
            self.system.free_memory() / 1024,
            self.system.available_memory() / 1024,
        );

        format!("{os}\n{cpu}\n{memory}")
    }

    fn disk(&mut self) -> String {
        let disks = Disks::new_with_refreshed_list();
        let total: u64 = disks.iter().map(|d| d.total_space()).sum();
        let free: u64 = disks.iter().map(|d| d.available_space()).sum();
        let used = total.saturating_sub(free);

        format!(
            "Total disk: {:.2} GB\nUsed disk: {:.2} GB\nFree disk: {:.2} GB",
            bytes_to_gb(total),
            bytes_to_gb(used),
            bytes_to_gb(free),
        )
    }
}

fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / 1024f64.powi(3)
}
