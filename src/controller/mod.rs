//! The operator-facing request/reply state machine driving one session at a
//! time, plus whole-table operations (`list`, global `exit`).
//!
//! Modeled on `server_controller.py`'s
//! `CreateController`: `control_client`/`action_validated_client_command`
//! become the tagged-enum dispatch of `menu.rs` (the design choice of spec
//! §9 — "reimplement as a tagged-variant request/reply enum with a single
//! dispatch table"), and its per-verb `get_client_*`/`recv_*_from_client`
//! pairs become `commands.rs`.

pub mod commands;
pub mod menu;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::artifacts::ArtifactRoot;
use crate::error::{FilesystemError, ProtocolError, TransportError};
use crate::frame::write_frame;
use crate::session::{Session, SessionState, SharedSessionTable};
use crate::wire::Request;

/// Spec §4.6 "kill"/"Global exit": the agent is given one second to notice
/// the `exit` frame and close before the controller drops its end.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Errors arising while driving one command's request/reply exchange.
/// Combines the taxonomy kinds of the protocol that a single exchange can raise.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Drives the request/reply state machine and whole-table operations.
/// Holds the session table and the artifact sinks commands persist into.
pub struct Controller {
    table: SharedSessionTable,
    artifacts: ArtifactRoot,
}

impl Controller {
    pub fn new(table: SharedSessionTable, artifacts: ArtifactRoot) -> Self {
        Controller { table, artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactRoot {
        &self.artifacts
    }

    pub fn session_count(&self) -> usize {
        self.table.lock().expect("session table poisoned").len()
    }

    pub fn render_table(&self) -> String {
        self.table
            .lock()
            .expect("session table poisoned")
            .to_string()
    }

    pub fn get(&self, index: usize) -> Option<Session> {
        self.table.lock().expect("session table poisoned").get(index)
    }

    /// Sends `exit` to the session at `index`, waits the grace period, and
    /// removes it from the table regardless of whether the write succeeded
    ///.
    pub async fn kill(&self, index: usize) -> Option<Session> {
        let session = self.get(index)?;
        {
            let mut io = session.io.lock().await;
            io.state = SessionState::Closed;
            if let Err(err) = write_frame(&mut io.stream, &Request::Exit.render()).await {
                warn!("error sending exit to session {index}: {err}");
            }
        }
        tokio::time::sleep(CLOSE_GRACE_PERIOD).await;
        let removed = self.table.lock().expect("session table poisoned").remove(index);
        info!("session {index} ({}) killed by operator", session.addr);
        removed
    }

    /// Global `exit`: sends `exit` to every session, waits the grace period
    /// once, then drains the table.
    pub async fn shutdown_all(&self) {
        let sessions: Vec<Session> = {
            let guard = self.table.lock().expect("session table poisoned");
            guard.iter().cloned().collect()
        };

        for session in &sessions {
            let mut io = session.io.lock().await;
            io.state = SessionState::Closed;
            if let Err(err) = write_frame(&mut io.stream, &Request::Exit.render()).await {
                warn!("error sending exit to {}: {err}", session.addr);
            }
        }

        tokio::time::sleep(CLOSE_GRACE_PERIOD).await;

        self.table.lock().expect("session table poisoned").clear();
        info!("all sessions closed");
    }

    pub fn generate_known_good_hashes(&self, binary_paths: &[PathBuf], out_path: &PathBuf) {
        match crate::file_manager::generate_known_good_hashes(binary_paths, out_path) {
            Ok(count) => info!("generated {count} known-good binary hashes"),
            Err(err) => warn!("failed to generate known-good hashes: {err}"),
        }
    }
}
