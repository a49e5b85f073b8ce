//! The liveness prober: periodically sends `hello` to every session and
//! evicts the ones that don't answer in time.
//!
//! Modeled on `server_controller.py`'s
//! `check_clients_are_alive` (a `while True: sleep(10)` loop sending
//! `hello<EOM488965>` to each connection and dropping ones that raise).
//! A session currently under an operator command is skipped rather than
//! blocked on, via `try_lock` on [`SessionIo`] (the protocol "Concurrent probe vs.
//! command on one session" — the design choice fix), and failed sessions
//! within one sweep are removed highest-index-first so earlier removals
//! don't shift the indices of sessions still pending eviction.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::error::{ProtocolError, TransportError};
use crate::frame::write_frame;
use crate::session::SharedSessionTable;
use crate::timeout::WithTimeout;
use crate::wire::{Reply, Request};

/// How long a session is given to answer one `hello` before it's considered
/// dead.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Runs the probe sweep every `period` until the process exits.
pub async fn run(table: SharedSessionTable, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await;

    loop {
        interval.tick().await;
        sweep(&table).await;
    }
}

async fn sweep(table: &SharedSessionTable) {
    let sessions = {
        let guard = table.lock().expect("session table poisoned");
        guard.iter().cloned().enumerate().collect::<Vec<_>>()
    };

    let mut dead_indices = Vec::new();
    for (index, session) in sessions {
        match session.io.try_lock() {
            Ok(mut io) => {
                let outcome: Result<Result<Reply, ProbeError>, _> = async {
                    write_frame(&mut io.stream, &Request::Hello.render()).await?;
                    let frame = io
                        .reader
                        .read_frame(&mut io.stream)
                        .await?
                        .ok_or(TransportError::PeerClosed)?;
                    Ok(Reply::parse(&frame)?)
                }
                .with_timeout(PROBE_TIMEOUT)
                .await;

                match outcome {
                    Ok(Ok(Reply::Hello)) => {}
                    Ok(Ok(other)) => {
                        warn!(
                            "session {index} ({}) answered probe with an unexpected reply: {}",
                            session.addr,
                            other.render()
                        );
                        dead_indices.push(index);
                    }
                    Ok(Err(err)) => {
                        warn!("session {index} ({}) failed liveness probe: {err}", session.addr);
                        dead_indices.push(index);
                    }
                    Err(_elapsed) => {
                        warn!("session {index} ({}) timed out on liveness probe", session.addr);
                        dead_indices.push(index);
                    }
                }
            }
            Err(_would_block) => {
                // A command is in flight on this session; leave it for the
                // next sweep rather than waiting on it here.
            }
        }
    }

    if dead_indices.is_empty() {
        return;
    }

    let mut guard = table.lock().expect("session table poisoned");
    for index in dead_indices.into_iter().rev() {
        if let Some(session) = guard.remove(index) {
            info!("evicted unresponsive session {index} ({})", session.addr);
        }
    }
}
