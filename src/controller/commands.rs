//! One request/reply exchange per verb, run while holding the session's I/O
//! lock for the duration of the round trip.
//!
//! Modeled on `server_controller.py`'s
//! `get_client_processes`/`get_client_sysinfo`/`get_client_disk_info`/
//! `get_dir_listing`/`request_file_from_client`/`send_file_to_client`, each
//! of which here becomes one function returning a typed outcome instead of
//! printing directly.

use std::path::PathBuf;

use base64::Engine;

use crate::artifacts::{ArtifactKind, ArtifactRoot};
use crate::error::{ProtocolError, TransportError};
use crate::frame::write_frame;
use crate::session::{Session, SessionState};
use crate::wire::{Reply, Request};

use super::CommandError;

/// Runs one request/reply exchange, entering `state` before the request is
/// written and returning to `Idle` once the reply has been read (the protocol's
/// linear state transitions, made explicit per an explicit state machine).
async fn exchange(session: &Session, request: Request, state: SessionState) -> Result<Reply, CommandError> {
    let mut io = session.io.lock().await;
    io.state = state;
    write_frame(&mut io.stream, &request.render()).await?;
    let frame = io
        .reader
        .read_frame(&mut io.stream)
        .await?
        .ok_or(TransportError::PeerClosed)?;
    let reply = Reply::parse(&frame)?;
    io.state = SessionState::Idle;
    Ok(reply)
}

fn unexpected(reply: Reply) -> CommandError {
    CommandError::Protocol(ProtocolError::MalformedPayload {
        verb: "reply",
        reason: format!("unexpected reply: {}", reply.render()),
    })
}

pub async fn processes(session: &Session, artifacts: &ArtifactRoot) -> Result<PathBuf, CommandError> {
    match exchange(session, Request::Processes, SessionState::AwaitingReply).await? {
        Reply::Processes { body } => {
            Ok(artifacts.save_dump(session.addr.ip(), ArtifactKind::Processes, &body)?)
        }
        other => Err(unexpected(other)),
    }
}

pub async fn sysinfo(session: &Session, artifacts: &ArtifactRoot) -> Result<(PathBuf, String), CommandError> {
    match exchange(session, Request::SysInfo, SessionState::AwaitingReply).await? {
        Reply::SysInfo { body } => {
            let path = artifacts.save_dump(session.addr.ip(), ArtifactKind::SysInfo, &body)?;
            Ok((path, body))
        }
        other => Err(unexpected(other)),
    }
}

pub async fn disk(session: &Session, artifacts: &ArtifactRoot) -> Result<(PathBuf, String), CommandError> {
    match exchange(session, Request::Disk, SessionState::AwaitingReply).await? {
        Reply::DiskInfo { body } => {
            let path = artifacts.save_dump(session.addr.ip(), ArtifactKind::Disk, &body)?;
            Ok((path, body))
        }
        other => Err(unexpected(other)),
    }
}

pub enum DirListingOutcome {
    Entries(String),
    NotFound,
    PermissionDenied,
    NotADirectory,
}

pub async fn listdir(session: &Session, path: &str) -> Result<DirListingOutcome, CommandError> {
    match exchange(
        session,
        Request::ListDir {
            path: path.to_string(),
        },
        SessionState::AwaitingReply,
    )
    .await?
    {
        Reply::DirListing { body } => Ok(DirListingOutcome::Entries(body)),
        Reply::DirNotFound => Ok(DirListingOutcome::NotFound),
        Reply::PermissionDenied => Ok(DirListingOutcome::PermissionDenied),
        Reply::NotADirectory => Ok(DirListingOutcome::NotADirectory),
        other => Err(unexpected(other)),
    }
}

pub enum DownloadOutcome {
    Saved(PathBuf),
    RemoteMissing,
}

/// Two-phase download: `checkfile` then
/// `request`, so a missing or forbidden remote path is reported before any
/// transfer is attempted.
pub async fn download(
    session: &Session,
    remote_path: &str,
    artifacts: &ArtifactRoot,
) -> Result<DownloadOutcome, CommandError> {
    match exchange(
        session,
        Request::CheckFile {
            path: remote_path.to_string(),
        },
        SessionState::FileTransferPhaseA,
    )
    .await?
    {
        Reply::CheckFile { exists: true } => {}
        Reply::CheckFile { exists: false } => return Ok(DownloadOutcome::RemoteMissing),
        other => return Err(unexpected(other)),
    }

    match exchange(
        session,
        Request::RequestFile {
            path: remote_path.to_string(),
        },
        SessionState::FileTransferPhaseB,
    )
    .await?
    {
        Reply::Send { payload_b64 } => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload_b64)
                .map_err(ProtocolError::Base64)?;
            Ok(DownloadOutcome::Saved(artifacts.save_download(remote_path, &bytes)?))
        }
        other => Err(unexpected(other)),
    }
}

/// Sends a file to the agent. No acknowledgement frame is defined on success
///; the only reply a misbehaving agent could send
/// is `send|denied`, which would surface as an unexpected reply to whatever
/// command is issued next on this session.
pub async fn upload(session: &Session, basename: &str, bytes: &[u8]) -> Result<(), CommandError> {
    let payload_b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut io = session.io.lock().await;
    io.state = SessionState::FileTransferPhaseB;
    write_frame(
        &mut io.stream,
        &Request::SendFile {
            basename: basename.to_string(),
            payload_b64,
        }
        .render(),
    )
    .await?;
    io.state = SessionState::Idle;
    Ok(())
}
