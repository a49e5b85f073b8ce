//! The agent's read-dispatch-reply loop.
//!
//! Modeled on `client.py`'s `ready_to_receive`: one
//! connection, read one request, dispatch on its verb, write back one
//! reply, repeat until `exit` or the connection drops. The chained
//! `if data == ...` ladder becomes a `match` over [`Request`], the REDESIGN
//! FLAG of the protocol

use std::fs;
use std::path::Path;

use base64::Engine;
use tracing::{info, warn};

use crate::error::TransportError;
use crate::frame::{write_frame, FrameReader};
use crate::host_info::HostInfo;
use crate::transport::IoStream;
use crate::wire::{Reply, Request};

/// Serves one controller connection until `exit` is received or the
/// connection is dropped.
pub async fn run(
    mut stream: IoStream,
    max_frame_bytes: usize,
    host_info: &mut dyn HostInfo,
) -> Result<(), TransportError> {
    let mut reader = FrameReader::new(max_frame_bytes);

    loop {
        let frame = match reader.read_frame(&mut stream).await? {
            Some(frame) => frame,
            None => {
                info!("controller closed the connection");
                return Ok(());
            }
        };

        let request = match Request::parse(&frame) {
            Ok(request) => request,
            Err(err) => {
                warn!("malformed request, ignoring: {err}");
                continue;
            }
        };

        if matches!(request, Request::Exit) {
            info!("received exit, shutting down");
            return Ok(());
        }

        if let Some(reply) = handle(request, host_info) {
            write_frame(&mut stream, &reply.render()).await?;
        }
    }
}

/// Dispatches one request to its reply. Returns `None` for the one case with
/// no reply on success: a successful upload is
/// silently acknowledged; only a failed one sends `send|denied`.
fn handle(request: Request, host_info: &mut dyn HostInfo) -> Option<Reply> {
    Some(match request {
        Request::Hello => Reply::Hello,
        Request::Exit => unreachable!("exit is handled by the caller before dispatch"),
        Request::Processes => Reply::Processes {
            body: host_info.processes(),
        },
        Request::SysInfo => Reply::SysInfo {
            body: host_info.sysinfo(),
        },
        Request::Disk => Reply::DiskInfo {
            body: host_info.disk(),
        },
        Request::ListDir { path } => list_dir(&path),
        Request::CheckFile { path } => Reply::CheckFile {
            exists: Path::new(&path).is_file(),
        },
        Request::RequestFile { path } => send_file(&path),
        Request::SendFile {
            basename,
            payload_b64,
        } => return receive_file(&basename, &payload_b64),
    })
}

fn list_dir(path: &str) -> Reply {
    match fs::read_dir(path) {
        Ok(entries) => {
            let names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            Reply::DirListing {
                body: names.join("\n"),
            }
        }
        Err(err) => match err.kind() {
            std::io::ErrorKind::NotFound => Reply::DirNotFound,
            std::io::ErrorKind::PermissionDenied => Reply::PermissionDenied,
            _ if Path::new(path).is_file() => Reply::NotADirectory,
            _ => Reply::DirNotFound,
        },
    }
}

fn send_file(path: &str) -> Reply {
    match fs::read(path) {
        Ok(bytes) => Reply::Send {
            payload_b64: base64::engine::general_purpose::STANDARD.encode(bytes),
        },
        Err(err) => {
            warn!("error reading requested file {path}: {err}");
            Reply::SendDenied
        }
    }
}

fn receive_file(basename: &str, payload_b64: &str) -> Option<Reply> {
    let write_result = base64::engine::general_purpose::STANDARD
        .decode(payload_b64)
        .map_err(|err| err.to_string())
        .and_then(|bytes| fs::write(basename, bytes).map_err(|err| err.to_string()));

    match write_result {
        Ok(()) => {
            info!("file received and saved {basename}");
            // No reply frame is sent on a successful write (the protocol
            // "Upload (put)"); only a failure is reported back.
            None
        }
        Err(err) => {
            warn!("error saving received file {basename}: {err}");
            Some(Reply::SendDenied)
        }
    }
}
