use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors arising from reading or writing frames on a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    PeerClosed,

    #[error("frame exceeded maximum size of {max} bytes")]
    FrameTooLarge { max: usize },

    #[error("frame was not valid UTF-8")]
    InvalidEncoding,

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors arising from interpreting a frame's body as a request or reply.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized verb: {0}")]
    UnknownVerb(String),

    #[error("malformed payload for verb {verb}: {reason}")]
    MalformedPayload { verb: &'static str, reason: String },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors arising from session-table admission and the IP allow-list.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("address {0} is not on the allow-list")]
    NotAuthorised(IpAddr),

    #[error("could not read allow-list at {path}: {source}")]
    AllowListUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors arising from artifact persistence, file transfer, or directory scaffolding.
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("path escapes the permitted root: {0}")]
    PathEscapesRoot(PathBuf),

    #[error("no such file: {0}")]
    NotFound(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors arising from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file at {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse configuration file at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not determine a configuration directory for this user")]
    NoConfigDir,
}

/// Errors that should terminate the owning task or process outright.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to generate TLS certificate: {0}")]
    CertGeneration(String),

    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
