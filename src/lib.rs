//! `ironseam`: the core of a TLS command-and-control framework — a framed,
//! sentinel-delimited wire protocol (`frame`, `wire`), a session table and
//! liveness prober for a server managing many concurrently connected
//! endpoint agents (`session`, `accept`, `prober`), and the request/reply
//! state machine an operator drives interactively (`controller`) against the
//! single-threaded loop the agent runs (`agent`).
//!
//! Host introspection and artifact/allow-list file management round out the
//! two binaries in `src/bin/` (`host_info`, `file_manager`, `allowlist`,
//! `artifacts`) so they run end-to-end.

pub mod accept;
pub mod agent;
pub mod allowlist;
pub mod artifacts;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod file_manager;
pub mod frame;
pub mod host_info;
pub mod logging;
pub mod prober;
pub mod session;
pub mod timeout;
pub mod transport;
pub mod wire;
