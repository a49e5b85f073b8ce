//! The accept loop: binds the listening socket, wraps each connection in
//! TLS, and admits or rejects it against the IP allow-list.
//!
//! Modeled on `server_controller.py`'s
//! `authorise_client`/`add_authorised_connection_to_controller` (re-reads
//! the allow-list on every connection via [`AllowList::is_authorised`]) and
//! `create_server.py`'s `CreateServer` (binds, `listen`, spawns a handler per
//! accepted socket), combined with the spawn-per-connection shape of
//! `examples/other_examples/cedd47b6_tokio-rs-mini-redis__src-server.rs.rs`'s
//! `Listener::run`.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{info, warn};

use crate::allowlist::AllowList;
use crate::error::FatalError;
use crate::session::{Session, SharedSessionTable};
use crate::transport::IoStream;

/// Binds `addr` and accepts connections until the process is told to stop.
/// Each accepted socket is TLS-wrapped, checked against `allowlist`, and (if
/// authorised) inserted into `table`; rejected sockets are dropped
/// immediately without ever reaching the session table.
pub async fn run(
    addr: SocketAddr,
    acceptor: TlsAcceptor,
    allowlist: AllowList,
    table: SharedSessionTable,
    max_frame_bytes: usize,
) -> Result<(), FatalError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| FatalError::Bind { addr, source })?;
    info!("listening on {addr}");

    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                warn!("error accepting connection: {err}");
                continue;
            }
        };

        if !allowlist.is_authorised(peer_addr.ip()) {
            allowlist.log_rejected(peer_addr.ip());
            warn!("rejected connection from unauthorised address {peer_addr}");
            continue;
        }
        allowlist.log_authorised(peer_addr.ip());

        let acceptor = acceptor.clone();
        let table = table.clone();

        tokio::spawn(async move {
            let stream = match acceptor.accept(socket).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("TLS handshake with {peer_addr} failed: {err}");
                    return;
                }
            };

            let session = Session::new(peer_addr, IoStream::from(stream), max_frame_bytes);
            let index = table.lock().expect("session table poisoned").push(session);
            info!("session {index} established with {peer_addr}");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::new_shared;

    #[tokio::test]
    async fn rejects_unauthorised_peer_without_inserting_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authorised_ips.txt");
        std::fs::write(&path, "").unwrap();
        let allowlist = AllowList::new(&path);

        assert!(!allowlist.is_authorised("127.0.0.1".parse().unwrap()));

        let table = new_shared();
        assert_eq!(table.lock().unwrap().len(), 0);
    }
}
