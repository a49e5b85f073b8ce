//! The session table: an ordered, index-addressable collection of live,
//! authorised connections (the protocol "Session"/"SessionTable", §4.4).
//!
//! Modeled on `server_controller.py`'s parallel
//! `_connection_list`/`_address_list` (merged here into one `Vec<Session>` so
//! invariant (a) — "equal length at all observation points" — is structural
//! rather than something every mutation site has to maintain by hand), and on
//! the `Arc<Mutex<..>>` shared-state shape of
//! `examples/other_examples/cedd47b6_tokio-rs-mini-redis__src-server.rs.rs`.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};

use comfy_table::{Cell, Table};
use tokio::sync::Mutex as AsyncMutex;

use crate::frame::FrameReader;
use crate::transport::IoStream;

/// The request/reply state machine of the protocol, made explicit per the §9
/// design choice ("makes the state machine in §4.6 explicit") instead of
/// being implicit in control flow. Transitions are linear: a command moves a
/// session out of `Idle` before its request is written and back to `Idle`
/// once the matching reply has been read; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingReply,
    FileTransferPhaseA,
    FileTransferPhaseB,
    Closed,
}

/// The stream, frame-reading state, and protocol state for one live
/// connection.
///
/// Wrapped in a `tokio::sync::Mutex` that doubles as the per-session
/// exclusive lock of the protocol: the controller holds it for the duration
/// of one request/reply exchange, and the liveness prober only `try_lock`s
/// it, so a probe never lands between an operator's write and read on the
/// same session.
pub struct SessionIo {
    pub stream: IoStream,
    pub reader: FrameReader,
    pub state: SessionState,
}

#[derive(Clone)]
pub struct Session {
    pub addr: SocketAddr,
    pub io: Arc<AsyncMutex<SessionIo>>,
}

impl Session {
    pub fn new(addr: SocketAddr, stream: IoStream, max_frame_bytes: usize) -> Self {
        Session {
            addr,
            io: Arc::new(AsyncMutex::new(SessionIo {
                stream,
                reader: FrameReader::new(max_frame_bytes),
                state: SessionState::Idle,
            })),
        }
    }
}

/// Ordered table of live sessions, indices contiguous from 0 (the protocol
/// invariant (b)). A session's index is its position at display time and is
/// not stable across evictions.
#[derive(Default)]
pub struct SessionTable {
    sessions: Vec<Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        SessionTable::default()
    }

    pub fn push(&mut self, session: Session) -> usize {
        self.sessions.push(session);
        self.sessions.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Session> {
        self.sessions.get(index).cloned()
    }

    pub fn remove(&mut self, index: usize) -> Option<Session> {
        if index < self.sessions.len() {
            Some(self.sessions.remove(index))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

impl fmt::Display for SessionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new();
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.set_header(vec![Cell::new("ID"), Cell::new("Address")]);
        for (index, session) in self.sessions.iter().enumerate() {
            table.add_row(vec![Cell::new(index), Cell::new(session.addr)]);
        }
        write!(f, "{table}")
    }
}

pub type SharedSessionTable = Arc<StdMutex<SessionTable>>;

pub fn new_shared() -> SharedSessionTable {
    Arc::new(StdMutex::new(SessionTable::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};
    use tokio::net::TcpStream;

    fn fake_addr(octet: u8) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, octet), 4444))
    }

    async fn fake_session(octet: u8) -> Session {
        // A loopback pair stands in for a real connection; only the table's
        // own bookkeeping is under test here, not any I/O on the session.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, _) = tokio::join!(TcpStream::connect(addr), listener.accept());
        Session::new(fake_addr(octet), IoStream::from(client.unwrap()), 4096)
    }

    #[tokio::test]
    async fn push_and_remove_preserve_contiguous_indices() {
        let mut table = SessionTable::new();
        let i0 = table.push(fake_session(1).await);
        let i1 = table.push(fake_session(2).await);
        let i2 = table.push(fake_session(3).await);
        assert_eq!((i0, i1, i2), (0, 1, 2));
        assert_eq!(table.len(), 3);

        let removed = table.remove(1).unwrap();
        assert_eq!(removed.addr, fake_addr(2));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().addr, fake_addr(1));
        assert_eq!(table.get(1).unwrap().addr, fake_addr(3));
    }

    #[tokio::test]
    async fn remove_out_of_range_is_none() {
        let mut table = SessionTable::new();
        table.push(fake_session(1).await);
        assert!(table.remove(5).is_none());
        assert_eq!(table.len(), 1);
    }
}
