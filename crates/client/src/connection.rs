use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use emberline_core::Session;
use emberline_wire::{Dispatcher, FrameAccumulator, Tag};

/// Fixed retry interval for the auto-connect loop.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(2);

/// How long one service step waits for traffic before yielding back to the
/// caller.
const READ_TIMEOUT: Duration = Duration::from_millis(250);

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Persistent connection to a profiled peer.
///
/// Owns the handler dispatcher so that every arriving message, including
/// the synthetic connect/disconnect notifications, takes the same dispatch
/// path a capture replay does. Socket failures are logged and collapse the
/// connection back to `Disconnected`; they never propagate to the caller,
/// and a later [`step`](Self::step) retries on the fixed interval.
pub struct Connection {
    dispatcher: Dispatcher<Session>,
    state: ConnectionState,
    stream: Option<TcpStream>,
    accumulator: FrameAccumulator,
    read_buf: Vec<u8>,
}

impl Connection {
    pub fn new(dispatcher: Dispatcher<Session>) -> Self {
        Self {
            dispatcher,
            state: ConnectionState::Disconnected,
            stream: None,
            accumulator: FrameAccumulator::new(),
            read_buf: vec![0; READ_BUFFER_SIZE],
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Try to open the connection. A no-op unless currently disconnected.
    /// Returns whether the connection is up afterwards.
    pub async fn connect(&mut self, addr: &str, session: &mut Session) -> bool {
        if self.state != ConnectionState::Disconnected {
            return self.is_connected();
        }
        self.state = ConnectionState::Connecting;
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("connected to {addr}");
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                self.notify(session, Tag::CONNECT);
                true
            }
            Err(err) => {
                debug!("connect to {addr} failed: {err}");
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    pub fn disconnect(&mut self, session: &mut Session) {
        self.close(session);
    }

    fn close(&mut self, session: &mut Session) {
        let was_connected = self.state == ConnectionState::Connected;
        self.stream = None;
        self.accumulator.clear();
        self.state = ConnectionState::Disconnected;
        if was_connected {
            self.notify(session, Tag::DISCONNECT);
        }
    }

    fn notify(&mut self, session: &mut Session, tag: Tag) {
        if let Err(err) = self.dispatcher.dispatch(session, tag, &[]) {
            warn!("{tag} listener failed: {err}");
        }
    }

    /// Send raw bytes to the peer. A no-op unless connected; a write failure
    /// is logged and closes the connection.
    pub async fn send(&mut self, session: &mut Session, bytes: &[u8]) {
        if self.state != ConnectionState::Connected {
            return;
        }
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        if let Err(err) = stream.write_all(bytes).await {
            warn!("send failed: {err}");
            self.close(session);
        }
    }

    /// Ask the peer for the string behind a name hash.
    pub async fn request_sample_name(&mut self, session: &mut Session, hash: u32) {
        self.send(session, format!("GSMP{hash}").as_bytes()).await;
    }

    /// One turn of the service loop.
    ///
    /// Down: wait out the retry interval, then attempt to connect. Up: wait
    /// briefly for traffic, dispatch every completed message in arrival
    /// order, then flush any name-resolution requests the handlers queued.
    pub async fn step(&mut self, session: &mut Session, addr: &str) {
        if self.state != ConnectionState::Connected {
            tokio::time::sleep(RECONNECT_INTERVAL).await;
            self.connect(addr, session).await;
            return;
        }

        let Some(stream) = self.stream.as_mut() else {
            self.close(session);
            return;
        };
        let read = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut self.read_buf)).await;
        match read {
            Err(_) => return, // quiet link, nothing to do
            Ok(Ok(0)) => {
                info!("peer closed the connection");
                self.close(session);
                return;
            }
            Ok(Ok(n)) => self.accumulator.feed(&self.read_buf[..n]),
            Ok(Err(err)) => {
                warn!("read failed: {err}");
                self.close(session);
                return;
            }
        }

        loop {
            match self.accumulator.next_message() {
                Ok(Some((tag, payload))) => {
                    if let Err(err) = self.dispatcher.dispatch(session, tag, &payload) {
                        warn!("{tag} handler failed: {err}");
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("corrupt stream: {err}");
                    self.close(session);
                    return;
                }
            }
        }

        for hash in session.take_name_requests() {
            self.request_sample_name(session, hash).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberline_core::model::sample::encode_wire_sample;
    use emberline_core::register_handlers;
    use emberline_wire::encode_message;
    use tokio::net::TcpListener;

    fn new_connection() -> Connection {
        let mut dispatcher = Dispatcher::new();
        register_handlers(&mut dispatcher);
        Connection::new(dispatcher)
    }

    fn ssmp(hash: u32, name: &str) -> Vec<u8> {
        let mut payload = hash.to_le_bytes().to_vec();
        payload.extend_from_slice(&(name.len() as u32).to_le_bytes());
        payload.extend_from_slice(name.as_bytes());
        encode_message(Tag::SAMPLE_NAME, &payload)
    }

    fn smpl_one_sample(thread: &str, hash: u32) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(thread.len() as u32).to_le_bytes());
        payload.extend_from_slice(thread.as_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        payload.extend_from_slice(&encode_wire_sample(
            hash,
            [0; 3],
            0,
            1_000_000.0,
            1_000_000.0,
            0.0,
            0.0,
            1,
            0,
        ));
        encode_message(Tag::SAMPLE_TREE, &payload)
    }

    #[tokio::test]
    async fn send_is_a_noop_while_disconnected() {
        let mut conn = new_connection();
        let mut session = Session::new();
        conn.send(&mut session, b"GSMP1").await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_dispatch_disconnect_lifecycle() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut conn = new_connection();
        let mut session = Session::new();

        assert!(conn.connect(&addr, &mut session).await);
        assert!(conn.is_connected());
        assert!(session.is_live());
        assert!(!session.is_paused());

        // Connecting again while up is a no-op.
        assert!(conn.connect(&addr, &mut session).await);

        let (mut server, _) = listener.accept().await.unwrap();
        server.write_all(&ssmp(42, "Update")).await.unwrap();
        server.shutdown().await.unwrap();
        drop(server);

        for _ in 0..20 {
            conn.step(&mut session, &addr).await;
            if !conn.is_connected() {
                break;
            }
        }

        // The pushed name arrived before the close was noticed.
        assert_eq!(session.sample_names.lookup(42).unwrap().string(), "Update");
        assert!(!conn.is_connected());
        assert!(!session.is_live());
        assert!(session.is_paused(), "disconnect pauses the session");
    }

    #[tokio::test]
    async fn unseen_hashes_go_out_as_name_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let mut conn = new_connection();
        let mut session = Session::new();
        assert!(conn.connect(&addr, &mut session).await);

        let (mut server, _) = listener.accept().await.unwrap();
        server.write_all(&smpl_one_sample("Main", 777)).await.unwrap();

        for _ in 0..20 {
            conn.step(&mut session, &addr).await;
            if session.threads.history("Main").is_some() {
                break;
            }
        }
        assert_eq!(session.threads.history("Main").unwrap().len(), 1);

        let mut request = vec![0u8; 7];
        server.read_exact(&mut request).await.unwrap();
        assert_eq!(&request, b"GSMP777");
    }
}
