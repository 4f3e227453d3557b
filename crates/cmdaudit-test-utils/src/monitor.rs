//! A scripted, in-process monitor.

use cmdaudit_audit_types::wire::{SOA_AGGREGATED_MARKER, SOA_MARKER};
use cmdaudit_audit_types::WireRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

#[derive(Default)]
struct Shared {
    acks: Mutex<VecDeque<String>>,
    connections: Mutex<Vec<String>>,
    shutdown: AtomicBool,
}

/// A monitor listening on an ephemeral loopback port.
///
/// Connections are served one at a time. Each payload is read to EOF and
/// stored before the answer goes out, so a client that has read its answer
/// always finds its payload in [`connections`](Self::connections). SOA
/// payloads are answered with the next scripted ack (`OK` once the script
/// runs out); an empty scripted ack closes without answering. Every other
/// payload is answered with `OK`.
pub struct MonitorDouble {
    addr: SocketAddr,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorDouble {
    /// Start a monitor that answers successive SOAs with `acks`.
    pub fn spawn<I, S>(acks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind monitor double");
        let addr = listener.local_addr().expect("Failed to read monitor address");
        let shared = Arc::new(Shared::default());
        shared.acks.lock().extend(acks.into_iter().map(Into::into));

        let worker = Arc::clone(&shared);
        let handle = std::thread::spawn(move || serve(listener, worker));

        Self {
            addr,
            shared,
            handle: Some(handle),
        }
    }

    /// Start a monitor that answers every SOA with `OK`.
    pub fn ok() -> Self {
        Self::spawn(Vec::<String>::new())
    }

    /// Listening port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Payloads received so far, one per connection, in arrival order.
    pub fn connections(&self) -> Vec<String> {
        self.shared.connections.lock().clone()
    }

    /// Parsed records of one connection.
    pub fn records(&self, index: usize) -> Vec<WireRecord> {
        let payload = self
            .connections()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("no connection #{}", index));
        WireRecord::parse_stream(payload.as_bytes()).expect("Failed to parse monitor payload")
    }

    /// Parsed records of every connection, flattened in arrival order.
    pub fn all_records(&self) -> Vec<WireRecord> {
        (0..self.connections().len())
            .flat_map(|i| self.records(i))
            .collect()
    }
}

impl Drop for MonitorDouble {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        // Wake the accept loop so it sees the flag.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(listener: TcpListener, shared: Arc<Shared>) {
    for stream in listener.incoming() {
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }
        let Ok(mut stream) = stream else { continue };

        let mut raw = Vec::new();
        if stream.read_to_end(&mut raw).is_err() {
            continue;
        }
        let payload = String::from_utf8_lossy(&raw).into_owned();
        let is_soa = payload.starts_with(SOA_MARKER) || payload.starts_with(SOA_AGGREGATED_MARKER);
        shared.connections.lock().push(payload);

        let answer = if is_soa {
            shared
                .acks
                .lock()
                .pop_front()
                .unwrap_or_else(|| "OK".to_string())
        } else {
            "OK".to_string()
        };
        if !answer.is_empty() {
            let _ = stream.write_all(format!("{}\n", answer).as_bytes());
        }
    }
}

/// A loopback port with nothing listening on it.
pub fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe listener");
    listener
        .local_addr()
        .expect("Failed to read probe address")
        .port()
}
