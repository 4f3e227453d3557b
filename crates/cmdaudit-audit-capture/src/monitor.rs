//! Blocking connections to the monitor.

use crate::{AuditError, AuditResult};
use cmdaudit_common_config::MonitorEndpoints;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, trace};

/// Longest answer line accepted from the monitor, newline excluded.
pub const MAX_ANSWER_LEN: usize = 4096;

/// Protocol phase of the current command's exchange with the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    Closed,
    Connecting,
    AwaitingSoaAck,
    /// SOA acknowledged; the command is running.
    Open,
    SendingEoa,
    AwaitingEoaAck,
}

/// One short-lived connection carrying a single request and its answer.
#[derive(Debug)]
pub struct MonitorConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl MonitorConnection {
    /// Connect to the first candidate that answers.
    ///
    /// A timeout or interrupt moves on to the next candidate. Any other
    /// failure, or running out of candidates, is an error.
    pub fn connect(endpoints: &MonitorEndpoints, timeout: Duration) -> AuditResult<Self> {
        let mut last = None;
        for (attempt, addr) in endpoints.candidates().enumerate() {
            if attempt > 0 {
                debug!(%addr, "retrying monitor connection");
            }
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    trace!(%addr, "monitor connection opened");
                    return Ok(Self { stream, peer: addr });
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                    debug!(%addr, error = %e, "monitor connect attempt failed");
                    last = Some(e);
                }
                Err(source) => {
                    return Err(AuditError::Connect {
                        endpoint: addr.to_string(),
                        source,
                    })
                }
            }
        }
        Err(AuditError::Connect {
            endpoint: endpoints.to_string(),
            source: last.unwrap_or_else(|| io::Error::from(io::ErrorKind::TimedOut)),
        })
    }

    /// Address of the monitor.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send bytes.
    pub fn send(&mut self, bytes: &[u8]) -> AuditResult<()> {
        self.stream
            .write_all(bytes)
            .map_err(|e| AuditError::monitor("send", e))
    }

    /// The raw stream, for copying staged records.
    pub fn writer(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Signal the end of the request.
    pub fn half_close(&mut self) -> AuditResult<()> {
        self.stream
            .shutdown(Shutdown::Write)
            .map_err(|e| AuditError::monitor("shutdown", e))
    }

    /// Block for one answer line, returned without its newline.
    ///
    /// The result is empty if the monitor closed without answering. A line
    /// longer than [`MAX_ANSWER_LEN`] is a protocol error.
    pub fn recv_line(&mut self) -> AuditResult<String> {
        let mut line = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            let n = match self.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(AuditError::monitor("recv", e)),
            };
            let newline = buf[..n].iter().position(|&b| b == b'\n');
            line.extend_from_slice(&buf[..newline.unwrap_or(n)]);
            if line.len() > MAX_ANSWER_LEN {
                return Err(AuditError::Protocol(format!(
                    "monitor answer longer than {} bytes",
                    MAX_ANSWER_LEN
                )));
            }
            if newline.is_some() {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Half-close, wait for the answer line, then close.
    pub fn finish(mut self) -> AuditResult<String> {
        self.half_close()?;
        let line = self.recv_line()?;
        trace!(peer = %self.peer, answer = %line, "monitor connection closed");
        Ok(line)
    }
}
