//! Monitor connection candidates.

use crate::{ConfigError, ConfigResult};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Default monitor address when none is configured.
pub const DEFAULT_MONITOR_HOST: &str = "127.0.0.1";

/// The ordered list of addresses a monitor may be listening on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEndpoints {
    host: IpAddr,
    ports: Vec<u16>,
}

impl MonitorEndpoints {
    /// Build from a host and an explicit port list.
    pub fn new(host: IpAddr, ports: Vec<u16>) -> ConfigResult<Self> {
        if ports.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "monitor ports".to_string(),
                message: "at least one port is required".to_string(),
            });
        }
        Ok(Self { host, ports })
    }

    /// Parse a host address and a delimited port list such as `4000,4001`.
    ///
    /// Any non-digit character separates ports.
    pub fn parse(host: &str, ports: &str) -> ConfigResult<Self> {
        let host: IpAddr = host.trim().parse().map_err(|e| ConfigError::InvalidValue {
            name: "monitor host".to_string(),
            message: format!("'{}': {}", host, e),
        })?;

        let ports = ports
            .split(|c: char| !c.is_ascii_digit())
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                    name: "monitor port".to_string(),
                    message: format!("'{}': {}", p, e),
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Self::new(host, ports)
    }

    /// Candidate socket addresses in connection order.
    pub fn candidates(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.ports.iter().map(move |&port| SocketAddr::new(self.host, port))
    }

    /// Monitor host.
    pub fn host(&self) -> IpAddr {
        self.host
    }

    /// Candidate ports in order.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }
}

impl fmt::Display for MonitorEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}:{}", self.host, ports.join(","))
    }
}
