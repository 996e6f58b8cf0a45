//! Endpoint Resolution
//!
//! Turns a transport kind plus an address string into a concrete endpoint.
//!
//! ## Address Formats
//!
//! - `Tcp`: `host:port`, where `host` is an IP literal without `:` and
//!   `port` is one to five decimal digits that fit in a `u16`
//! - `Unix`: the whole string is the filesystem path of the socket

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// The stream transports a server can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportKind {
    /// TCP over IPv4 or IPv6
    #[default]
    Tcp,
    /// Unix-domain stream socket
    Unix,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Tcp => write!(f, "tcp"),
            TransportKind::Unix => write!(f, "unix"),
        }
    }
}

/// Returned when a transport name is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown transport: {0} (expected tcp or unix)")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportKind::Tcp),
            "unix" => Ok(TransportKind::Unix),
            _ => Err(UnknownTransport(s.to_string())),
        }
    }
}

/// A resolved, bindable endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl Endpoint {
    pub fn kind(&self) -> TransportKind {
        match self {
            Endpoint::Tcp(_) => TransportKind::Tcp,
            Endpoint::Unix(_) => TransportKind::Unix,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{}", addr),
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reasons an address string cannot be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The string does not have the `host:port` shape
    #[error("invalid host or port: {0:?}")]
    InvalidEndpoint(String),

    /// The host part is not an IP address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The port part does not fit in 16 bits
    #[error("invalid port: {0}")]
    InvalidPort(String),
}

/// Resolves `address` for the given transport.
pub fn resolve(kind: TransportKind, address: &str) -> Result<Endpoint, ResolveError> {
    match kind {
        TransportKind::Tcp => resolve_tcp(address).map(Endpoint::Tcp),
        TransportKind::Unix => {
            if address.is_empty() {
                return Err(ResolveError::InvalidEndpoint(address.to_string()));
            }
            Ok(Endpoint::Unix(PathBuf::from(address)))
        }
    }
}

fn resolve_tcp(address: &str) -> Result<SocketAddr, ResolveError> {
    let (host, port) = split_host_port(address)
        .ok_or_else(|| ResolveError::InvalidEndpoint(address.to_string()))?;

    let ip: IpAddr = host
        .parse()
        .map_err(|_| ResolveError::InvalidAddress(host.to_string()))?;

    let port: u16 = port
        .parse()
        .map_err(|_| ResolveError::InvalidPort(port.to_string()))?;

    Ok(SocketAddr::new(ip, port))
}

/// Splits `host:port`: a non-empty host without `:`, then 1..=5 digits.
fn split_host_port(address: &str) -> Option<(&str, &str)> {
    let (host, port) = address.split_once(':')?;

    let port_ok = (1..=5).contains(&port.len()) && port.bytes().all(|b| b.is_ascii_digit());
    if host.is_empty() || !port_ok {
        return None;
    }

    Some((host, port))
}
