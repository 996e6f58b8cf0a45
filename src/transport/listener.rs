//! Listening Sockets and Accepted Streams
//!
//! Two concrete transports share one accept contract:
//!
//! ```text
//!             ┌──────────────┐ accept() ┌───────────────────┐
//! Endpoint ──>│   Listener   │─────────>│  SessionStream    │ + peer text
//!             │ Tcp | Unix   │          │  Tcp | Unix       │
//!             └──────────────┘          └───────────────────┘
//! ```
//!
//! TCP listeners are created through `socket2` so that `SO_REUSEADDR` is set
//! before binding. Unix listeners remove their socket file on drop.

use crate::transport::Endpoint;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tracing::{debug, warn};

/// Backlog passed to `listen(2)`
const LISTEN_BACKLOG: i32 = 1024;

/// Peer text used for Unix clients that did not bind a path
const UNNAMED_PEER: &str = "unnamed";

/// A bound, listening socket.
#[derive(Debug)]
pub enum Listener {
    Tcp(TcpListener),
    Unix { inner: UnixListener, path: PathBuf },
}

impl Listener {
    /// Binds and starts listening on `endpoint`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(endpoint: &Endpoint) -> io::Result<Self> {
        match endpoint {
            Endpoint::Tcp(addr) => bind_tcp(*addr).map(Listener::Tcp),
            Endpoint::Unix(path) => {
                let inner = UnixListener::bind(path)?;
                Ok(Listener::Unix {
                    inner,
                    path: path.clone(),
                })
            }
        }
    }

    /// The endpoint actually bound (resolves port 0 to the assigned port).
    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        match self {
            Listener::Tcp(listener) => listener.local_addr().map(Endpoint::Tcp),
            Listener::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
        }
    }

    /// Waits for the next connection and returns it with the peer address text.
    pub async fn accept(&self) -> io::Result<(SessionStream, String)> {
        match self {
            Listener::Tcp(listener) => {
                let (stream, addr) = listener.accept().await?;
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(peer = %addr, error = %e, "Failed to set TCP_NODELAY");
                }
                Ok((SessionStream::Tcp(stream), addr.to_string()))
            }
            Listener::Unix { inner, .. } => {
                let (stream, addr) = inner.accept().await?;
                let peer = addr
                    .as_pathname()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| UNNAMED_PEER.to_string());
                Ok((SessionStream::Unix(stream), peer))
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Listener::Unix { path, .. } = self {
            remove_socket_file(path);
        }
    }
}

fn bind_tcp(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    TcpListener::from_std(socket.into())
}

fn remove_socket_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed socket file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove socket file"),
    }
}

/// A connected stream of either transport.
#[derive(Debug)]
pub enum SessionStream {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl AsyncRead for SessionStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SessionStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            SessionStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SessionStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            SessionStream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            SessionStream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SessionStream::Tcp(s) => Pin::new(s).poll_flush(cx),
            SessionStream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SessionStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            SessionStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
