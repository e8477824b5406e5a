//! Accepted stream types and the handler seam above the listener.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the daemon listener.
#[derive(Debug)]
pub enum ConnectionStream {
    /// TCP connection.
    Tcp(TcpStream),
    /// Unix domain socket connection.
    #[cfg(unix)]
    Unix(UnixStream),
}

/// Applies `$body` to whichever socket `$stream` wraps.
macro_rules! on_socket {
    ($stream:expr, $socket:ident => $body:expr) => {
        match $stream {
            ConnectionStream::Tcp($socket) => $body,
            #[cfg(unix)]
            ConnectionStream::Unix($socket) => $body,
        }
    };
}

impl ConnectionStream {
    /// Opens a second handle to the same socket, used as the write half.
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    /// Bounds how long a read may block.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        on_socket!(self, socket => socket.set_read_timeout(timeout))
    }

    /// Bounds how long a write may block.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        on_socket!(self, socket => socket.set_write_timeout(timeout))
    }

    /// Shuts down both directions, unblocking any reader on another handle.
    pub fn shutdown(&self) -> io::Result<()> {
        on_socket!(self, socket => socket.shutdown(Shutdown::Both))
    }

    /// Peer address for logs; Unix peers are unnamed.
    pub fn peer(&self) -> String {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map_or_else(|_| String::from("tcp:unknown"), |addr| addr.to_string()),
            #[cfg(unix)]
            Self::Unix(_) => String::from("unix"),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        on_socket!(self, socket => socket.read(buf))
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        on_socket!(self, socket => socket.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        on_socket!(self, socket => socket.flush())
    }
}

/// Handles accepted socket connections.
///
/// The listener calls [`ConnectionHandler::handle`] on a dedicated thread per
/// connection; the handler owns the stream until it returns.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}
