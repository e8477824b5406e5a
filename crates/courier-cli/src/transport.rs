//! Opens the byte stream the stub talks over.

use std::fmt::Debug;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use courier_config::SocketEndpoint;

use crate::StubError;

/// Upper bound on establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected socket of either family.
pub(crate) trait Duplex: Read + Write + Send + Debug {
    /// Bounds the next blocking read; `None` waits indefinitely.
    fn limit_reads(&self, bound: Option<Duration>) -> io::Result<()>;

    /// Bounds each blocking write; `None` waits indefinitely.
    fn limit_writes(&self, bound: Option<Duration>) -> io::Result<()>;
}

impl Duplex for TcpStream {
    fn limit_reads(&self, bound: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(bound)
    }

    fn limit_writes(&self, bound: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(bound)
    }
}

#[cfg(unix)]
impl Duplex for std::os::unix::net::UnixStream {
    fn limit_reads(&self, bound: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(bound)
    }

    fn limit_writes(&self, bound: Option<Duration>) -> io::Result<()> {
        self.set_write_timeout(bound)
    }
}

pub(crate) type Connection = Box<dyn Duplex>;

/// Connects to `endpoint` within [`CONNECT_TIMEOUT`].
pub(crate) fn connect(endpoint: &SocketEndpoint) -> Result<Connection, StubError> {
    let unreachable = |source| StubError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let candidates: Vec<_> = (host.as_str(), *port)
                .to_socket_addrs()
                .map_err(|source| StubError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?
                .collect();
            let stream = dial_tcp(&candidates).map_err(unreachable)?;
            stream.set_nodelay(true).map_err(StubError::Io)?;
            Ok(Box::new(stream))
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => {
            let stream = dial_unix(path.as_str()).map_err(unreachable)?;
            Ok(Box::new(stream))
        }
        #[cfg(not(unix))]
        SocketEndpoint::Unix { .. } => Err(StubError::UnsupportedUnix {
            endpoint: endpoint.to_string(),
        }),
    }
}

/// Tries each resolved address in turn and keeps the last failure.
fn dial_tcp(candidates: &[std::net::SocketAddr]) -> io::Result<TcpStream> {
    let mut last = io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to nothing");
    for address in candidates {
        match TcpStream::connect_timeout(address, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(error) => last = error,
        }
    }
    Err(last)
}

#[cfg(unix)]
fn dial_unix(path: &str) -> io::Result<std::os::unix::net::UnixStream> {
    use std::os::fd::OwnedFd;

    use socket2::{Domain, SockAddr, Socket, Type};

    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.connect_timeout(&SockAddr::unix(path)?, CONNECT_TIMEOUT)?;
    Ok(OwnedFd::from(socket).into())
}
