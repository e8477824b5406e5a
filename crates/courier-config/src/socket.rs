//! Listener endpoints written as `tcp://host:port` or `unix:///path`.

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// Where the daemon listens and the stub connects.
///
/// Configuration files may also spell an endpoint as a table:
/// `{ transport = "tcp", host = "...", port = ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEndpoint {
    /// Unix domain socket at a filesystem path.
    Unix {
        /// Socket file path.
        path: Utf8PathBuf,
    },
    /// TCP host and port.
    Tcp {
        /// Host name or literal address, without IPv6 brackets.
        host: String,
        /// Port; `0` asks the OS for an ephemeral one.
        port: u16,
    },
}

impl SocketEndpoint {
    /// A Unix socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// A TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// The socket file path, for Unix endpoints.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket, mode `0700` on
    /// Unix. TCP endpoints need nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the path has no parent or the
    /// directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        match self.unix_path() {
            Some(path) => create_socket_dir(path),
            None => Ok(()),
        }
    }
}

fn create_socket_dir(socket: &Utf8Path) -> Result<(), SocketPreparationError> {
    let parent = socket
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .ok_or_else(|| SocketPreparationError::MissingParent {
            path: socket.to_path_buf(),
        })?;

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);

    match builder.create(parent) {
        Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
            Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            // IPv6 literals need brackets to keep the port unambiguous.
            Self::Tcp { host, port } if host.contains(':') => write!(f, "tcp://[{host}]:{port}"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl TryFrom<&Url> for SocketEndpoint {
    type Error = EndpointDefect;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        match url.scheme() {
            "tcp" => {
                let host = url.host_str().ok_or(EndpointDefect::MissingHost)?;
                let port = url.port().ok_or(EndpointDefect::MissingPort)?;
                Ok(Self::tcp(
                    host.trim_start_matches('[').trim_end_matches(']'),
                    port,
                ))
            }
            "unix" => match url.path() {
                "" | "/" => Err(EndpointDefect::MissingPath),
                path => Ok(Self::unix(path)),
            },
            other => Err(EndpointDefect::UnsupportedScheme(other.to_owned())),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let defect = |defect| SocketParseError {
            input: input.to_owned(),
            defect,
        };
        let url = Url::parse(input).map_err(|error| defect(EndpointDefect::Url(error)))?;
        Self::try_from(&url).map_err(defect)
    }
}

impl Serialize for SocketEndpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Url(String),
    Table(EndpointTable),
}

#[derive(Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
enum EndpointTable {
    Unix { path: Utf8PathBuf },
    Tcp { host: String, port: u16 },
}

impl<'de> Deserialize<'de> for SocketEndpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match EndpointRepr::deserialize(deserializer)? {
            EndpointRepr::Url(text) => text.parse().map_err(serde::de::Error::custom),
            EndpointRepr::Table(EndpointTable::Unix { path }) => Ok(Self::unix(path)),
            EndpointRepr::Table(EndpointTable::Tcp { host, port }) => Ok(Self::tcp(host, port)),
        }
    }
}

/// Text that does not describe a [`SocketEndpoint`].
#[derive(Debug, Error)]
#[error("invalid socket endpoint '{input}': {defect}")]
pub struct SocketParseError {
    /// The rejected text.
    pub input: String,
    /// What is wrong with it.
    #[source]
    pub defect: EndpointDefect,
}

/// The specific problem with an endpoint URL.
#[derive(Debug, Error)]
pub enum EndpointDefect {
    /// Not a URL at all.
    #[error("{0}")]
    Url(#[source] url::ParseError),
    /// Scheme other than `tcp` or `unix`.
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    /// `tcp` URL without a host.
    #[error("missing host")]
    MissingHost,
    /// `tcp` URL without a port.
    #[error("missing port")]
    MissingPort,
    /// `unix` URL without a path.
    #[error("missing socket path")]
    MissingPath,
}

/// Failure to create the directory holding a Unix socket.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory component.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// Creating the directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
