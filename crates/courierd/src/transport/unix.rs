//! Unix socket binding with stale-file recovery.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::{LISTENER_TARGET, ListenerError, SocketPathConflict};

/// Socket file created by a successful bind; removed when dropped.
#[derive(Debug)]
pub(super) struct SocketFile {
    path: Utf8PathBuf,
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(target: LISTENER_TARGET, path = %self.path, "removed unix socket file"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(
                target: LISTENER_TARGET,
                path = %self.path,
                %error,
                "failed to remove unix socket file"
            ),
        }
    }
}

/// Binds `path`, first clearing a socket file left behind by a dead process.
pub(super) fn bind(path: &Utf8Path) -> Result<(UnixListener, SocketFile), ListenerError> {
    if fs::symlink_metadata(path).is_ok() {
        clear_stale(path)?;
    }
    let listener = UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        endpoint: format!("unix://{path}"),
        source,
    })?;
    Ok((
        listener,
        SocketFile {
            path: path.to_path_buf(),
        },
    ))
}

fn clear_stale(path: &Utf8Path) -> Result<(), ListenerError> {
    let conflict = |reason| ListenerError::socket_path(path, reason);
    let metadata =
        fs::symlink_metadata(path).map_err(|error| conflict(SocketPathConflict::Probe(error)))?;
    if !metadata.file_type().is_socket() {
        return Err(conflict(SocketPathConflict::NotASocket));
    }
    match UnixStream::connect(path) {
        Ok(_live) => Err(conflict(SocketPathConflict::InUse)),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            debug!(target: LISTENER_TARGET, %path, "replacing stale unix socket");
            fs::remove_file(path).map_err(|error| conflict(SocketPathConflict::Remove(error)))
        }
        Err(error) => Err(conflict(SocketPathConflict::Probe(error))),
    }
}
