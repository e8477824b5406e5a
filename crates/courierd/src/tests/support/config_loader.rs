//! Configuration loaders for bootstrap and lifecycle tests.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;

use courier_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

use super::TEST_TOKEN;

/// Loader that places the socket and audit log under a temporary directory.
pub struct TempDirConfigLoader {
    dir: TempDir,
    audit_log: Option<Utf8PathBuf>,
}

impl TempDirConfigLoader {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temporary directory"),
            audit_log: None,
        }
    }

    /// Enables a JSONL audit log inside the temporary directory.
    pub fn with_audit_log(mut self) -> Self {
        self.audit_log = Some(self.path("audit.jsonl"));
        self
    }

    /// Points the audit log at a directory that does not exist.
    pub fn with_unwritable_audit_log(mut self) -> Self {
        self.audit_log = Some(self.path("missing/audit.jsonl"));
        self
    }

    pub fn path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(name)).expect("utf8 temp path")
    }

    pub fn socket_path(&self) -> Utf8PathBuf {
        self.path("run/courierd.sock")
    }

    pub fn audit_log(&self) -> Option<&Utf8PathBuf> {
        self.audit_log.as_ref()
    }
}

impl ConfigLoader for TempDirConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen: SocketEndpoint::unix(self.socket_path()),
            auth_token: TEST_TOKEN.to_owned(),
            execution_delay_ms: 0,
            audit_log: self.audit_log.clone(),
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an invalid listen endpoint.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("courierd"),
            OsString::from("--listen"),
            OsString::from("invalid://socket"),
        ])
    }
}
