//! File upload, listing, and deletion against a volatile catalogue.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Value, json};

use courier_proto::{Body, Method, unix_millis};

use super::arguments::{require_non_empty, require_str};
use super::{HandlerContext, MethodError, MethodHandler, MethodRegistry};
use crate::audit::AuditKind;

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Name supplied by the uploader.
    pub filename: String,
    /// Content length in bytes.
    pub size: usize,
    /// Upload time in milliseconds since the Unix epoch.
    pub uploaded_at: i64,
}

/// In-memory record of files uploaded since startup.
///
/// Content is not retained; only metadata survives, and only for the life
/// of the process.
#[derive(Debug, Default)]
pub struct FileCatalog {
    entries: Mutex<BTreeMap<String, FileEntry>>,
}

impl FileCatalog {
    /// Inserts or replaces the entry for `entry.filename`.
    pub fn insert(&self, entry: FileEntry) {
        self.lock().insert(entry.filename.clone(), entry);
    }

    /// Removes `filename`, returning whether it was present.
    pub fn remove(&self, filename: &str) -> bool {
        self.lock().remove(filename).is_some()
    }

    /// Entries ordered by filename.
    #[must_use]
    pub fn list(&self) -> Vec<FileEntry> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, FileEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(super) fn register(registry: &mut MethodRegistry, catalog: Arc<FileCatalog>) {
    registry
        .register(
            Method::UploadFile.as_str(),
            UploadFile {
                catalog: Arc::clone(&catalog),
            },
        )
        .register(
            Method::ListFiles.as_str(),
            ListFiles {
                catalog: Arc::clone(&catalog),
            },
        )
        .register(Method::DeleteFile.as_str(), DeleteFile { catalog });
}

/// `UPLOAD_FILE`: accepts `filename` and `content`.
struct UploadFile {
    catalog: Arc<FileCatalog>,
}

impl MethodHandler for UploadFile {
    fn call(&self, context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
        let filename = require_non_empty(body, "filename")?;
        let content = require_str(body, "content")?;
        let entry = FileEntry {
            filename: filename.to_owned(),
            size: content.len(),
            uploaded_at: unix_millis(),
        };
        context.record(
            AuditKind::Upload,
            json!({ "filename": entry.filename, "size": entry.size }),
        );
        let result = json!({
            "filename": entry.filename,
            "size": entry.size,
            "uploaded_at": entry.uploaded_at,
            "message": "File uploaded successfully",
        });
        self.catalog.insert(entry);
        Ok(result)
    }
}

/// `LIST_FILES`: reports the catalogue.
struct ListFiles {
    catalog: Arc<FileCatalog>,
}

impl MethodHandler for ListFiles {
    fn call(&self, _context: &HandlerContext<'_>, _body: &Body) -> Result<Value, MethodError> {
        let files = self.catalog.list();
        let count = files.len();
        Ok(json!({ "files": files, "count": count }))
    }
}

/// `DELETE_FILE`: removes `filename` from the catalogue.
struct DeleteFile {
    catalog: Arc<FileCatalog>,
}

impl MethodHandler for DeleteFile {
    fn call(&self, _context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
        let filename = require_non_empty(body, "filename")?;
        let deleted = self.catalog.remove(filename);
        Ok(json!({ "filename": filename, "deleted": deleted }))
    }
}
