//! Shared doubles and harnesses for daemon tests.

mod audit;
mod client;
mod config_loader;
mod connection;
mod gate;
mod observer;
mod reporter;
mod server;

pub use audit::{FailingAuditSink, MockSink, OverlapDetectingSink, RecordingAuditSink};
pub use client::TestClient;
pub use config_loader::{FailingConfigLoader, TempDirConfigLoader};
pub use connection::MemoryConnection;
pub use gate::Gate;
pub use observer::{ObservedJob, RecordingObserver};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use server::{TEST_TOKEN, TestServer, wait_until};
