//! Test double for [`HealthReporter`] that records lifecycle events.

use std::sync::Mutex;

use crate::health::{HealthReporter, LifecycleEvent};

/// Owned copy of a [`LifecycleEvent`], kept for later assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerReady(String),
    ShutdownRequested,
    ShutdownComplete,
}

impl From<LifecycleEvent<'_>> for HealthEvent {
    fn from(event: LifecycleEvent<'_>) -> Self {
        match event {
            LifecycleEvent::BootstrapStarting => Self::BootstrapStarting,
            LifecycleEvent::BootstrapSucceeded(_) => Self::BootstrapSucceeded,
            LifecycleEvent::BootstrapFailed(error) => Self::BootstrapFailed(error.to_string()),
            LifecycleEvent::ListenerReady(endpoint) => Self::ListenerReady(endpoint.to_string()),
            LifecycleEvent::ShutdownRequested => Self::ShutdownRequested,
            LifecycleEvent::ShutdownComplete => Self::ShutdownComplete,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn report(&self, event: LifecycleEvent<'_>) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event.into());
    }
}
