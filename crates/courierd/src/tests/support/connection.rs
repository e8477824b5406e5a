//! In-memory response sink standing in for a socket.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use courier_proto::Response;

use crate::dispatch::ResponseSink;

/// Collects frames written by the dispatcher.
#[derive(Debug)]
pub struct MemoryConnection {
    id: u64,
    open: AtomicBool,
    frames: Mutex<Vec<Vec<u8>>>,
}

impl MemoryConnection {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            open: AtomicBool::new(true),
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Raw frames including terminators.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().expect("frames mutex poisoned").clone()
    }

    /// Decoded responses in write order.
    pub fn responses(&self) -> Vec<Response> {
        self.frames()
            .iter()
            .map(|frame| serde_json::from_slice(frame).expect("response frame"))
            .collect()
    }
}

impl ResponseSink for MemoryConnection {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send_frame(&self, frame: &[u8]) -> io::Result<()> {
        self.frames
            .lock()
            .expect("frames mutex poisoned")
            .push(frame.to_vec());
        Ok(())
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}
