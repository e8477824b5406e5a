//! Blocking line-protocol client for driving a test server.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::{Value, json};

use courier_proto::{FrameDecoder, Response};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestClient {
    stream: TcpStream,
    decoder: FrameDecoder,
    ready: VecDeque<Vec<u8>>,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to test server");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        Self {
            stream,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
        }
    }

    /// Serialises a request frame, terminator included.
    pub fn frame(token: Option<&str>, method: &str, request_id: &str, body: Value) -> Vec<u8> {
        let mut header = json!({ "method": method, "timestamp": 0, "request_id": request_id });
        if let Some(token) = token {
            header["auth_token"] = Value::from(token);
        }
        let mut frame = serde_json::to_vec(&json!({ "header": header, "body": body }))
            .expect("serialise request");
        frame.push(b'\n');
        frame
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("write to test server");
        self.stream.flush().expect("flush");
    }

    pub fn send(&mut self, token: &str, method: &str, request_id: &str, body: Value) {
        let frame = Self::frame(Some(token), method, request_id, body);
        self.send_raw(&frame);
    }

    /// Reads the next response, panicking if none arrives in time.
    pub fn read_response(&mut self) -> Response {
        self.try_read_response()
            .expect("connection closed before a response arrived")
    }

    pub fn read_responses(&mut self, count: usize) -> Vec<Response> {
        (0..count).map(|_| self.read_response()).collect()
    }

    /// Returns `true` once the server has closed the connection.
    pub fn is_closed(&mut self) -> bool {
        self.try_read_response().is_none()
    }

    fn try_read_response(&mut self) -> Option<Response> {
        let mut chunk = [0_u8; 4096];
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Some(serde_json::from_slice(&frame).expect("response json"));
            }
            let read = match self.stream.read(&mut chunk) {
                Ok(0) => return None,
                Ok(read) => read,
                Err(error) if error.kind() == ErrorKind::ConnectionReset => return None,
                Err(error) => panic!("read from test server failed: {error}"),
            };
            let frames: Vec<_> = self.decoder.feed(&chunk[..read]).collect();
            self.ready.extend(frames);
        }
    }
}
