//! Wire types shared by the courier daemon and its callers.
//!
//! Every message on the wire is a single JSON object followed by one newline
//! terminator. Requests carry a [`RequestHeader`] and a method-specific
//! [`Body`]; the daemon answers each admitted request with a [`Response`]
//! that echoes the caller's `request_id`.
//!
//! The [`FrameDecoder`] turns an arbitrarily fragmented byte stream into
//! complete frames, keeping trailing partial bytes buffered until the next
//! read, and [`encode`] serialises an outbound message with its terminator.

mod clock;
mod codec;
mod method;
mod pdu;
mod response;

pub use clock::unix_millis;
pub use codec::{FrameDecoder, FrameError, Frames, TERMINATOR, encode};
pub use method::{Method, MethodParseError};
pub use pdu::{Body, Request, RequestHeader};
pub use response::{Response, Status};
