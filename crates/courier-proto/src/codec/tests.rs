//! Unit tests for newline framing.

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::{Request, Response};

fn sample_frames() -> Vec<Vec<u8>> {
    vec![
        br#"{"header":{"auth_token":"T","method":"PING","timestamp":0,"request_id":"r1"},"body":{}}"#
            .to_vec(),
        br#"{"header":{"auth_token":"T","method":"UPLOAD_FILE","timestamp":1,"request_id":"r2"},"body":{"filename":"a.txt","content":"line one\nline two"}}"#
            .to_vec(),
        br#"{"header":{"auth_token":"T","method":"CHECK_BALANCE","timestamp":2,"request_id":"r3"},"body":{"account_id":"acc-7"}}"#
            .to_vec(),
    ]
}

fn concatenated(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut stream = Vec::new();
    for frame in frames {
        stream.extend_from_slice(frame);
        stream.push(TERMINATOR);
    }
    stream
}

#[test]
fn yields_nothing_until_terminator_arrives() {
    let mut decoder = FrameDecoder::new();
    assert_eq!(decoder.feed(br#"{"header":"#).count(), 0);
    assert_eq!(decoder.pending(), br#"{"header":"#);

    let frames: Vec<_> = decoder.feed(b"{}}\n").collect();
    assert_eq!(frames, vec![br#"{"header":{}}"#.to_vec()]);
    assert!(decoder.is_empty());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(7)]
#[case(64)]
#[case(4096)]
fn reproduces_frames_for_any_chunk_size(#[case] chunk_size: usize) {
    let expected = sample_frames();
    let stream = concatenated(&expected);
    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();

    for chunk in stream.chunks(chunk_size) {
        decoded.extend(decoder.feed(chunk));
    }

    assert_eq!(decoded, expected);
    assert!(decoder.is_empty());
}

#[test]
fn reproduces_frames_for_uneven_chunks() {
    let expected = sample_frames();
    let stream = concatenated(&expected);
    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();
    let mut rest = stream.as_slice();
    let mut size = 1;

    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(size.min(rest.len()));
        decoded.extend(decoder.feed(chunk));
        rest = tail;
        size = size * 3 % 37 + 1;
    }

    assert_eq!(decoded, expected);
}

#[test]
fn retains_trailing_partial_frame() {
    let mut decoder = FrameDecoder::new();
    let frames: Vec<_> = decoder.feed(b"{\"a\":1}\n{\"b\":").collect();
    assert_eq!(frames, vec![b"{\"a\":1}".to_vec()]);
    assert_eq!(decoder.pending(), b"{\"b\":");
}

#[test]
fn drops_empty_and_blank_frames() {
    let mut decoder = FrameDecoder::new();
    let frames: Vec<_> = decoder.feed(b"\n\n   \n\t\r\n{}\n\n").collect();
    assert_eq!(frames, vec![b"{}".to_vec()]);
    assert!(decoder.is_empty());
}

#[test]
fn unpulled_frames_stay_buffered() {
    let mut decoder = FrameDecoder::new();
    {
        let mut frames = decoder.feed(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(frames.next(), Some(b"{\"a\":1}".to_vec()));
    }
    assert_eq!(decoder.pending(), b"{\"b\":2}\n");

    let frames: Vec<_> = decoder.feed(b"").collect();
    assert_eq!(frames, vec![b"{\"b\":2}".to_vec()]);
}

#[test]
fn supports_large_frames() {
    let content = "x".repeat(256 * 1024);
    let frame = serde_json::to_vec(&json!({ "body": { "content": content } }))
        .expect("serialise large frame");
    let stream = concatenated(std::slice::from_ref(&frame));
    let mut decoder = FrameDecoder::new();
    let mut decoded = Vec::new();

    for chunk in stream.chunks(1000) {
        decoded.extend(decoder.feed(chunk));
    }

    assert_eq!(decoded, vec![frame]);
}

#[test]
fn encode_appends_exactly_one_terminator() {
    let response = Response::ok(Some("r1".to_owned()), json!({ "text": "a\nb" }));
    let bytes = encode(&response).expect("encode response");

    assert_eq!(bytes.last(), Some(&TERMINATOR));
    assert_eq!(
        bytes.iter().filter(|byte| **byte == TERMINATOR).count(),
        1,
        "newlines inside values must be escaped"
    );
}

#[test]
fn encoded_requests_decode_to_the_same_request() {
    let mut body = crate::Body::new();
    body.insert("filename".to_owned(), json!("notes.txt"));
    let request = Request::new("UPLOAD_FILE", "secret", "req-9", body);
    let bytes = encode(&request).expect("encode request");

    let mut decoder = FrameDecoder::new();
    let frames: Vec<_> = decoder.feed(&bytes).collect();
    assert_eq!(frames.len(), 1);
    let frame = frames.first().expect("one frame");
    let decoded = Request::parse(frame).expect("parse request");
    assert_eq!(decoded, request);
}
