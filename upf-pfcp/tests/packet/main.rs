//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

mod report;
mod session;

use upf_pfcp::packet::Message;
use upf_pfcp::packet::error::DecodeError;

//
// Helper functions.
//

pub(crate) fn test_encode_msg(bytes_expected: &[u8], msg: &Message) {
    let bytes_actual = msg.encode();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
}

pub(crate) fn test_decode_msg(bytes: &[u8], msg_expected: &Message) {
    let msg_actual = Message::decode(bytes).unwrap();
    assert_eq!(*msg_expected, msg_actual);
}

//
// Header-level error handling.
//

#[test]
fn test_decode_invalid_version() {
    let bytes = [0x40, 0x01, 0x00, 0x04, 0x00, 0x00, 0x01, 0x00];
    assert_eq!(Message::decode(&bytes), Err(DecodeError::InvalidVersion(2)));
}

#[test]
fn test_decode_unknown_msg_type() {
    let bytes = [0x20, 0x63, 0x00, 0x04, 0x00, 0x00, 0x01, 0x00];
    assert_eq!(
        Message::decode(&bytes),
        Err(DecodeError::UnknownMessageType(99))
    );
}

#[test]
fn test_decode_truncated_header() {
    let bytes = [0x20, 0x01, 0x00];
    assert_eq!(Message::decode(&bytes), Err(DecodeError::IncompleteMessage));
}

#[test]
fn test_decode_length_beyond_datagram() {
    // Declared message length exceeds the received bytes.
    let bytes = [0x20, 0x01, 0x00, 0x20, 0x00, 0x00, 0x01, 0x00];
    assert_eq!(
        Message::decode(&bytes),
        Err(DecodeError::InvalidMessageLength(32))
    );
}
