//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;

pub type DecodeResult<T> = Result<T, DecodeError>;

// PFCP message decode errors.
#[derive(Debug, Eq, PartialEq)]
pub enum DecodeError {
    IncompleteMessage,
    InvalidVersion(u8),
    UnknownMessageType(u8),
    InvalidMessageLength(u16),
    InvalidIeLength(u16, u16),
    MissingIe(u16),
    InvalidIeValue(u16),
    ReadOutOfBounds,
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompleteMessage => {
                write!(f, "incomplete message")
            }
            DecodeError::InvalidVersion(version) => {
                write!(f, "invalid PFCP version: {version}")
            }
            DecodeError::UnknownMessageType(msg_type) => {
                write!(f, "unknown message type: {msg_type}")
            }
            DecodeError::InvalidMessageLength(len) => {
                write!(f, "invalid message length: {len}")
            }
            DecodeError::InvalidIeLength(ie_type, len) => {
                write!(f, "invalid length for IE {ie_type}: {len}")
            }
            DecodeError::MissingIe(ie_type) => {
                write!(f, "missing mandatory IE: {ie_type}")
            }
            DecodeError::InvalidIeValue(ie_type) => {
                write!(f, "invalid value for IE {ie_type}")
            }
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}
