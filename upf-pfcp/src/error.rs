//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;

use tracing::{error, warn};

use crate::forwarder::DriverError;
use crate::packet::MsgType;
use crate::packet::ie::{IeType, NodeId};

// PFCP server errors.
#[derive(Debug)]
pub enum Error {
    // I/O errors
    IoError(IoError),
    // Node and session lookup
    NodeNotFound(NodeId),
    SessionNotFound(u64),
    // Message input
    MissingMandatoryIe(MsgType, IeType),
    UnmatchedResponse(MsgType, u32),
    // Rule handling
    DanglingRuleReference(u16, IeType, u32),
    RuleNotFound(IeType, u32),
    Driver(&'static str, DriverError),
    // Request transactions
    ReqTimeout(SocketAddr, u32),
    ReqAborted,
}

// PFCP server I/O errors.
#[derive(Debug)]
pub enum IoError {
    UdpSocketError(std::io::Error),
    UdpRecvError(std::io::Error),
    UdpSendError(std::io::Error),
    SideChannelSocketError(std::io::Error),
    SideChannelRecvError(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::IoError(error) => {
                error.log();
            }
            Error::NodeNotFound(node_id) => {
                error!(%node_id, "{}", self);
            }
            Error::SessionNotFound(seid) => {
                warn!(%seid, "{}", self);
            }
            Error::MissingMandatoryIe(msg_type, ie_type) => {
                error!(%msg_type, ?ie_type, "{}", self);
            }
            Error::UnmatchedResponse(msg_type, seq) => {
                warn!(%msg_type, %seq, "{}", self);
            }
            Error::DanglingRuleReference(pdr_id, ie_type, id) => {
                error!(%pdr_id, ?ie_type, %id, "{}", self);
            }
            Error::RuleNotFound(ie_type, id) => {
                error!(?ie_type, %id, "{}", self);
            }
            Error::Driver(operation, error) => {
                error!(%operation, error = %error, "{}", self);
            }
            Error::ReqTimeout(raddr, seq) => {
                warn!(%raddr, %seq, "{}", self);
            }
            Error::ReqAborted => {
                warn!("{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::NodeNotFound(..) => {
                write!(f, "no established association for node")
            }
            Error::SessionNotFound(..) => {
                write!(f, "session context not found")
            }
            Error::MissingMandatoryIe(..) => {
                write!(f, "missing mandatory IE")
            }
            Error::UnmatchedResponse(..) => {
                write!(f, "response matches no outstanding request")
            }
            Error::DanglingRuleReference(..) => {
                write!(f, "PDR references a rule absent from the session")
            }
            Error::RuleNotFound(..) => {
                write!(f, "rule not found in session")
            }
            Error::Driver(..) => {
                write!(f, "forwarder driver call failed")
            }
            Error::ReqTimeout(..) => {
                write!(f, "request retransmission budget exhausted")
            }
            Error::ReqAborted => {
                write!(f, "request aborted by shutdown")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::Driver(_, error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

// ===== impl IoError =====

impl IoError {
    pub(crate) fn log(&self) {
        match self {
            IoError::UdpSocketError(error)
            | IoError::UdpRecvError(error)
            | IoError::UdpSendError(error)
            | IoError::SideChannelSocketError(error)
            | IoError::SideChannelRecvError(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::UdpSocketError(..) => {
                write!(f, "failed to create UDP socket")
            }
            IoError::UdpRecvError(..) => {
                write!(f, "failed to receive UDP packet")
            }
            IoError::UdpSendError(..) => {
                write!(f, "failed to send UDP packet")
            }
            IoError::SideChannelSocketError(..) => {
                write!(f, "failed to create side-channel socket")
            }
            IoError::SideChannelRecvError(..) => {
                write!(f, "failed to receive side-channel datagram")
            }
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::UdpSocketError(error)
            | IoError::UdpRecvError(error)
            | IoError::UdpSendError(error)
            | IoError::SideChannelSocketError(error)
            | IoError::SideChannelRecvError(error) => Some(error),
        }
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
