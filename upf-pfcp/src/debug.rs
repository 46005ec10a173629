//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{debug, debug_span};

use crate::packet::MsgType;
use crate::packet::ie::NodeId;

// PFCP server debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    MsgRx(&'a SocketAddr, MsgType, u32),
    MsgTx(&'a SocketAddr, MsgType, u32),
    MsgRetransTx(&'a SocketAddr, u32, u8),
    MsgDupRx(&'a SocketAddr, u32),
    NodeCreate(&'a NodeId),
    NodeDelete(&'a NodeId),
    SessionCreate(u64, u64),
    SessionDelete(u64),
    PacketBuffered(u64, u16, usize),
    PacketDropped(u64, u16),
    GtpuForward(u64, u16, &'a SocketAddr),
    ReportDispatch(u64, &'static str),
    PerioTimeout(&'a Duration),
    ExpiryTimeout(u64, u32),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::MsgRx(addr, msg_type, seq) => {
                debug_span!("peer", %addr).in_scope(|| {
                    debug!(%msg_type, %seq, "{}", self);
                });
            }
            Debug::MsgTx(addr, msg_type, seq) => {
                debug_span!("peer", %addr).in_scope(|| {
                    debug!(%msg_type, %seq, "{}", self);
                });
            }
            Debug::MsgRetransTx(addr, seq, retry) => {
                debug_span!("peer", %addr).in_scope(|| {
                    debug!(%seq, %retry, "{}", self);
                });
            }
            Debug::MsgDupRx(addr, seq) => {
                debug_span!("peer", %addr).in_scope(|| {
                    debug!(%seq, "{}", self);
                });
            }
            Debug::NodeCreate(node_id) | Debug::NodeDelete(node_id) => {
                debug_span!("node", id = %node_id).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::SessionCreate(local_seid, remote_seid) => {
                debug_span!("session", %local_seid).in_scope(|| {
                    debug!(%remote_seid, "{}", self);
                });
            }
            Debug::SessionDelete(local_seid) => {
                debug_span!("session", %local_seid).in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::PacketBuffered(seid, pdr_id, queue_len) => {
                debug_span!("session", local_seid = %seid).in_scope(|| {
                    debug!(%pdr_id, %queue_len, "{}", self);
                });
            }
            Debug::PacketDropped(seid, pdr_id) => {
                debug_span!("session", local_seid = %seid).in_scope(|| {
                    debug!(%pdr_id, "{}", self);
                });
            }
            Debug::GtpuForward(seid, pdr_id, dst) => {
                debug_span!("session", local_seid = %seid).in_scope(|| {
                    debug!(%pdr_id, %dst, "{}", self);
                });
            }
            Debug::ReportDispatch(seid, report_type) => {
                debug_span!("session", local_seid = %seid).in_scope(|| {
                    debug!(%report_type, "{}", self);
                });
            }
            Debug::PerioTimeout(period) => {
                debug!(?period, "{}", self);
            }
            Debug::ExpiryTimeout(seid, urr_id) => {
                debug_span!("session", local_seid = %seid).in_scope(|| {
                    debug!(%urr_id, "{}", self);
                });
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::MsgRx(..) => {
                write!(f, "message received")
            }
            Debug::MsgTx(..) => {
                write!(f, "message sent")
            }
            Debug::MsgRetransTx(..) => {
                write!(f, "request retransmitted")
            }
            Debug::MsgDupRx(..) => {
                write!(f, "duplicate request, cached response replayed")
            }
            Debug::NodeCreate(..) => {
                write!(f, "node association created")
            }
            Debug::NodeDelete(..) => {
                write!(f, "node association deleted")
            }
            Debug::SessionCreate(..) => {
                write!(f, "session created")
            }
            Debug::SessionDelete(..) => {
                write!(f, "session deleted")
            }
            Debug::PacketBuffered(..) => {
                write!(f, "downlink packet buffered")
            }
            Debug::PacketDropped(..) => {
                write!(f, "buffer queue full, packet dropped")
            }
            Debug::GtpuForward(..) => {
                write!(f, "buffered packet forwarded")
            }
            Debug::ReportDispatch(..) => {
                write!(f, "report dispatched")
            }
            Debug::PerioTimeout(..) => {
                write!(f, "periodic measurement tick")
            }
            Debug::ExpiryTimeout(..) => {
                write!(f, "quota validity timer expired")
            }
        }
    }
}
