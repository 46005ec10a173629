//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::{
    IeIter, IeType, decode_timestamp_ie, encode_timestamp_ie,
};
use crate::packet::{Header, MessageBody, MsgType};

// Heartbeat Request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeartbeatRequest {
    pub seq: u32,
    pub recovery_time_stamp: Option<DateTime<Utc>>,
}

// Heartbeat Response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeartbeatResponse {
    pub seq: u32,
    pub recovery_time_stamp: DateTime<Utc>,
}

// ===== impl HeartbeatRequest =====

impl MessageBody for HeartbeatRequest {
    const MSG_TYPE: MsgType = MsgType::HeartbeatRequest;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        if let Some(ts) = &self.recovery_time_stamp {
            encode_timestamp_ie(IeType::RecoveryTimeStamp, ts, buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut recovery_time_stamp = None;
        for ie in IeIter::new(buf) {
            let (ie_type, value) = ie?;
            if let Some(IeType::RecoveryTimeStamp) = IeType::decode(ie_type) {
                recovery_time_stamp = Some(decode_timestamp_ie(
                    IeType::RecoveryTimeStamp,
                    value,
                )?);
            }
        }
        Ok(HeartbeatRequest {
            seq: hdr.seq,
            recovery_time_stamp,
        })
    }
}

// ===== impl HeartbeatResponse =====

impl MessageBody for HeartbeatResponse {
    const MSG_TYPE: MsgType = MsgType::HeartbeatResponse;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        encode_timestamp_ie(
            IeType::RecoveryTimeStamp,
            &self.recovery_time_stamp,
            buf,
        );
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut recovery_time_stamp = None;
        for ie in IeIter::new(buf) {
            let (ie_type, value) = ie?;
            if let Some(IeType::RecoveryTimeStamp) = IeType::decode(ie_type) {
                recovery_time_stamp = Some(decode_timestamp_ie(
                    IeType::RecoveryTimeStamp,
                    value,
                )?);
            }
        }
        Ok(HeartbeatResponse {
            seq: hdr.seq,
            recovery_time_stamp: recovery_time_stamp.ok_or(
                DecodeError::MissingIe(IeType::RecoveryTimeStamp as u16),
            )?,
        })
    }
}
