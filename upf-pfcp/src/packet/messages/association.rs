//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::{
    Cause, IeIter, IeKind, IeType, NodeId, decode_timestamp_ie,
    encode_timestamp_ie,
};
use crate::packet::{Header, MessageBody, MsgType};

// Association Setup Request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationSetupRequest {
    pub seq: u32,
    pub node_id: NodeId,
    pub recovery_time_stamp: Option<DateTime<Utc>>,
}

// Association Setup Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationSetupResponse {
    pub seq: u32,
    pub node_id: NodeId,
    pub cause: Cause,
    pub recovery_time_stamp: Option<DateTime<Utc>>,
}

// Association Update Request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationUpdateRequest {
    pub seq: u32,
    pub node_id: NodeId,
}

// Association Update Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationUpdateResponse {
    pub seq: u32,
    pub node_id: NodeId,
    pub cause: Cause,
}

// Association Release Request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationReleaseRequest {
    pub seq: u32,
    pub node_id: NodeId,
}

// Association Release Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationReleaseResponse {
    pub seq: u32,
    pub node_id: NodeId,
    pub cause: Cause,
}

// Decoded subset of IEs shared by the association message bodies.
#[derive(Debug, Default)]
struct AssociationIes {
    node_id: Option<NodeId>,
    cause: Option<Cause>,
    recovery_time_stamp: Option<DateTime<Utc>>,
}

// ===== impl AssociationSetupRequest =====

impl MessageBody for AssociationSetupRequest {
    const MSG_TYPE: MsgType = MsgType::AssociationSetupRequest;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
        if let Some(ts) = &self.recovery_time_stamp {
            encode_timestamp_ie(IeType::RecoveryTimeStamp, ts, buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationSetupRequest {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
            recovery_time_stamp: ies.recovery_time_stamp,
        })
    }
}

// ===== impl AssociationSetupResponse =====

impl MessageBody for AssociationSetupResponse {
    const MSG_TYPE: MsgType = MsgType::AssociationSetupResponse;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
        self.cause.encode(buf);
        if let Some(ts) = &self.recovery_time_stamp {
            encode_timestamp_ie(IeType::RecoveryTimeStamp, ts, buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationSetupResponse {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
            cause: ies
                .cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
            recovery_time_stamp: ies.recovery_time_stamp,
        })
    }
}

// ===== impl AssociationUpdateRequest =====

impl MessageBody for AssociationUpdateRequest {
    const MSG_TYPE: MsgType = MsgType::AssociationUpdateRequest;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationUpdateRequest {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
        })
    }
}

// ===== impl AssociationUpdateResponse =====

impl MessageBody for AssociationUpdateResponse {
    const MSG_TYPE: MsgType = MsgType::AssociationUpdateResponse;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
        self.cause.encode(buf);
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationUpdateResponse {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
            cause: ies
                .cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
        })
    }
}

// ===== impl AssociationReleaseRequest =====

impl MessageBody for AssociationReleaseRequest {
    const MSG_TYPE: MsgType = MsgType::AssociationReleaseRequest;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationReleaseRequest {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
        })
    }
}

// ===== impl AssociationReleaseResponse =====

impl MessageBody for AssociationReleaseResponse {
    const MSG_TYPE: MsgType = MsgType::AssociationReleaseResponse;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
        self.cause.encode(buf);
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let ies = decode_association_ies(buf)?;
        Ok(AssociationReleaseResponse {
            seq: hdr.seq,
            node_id: ies
                .node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
            cause: ies
                .cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
        })
    }
}

// ===== helper functions =====

fn decode_association_ies(buf: Bytes) -> DecodeResult<AssociationIes> {
    let mut ies = AssociationIes::default();
    for ie in IeIter::new(buf) {
        let (ie_type, mut value) = ie?;
        match IeType::decode(ie_type) {
            Some(IeType::NodeId) => {
                ies.node_id = Some(NodeId::decode_value(&mut value)?);
            }
            Some(IeType::Cause) => {
                ies.cause = Some(Cause::decode_value(&mut value)?);
            }
            Some(IeType::RecoveryTimeStamp) => {
                ies.recovery_time_stamp = Some(decode_timestamp_ie(
                    IeType::RecoveryTimeStamp,
                    value,
                )?);
            }
            _ => (),
        }
    }
    Ok(ies)
}
