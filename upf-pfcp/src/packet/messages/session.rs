//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, BytesMut};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::rules::{
    CreateBar, CreateFar, CreatePdr, CreateQer, CreateUrr, QueryUrr,
    UpdateBar, UpdateFar, UpdatePdr, UpdateQer, UpdateUrr, decode_remove_ie,
    encode_remove_bar, encode_remove_far, encode_remove_pdr,
    encode_remove_qer, encode_remove_urr,
};
use crate::packet::ie::reports::UsageReport;
use crate::packet::ie::{
    Cause, Fseid, IeIter, IeKind, IeType, NodeId, decode_u8_ie, decode_u16_ie,
    decode_u32_ie,
};
use crate::packet::{Header, MessageBody, MsgType};

// Session Establishment Request.
//
// The mandatory Node ID and CP F-SEID IEs are kept optional here so their
// absence can be reported by the request handler rather than rejected at
// decode time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionEstablishmentRequest {
    pub seid: u64,
    pub seq: u32,
    pub node_id: Option<NodeId>,
    pub fseid: Option<Fseid>,
    pub create_fars: Vec<CreateFar>,
    pub create_qers: Vec<CreateQer>,
    pub create_urrs: Vec<CreateUrr>,
    pub create_bars: Vec<CreateBar>,
    pub create_pdrs: Vec<CreatePdr>,
}

// Session Establishment Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionEstablishmentResponse {
    pub seid: u64,
    pub seq: u32,
    pub node_id: NodeId,
    pub cause: Cause,
    pub fseid: Option<Fseid>,
}

// Session Modification Request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionModificationRequest {
    pub seid: u64,
    pub seq: u32,
    pub node_id: Option<NodeId>,
    pub create_fars: Vec<CreateFar>,
    pub create_qers: Vec<CreateQer>,
    pub create_urrs: Vec<CreateUrr>,
    pub create_bars: Vec<CreateBar>,
    pub create_pdrs: Vec<CreatePdr>,
    pub remove_fars: Vec<u32>,
    pub remove_qers: Vec<u32>,
    pub remove_urrs: Vec<u32>,
    pub remove_bars: Vec<u8>,
    pub remove_pdrs: Vec<u16>,
    pub update_fars: Vec<UpdateFar>,
    pub update_qers: Vec<UpdateQer>,
    pub update_urrs: Vec<UpdateUrr>,
    pub update_bars: Vec<UpdateBar>,
    pub update_pdrs: Vec<UpdatePdr>,
    pub query_urrs: Vec<QueryUrr>,
}

// Session Modification Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionModificationResponse {
    pub seid: u64,
    pub seq: u32,
    pub cause: Cause,
    pub usage_reports: Vec<UsageReport>,
}

// Session Deletion Request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionDeletionRequest {
    pub seid: u64,
    pub seq: u32,
}

// Session Deletion Response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionDeletionResponse {
    pub seid: u64,
    pub seq: u32,
    pub cause: Cause,
    pub usage_reports: Vec<UsageReport>,
}

// ===== impl SessionEstablishmentRequest =====

impl MessageBody for SessionEstablishmentRequest {
    const MSG_TYPE: MsgType = MsgType::SessionEstablishmentRequest;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        if let Some(node_id) = &self.node_id {
            node_id.encode(buf);
        }
        if let Some(fseid) = &self.fseid {
            fseid.encode(buf);
        }
        for far in &self.create_fars {
            far.encode(buf);
        }
        for qer in &self.create_qers {
            qer.encode(buf);
        }
        for urr in &self.create_urrs {
            urr.encode(buf);
        }
        for bar in &self.create_bars {
            bar.encode(buf);
        }
        for pdr in &self.create_pdrs {
            pdr.encode(buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut msg = SessionEstablishmentRequest {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            node_id: None,
            fseid: None,
            create_fars: Vec::new(),
            create_qers: Vec::new(),
            create_urrs: Vec::new(),
            create_bars: Vec::new(),
            create_pdrs: Vec::new(),
        };
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::NodeId) => {
                    msg.node_id = Some(NodeId::decode_value(&mut value)?);
                }
                Some(IeType::Fseid) => {
                    msg.fseid = Some(Fseid::decode_value(&mut value)?);
                }
                Some(IeType::CreateFar) => {
                    msg.create_fars.push(CreateFar::decode_value(&mut value)?);
                }
                Some(IeType::CreateQer) => {
                    msg.create_qers.push(CreateQer::decode_value(&mut value)?);
                }
                Some(IeType::CreateUrr) => {
                    msg.create_urrs.push(CreateUrr::decode_value(&mut value)?);
                }
                Some(IeType::CreateBar) => {
                    msg.create_bars.push(CreateBar::decode_value(&mut value)?);
                }
                Some(IeType::CreatePdr) => {
                    msg.create_pdrs.push(CreatePdr::decode_value(&mut value)?);
                }
                _ => (),
            }
        }
        Ok(msg)
    }
}

// ===== impl SessionEstablishmentResponse =====

impl MessageBody for SessionEstablishmentResponse {
    const MSG_TYPE: MsgType = MsgType::SessionEstablishmentResponse;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.node_id.encode(buf);
        self.cause.encode(buf);
        if let Some(fseid) = &self.fseid {
            fseid.encode(buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut node_id = None;
        let mut cause = None;
        let mut fseid = None;
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::NodeId) => {
                    node_id = Some(NodeId::decode_value(&mut value)?);
                }
                Some(IeType::Cause) => {
                    cause = Some(Cause::decode_value(&mut value)?);
                }
                Some(IeType::Fseid) => {
                    fseid = Some(Fseid::decode_value(&mut value)?);
                }
                _ => (),
            }
        }
        Ok(SessionEstablishmentResponse {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            node_id: node_id
                .ok_or(DecodeError::MissingIe(IeType::NodeId as u16))?,
            cause: cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
            fseid,
        })
    }
}

// ===== impl SessionModificationRequest =====

impl MessageBody for SessionModificationRequest {
    const MSG_TYPE: MsgType = MsgType::SessionModificationRequest;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        if let Some(node_id) = &self.node_id {
            node_id.encode(buf);
        }
        for far in &self.create_fars {
            far.encode(buf);
        }
        for qer in &self.create_qers {
            qer.encode(buf);
        }
        for urr in &self.create_urrs {
            urr.encode(buf);
        }
        for bar in &self.create_bars {
            bar.encode(buf);
        }
        for pdr in &self.create_pdrs {
            pdr.encode(buf);
        }
        for far_id in &self.remove_fars {
            encode_remove_far(*far_id, buf);
        }
        for qer_id in &self.remove_qers {
            encode_remove_qer(*qer_id, buf);
        }
        for urr_id in &self.remove_urrs {
            encode_remove_urr(*urr_id, buf);
        }
        for bar_id in &self.remove_bars {
            encode_remove_bar(*bar_id, buf);
        }
        for pdr_id in &self.remove_pdrs {
            encode_remove_pdr(*pdr_id, buf);
        }
        for far in &self.update_fars {
            far.encode(buf);
        }
        for qer in &self.update_qers {
            qer.encode(buf);
        }
        for urr in &self.update_urrs {
            urr.encode(buf);
        }
        for bar in &self.update_bars {
            bar.encode(buf);
        }
        for pdr in &self.update_pdrs {
            pdr.encode(buf);
        }
        for query in &self.query_urrs {
            query.encode(buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut msg = SessionModificationRequest {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            ..Default::default()
        };
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::NodeId) => {
                    msg.node_id = Some(NodeId::decode_value(&mut value)?);
                }
                Some(IeType::CreateFar) => {
                    msg.create_fars.push(CreateFar::decode_value(&mut value)?);
                }
                Some(IeType::CreateQer) => {
                    msg.create_qers.push(CreateQer::decode_value(&mut value)?);
                }
                Some(IeType::CreateUrr) => {
                    msg.create_urrs.push(CreateUrr::decode_value(&mut value)?);
                }
                Some(IeType::CreateBar) => {
                    msg.create_bars.push(CreateBar::decode_value(&mut value)?);
                }
                Some(IeType::CreatePdr) => {
                    msg.create_pdrs.push(CreatePdr::decode_value(&mut value)?);
                }
                Some(IeType::RemoveFar) => {
                    msg.remove_fars.push(decode_remove_ie(
                        value,
                        IeType::FarId,
                        decode_u32_ie,
                    )?);
                }
                Some(IeType::RemoveQer) => {
                    msg.remove_qers.push(decode_remove_ie(
                        value,
                        IeType::QerId,
                        decode_u32_ie,
                    )?);
                }
                Some(IeType::RemoveUrr) => {
                    msg.remove_urrs.push(decode_remove_ie(
                        value,
                        IeType::UrrId,
                        decode_u32_ie,
                    )?);
                }
                Some(IeType::RemoveBar) => {
                    msg.remove_bars.push(decode_remove_ie(
                        value,
                        IeType::BarId,
                        decode_u8_ie,
                    )?);
                }
                Some(IeType::RemovePdr) => {
                    msg.remove_pdrs.push(decode_remove_ie(
                        value,
                        IeType::PdrId,
                        decode_u16_ie,
                    )?);
                }
                Some(IeType::UpdateFar) => {
                    msg.update_fars.push(UpdateFar::decode_value(&mut value)?);
                }
                Some(IeType::UpdateQer) => {
                    msg.update_qers.push(UpdateQer::decode_value(&mut value)?);
                }
                Some(IeType::UpdateUrr) => {
                    msg.update_urrs.push(UpdateUrr::decode_value(&mut value)?);
                }
                Some(IeType::UpdateBar) => {
                    msg.update_bars.push(UpdateBar::decode_value(&mut value)?);
                }
                Some(IeType::UpdatePdr) => {
                    msg.update_pdrs.push(UpdatePdr::decode_value(&mut value)?);
                }
                Some(IeType::QueryUrr) => {
                    msg.query_urrs.push(QueryUrr::decode_value(&mut value)?);
                }
                _ => (),
            }
        }
        Ok(msg)
    }
}

// ===== impl SessionModificationResponse =====

impl MessageBody for SessionModificationResponse {
    const MSG_TYPE: MsgType = MsgType::SessionModificationResponse;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.cause.encode(buf);
        for report in &self.usage_reports {
            report.encode_as(IeType::UsageReportSmr, buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let (cause, usage_reports) =
            decode_response_ies(buf, IeType::UsageReportSmr)?;
        Ok(SessionModificationResponse {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            cause: cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
            usage_reports,
        })
    }
}

// ===== impl SessionDeletionRequest =====

impl MessageBody for SessionDeletionRequest {
    const MSG_TYPE: MsgType = MsgType::SessionDeletionRequest;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, _buf: &mut BytesMut) {}

    fn decode_body(hdr: &Header, _buf: Bytes) -> DecodeResult<Self> {
        Ok(SessionDeletionRequest {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
        })
    }
}

// ===== impl SessionDeletionResponse =====

impl MessageBody for SessionDeletionResponse {
    const MSG_TYPE: MsgType = MsgType::SessionDeletionResponse;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.cause.encode(buf);
        for report in &self.usage_reports {
            report.encode_as(IeType::UsageReportSdr, buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let (cause, usage_reports) =
            decode_response_ies(buf, IeType::UsageReportSdr)?;
        Ok(SessionDeletionResponse {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            cause: cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
            usage_reports,
        })
    }
}

// ===== helper functions =====

fn decode_response_ies(
    buf: Bytes,
    usage_report_type: IeType,
) -> DecodeResult<(Option<Cause>, Vec<UsageReport>)> {
    let mut cause = None;
    let mut usage_reports = Vec::new();
    for ie in IeIter::new(buf) {
        let (ie_type, mut value) = ie?;
        match IeType::decode(ie_type) {
            Some(IeType::Cause) => {
                cause = Some(Cause::decode_value(&mut value)?);
            }
            Some(ie_type) if ie_type == usage_report_type => {
                usage_reports.push(UsageReport::decode(value)?);
            }
            _ => (),
        }
    }
    Ok((cause, usage_reports))
}
