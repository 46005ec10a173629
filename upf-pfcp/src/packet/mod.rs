//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod error;
pub mod ie;
pub mod messages;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use enum_as_inner::EnumAsInner;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use upf_utils::bytes::{BytesExt, BytesMutExt, TLS_BUF};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::messages::association::{
    AssociationReleaseRequest, AssociationReleaseResponse,
    AssociationSetupRequest, AssociationSetupResponse,
    AssociationUpdateRequest, AssociationUpdateResponse,
};
use crate::packet::messages::heartbeat::{HeartbeatRequest, HeartbeatResponse};
use crate::packet::messages::report::{
    SessionReportRequest, SessionReportResponse,
};
use crate::packet::messages::session::{
    SessionDeletionRequest, SessionDeletionResponse,
    SessionEstablishmentRequest, SessionEstablishmentResponse,
    SessionModificationRequest, SessionModificationResponse,
};

//
// PFCP message header.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |    Version  |Spare|FO|MP|S|    Message Type               ... |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |          Message Length       |       SEID (if S=1)       ... |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Sequence Number            | Spare         |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
pub const PFCP_VERSION: u8 = 1;
pub const HDR_BASE_SIZE: usize = 8;
pub const HDR_SEID_SIZE: usize = 8;

// The length field counts everything after the first four octets.
const HDR_DEAD_SIZE: usize = 4;

// PFCP message types.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum MsgType {
    HeartbeatRequest = 1,
    HeartbeatResponse = 2,
    AssociationSetupRequest = 5,
    AssociationSetupResponse = 6,
    AssociationUpdateRequest = 7,
    AssociationUpdateResponse = 8,
    AssociationReleaseRequest = 9,
    AssociationReleaseResponse = 10,
    VersionNotSupportedResponse = 11,
    SessionEstablishmentRequest = 50,
    SessionEstablishmentResponse = 51,
    SessionModificationRequest = 52,
    SessionModificationResponse = 53,
    SessionDeletionRequest = 54,
    SessionDeletionResponse = 55,
    SessionReportRequest = 56,
    SessionReportResponse = 57,
}

// Decoded message header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    pub msg_type: MsgType,
    pub seid: Option<u64>,
    pub seq: u32,
}

// PFCP message.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum Message {
    HeartbeatRequest(HeartbeatRequest),
    HeartbeatResponse(HeartbeatResponse),
    AssociationSetupRequest(AssociationSetupRequest),
    AssociationSetupResponse(AssociationSetupResponse),
    AssociationUpdateRequest(AssociationUpdateRequest),
    AssociationUpdateResponse(AssociationUpdateResponse),
    AssociationReleaseRequest(AssociationReleaseRequest),
    AssociationReleaseResponse(AssociationReleaseResponse),
    VersionNotSupportedResponse(VersionNotSupportedResponse),
    SessionEstablishmentRequest(SessionEstablishmentRequest),
    SessionEstablishmentResponse(SessionEstablishmentResponse),
    SessionModificationRequest(SessionModificationRequest),
    SessionModificationResponse(SessionModificationResponse),
    SessionDeletionRequest(SessionDeletionRequest),
    SessionDeletionResponse(SessionDeletionResponse),
    SessionReportRequest(SessionReportRequest),
    SessionReportResponse(SessionReportResponse),
}

// Version Not Supported Response, answered to peers speaking a different
// protocol version. Carries no IEs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VersionNotSupportedResponse {
    pub seq: u32,
}

// A message body, encoded and decoded under a common header.
pub(crate) trait MessageBody: Sized {
    const MSG_TYPE: MsgType;

    // SEID carried in the header, None for node-related messages.
    fn seid(&self) -> Option<u64>;

    fn seq(&self) -> u32;

    fn encode_body(&self, buf: &mut BytesMut);

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self>;
}

// ===== impl MsgType =====

impl MsgType {
    // Whether messages of this type solicit a response.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            MsgType::HeartbeatRequest
                | MsgType::AssociationSetupRequest
                | MsgType::AssociationUpdateRequest
                | MsgType::AssociationReleaseRequest
                | MsgType::SessionEstablishmentRequest
                | MsgType::SessionModificationRequest
                | MsgType::SessionDeletionRequest
                | MsgType::SessionReportRequest
        )
    }

    // Whether the header of this message type carries a SEID.
    fn has_seid(&self) -> bool {
        matches!(
            self,
            MsgType::SessionEstablishmentRequest
                | MsgType::SessionEstablishmentResponse
                | MsgType::SessionModificationRequest
                | MsgType::SessionModificationResponse
                | MsgType::SessionDeletionRequest
                | MsgType::SessionDeletionResponse
                | MsgType::SessionReportRequest
                | MsgType::SessionReportResponse
        )
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsgType::HeartbeatRequest => write!(f, "Heartbeat Request"),
            MsgType::HeartbeatResponse => write!(f, "Heartbeat Response"),
            MsgType::AssociationSetupRequest => {
                write!(f, "Association Setup Request")
            }
            MsgType::AssociationSetupResponse => {
                write!(f, "Association Setup Response")
            }
            MsgType::AssociationUpdateRequest => {
                write!(f, "Association Update Request")
            }
            MsgType::AssociationUpdateResponse => {
                write!(f, "Association Update Response")
            }
            MsgType::AssociationReleaseRequest => {
                write!(f, "Association Release Request")
            }
            MsgType::AssociationReleaseResponse => {
                write!(f, "Association Release Response")
            }
            MsgType::VersionNotSupportedResponse => {
                write!(f, "Version Not Supported Response")
            }
            MsgType::SessionEstablishmentRequest => {
                write!(f, "Session Establishment Request")
            }
            MsgType::SessionEstablishmentResponse => {
                write!(f, "Session Establishment Response")
            }
            MsgType::SessionModificationRequest => {
                write!(f, "Session Modification Request")
            }
            MsgType::SessionModificationResponse => {
                write!(f, "Session Modification Response")
            }
            MsgType::SessionDeletionRequest => {
                write!(f, "Session Deletion Request")
            }
            MsgType::SessionDeletionResponse => {
                write!(f, "Session Deletion Response")
            }
            MsgType::SessionReportRequest => {
                write!(f, "Session Report Request")
            }
            MsgType::SessionReportResponse => {
                write!(f, "Session Report Response")
            }
        }
    }
}

// ===== impl Message =====

impl Message {
    // Encodes the message into a bytes buffer.
    pub fn encode(&self) -> BytesMut {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();

            match self {
                Message::HeartbeatRequest(msg) => encode_msg(msg, &mut buf),
                Message::HeartbeatResponse(msg) => encode_msg(msg, &mut buf),
                Message::AssociationSetupRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::AssociationSetupResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::AssociationUpdateRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::AssociationUpdateResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::AssociationReleaseRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::AssociationReleaseResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::VersionNotSupportedResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionEstablishmentRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionEstablishmentResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionModificationRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionModificationResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionDeletionRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionDeletionResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionReportRequest(msg) => {
                    encode_msg(msg, &mut buf)
                }
                Message::SessionReportResponse(msg) => {
                    encode_msg(msg, &mut buf)
                }
            }

            buf.clone()
        })
    }

    // Decodes a PFCP message from a received datagram.
    pub fn decode(data: &[u8]) -> DecodeResult<Message> {
        let mut buf = Bytes::copy_from_slice(data);

        if buf.remaining() < HDR_BASE_SIZE {
            return Err(DecodeError::IncompleteMessage);
        }

        // Parse and validate the version.
        let first_byte = buf.try_get_u8()?;
        let version = first_byte >> 5;
        if version != PFCP_VERSION {
            return Err(DecodeError::InvalidVersion(version));
        }
        let s_flag = first_byte & 0x01 != 0;

        // Parse message type and length.
        let raw_msg_type = buf.try_get_u8()?;
        let msg_type = MsgType::from_u8(raw_msg_type)
            .ok_or(DecodeError::UnknownMessageType(raw_msg_type))?;
        let msg_len = buf.try_get_u16()? as usize;
        if msg_len + HDR_DEAD_SIZE > data.len() {
            return Err(DecodeError::InvalidMessageLength(msg_len as u16));
        }

        // Parse the optional SEID and the sequence number.
        let seid = if s_flag { Some(buf.try_get_u64()?) } else { None };
        let seq = buf.try_get_u24()?;
        let _spare = buf.try_get_u8()?;

        // The body spans the rest of the declared message length.
        let hdr_size = if s_flag {
            HDR_BASE_SIZE + HDR_SEID_SIZE
        } else {
            HDR_BASE_SIZE
        };
        let body_len = (msg_len + HDR_DEAD_SIZE)
            .checked_sub(hdr_size)
            .ok_or(DecodeError::InvalidMessageLength(msg_len as u16))?;
        let body = buf.split_to(body_len);

        let hdr = Header {
            msg_type,
            seid,
            seq,
        };

        let msg = match msg_type {
            MsgType::HeartbeatRequest => Message::HeartbeatRequest(
                HeartbeatRequest::decode_body(&hdr, body)?,
            ),
            MsgType::HeartbeatResponse => Message::HeartbeatResponse(
                HeartbeatResponse::decode_body(&hdr, body)?,
            ),
            MsgType::AssociationSetupRequest => {
                Message::AssociationSetupRequest(
                    AssociationSetupRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::AssociationSetupResponse => {
                Message::AssociationSetupResponse(
                    AssociationSetupResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::AssociationUpdateRequest => {
                Message::AssociationUpdateRequest(
                    AssociationUpdateRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::AssociationUpdateResponse => {
                Message::AssociationUpdateResponse(
                    AssociationUpdateResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::AssociationReleaseRequest => {
                Message::AssociationReleaseRequest(
                    AssociationReleaseRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::AssociationReleaseResponse => {
                Message::AssociationReleaseResponse(
                    AssociationReleaseResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::VersionNotSupportedResponse => {
                Message::VersionNotSupportedResponse(
                    VersionNotSupportedResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionEstablishmentRequest => {
                Message::SessionEstablishmentRequest(
                    SessionEstablishmentRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionEstablishmentResponse => {
                Message::SessionEstablishmentResponse(
                    SessionEstablishmentResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionModificationRequest => {
                Message::SessionModificationRequest(
                    SessionModificationRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionModificationResponse => {
                Message::SessionModificationResponse(
                    SessionModificationResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionDeletionRequest => {
                Message::SessionDeletionRequest(
                    SessionDeletionRequest::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionDeletionResponse => {
                Message::SessionDeletionResponse(
                    SessionDeletionResponse::decode_body(&hdr, body)?,
                )
            }
            MsgType::SessionReportRequest => Message::SessionReportRequest(
                SessionReportRequest::decode_body(&hdr, body)?,
            ),
            MsgType::SessionReportResponse => Message::SessionReportResponse(
                SessionReportResponse::decode_body(&hdr, body)?,
            ),
        };

        Ok(msg)
    }

    pub fn msg_type(&self) -> MsgType {
        match self {
            Message::HeartbeatRequest(_) => MsgType::HeartbeatRequest,
            Message::HeartbeatResponse(_) => MsgType::HeartbeatResponse,
            Message::AssociationSetupRequest(_) => {
                MsgType::AssociationSetupRequest
            }
            Message::AssociationSetupResponse(_) => {
                MsgType::AssociationSetupResponse
            }
            Message::AssociationUpdateRequest(_) => {
                MsgType::AssociationUpdateRequest
            }
            Message::AssociationUpdateResponse(_) => {
                MsgType::AssociationUpdateResponse
            }
            Message::AssociationReleaseRequest(_) => {
                MsgType::AssociationReleaseRequest
            }
            Message::AssociationReleaseResponse(_) => {
                MsgType::AssociationReleaseResponse
            }
            Message::VersionNotSupportedResponse(_) => {
                MsgType::VersionNotSupportedResponse
            }
            Message::SessionEstablishmentRequest(_) => {
                MsgType::SessionEstablishmentRequest
            }
            Message::SessionEstablishmentResponse(_) => {
                MsgType::SessionEstablishmentResponse
            }
            Message::SessionModificationRequest(_) => {
                MsgType::SessionModificationRequest
            }
            Message::SessionModificationResponse(_) => {
                MsgType::SessionModificationResponse
            }
            Message::SessionDeletionRequest(_) => {
                MsgType::SessionDeletionRequest
            }
            Message::SessionDeletionResponse(_) => {
                MsgType::SessionDeletionResponse
            }
            Message::SessionReportRequest(_) => MsgType::SessionReportRequest,
            Message::SessionReportResponse(_) => {
                MsgType::SessionReportResponse
            }
        }
    }

    pub fn seq(&self) -> u32 {
        match self {
            Message::HeartbeatRequest(msg) => msg.seq,
            Message::HeartbeatResponse(msg) => msg.seq,
            Message::AssociationSetupRequest(msg) => msg.seq,
            Message::AssociationSetupResponse(msg) => msg.seq,
            Message::AssociationUpdateRequest(msg) => msg.seq,
            Message::AssociationUpdateResponse(msg) => msg.seq,
            Message::AssociationReleaseRequest(msg) => msg.seq,
            Message::AssociationReleaseResponse(msg) => msg.seq,
            Message::VersionNotSupportedResponse(msg) => msg.seq,
            Message::SessionEstablishmentRequest(msg) => msg.seq,
            Message::SessionEstablishmentResponse(msg) => msg.seq,
            Message::SessionModificationRequest(msg) => msg.seq,
            Message::SessionModificationResponse(msg) => msg.seq,
            Message::SessionDeletionRequest(msg) => msg.seq,
            Message::SessionDeletionResponse(msg) => msg.seq,
            Message::SessionReportRequest(msg) => msg.seq,
            Message::SessionReportResponse(msg) => msg.seq,
        }
    }

    // Stamps the transaction-layer sequence number into the message.
    pub fn set_seq(&mut self, seq: u32) {
        match self {
            Message::HeartbeatRequest(msg) => msg.seq = seq,
            Message::HeartbeatResponse(msg) => msg.seq = seq,
            Message::AssociationSetupRequest(msg) => msg.seq = seq,
            Message::AssociationSetupResponse(msg) => msg.seq = seq,
            Message::AssociationUpdateRequest(msg) => msg.seq = seq,
            Message::AssociationUpdateResponse(msg) => msg.seq = seq,
            Message::AssociationReleaseRequest(msg) => msg.seq = seq,
            Message::AssociationReleaseResponse(msg) => msg.seq = seq,
            Message::VersionNotSupportedResponse(msg) => msg.seq = seq,
            Message::SessionEstablishmentRequest(msg) => msg.seq = seq,
            Message::SessionEstablishmentResponse(msg) => msg.seq = seq,
            Message::SessionModificationRequest(msg) => msg.seq = seq,
            Message::SessionModificationResponse(msg) => msg.seq = seq,
            Message::SessionDeletionRequest(msg) => msg.seq = seq,
            Message::SessionDeletionResponse(msg) => msg.seq = seq,
            Message::SessionReportRequest(msg) => msg.seq = seq,
            Message::SessionReportResponse(msg) => msg.seq = seq,
        }
    }

    pub fn seid(&self) -> Option<u64> {
        match self {
            Message::SessionEstablishmentRequest(msg) => Some(msg.seid),
            Message::SessionEstablishmentResponse(msg) => Some(msg.seid),
            Message::SessionModificationRequest(msg) => Some(msg.seid),
            Message::SessionModificationResponse(msg) => Some(msg.seid),
            Message::SessionDeletionRequest(msg) => Some(msg.seid),
            Message::SessionDeletionResponse(msg) => Some(msg.seid),
            Message::SessionReportRequest(msg) => Some(msg.seid),
            Message::SessionReportResponse(msg) => Some(msg.seid),
            _ => None,
        }
    }
}

// ===== impl VersionNotSupportedResponse =====

impl MessageBody for VersionNotSupportedResponse {
    const MSG_TYPE: MsgType = MsgType::VersionNotSupportedResponse;

    fn seid(&self) -> Option<u64> {
        None
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, _buf: &mut BytesMut) {}

    fn decode_body(hdr: &Header, _buf: Bytes) -> DecodeResult<Self> {
        Ok(VersionNotSupportedResponse { seq: hdr.seq })
    }
}

// ===== global functions =====

fn encode_msg<T: MessageBody>(msg: &T, buf: &mut BytesMut) {
    let seid = msg.seid();

    let mut first_byte = PFCP_VERSION << 5;
    if T::MSG_TYPE.has_seid() {
        first_byte |= 0x01;
    }
    buf.put_u8(first_byte);
    buf.put_u8(T::MSG_TYPE as u8);
    // The message length will be rewritten later.
    buf.put_u16(0);
    if T::MSG_TYPE.has_seid() {
        buf.put_u64(seid.unwrap_or(0));
    }
    buf.put_u24(msg.seq());
    buf.put_u8(0);

    msg.encode_body(buf);

    // Rewrite the message length.
    let msg_len = (buf.len() - HDR_DEAD_SIZE) as u16;
    buf[2..4].copy_from_slice(&msg_len.to_be_bytes());
}
