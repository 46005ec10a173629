//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod reports;
pub mod rules;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use upf_utils::bytes::{BytesExt, BytesMutExt};

use crate::packet::error::{DecodeError, DecodeResult};

//
// PFCP Information Element format.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |            Type               |            Length             |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// ~                             Value                             ~
// |                                                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
pub const IE_HDR_SIZE: u16 = 4;

// Offset between the NTP era (1900) and the Unix era (1970), in seconds.
// PFCP timestamps are carried in NTP format.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

// PFCP IE types.
//
// IANA registry:
// https://www.iana.org/assignments/pfcp-parameters/pfcp-parameters.xhtml
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, Ord, PartialEq, PartialOrd)]
pub enum IeType {
    CreatePdr = 1,
    Pdi = 2,
    CreateFar = 3,
    ForwardingParameters = 4,
    CreateUrr = 6,
    CreateQer = 7,
    UpdatePdr = 9,
    UpdateFar = 10,
    UpdateForwardingParameters = 11,
    UpdateUrr = 13,
    UpdateQer = 14,
    RemovePdr = 15,
    RemoveFar = 16,
    RemoveUrr = 17,
    RemoveQer = 18,
    Cause = 19,
    SourceInterface = 20,
    Fteid = 21,
    NetworkInstance = 22,
    SdfFilter = 23,
    ApplicationId = 24,
    GateStatus = 25,
    Mbr = 26,
    Gbr = 27,
    QerCorrelationId = 28,
    Precedence = 29,
    VolumeThreshold = 31,
    TimeThreshold = 32,
    ReportingTriggers = 37,
    ReportType = 39,
    ForwardingPolicy = 41,
    DestinationInterface = 42,
    ApplyAction = 44,
    DownlinkDataNotificationDelay = 46,
    PdrId = 56,
    Fseid = 57,
    NodeId = 60,
    MeasurementMethod = 62,
    UsageReportTrigger = 63,
    MeasurementPeriod = 64,
    VolumeMeasurement = 66,
    DurationMeasurement = 67,
    VolumeQuota = 73,
    TimeQuota = 74,
    StartTime = 75,
    EndTime = 76,
    QueryUrr = 77,
    UsageReportSmr = 78,
    UsageReportSdr = 79,
    UsageReportSrr = 80,
    UrrId = 81,
    DownlinkDataReport = 83,
    OuterHeaderCreation = 84,
    CreateBar = 85,
    UpdateBar = 86,
    RemoveBar = 87,
    BarId = 88,
    UeIpAddress = 93,
    OuterHeaderRemoval = 95,
    RecoveryTimeStamp = 96,
    MeasurementInformation = 100,
    UrSeqn = 104,
    FarId = 108,
    QerId = 109,
    Rqi = 123,
    Qfi = 124,
    QueryUrrReference = 125,
    SuggestedBufferingPacketsCount = 140,
    EventTimeStamp = 156,
    PagingPolicyIndicator = 158,
    QuotaValidityTime = 181,
    SessionReport = 214,
    SrrId = 215,
    QosMonitoringReport = 247,
    QosMonitoringMeasurement = 248,
}

// PFCP cause values.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum Cause {
    Reserved = 0,
    RequestAccepted = 1,
    MoreUsageReportToSend = 2,
    RequestRejected = 64,
    SessionContextNotFound = 65,
    MandatoryIeMissing = 66,
    ConditionalIeMissing = 67,
    InvalidLength = 68,
    MandatoryIeIncorrect = 69,
    InvalidForwardingPolicy = 70,
    InvalidFteidAllocationOption = 71,
    NoEstablishedPfcpAssociation = 72,
    RuleCreationModificationFailure = 73,
    PfcpEntityInCongestion = 74,
    NoResourcesAvailable = 75,
    ServiceNotSupported = 76,
    SystemFailure = 77,
    RedirectionRequested = 78,
    AllDynamicAddressesAreOccupied = 79,
}

// Node ID, identifying a PFCP entity.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NodeId {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Fqdn(String),
}

// F-SEID: Session Endpoint Identifier together with the owner's address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fseid {
    pub seid: u64,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

// Report Type flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ReportType: u8 {
        const DLDR = 1 << 0;
        const USAR = 1 << 1;
        const ERIR = 1 << 2;
        const UPIR = 1 << 3;
        const TMIR = 1 << 4;
        const SESR = 1 << 5;
        const UISR = 1 << 6;
    }
}

//
// A typed Information Element.
//
// Implementors encode and decode only the IE value; the common TLV header is
// handled by the provided `encode` method and by `IeIter` on the decode side.
//
pub trait IeKind: Sized {
    const IE_TYPE: IeType;

    fn encode_value(&self, buf: &mut BytesMut);

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self>;

    fn encode(&self, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(Self::IE_TYPE, buf);
        self.encode_value(buf);
        ie_encode_end(start_pos, buf);
    }
}

//
// Iterator over the IEs contained in a message body or grouped IE.
//
// Yields the raw IE type together with a slice holding the IE value. Unknown
// IE types are the caller's business (normally skipped); malformed TLVs abort
// the iteration with an error.
//
#[derive(Debug)]
pub struct IeIter {
    buf: Bytes,
}

// ===== impl IeType =====

impl IeType {
    pub(crate) fn decode(value: u16) -> Option<Self> {
        IeType::from_u16(value)
    }
}

// ===== impl Cause =====

impl Cause {
    pub fn accepted(&self) -> bool {
        matches!(self, Cause::RequestAccepted | Cause::MoreUsageReportToSend)
    }
}

impl IeKind for Cause {
    const IE_TYPE: IeType = IeType::Cause;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        Cause::from_u8(value)
            .ok_or(DecodeError::InvalidIeValue(IeType::Cause as u16))
    }
}

// ===== impl NodeId =====

impl NodeId {
    const TYPE_IPV4: u8 = 0;
    const TYPE_IPV6: u8 = 1;
    const TYPE_FQDN: u8 = 2;

    // Builds a Node ID from a configured string, using the address form when
    // the string parses as an IP literal.
    pub fn from_name(name: &str) -> NodeId {
        match name.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => NodeId::Ipv4(addr),
            Ok(IpAddr::V6(addr)) => NodeId::Ipv6(addr),
            Err(_) => NodeId::Fqdn(name.to_owned()),
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Ipv4(addr) => addr.fmt(f),
            NodeId::Ipv6(addr) => addr.fmt(f),
            NodeId::Fqdn(name) => name.fmt(f),
        }
    }
}

impl IeKind for NodeId {
    const IE_TYPE: IeType = IeType::NodeId;

    fn encode_value(&self, buf: &mut BytesMut) {
        match self {
            NodeId::Ipv4(addr) => {
                buf.put_u8(Self::TYPE_IPV4);
                buf.put_ipv4(addr);
            }
            NodeId::Ipv6(addr) => {
                buf.put_u8(Self::TYPE_IPV6);
                buf.put_ipv6(addr);
            }
            NodeId::Fqdn(name) => {
                buf.put_u8(Self::TYPE_FQDN);
                buf.put_slice(name.as_bytes());
            }
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let id_type = buf.try_get_u8()?;
        match id_type {
            Self::TYPE_IPV4 => Ok(NodeId::Ipv4(buf.try_get_ipv4()?)),
            Self::TYPE_IPV6 => Ok(NodeId::Ipv6(buf.try_get_ipv6()?)),
            Self::TYPE_FQDN => {
                let name = String::from_utf8(buf.to_vec()).map_err(|_| {
                    DecodeError::InvalidIeValue(IeType::NodeId as u16)
                })?;
                buf.advance(buf.remaining());
                Ok(NodeId::Fqdn(name))
            }
            _ => Err(DecodeError::InvalidIeValue(IeType::NodeId as u16)),
        }
    }
}

// ===== impl Fseid =====

impl Fseid {
    const FLAG_V4: u8 = 0x02;
    const FLAG_V6: u8 = 0x01;

    pub fn new(seid: u64, ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Fseid {
        Fseid { seid, ipv4, ipv6 }
    }
}

impl IeKind for Fseid {
    const IE_TYPE: IeType = IeType::Fseid;

    fn encode_value(&self, buf: &mut BytesMut) {
        let mut flags = 0;
        if self.ipv4.is_some() {
            flags |= Self::FLAG_V4;
        }
        if self.ipv6.is_some() {
            flags |= Self::FLAG_V6;
        }
        buf.put_u8(flags);
        buf.put_u64(self.seid);
        if let Some(addr) = &self.ipv4 {
            buf.put_ipv4(addr);
        }
        if let Some(addr) = &self.ipv6 {
            buf.put_ipv6(addr);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let seid = buf.try_get_u64()?;
        let mut fseid = Fseid::new(seid, None, None);
        if flags & Self::FLAG_V4 != 0 {
            fseid.ipv4 = Some(buf.try_get_ipv4()?);
        }
        if flags & Self::FLAG_V6 != 0 {
            fseid.ipv6 = Some(buf.try_get_ipv6()?);
        }
        Ok(fseid)
    }
}

// ===== impl ReportType =====

impl IeKind for ReportType {
    const IE_TYPE: IeType = IeType::ReportType;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits());
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        Ok(ReportType::from_bits_truncate(value))
    }
}

// ===== impl IeIter =====

impl IeIter {
    pub(crate) fn new(buf: Bytes) -> IeIter {
        IeIter { buf }
    }
}

impl Iterator for IeIter {
    type Item = DecodeResult<(u16, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.buf.has_remaining() {
            return None;
        }
        if self.buf.remaining() < IE_HDR_SIZE as usize {
            return Some(Err(DecodeError::ReadOutOfBounds));
        }

        let ie_type = self.buf.get_u16();
        let ie_len = self.buf.get_u16();
        if ie_len as usize > self.buf.remaining() {
            return Some(Err(DecodeError::InvalidIeLength(ie_type, ie_len)));
        }
        let value = self.buf.split_to(ie_len as usize);

        Some(Ok((ie_type, value)))
    }
}

// ===== global functions =====

pub(crate) fn ie_encode_start(ie_type: IeType, buf: &mut BytesMut) -> usize {
    let start_pos = buf.len();
    buf.put_u16(ie_type as u16);
    // The IE length will be rewritten later.
    buf.put_u16(0);
    start_pos
}

pub(crate) fn ie_encode_end(start_pos: usize, buf: &mut BytesMut) {
    let ie_len = (buf.len() - start_pos) as u16 - IE_HDR_SIZE;
    buf[start_pos + 2..start_pos + 4].copy_from_slice(&ie_len.to_be_bytes());
}

// Encodes a full IE carrying a single unsigned value.
pub(crate) fn encode_u8_ie(ie_type: IeType, value: u8, buf: &mut BytesMut) {
    buf.put_u16(ie_type as u16);
    buf.put_u16(1);
    buf.put_u8(value);
}

pub(crate) fn encode_u16_ie(ie_type: IeType, value: u16, buf: &mut BytesMut) {
    buf.put_u16(ie_type as u16);
    buf.put_u16(2);
    buf.put_u16(value);
}

pub(crate) fn encode_u32_ie(ie_type: IeType, value: u32, buf: &mut BytesMut) {
    buf.put_u16(ie_type as u16);
    buf.put_u16(4);
    buf.put_u32(value);
}

pub(crate) fn encode_string_ie(ie_type: IeType, value: &str, buf: &mut BytesMut) {
    buf.put_u16(ie_type as u16);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

// Decodes the value of an IE carrying a single unsigned integer.
pub(crate) fn decode_u8_ie(mut buf: Bytes) -> DecodeResult<u8> {
    Ok(buf.try_get_u8()?)
}

pub(crate) fn decode_u16_ie(mut buf: Bytes) -> DecodeResult<u16> {
    Ok(buf.try_get_u16()?)
}

pub(crate) fn decode_u32_ie(mut buf: Bytes) -> DecodeResult<u32> {
    Ok(buf.try_get_u32()?)
}

pub(crate) fn decode_string_ie(
    ie_type: IeType,
    buf: Bytes,
) -> DecodeResult<String> {
    String::from_utf8(buf.to_vec())
        .map_err(|_| DecodeError::InvalidIeValue(ie_type as u16))
}

// Encodes a timestamp IE in the NTP format used on the PFCP wire.
pub(crate) fn encode_timestamp_ie(
    ie_type: IeType,
    value: &DateTime<Utc>,
    buf: &mut BytesMut,
) {
    let secs = value.timestamp().wrapping_add(NTP_UNIX_OFFSET) as u32;
    encode_u32_ie(ie_type, secs, buf);
}

pub(crate) fn decode_timestamp_ie(
    ie_type: IeType,
    mut buf: Bytes,
) -> DecodeResult<DateTime<Utc>> {
    let secs = buf.try_get_u32()?;
    let unix = (secs as i64).wrapping_sub(NTP_UNIX_OFFSET);
    DateTime::from_timestamp(unix, 0)
        .ok_or(DecodeError::InvalidIeValue(ie_type as u16))
}
