//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use upf_utils::bytes::{BytesExt, BytesMutExt};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::{
    IeIter, IeKind, IeType, decode_string_ie, decode_u8_ie, decode_u16_ie,
    decode_u32_ie, encode_string_ie, encode_u8_ie, encode_u16_ie,
    encode_u32_ie, ie_encode_end, ie_encode_start,
};

// Apply Action flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ApplyAction: u8 {
        const DROP = 1 << 0;
        const FORW = 1 << 1;
        const BUFF = 1 << 2;
        const NOCP = 1 << 3;
        const DUPL = 1 << 4;
    }
}

// Measurement Method flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct MeasurementMethod: u8 {
        const DURAT = 1 << 0;
        const VOLUM = 1 << 1;
        const EVENT = 1 << 2;
    }
}

// Reporting Triggers flags (three octets on the wire, low bit first within
// each octet).
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ReportingTriggers: u32 {
        const PERIO = 1 << 0;
        const VOLTH = 1 << 1;
        const TIMTH = 1 << 2;
        const QUHTI = 1 << 3;
        const START = 1 << 4;
        const STOPT = 1 << 5;
        const DROTH = 1 << 6;
        const LIUSA = 1 << 7;
        const VOLQU = 1 << 8;
        const TIMQU = 1 << 9;
        const ENVCL = 1 << 10;
        const MACAR = 1 << 11;
        const EVETH = 1 << 12;
        const EVEQU = 1 << 13;
        const IPMJL = 1 << 14;
        const QUVTI = 1 << 15;
        const UPINT = 1 << 16;
        const REEMR = 1 << 17;
    }
}

// Measurement Information flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct MeasurementInformation: u8 {
        const MBQE = 1 << 0;
        const INAM = 1 << 1;
        const RADI = 1 << 2;
        const ISTM = 1 << 3;
        const MNOP = 1 << 4;
    }
}

// Source Interface values.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum SourceInterface {
    Access = 0,
    Core = 1,
    SgiLanN6Lan = 2,
    CpFunction = 3,
}

// Destination Interface values.
#[derive(Clone, Copy, Debug, Eq, FromPrimitive, PartialEq)]
pub enum DestinationInterface {
    Access = 0,
    Core = 1,
    SgiLanN6Lan = 2,
    CpFunction = 3,
    LiFunction = 4,
}

// Gate state for one traffic direction.
#[derive(Clone, Copy, Debug, Default, Eq, FromPrimitive, PartialEq)]
pub enum GateState {
    #[default]
    Open = 0,
    Closed = 1,
}

// Gate Status, one gate per direction.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GateStatus {
    pub uplink: GateState,
    pub downlink: GateState,
}

// MBR/GBR value pair (40-bit kbps values on the wire).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bitrate {
    pub uplink: u64,
    pub downlink: u64,
}

// F-TEID: tunnel endpoint together with the GTP-U address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fteid {
    pub teid: u32,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

// UE IP Address.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UeIpAddress {
    pub source_or_destination: bool,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

// SDF Filter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SdfFilter {
    pub flow_description: Option<String>,
    pub tos_traffic_class: Option<u16>,
    pub security_parameter_index: Option<u32>,
    pub flow_label: Option<u32>,
    pub filter_id: Option<u32>,
}

// Outer Header Creation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OuterHeaderCreation {
    pub description: u16,
    pub teid: Option<u32>,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub port: Option<u16>,
}

// Volume value set shared by the Volume Threshold and Volume Quota IEs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Volume {
    pub total: Option<u64>,
    pub uplink: Option<u64>,
    pub downlink: Option<u64>,
}

// Packet Detection Information.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pdi {
    pub source_interface: SourceInterface,
    pub f_teid: Option<Fteid>,
    pub network_instance: Option<String>,
    pub ue_ip_address: Option<UeIpAddress>,
    pub sdf_filter: Option<SdfFilter>,
    pub application_id: Option<String>,
}

// Forwarding Parameters (also carried as Update Forwarding Parameters).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ForwardingParameters {
    pub destination_interface: Option<DestinationInterface>,
    pub network_instance: Option<String>,
    pub outer_header_creation: Option<OuterHeaderCreation>,
    pub forwarding_policy: Option<String>,
}

// Create PDR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreatePdr {
    pub pdr_id: u16,
    pub precedence: Option<u32>,
    pub pdi: Option<Pdi>,
    pub outer_header_removal: Option<u8>,
    pub far_id: Option<u32>,
    pub qer_ids: Vec<u32>,
    pub urr_ids: Vec<u32>,
}

// Update PDR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdatePdr {
    pub pdr_id: u16,
    pub precedence: Option<u32>,
    pub pdi: Option<Pdi>,
    pub outer_header_removal: Option<u8>,
    pub far_id: Option<u32>,
    pub qer_ids: Vec<u32>,
    pub urr_ids: Vec<u32>,
}

// Create FAR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateFar {
    pub far_id: u32,
    pub apply_action: ApplyAction,
    pub forwarding_parameters: Option<ForwardingParameters>,
    pub bar_id: Option<u8>,
}

// Update FAR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateFar {
    pub far_id: u32,
    pub apply_action: Option<ApplyAction>,
    pub update_forwarding_parameters: Option<ForwardingParameters>,
    pub bar_id: Option<u8>,
}

// Create QER.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateQer {
    pub qer_id: u32,
    pub correlation_id: Option<u32>,
    pub gate_status: Option<GateStatus>,
    pub mbr: Option<Bitrate>,
    pub gbr: Option<Bitrate>,
    pub qfi: Option<u8>,
    pub rqi: Option<bool>,
    pub paging_policy_indicator: Option<u8>,
}

// Update QER.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateQer {
    pub qer_id: u32,
    pub correlation_id: Option<u32>,
    pub gate_status: Option<GateStatus>,
    pub mbr: Option<Bitrate>,
    pub gbr: Option<Bitrate>,
    pub qfi: Option<u8>,
    pub rqi: Option<bool>,
    pub paging_policy_indicator: Option<u8>,
}

// Create URR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateUrr {
    pub urr_id: u32,
    pub measurement_method: MeasurementMethod,
    pub reporting_triggers: ReportingTriggers,
    pub measurement_period: Option<u32>,
    pub volume_threshold: Option<Volume>,
    pub volume_quota: Option<Volume>,
    pub time_threshold: Option<u32>,
    pub time_quota: Option<u32>,
    pub quota_validity_time: Option<u32>,
    pub measurement_information: Option<MeasurementInformation>,
}

// Update URR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateUrr {
    pub urr_id: u32,
    pub measurement_method: Option<MeasurementMethod>,
    pub reporting_triggers: Option<ReportingTriggers>,
    pub measurement_period: Option<u32>,
    pub volume_threshold: Option<Volume>,
    pub volume_quota: Option<Volume>,
    pub time_threshold: Option<u32>,
    pub time_quota: Option<u32>,
    pub quota_validity_time: Option<u32>,
    pub measurement_information: Option<MeasurementInformation>,
}

// Create BAR.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CreateBar {
    pub bar_id: u8,
    pub ddn_delay: Option<u8>,
    pub suggested_buffering_packets: Option<u8>,
}

// Update BAR.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UpdateBar {
    pub bar_id: u8,
    pub ddn_delay: Option<u8>,
    pub suggested_buffering_packets: Option<u8>,
}

// Query URR.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryUrr {
    pub urr_id: u32,
}

// ===== impl ApplyAction =====

impl IeKind for ApplyAction {
    const IE_TYPE: IeType = IeType::ApplyAction;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits());
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        Ok(ApplyAction::from_bits_truncate(value))
    }
}

// ===== impl MeasurementMethod =====

impl IeKind for MeasurementMethod {
    const IE_TYPE: IeType = IeType::MeasurementMethod;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits());
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        Ok(MeasurementMethod::from_bits_truncate(value))
    }
}

// ===== impl ReportingTriggers =====

impl IeKind for ReportingTriggers {
    const IE_TYPE: IeType = IeType::ReportingTriggers;

    fn encode_value(&self, buf: &mut BytesMut) {
        let bits = self.bits();
        buf.put_u8(bits as u8);
        buf.put_u8((bits >> 8) as u8);
        buf.put_u8((bits >> 16) as u8);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        // The third octet was added in a later protocol release.
        let mut bits = buf.try_get_u8()? as u32;
        bits |= (buf.try_get_u8()? as u32) << 8;
        if buf.has_remaining() {
            bits |= (buf.try_get_u8()? as u32) << 16;
        }
        Ok(ReportingTriggers::from_bits_truncate(bits))
    }
}

// ===== impl MeasurementInformation =====

impl IeKind for MeasurementInformation {
    const IE_TYPE: IeType = IeType::MeasurementInformation;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.bits());
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        Ok(MeasurementInformation::from_bits_truncate(value))
    }
}

// ===== impl SourceInterface =====

impl IeKind for SourceInterface {
    const IE_TYPE: IeType = IeType::SourceInterface;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()? & 0x0F;
        SourceInterface::from_u8(value)
            .ok_or(DecodeError::InvalidIeValue(IeType::SourceInterface as u16))
    }
}

// ===== impl DestinationInterface =====

impl IeKind for DestinationInterface {
    const IE_TYPE: IeType = IeType::DestinationInterface;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()? & 0x0F;
        DestinationInterface::from_u8(value).ok_or(
            DecodeError::InvalidIeValue(IeType::DestinationInterface as u16),
        )
    }
}

// ===== impl GateStatus =====

impl IeKind for GateStatus {
    const IE_TYPE: IeType = IeType::GateStatus;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(((self.uplink as u8) << 2) | self.downlink as u8);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let value = buf.try_get_u8()?;
        let uplink = GateState::from_u8((value >> 2) & 0x03)
            .ok_or(DecodeError::InvalidIeValue(IeType::GateStatus as u16))?;
        let downlink = GateState::from_u8(value & 0x03)
            .ok_or(DecodeError::InvalidIeValue(IeType::GateStatus as u16))?;
        Ok(GateStatus { uplink, downlink })
    }
}

// ===== impl Bitrate =====

impl Bitrate {
    fn encode(&self, ie_type: IeType, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(ie_type, buf);
        buf.put_u40(self.uplink);
        buf.put_u40(self.downlink);
        ie_encode_end(start_pos, buf);
    }

    fn decode(mut buf: Bytes) -> DecodeResult<Self> {
        let uplink = buf.try_get_u40()?;
        let downlink = buf.try_get_u40()?;
        Ok(Bitrate { uplink, downlink })
    }
}

// ===== impl Fteid =====

impl Fteid {
    const FLAG_V4: u8 = 0x01;
    const FLAG_V6: u8 = 0x02;
}

impl IeKind for Fteid {
    const IE_TYPE: IeType = IeType::Fteid;

    fn encode_value(&self, buf: &mut BytesMut) {
        let mut flags = 0;
        if self.ipv4.is_some() {
            flags |= Self::FLAG_V4;
        }
        if self.ipv6.is_some() {
            flags |= Self::FLAG_V6;
        }
        buf.put_u8(flags);
        buf.put_u32(self.teid);
        if let Some(addr) = &self.ipv4 {
            buf.put_ipv4(addr);
        }
        if let Some(addr) = &self.ipv6 {
            buf.put_ipv6(addr);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let teid = buf.try_get_u32()?;
        let mut fteid = Fteid {
            teid,
            ipv4: None,
            ipv6: None,
        };
        if flags & Self::FLAG_V4 != 0 {
            fteid.ipv4 = Some(buf.try_get_ipv4()?);
        }
        if flags & Self::FLAG_V6 != 0 {
            fteid.ipv6 = Some(buf.try_get_ipv6()?);
        }
        Ok(fteid)
    }
}

// ===== impl UeIpAddress =====

impl UeIpAddress {
    const FLAG_V6: u8 = 0x01;
    const FLAG_V4: u8 = 0x02;
    const FLAG_SD: u8 = 0x04;
}

impl IeKind for UeIpAddress {
    const IE_TYPE: IeType = IeType::UeIpAddress;

    fn encode_value(&self, buf: &mut BytesMut) {
        let mut flags = 0;
        if self.ipv6.is_some() {
            flags |= Self::FLAG_V6;
        }
        if self.ipv4.is_some() {
            flags |= Self::FLAG_V4;
        }
        if self.source_or_destination {
            flags |= Self::FLAG_SD;
        }
        buf.put_u8(flags);
        if let Some(addr) = &self.ipv4 {
            buf.put_ipv4(addr);
        }
        if let Some(addr) = &self.ipv6 {
            buf.put_ipv6(addr);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let mut addr = UeIpAddress {
            source_or_destination: flags & Self::FLAG_SD != 0,
            ..Default::default()
        };
        if flags & Self::FLAG_V4 != 0 {
            addr.ipv4 = Some(buf.try_get_ipv4()?);
        }
        if flags & Self::FLAG_V6 != 0 {
            addr.ipv6 = Some(buf.try_get_ipv6()?);
        }
        Ok(addr)
    }
}

// ===== impl SdfFilter =====

impl SdfFilter {
    const FLAG_FD: u8 = 0x01;
    const FLAG_TTC: u8 = 0x02;
    const FLAG_SPI: u8 = 0x04;
    const FLAG_FL: u8 = 0x08;
    const FLAG_BID: u8 = 0x10;
}

impl IeKind for SdfFilter {
    const IE_TYPE: IeType = IeType::SdfFilter;

    fn encode_value(&self, buf: &mut BytesMut) {
        let mut flags = 0;
        if self.flow_description.is_some() {
            flags |= Self::FLAG_FD;
        }
        if self.tos_traffic_class.is_some() {
            flags |= Self::FLAG_TTC;
        }
        if self.security_parameter_index.is_some() {
            flags |= Self::FLAG_SPI;
        }
        if self.flow_label.is_some() {
            flags |= Self::FLAG_FL;
        }
        if self.filter_id.is_some() {
            flags |= Self::FLAG_BID;
        }
        buf.put_u8(flags);
        // Spare octet.
        buf.put_u8(0);
        if let Some(fd) = &self.flow_description {
            buf.put_u16(fd.len() as u16);
            buf.put_slice(fd.as_bytes());
        }
        if let Some(ttc) = self.tos_traffic_class {
            buf.put_u16(ttc);
        }
        if let Some(spi) = self.security_parameter_index {
            buf.put_u32(spi);
        }
        if let Some(fl) = self.flow_label {
            buf.put_u24(fl);
        }
        if let Some(bid) = self.filter_id {
            buf.put_u32(bid);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let _spare = buf.try_get_u8()?;
        let mut filter = SdfFilter::default();
        if flags & Self::FLAG_FD != 0 {
            let fd_len = buf.try_get_u16()? as usize;
            if fd_len > buf.remaining() {
                return Err(DecodeError::InvalidIeValue(
                    IeType::SdfFilter as u16,
                ));
            }
            let fd = buf.split_to(fd_len);
            filter.flow_description =
                Some(String::from_utf8(fd.to_vec()).map_err(|_| {
                    DecodeError::InvalidIeValue(IeType::SdfFilter as u16)
                })?);
        }
        if flags & Self::FLAG_TTC != 0 {
            filter.tos_traffic_class = Some(buf.try_get_u16()?);
        }
        if flags & Self::FLAG_SPI != 0 {
            filter.security_parameter_index = Some(buf.try_get_u32()?);
        }
        if flags & Self::FLAG_FL != 0 {
            filter.flow_label = Some(buf.try_get_u24()?);
        }
        if flags & Self::FLAG_BID != 0 {
            filter.filter_id = Some(buf.try_get_u32()?);
        }
        Ok(filter)
    }
}

// ===== impl OuterHeaderCreation =====

impl OuterHeaderCreation {
    pub const DESC_GTPU_UDP_IPV4: u16 = 0x0100;
    pub const DESC_GTPU_UDP_IPV6: u16 = 0x0200;
    pub const DESC_UDP_IPV4: u16 = 0x0400;
    pub const DESC_UDP_IPV6: u16 = 0x0800;
    pub const DESC_IPV4: u16 = 0x1000;
    pub const DESC_IPV6: u16 = 0x2000;

    pub fn has_teid(&self) -> bool {
        self.description
            & (Self::DESC_GTPU_UDP_IPV4 | Self::DESC_GTPU_UDP_IPV6)
            != 0
    }

    fn has_ipv4(&self) -> bool {
        self.description
            & (Self::DESC_GTPU_UDP_IPV4 | Self::DESC_UDP_IPV4 | Self::DESC_IPV4)
            != 0
    }

    fn has_ipv6(&self) -> bool {
        self.description
            & (Self::DESC_GTPU_UDP_IPV6 | Self::DESC_UDP_IPV6 | Self::DESC_IPV6)
            != 0
    }

    fn has_port(&self) -> bool {
        self.description & (Self::DESC_UDP_IPV4 | Self::DESC_UDP_IPV6) != 0
    }
}

impl IeKind for OuterHeaderCreation {
    const IE_TYPE: IeType = IeType::OuterHeaderCreation;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u16(self.description);
        if let Some(teid) = self.teid {
            buf.put_u32(teid);
        }
        if let Some(addr) = &self.ipv4 {
            buf.put_ipv4(addr);
        }
        if let Some(addr) = &self.ipv6 {
            buf.put_ipv6(addr);
        }
        if let Some(port) = self.port {
            buf.put_u16(port);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let description = buf.try_get_u16()?;
        let mut ohc = OuterHeaderCreation {
            description,
            teid: None,
            ipv4: None,
            ipv6: None,
            port: None,
        };
        if ohc.has_teid() {
            ohc.teid = Some(buf.try_get_u32()?);
        }
        if ohc.has_ipv4() {
            ohc.ipv4 = Some(buf.try_get_ipv4()?);
        }
        if ohc.has_ipv6() {
            ohc.ipv6 = Some(buf.try_get_ipv6()?);
        }
        if ohc.has_port() {
            ohc.port = Some(buf.try_get_u16()?);
        }
        Ok(ohc)
    }
}

// ===== impl Volume =====

impl Volume {
    const FLAG_TOVOL: u8 = 0x01;
    const FLAG_ULVOL: u8 = 0x02;
    const FLAG_DLVOL: u8 = 0x04;

    fn encode(&self, ie_type: IeType, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(ie_type, buf);
        let mut flags = 0;
        if self.total.is_some() {
            flags |= Self::FLAG_TOVOL;
        }
        if self.uplink.is_some() {
            flags |= Self::FLAG_ULVOL;
        }
        if self.downlink.is_some() {
            flags |= Self::FLAG_DLVOL;
        }
        buf.put_u8(flags);
        if let Some(total) = self.total {
            buf.put_u64(total);
        }
        if let Some(uplink) = self.uplink {
            buf.put_u64(uplink);
        }
        if let Some(downlink) = self.downlink {
            buf.put_u64(downlink);
        }
        ie_encode_end(start_pos, buf);
    }

    fn decode(mut buf: Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let mut volume = Volume::default();
        if flags & Self::FLAG_TOVOL != 0 {
            volume.total = Some(buf.try_get_u64()?);
        }
        if flags & Self::FLAG_ULVOL != 0 {
            volume.uplink = Some(buf.try_get_u64()?);
        }
        if flags & Self::FLAG_DLVOL != 0 {
            volume.downlink = Some(buf.try_get_u64()?);
        }
        Ok(volume)
    }
}

// ===== impl Pdi =====

impl IeKind for Pdi {
    const IE_TYPE: IeType = IeType::Pdi;

    fn encode_value(&self, buf: &mut BytesMut) {
        self.source_interface.encode(buf);
        if let Some(f_teid) = &self.f_teid {
            f_teid.encode(buf);
        }
        if let Some(instance) = &self.network_instance {
            encode_string_ie(IeType::NetworkInstance, instance, buf);
        }
        if let Some(addr) = &self.ue_ip_address {
            addr.encode(buf);
        }
        if let Some(filter) = &self.sdf_filter {
            filter.encode(buf);
        }
        if let Some(app_id) = &self.application_id {
            encode_string_ie(IeType::ApplicationId, app_id, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut source_interface = None;
        let mut pdi = Pdi {
            source_interface: SourceInterface::Access,
            f_teid: None,
            network_instance: None,
            ue_ip_address: None,
            sdf_filter: None,
            application_id: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::SourceInterface) => {
                    source_interface =
                        Some(SourceInterface::decode_value(&mut value)?);
                }
                Some(IeType::Fteid) => {
                    pdi.f_teid = Some(Fteid::decode_value(&mut value)?);
                }
                Some(IeType::NetworkInstance) => {
                    pdi.network_instance = Some(decode_string_ie(
                        IeType::NetworkInstance,
                        value,
                    )?);
                }
                Some(IeType::UeIpAddress) => {
                    pdi.ue_ip_address =
                        Some(UeIpAddress::decode_value(&mut value)?);
                }
                Some(IeType::SdfFilter) => {
                    pdi.sdf_filter = Some(SdfFilter::decode_value(&mut value)?);
                }
                Some(IeType::ApplicationId) => {
                    pdi.application_id =
                        Some(decode_string_ie(IeType::ApplicationId, value)?);
                }
                _ => (),
            }
        }
        pdi.source_interface = source_interface
            .ok_or(DecodeError::MissingIe(IeType::SourceInterface as u16))?;
        Ok(pdi)
    }
}

// ===== impl ForwardingParameters =====

impl ForwardingParameters {
    fn encode_as(&self, ie_type: IeType, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(ie_type, buf);
        self.encode_value(buf);
        ie_encode_end(start_pos, buf);
    }

    fn decode(mut buf: Bytes) -> DecodeResult<Self> {
        let mut params = ForwardingParameters::default();
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::DestinationInterface) => {
                    params.destination_interface =
                        Some(DestinationInterface::decode_value(&mut value)?);
                }
                Some(IeType::NetworkInstance) => {
                    params.network_instance = Some(decode_string_ie(
                        IeType::NetworkInstance,
                        value,
                    )?);
                }
                Some(IeType::OuterHeaderCreation) => {
                    params.outer_header_creation =
                        Some(OuterHeaderCreation::decode_value(&mut value)?);
                }
                Some(IeType::ForwardingPolicy) => {
                    params.forwarding_policy =
                        Some(decode_forwarding_policy(value)?);
                }
                _ => (),
            }
        }
        Ok(params)
    }
}

impl IeKind for ForwardingParameters {
    const IE_TYPE: IeType = IeType::ForwardingParameters;

    fn encode_value(&self, buf: &mut BytesMut) {
        if let Some(interface) = &self.destination_interface {
            interface.encode(buf);
        }
        if let Some(instance) = &self.network_instance {
            encode_string_ie(IeType::NetworkInstance, instance, buf);
        }
        if let Some(ohc) = &self.outer_header_creation {
            ohc.encode(buf);
        }
        if let Some(policy) = &self.forwarding_policy {
            encode_forwarding_policy(policy, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        ForwardingParameters::decode(buf.split_to(buf.remaining()))
    }
}

// ===== impl CreatePdr =====

impl IeKind for CreatePdr {
    const IE_TYPE: IeType = IeType::CreatePdr;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u16_ie(IeType::PdrId, self.pdr_id, buf);
        if let Some(precedence) = self.precedence {
            encode_u32_ie(IeType::Precedence, precedence, buf);
        }
        if let Some(pdi) = &self.pdi {
            pdi.encode(buf);
        }
        if let Some(ohr) = self.outer_header_removal {
            encode_u8_ie(IeType::OuterHeaderRemoval, ohr, buf);
        }
        if let Some(far_id) = self.far_id {
            encode_u32_ie(IeType::FarId, far_id, buf);
        }
        for qer_id in &self.qer_ids {
            encode_u32_ie(IeType::QerId, *qer_id, buf);
        }
        for urr_id in &self.urr_ids {
            encode_u32_ie(IeType::UrrId, *urr_id, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut pdr_id = None;
        let mut pdr = CreatePdr {
            pdr_id: 0,
            precedence: None,
            pdi: None,
            outer_header_removal: None,
            far_id: None,
            qer_ids: Vec::new(),
            urr_ids: Vec::new(),
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::PdrId) => {
                    pdr_id = Some(decode_u16_ie(value)?);
                }
                Some(IeType::Precedence) => {
                    pdr.precedence = Some(decode_u32_ie(value)?);
                }
                Some(IeType::Pdi) => {
                    pdr.pdi = Some(Pdi::decode_value(&mut value)?);
                }
                Some(IeType::OuterHeaderRemoval) => {
                    pdr.outer_header_removal = Some(decode_u8_ie(value)?);
                }
                Some(IeType::FarId) => {
                    pdr.far_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::QerId) => {
                    pdr.qer_ids.push(decode_u32_ie(value)?);
                }
                Some(IeType::UrrId) => {
                    pdr.urr_ids.push(decode_u32_ie(value)?);
                }
                _ => (),
            }
        }
        pdr.pdr_id =
            pdr_id.ok_or(DecodeError::MissingIe(IeType::PdrId as u16))?;
        Ok(pdr)
    }
}

// ===== impl UpdatePdr =====

impl IeKind for UpdatePdr {
    const IE_TYPE: IeType = IeType::UpdatePdr;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u16_ie(IeType::PdrId, self.pdr_id, buf);
        if let Some(precedence) = self.precedence {
            encode_u32_ie(IeType::Precedence, precedence, buf);
        }
        if let Some(pdi) = &self.pdi {
            pdi.encode(buf);
        }
        if let Some(ohr) = self.outer_header_removal {
            encode_u8_ie(IeType::OuterHeaderRemoval, ohr, buf);
        }
        if let Some(far_id) = self.far_id {
            encode_u32_ie(IeType::FarId, far_id, buf);
        }
        for qer_id in &self.qer_ids {
            encode_u32_ie(IeType::QerId, *qer_id, buf);
        }
        for urr_id in &self.urr_ids {
            encode_u32_ie(IeType::UrrId, *urr_id, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let pdr = CreatePdr::decode_value(buf)?;
        Ok(UpdatePdr {
            pdr_id: pdr.pdr_id,
            precedence: pdr.precedence,
            pdi: pdr.pdi,
            outer_header_removal: pdr.outer_header_removal,
            far_id: pdr.far_id,
            qer_ids: pdr.qer_ids,
            urr_ids: pdr.urr_ids,
        })
    }
}

// ===== impl CreateFar =====

impl IeKind for CreateFar {
    const IE_TYPE: IeType = IeType::CreateFar;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u32_ie(IeType::FarId, self.far_id, buf);
        self.apply_action.encode(buf);
        if let Some(params) = &self.forwarding_parameters {
            params.encode_as(IeType::ForwardingParameters, buf);
        }
        if let Some(bar_id) = self.bar_id {
            encode_u8_ie(IeType::BarId, bar_id, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut far_id = None;
        let mut apply_action = None;
        let mut far = CreateFar {
            far_id: 0,
            apply_action: ApplyAction::empty(),
            forwarding_parameters: None,
            bar_id: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::FarId) => {
                    far_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::ApplyAction) => {
                    apply_action =
                        Some(ApplyAction::decode_value(&mut value)?);
                }
                Some(IeType::ForwardingParameters) => {
                    far.forwarding_parameters =
                        Some(ForwardingParameters::decode(value)?);
                }
                Some(IeType::BarId) => {
                    far.bar_id = Some(decode_u8_ie(value)?);
                }
                _ => (),
            }
        }
        far.far_id =
            far_id.ok_or(DecodeError::MissingIe(IeType::FarId as u16))?;
        far.apply_action = apply_action
            .ok_or(DecodeError::MissingIe(IeType::ApplyAction as u16))?;
        Ok(far)
    }
}

// ===== impl UpdateFar =====

impl IeKind for UpdateFar {
    const IE_TYPE: IeType = IeType::UpdateFar;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u32_ie(IeType::FarId, self.far_id, buf);
        if let Some(apply_action) = &self.apply_action {
            apply_action.encode(buf);
        }
        if let Some(params) = &self.update_forwarding_parameters {
            params.encode_as(IeType::UpdateForwardingParameters, buf);
        }
        if let Some(bar_id) = self.bar_id {
            encode_u8_ie(IeType::BarId, bar_id, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut far_id = None;
        let mut far = UpdateFar {
            far_id: 0,
            apply_action: None,
            update_forwarding_parameters: None,
            bar_id: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::FarId) => {
                    far_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::ApplyAction) => {
                    far.apply_action =
                        Some(ApplyAction::decode_value(&mut value)?);
                }
                Some(IeType::UpdateForwardingParameters) => {
                    far.update_forwarding_parameters =
                        Some(ForwardingParameters::decode(value)?);
                }
                Some(IeType::BarId) => {
                    far.bar_id = Some(decode_u8_ie(value)?);
                }
                _ => (),
            }
        }
        far.far_id =
            far_id.ok_or(DecodeError::MissingIe(IeType::FarId as u16))?;
        Ok(far)
    }
}

// ===== impl CreateQer =====

impl CreateQer {
    fn encode_members(
        qer: &CreateQer,
        buf: &mut BytesMut,
    ) {
        encode_u32_ie(IeType::QerId, qer.qer_id, buf);
        if let Some(correlation_id) = qer.correlation_id {
            encode_u32_ie(IeType::QerCorrelationId, correlation_id, buf);
        }
        if let Some(gate_status) = &qer.gate_status {
            gate_status.encode(buf);
        }
        if let Some(mbr) = &qer.mbr {
            mbr.encode(IeType::Mbr, buf);
        }
        if let Some(gbr) = &qer.gbr {
            gbr.encode(IeType::Gbr, buf);
        }
        if let Some(qfi) = qer.qfi {
            encode_u8_ie(IeType::Qfi, qfi & 0x3F, buf);
        }
        if let Some(rqi) = qer.rqi {
            encode_u8_ie(IeType::Rqi, rqi as u8, buf);
        }
        if let Some(ppi) = qer.paging_policy_indicator {
            encode_u8_ie(IeType::PagingPolicyIndicator, ppi & 0x07, buf);
        }
    }

    fn decode_members(buf: &mut Bytes) -> DecodeResult<CreateQer> {
        let mut qer_id = None;
        let mut qer = CreateQer {
            qer_id: 0,
            correlation_id: None,
            gate_status: None,
            mbr: None,
            gbr: None,
            qfi: None,
            rqi: None,
            paging_policy_indicator: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::QerId) => {
                    qer_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::QerCorrelationId) => {
                    qer.correlation_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::GateStatus) => {
                    qer.gate_status =
                        Some(GateStatus::decode_value(&mut value)?);
                }
                Some(IeType::Mbr) => {
                    qer.mbr = Some(Bitrate::decode(value)?);
                }
                Some(IeType::Gbr) => {
                    qer.gbr = Some(Bitrate::decode(value)?);
                }
                Some(IeType::Qfi) => {
                    qer.qfi = Some(decode_u8_ie(value)? & 0x3F);
                }
                Some(IeType::Rqi) => {
                    qer.rqi = Some(decode_u8_ie(value)? & 0x01 != 0);
                }
                Some(IeType::PagingPolicyIndicator) => {
                    qer.paging_policy_indicator =
                        Some(decode_u8_ie(value)? & 0x07);
                }
                _ => (),
            }
        }
        qer.qer_id =
            qer_id.ok_or(DecodeError::MissingIe(IeType::QerId as u16))?;
        Ok(qer)
    }
}

impl IeKind for CreateQer {
    const IE_TYPE: IeType = IeType::CreateQer;

    fn encode_value(&self, buf: &mut BytesMut) {
        CreateQer::encode_members(self, buf);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        CreateQer::decode_members(buf)
    }
}

// ===== impl UpdateQer =====

impl IeKind for UpdateQer {
    const IE_TYPE: IeType = IeType::UpdateQer;

    fn encode_value(&self, buf: &mut BytesMut) {
        let qer = CreateQer {
            qer_id: self.qer_id,
            correlation_id: self.correlation_id,
            gate_status: self.gate_status,
            mbr: self.mbr,
            gbr: self.gbr,
            qfi: self.qfi,
            rqi: self.rqi,
            paging_policy_indicator: self.paging_policy_indicator,
        };
        CreateQer::encode_members(&qer, buf);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let qer = CreateQer::decode_members(buf)?;
        Ok(UpdateQer {
            qer_id: qer.qer_id,
            correlation_id: qer.correlation_id,
            gate_status: qer.gate_status,
            mbr: qer.mbr,
            gbr: qer.gbr,
            qfi: qer.qfi,
            rqi: qer.rqi,
            paging_policy_indicator: qer.paging_policy_indicator,
        })
    }
}

// ===== impl CreateUrr =====

impl IeKind for CreateUrr {
    const IE_TYPE: IeType = IeType::CreateUrr;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u32_ie(IeType::UrrId, self.urr_id, buf);
        self.measurement_method.encode(buf);
        self.reporting_triggers.encode(buf);
        if let Some(period) = self.measurement_period {
            encode_u32_ie(IeType::MeasurementPeriod, period, buf);
        }
        if let Some(threshold) = &self.volume_threshold {
            threshold.encode(IeType::VolumeThreshold, buf);
        }
        if let Some(quota) = &self.volume_quota {
            quota.encode(IeType::VolumeQuota, buf);
        }
        if let Some(threshold) = self.time_threshold {
            encode_u32_ie(IeType::TimeThreshold, threshold, buf);
        }
        if let Some(quota) = self.time_quota {
            encode_u32_ie(IeType::TimeQuota, quota, buf);
        }
        if let Some(validity) = self.quota_validity_time {
            encode_u32_ie(IeType::QuotaValidityTime, validity, buf);
        }
        if let Some(info) = &self.measurement_information {
            info.encode(buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut urr_id = None;
        let mut method = None;
        let mut triggers = None;
        let mut urr = CreateUrr {
            urr_id: 0,
            measurement_method: MeasurementMethod::empty(),
            reporting_triggers: ReportingTriggers::empty(),
            measurement_period: None,
            volume_threshold: None,
            volume_quota: None,
            time_threshold: None,
            time_quota: None,
            quota_validity_time: None,
            measurement_information: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::UrrId) => {
                    urr_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::MeasurementMethod) => {
                    method =
                        Some(MeasurementMethod::decode_value(&mut value)?);
                }
                Some(IeType::ReportingTriggers) => {
                    triggers =
                        Some(ReportingTriggers::decode_value(&mut value)?);
                }
                Some(IeType::MeasurementPeriod) => {
                    urr.measurement_period = Some(decode_u32_ie(value)?);
                }
                Some(IeType::VolumeThreshold) => {
                    urr.volume_threshold = Some(Volume::decode(value)?);
                }
                Some(IeType::VolumeQuota) => {
                    urr.volume_quota = Some(Volume::decode(value)?);
                }
                Some(IeType::TimeThreshold) => {
                    urr.time_threshold = Some(decode_u32_ie(value)?);
                }
                Some(IeType::TimeQuota) => {
                    urr.time_quota = Some(decode_u32_ie(value)?);
                }
                Some(IeType::QuotaValidityTime) => {
                    urr.quota_validity_time = Some(decode_u32_ie(value)?);
                }
                Some(IeType::MeasurementInformation) => {
                    urr.measurement_information = Some(
                        MeasurementInformation::decode_value(&mut value)?,
                    );
                }
                _ => (),
            }
        }
        urr.urr_id =
            urr_id.ok_or(DecodeError::MissingIe(IeType::UrrId as u16))?;
        urr.measurement_method = method
            .ok_or(DecodeError::MissingIe(IeType::MeasurementMethod as u16))?;
        urr.reporting_triggers = triggers
            .ok_or(DecodeError::MissingIe(IeType::ReportingTriggers as u16))?;
        Ok(urr)
    }
}

// ===== impl UpdateUrr =====

impl IeKind for UpdateUrr {
    const IE_TYPE: IeType = IeType::UpdateUrr;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u32_ie(IeType::UrrId, self.urr_id, buf);
        if let Some(method) = &self.measurement_method {
            method.encode(buf);
        }
        if let Some(triggers) = &self.reporting_triggers {
            triggers.encode(buf);
        }
        if let Some(period) = self.measurement_period {
            encode_u32_ie(IeType::MeasurementPeriod, period, buf);
        }
        if let Some(threshold) = &self.volume_threshold {
            threshold.encode(IeType::VolumeThreshold, buf);
        }
        if let Some(quota) = &self.volume_quota {
            quota.encode(IeType::VolumeQuota, buf);
        }
        if let Some(threshold) = self.time_threshold {
            encode_u32_ie(IeType::TimeThreshold, threshold, buf);
        }
        if let Some(quota) = self.time_quota {
            encode_u32_ie(IeType::TimeQuota, quota, buf);
        }
        if let Some(validity) = self.quota_validity_time {
            encode_u32_ie(IeType::QuotaValidityTime, validity, buf);
        }
        if let Some(info) = &self.measurement_information {
            info.encode(buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut urr_id = None;
        let mut urr = UpdateUrr {
            urr_id: 0,
            measurement_method: None,
            reporting_triggers: None,
            measurement_period: None,
            volume_threshold: None,
            volume_quota: None,
            time_threshold: None,
            time_quota: None,
            quota_validity_time: None,
            measurement_information: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::UrrId) => {
                    urr_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::MeasurementMethod) => {
                    urr.measurement_method =
                        Some(MeasurementMethod::decode_value(&mut value)?);
                }
                Some(IeType::ReportingTriggers) => {
                    urr.reporting_triggers =
                        Some(ReportingTriggers::decode_value(&mut value)?);
                }
                Some(IeType::MeasurementPeriod) => {
                    urr.measurement_period = Some(decode_u32_ie(value)?);
                }
                Some(IeType::VolumeThreshold) => {
                    urr.volume_threshold = Some(Volume::decode(value)?);
                }
                Some(IeType::VolumeQuota) => {
                    urr.volume_quota = Some(Volume::decode(value)?);
                }
                Some(IeType::TimeThreshold) => {
                    urr.time_threshold = Some(decode_u32_ie(value)?);
                }
                Some(IeType::TimeQuota) => {
                    urr.time_quota = Some(decode_u32_ie(value)?);
                }
                Some(IeType::QuotaValidityTime) => {
                    urr.quota_validity_time = Some(decode_u32_ie(value)?);
                }
                Some(IeType::MeasurementInformation) => {
                    urr.measurement_information = Some(
                        MeasurementInformation::decode_value(&mut value)?,
                    );
                }
                _ => (),
            }
        }
        urr.urr_id =
            urr_id.ok_or(DecodeError::MissingIe(IeType::UrrId as u16))?;
        Ok(urr)
    }
}

// ===== impl CreateBar =====

impl IeKind for CreateBar {
    const IE_TYPE: IeType = IeType::CreateBar;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u8_ie(IeType::BarId, self.bar_id, buf);
        if let Some(delay) = self.ddn_delay {
            encode_u8_ie(IeType::DownlinkDataNotificationDelay, delay, buf);
        }
        if let Some(count) = self.suggested_buffering_packets {
            encode_u8_ie(IeType::SuggestedBufferingPacketsCount, count, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut bar_id = None;
        let mut bar = CreateBar {
            bar_id: 0,
            ddn_delay: None,
            suggested_buffering_packets: None,
        };
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::BarId) => {
                    bar_id = Some(decode_u8_ie(value)?);
                }
                Some(IeType::DownlinkDataNotificationDelay) => {
                    bar.ddn_delay = Some(decode_u8_ie(value)?);
                }
                Some(IeType::SuggestedBufferingPacketsCount) => {
                    bar.suggested_buffering_packets =
                        Some(decode_u8_ie(value)?);
                }
                _ => (),
            }
        }
        bar.bar_id =
            bar_id.ok_or(DecodeError::MissingIe(IeType::BarId as u16))?;
        Ok(bar)
    }
}

// ===== impl UpdateBar =====

impl IeKind for UpdateBar {
    const IE_TYPE: IeType = IeType::UpdateBar;

    fn encode_value(&self, buf: &mut BytesMut) {
        let bar = CreateBar {
            bar_id: self.bar_id,
            ddn_delay: self.ddn_delay,
            suggested_buffering_packets: self.suggested_buffering_packets,
        };
        bar.encode_value(buf);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let bar = CreateBar::decode_value(buf)?;
        Ok(UpdateBar {
            bar_id: bar.bar_id,
            ddn_delay: bar.ddn_delay,
            suggested_buffering_packets: bar.suggested_buffering_packets,
        })
    }
}

// ===== impl QueryUrr =====

impl IeKind for QueryUrr {
    const IE_TYPE: IeType = IeType::QueryUrr;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u32_ie(IeType::UrrId, self.urr_id, buf);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut urr_id = None;
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, value) = ie?;
            if let Some(IeType::UrrId) = IeType::decode(ie_type) {
                urr_id = Some(decode_u32_ie(value)?);
            }
        }
        let urr_id =
            urr_id.ok_or(DecodeError::MissingIe(IeType::UrrId as u16))?;
        Ok(QueryUrr { urr_id })
    }
}

// ===== global functions =====

// Decodes a grouped Remove rule IE down to the single rule ID it carries.
pub(crate) fn decode_remove_ie<T>(
    buf: Bytes,
    id_type: IeType,
    decode_id: fn(Bytes) -> DecodeResult<T>,
) -> DecodeResult<T> {
    for ie in IeIter::new(buf) {
        let (ie_type, value) = ie?;
        if IeType::decode(ie_type) == Some(id_type) {
            return decode_id(value);
        }
    }
    Err(DecodeError::MissingIe(id_type as u16))
}

// Encodes a grouped Remove rule IE from the rule ID.
pub(crate) fn encode_remove_pdr(pdr_id: u16, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::RemovePdr, buf);
    encode_u16_ie(IeType::PdrId, pdr_id, buf);
    ie_encode_end(start_pos, buf);
}

pub(crate) fn encode_remove_far(far_id: u32, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::RemoveFar, buf);
    encode_u32_ie(IeType::FarId, far_id, buf);
    ie_encode_end(start_pos, buf);
}

pub(crate) fn encode_remove_qer(qer_id: u32, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::RemoveQer, buf);
    encode_u32_ie(IeType::QerId, qer_id, buf);
    ie_encode_end(start_pos, buf);
}

pub(crate) fn encode_remove_urr(urr_id: u32, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::RemoveUrr, buf);
    encode_u32_ie(IeType::UrrId, urr_id, buf);
    ie_encode_end(start_pos, buf);
}

pub(crate) fn encode_remove_bar(bar_id: u8, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::RemoveBar, buf);
    encode_u8_ie(IeType::BarId, bar_id, buf);
    ie_encode_end(start_pos, buf);
}

// The Forwarding Policy IE carries a one-octet identifier length followed by
// the identifier itself.
fn encode_forwarding_policy(policy: &str, buf: &mut BytesMut) {
    let start_pos = ie_encode_start(IeType::ForwardingPolicy, buf);
    buf.put_u8(policy.len() as u8);
    buf.put_slice(policy.as_bytes());
    ie_encode_end(start_pos, buf);
}

fn decode_forwarding_policy(mut buf: Bytes) -> DecodeResult<String> {
    let len = buf.try_get_u8()? as usize;
    if len > buf.remaining() {
        return Err(DecodeError::InvalidIeValue(
            IeType::ForwardingPolicy as u16,
        ));
    }
    let identifier = buf.split_to(len);
    String::from_utf8(identifier.to_vec())
        .map_err(|_| DecodeError::InvalidIeValue(IeType::ForwardingPolicy as u16))
}
