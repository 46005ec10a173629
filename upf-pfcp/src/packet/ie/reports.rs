//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bitflags::bitflags;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::{
    IeIter, IeKind, IeType, decode_timestamp_ie, decode_u8_ie, decode_u16_ie,
    decode_u32_ie, encode_timestamp_ie, encode_u8_ie, encode_u16_ie,
    encode_u32_ie, ie_encode_end, ie_encode_start,
};

// Usage Report Trigger flags (three octets on the wire, low bit first within
// each octet).
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct UsageReportTrigger: u32 {
        const PERIO = 1 << 0;
        const VOLTH = 1 << 1;
        const TIMTH = 1 << 2;
        const QUHTI = 1 << 3;
        const START = 1 << 4;
        const STOPT = 1 << 5;
        const DROTH = 1 << 6;
        const IMMER = 1 << 7;
        const VOLQU = 1 << 8;
        const TIMQU = 1 << 9;
        const LIUSA = 1 << 10;
        const TERMR = 1 << 11;
        const MONIT = 1 << 12;
        const ENVCL = 1 << 13;
        const MACAR = 1 << 14;
        const EVETH = 1 << 15;
        const EVEQU = 1 << 16;
        const TEBUR = 1 << 17;
        const IPMJL = 1 << 18;
        const QUVTI = 1 << 19;
        const EMRRE = 1 << 20;
    }
}

// Volume Measurement flags.
bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct VolumeMeasurementFlags: u8 {
        const TOVOL = 1 << 0;
        const ULVOL = 1 << 1;
        const DLVOL = 1 << 2;
        const TONOP = 1 << 3;
        const ULNOP = 1 << 4;
        const DLNOP = 1 << 5;
    }
}

// Volume Measurement.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VolumeMeasurement {
    pub flags: VolumeMeasurementFlags,
    pub total_volume: u64,
    pub uplink_volume: u64,
    pub downlink_volume: u64,
    pub total_packets: u64,
    pub uplink_packets: u64,
    pub downlink_packets: u64,
}

// Usage Report, carried in Session Modification/Deletion responses and in
// Session Report requests under distinct grouped IE types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UsageReport {
    pub urr_id: u32,
    pub ur_seqn: u32,
    pub trigger: UsageReportTrigger,
    pub volume_measurement: Option<VolumeMeasurement>,
    pub duration_measurement: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub query_urr_reference: Option<u32>,
}

// Downlink Data Report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DownlinkDataReport {
    pub pdr_id: u16,
}

// QoS Monitoring Measurement.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QosMonitoringMeasurement {
    pub downlink_delay: Option<u32>,
    pub uplink_delay: Option<u32>,
    pub round_trip_delay: Option<u32>,
}

// QoS Monitoring Report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QosMonitoringReport {
    pub qfi: u8,
    pub measurement: QosMonitoringMeasurement,
    pub event_time_stamp: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
}

// Session Report, carried in Session Report requests for QoS monitoring.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionReport {
    pub srr_id: u8,
    pub qos_monitoring_report: Option<QosMonitoringReport>,
}

// ===== impl UsageReportTrigger =====

impl UsageReportTrigger {
    // Builds the trigger set from the flat bit assignment used on the
    // forwarder side channel.
    pub fn from_sidechan(bits: u64) -> UsageReportTrigger {
        UsageReportTrigger::from_bits_truncate(bits as u32)
    }

    fn encode(&self, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(IeType::UsageReportTrigger, buf);
        let bits = self.bits();
        buf.put_u8(bits as u8);
        buf.put_u8((bits >> 8) as u8);
        buf.put_u8((bits >> 16) as u8);
        ie_encode_end(start_pos, buf);
    }

    fn decode(mut buf: Bytes) -> DecodeResult<Self> {
        let mut bits = buf.try_get_u8()? as u32;
        bits |= (buf.try_get_u8()? as u32) << 8;
        if buf.has_remaining() {
            bits |= (buf.try_get_u8()? as u32) << 16;
        }
        Ok(UsageReportTrigger::from_bits_truncate(bits))
    }
}

// ===== impl VolumeMeasurement =====

impl IeKind for VolumeMeasurement {
    const IE_TYPE: IeType = IeType::VolumeMeasurement;

    fn encode_value(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags.bits());
        if self.flags.contains(VolumeMeasurementFlags::TOVOL) {
            buf.put_u64(self.total_volume);
        }
        if self.flags.contains(VolumeMeasurementFlags::ULVOL) {
            buf.put_u64(self.uplink_volume);
        }
        if self.flags.contains(VolumeMeasurementFlags::DLVOL) {
            buf.put_u64(self.downlink_volume);
        }
        if self.flags.contains(VolumeMeasurementFlags::TONOP) {
            buf.put_u64(self.total_packets);
        }
        if self.flags.contains(VolumeMeasurementFlags::ULNOP) {
            buf.put_u64(self.uplink_packets);
        }
        if self.flags.contains(VolumeMeasurementFlags::DLNOP) {
            buf.put_u64(self.downlink_packets);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags =
            VolumeMeasurementFlags::from_bits_truncate(buf.try_get_u8()?);
        let mut vm = VolumeMeasurement {
            flags,
            ..Default::default()
        };
        if flags.contains(VolumeMeasurementFlags::TOVOL) {
            vm.total_volume = buf.try_get_u64()?;
        }
        if flags.contains(VolumeMeasurementFlags::ULVOL) {
            vm.uplink_volume = buf.try_get_u64()?;
        }
        if flags.contains(VolumeMeasurementFlags::DLVOL) {
            vm.downlink_volume = buf.try_get_u64()?;
        }
        if flags.contains(VolumeMeasurementFlags::TONOP) {
            vm.total_packets = buf.try_get_u64()?;
        }
        if flags.contains(VolumeMeasurementFlags::ULNOP) {
            vm.uplink_packets = buf.try_get_u64()?;
        }
        if flags.contains(VolumeMeasurementFlags::DLNOP) {
            vm.downlink_packets = buf.try_get_u64()?;
        }
        Ok(vm)
    }
}

// ===== impl UsageReport =====

impl UsageReport {
    pub(crate) fn encode_as(&self, ie_type: IeType, buf: &mut BytesMut) {
        let start_pos = ie_encode_start(ie_type, buf);
        encode_u32_ie(IeType::UrrId, self.urr_id, buf);
        encode_u32_ie(IeType::UrSeqn, self.ur_seqn, buf);
        self.trigger.encode(buf);
        if let Some(vm) = &self.volume_measurement {
            vm.encode(buf);
        }
        if let Some(duration) = self.duration_measurement {
            encode_u32_ie(IeType::DurationMeasurement, duration, buf);
        }
        if let Some(start_time) = &self.start_time {
            encode_timestamp_ie(IeType::StartTime, start_time, buf);
        }
        if let Some(end_time) = &self.end_time {
            encode_timestamp_ie(IeType::EndTime, end_time, buf);
        }
        if let Some(query_ref) = self.query_urr_reference {
            encode_u32_ie(IeType::QueryUrrReference, query_ref, buf);
        }
        ie_encode_end(start_pos, buf);
    }

    pub(crate) fn decode(buf: Bytes) -> DecodeResult<Self> {
        let mut urr_id = None;
        let mut ur_seqn = None;
        let mut trigger = None;
        let mut report = UsageReport {
            urr_id: 0,
            ur_seqn: 0,
            trigger: UsageReportTrigger::empty(),
            volume_measurement: None,
            duration_measurement: None,
            start_time: None,
            end_time: None,
            query_urr_reference: None,
        };
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::UrrId) => {
                    urr_id = Some(decode_u32_ie(value)?);
                }
                Some(IeType::UrSeqn) => {
                    ur_seqn = Some(decode_u32_ie(value)?);
                }
                Some(IeType::UsageReportTrigger) => {
                    trigger = Some(UsageReportTrigger::decode(value)?);
                }
                Some(IeType::VolumeMeasurement) => {
                    report.volume_measurement =
                        Some(VolumeMeasurement::decode_value(&mut value)?);
                }
                Some(IeType::DurationMeasurement) => {
                    report.duration_measurement = Some(decode_u32_ie(value)?);
                }
                Some(IeType::StartTime) => {
                    report.start_time =
                        Some(decode_timestamp_ie(IeType::StartTime, value)?);
                }
                Some(IeType::EndTime) => {
                    report.end_time =
                        Some(decode_timestamp_ie(IeType::EndTime, value)?);
                }
                Some(IeType::QueryUrrReference) => {
                    report.query_urr_reference = Some(decode_u32_ie(value)?);
                }
                _ => (),
            }
        }
        report.urr_id =
            urr_id.ok_or(DecodeError::MissingIe(IeType::UrrId as u16))?;
        report.ur_seqn =
            ur_seqn.ok_or(DecodeError::MissingIe(IeType::UrSeqn as u16))?;
        report.trigger = trigger.ok_or(DecodeError::MissingIe(
            IeType::UsageReportTrigger as u16,
        ))?;
        Ok(report)
    }
}

// ===== impl DownlinkDataReport =====

impl IeKind for DownlinkDataReport {
    const IE_TYPE: IeType = IeType::DownlinkDataReport;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u16_ie(IeType::PdrId, self.pdr_id, buf);
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut pdr_id = None;
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, value) = ie?;
            if let Some(IeType::PdrId) = IeType::decode(ie_type) {
                pdr_id = Some(decode_u16_ie(value)?);
            }
        }
        let pdr_id =
            pdr_id.ok_or(DecodeError::MissingIe(IeType::PdrId as u16))?;
        Ok(DownlinkDataReport { pdr_id })
    }
}

// ===== impl QosMonitoringMeasurement =====

impl QosMonitoringMeasurement {
    const FLAG_DL: u8 = 0x01;
    const FLAG_UL: u8 = 0x02;
    const FLAG_RP: u8 = 0x04;
}

impl IeKind for QosMonitoringMeasurement {
    const IE_TYPE: IeType = IeType::QosMonitoringMeasurement;

    fn encode_value(&self, buf: &mut BytesMut) {
        let mut flags = 0;
        if self.downlink_delay.is_some() {
            flags |= Self::FLAG_DL;
        }
        if self.uplink_delay.is_some() {
            flags |= Self::FLAG_UL;
        }
        if self.round_trip_delay.is_some() {
            flags |= Self::FLAG_RP;
        }
        buf.put_u8(flags);
        if let Some(delay) = self.downlink_delay {
            buf.put_u32(delay);
        }
        if let Some(delay) = self.uplink_delay {
            buf.put_u32(delay);
        }
        if let Some(delay) = self.round_trip_delay {
            buf.put_u32(delay);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let flags = buf.try_get_u8()?;
        let mut measurement = QosMonitoringMeasurement::default();
        if flags & Self::FLAG_DL != 0 {
            measurement.downlink_delay = Some(buf.try_get_u32()?);
        }
        if flags & Self::FLAG_UL != 0 {
            measurement.uplink_delay = Some(buf.try_get_u32()?);
        }
        if flags & Self::FLAG_RP != 0 {
            measurement.round_trip_delay = Some(buf.try_get_u32()?);
        }
        Ok(measurement)
    }
}

// ===== impl QosMonitoringReport =====

impl IeKind for QosMonitoringReport {
    const IE_TYPE: IeType = IeType::QosMonitoringReport;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u8_ie(IeType::Qfi, self.qfi & 0x3F, buf);
        self.measurement.encode(buf);
        encode_timestamp_ie(IeType::EventTimeStamp, &self.event_time_stamp, buf);
        if let Some(start_time) = &self.start_time {
            encode_timestamp_ie(IeType::StartTime, start_time, buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut qfi = None;
        let mut measurement = None;
        let mut event_time_stamp = None;
        let mut start_time = None;
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::Qfi) => {
                    qfi = Some(decode_u8_ie(value)? & 0x3F);
                }
                Some(IeType::QosMonitoringMeasurement) => {
                    measurement = Some(
                        QosMonitoringMeasurement::decode_value(&mut value)?,
                    );
                }
                Some(IeType::EventTimeStamp) => {
                    event_time_stamp = Some(decode_timestamp_ie(
                        IeType::EventTimeStamp,
                        value,
                    )?);
                }
                Some(IeType::StartTime) => {
                    start_time =
                        Some(decode_timestamp_ie(IeType::StartTime, value)?);
                }
                _ => (),
            }
        }
        Ok(QosMonitoringReport {
            qfi: qfi.ok_or(DecodeError::MissingIe(IeType::Qfi as u16))?,
            measurement: measurement.ok_or(DecodeError::MissingIe(
                IeType::QosMonitoringMeasurement as u16,
            ))?,
            event_time_stamp: event_time_stamp.ok_or(
                DecodeError::MissingIe(IeType::EventTimeStamp as u16),
            )?,
            start_time,
        })
    }
}

// ===== impl SessionReport =====

impl IeKind for SessionReport {
    const IE_TYPE: IeType = IeType::SessionReport;

    fn encode_value(&self, buf: &mut BytesMut) {
        encode_u8_ie(IeType::SrrId, self.srr_id, buf);
        if let Some(report) = &self.qos_monitoring_report {
            report.encode(buf);
        }
    }

    fn decode_value(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut srr_id = None;
        let mut qos_monitoring_report = None;
        for ie in IeIter::new(buf.split_to(buf.remaining())) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::SrrId) => {
                    srr_id = Some(decode_u8_ie(value)?);
                }
                Some(IeType::QosMonitoringReport) => {
                    qos_monitoring_report =
                        Some(QosMonitoringReport::decode_value(&mut value)?);
                }
                _ => (),
            }
        }
        Ok(SessionReport {
            srr_id: srr_id
                .ok_or(DecodeError::MissingIe(IeType::SrrId as u16))?,
            qos_monitoring_report,
        })
    }
}
