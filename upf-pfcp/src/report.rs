//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::Bytes;
use chrono::{DateTime, Utc};
use enum_as_inner::EnumAsInner;

use crate::packet::ie::reports::{
    UsageReport, UsageReportTrigger, VolumeMeasurement,
    VolumeMeasurementFlags,
};
use crate::packet::ie::rules::{
    ApplyAction, MeasurementInformation, MeasurementMethod,
};
use crate::session::Session;

// A report pushed upward by the forwarder, attached to a session.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
pub enum Report {
    Dldr(DldReport),
    Usar(UsaReport),
    Sesr(SesReport),
}

// Downlink Data Report: the first buffered packet of a PDR arrived.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DldReport {
    pub pdr_id: u16,
    pub apply_action: ApplyAction,
    pub buffered_packet: Option<Bytes>,
}

// Usage report record, as measured by the forwarder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UsaReport {
    pub urr_id: u32,
    pub ur_seqn: u32,
    pub trigger: UsageReportTrigger,
    pub volume: VolumeMeasurement,
    pub query_urr_reference: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// QoS monitoring report record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SesReport {
    pub qfi: u8,
    pub packet_delay: u32,
    pub event_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
}

// ===== impl Report =====

impl Report {
    pub fn report_type(&self) -> &'static str {
        match self {
            Report::Dldr(_) => "DLDR",
            Report::Usar(_) => "USAR",
            Report::Sesr(_) => "SESR",
        }
    }
}

// ===== impl UsaReport =====

impl UsaReport {
    // Builds the wire Usage Report IE for this record, consuming one sequence
    // number from the session's per-URR counter.
    //
    // The volume and time details included depend on the URR's measurement
    // method and measurement information, which the session holds
    // authoritatively.
    pub(crate) fn into_ie(self, sess: &mut Session) -> UsageReport {
        let ur_seqn = sess.next_ur_seqn(self.urr_id);

        let mut volume_measurement = None;
        let mut duration_measurement = None;
        if let Some(urr) = sess.urrs.get(&self.urr_id) {
            if urr.measurement_method.contains(MeasurementMethod::VOLUM) {
                let mut flags = VolumeMeasurementFlags::TOVOL
                    | VolumeMeasurementFlags::ULVOL
                    | VolumeMeasurementFlags::DLVOL;
                let mnop = urr
                    .measurement_information
                    .is_some_and(|info| {
                        info.contains(MeasurementInformation::MNOP)
                    });
                if mnop {
                    flags |= VolumeMeasurementFlags::TONOP
                        | VolumeMeasurementFlags::ULNOP
                        | VolumeMeasurementFlags::DLNOP;
                }
                volume_measurement = Some(VolumeMeasurement {
                    flags,
                    ..self.volume
                });
            }
            if urr.measurement_method.contains(MeasurementMethod::DURAT) {
                let duration = match (self.start_time, self.end_time) {
                    (Some(start), Some(end)) => {
                        (end - start).num_seconds().max(0) as u32
                    }
                    _ => 0,
                };
                duration_measurement = Some(duration);
            }
        }

        // Start/End Time are not reported for traffic-detection and
        // MAC-address triggers.
        let mut start_time = self.start_time;
        let mut end_time = self.end_time;
        if self.trigger.intersects(
            UsageReportTrigger::START
                | UsageReportTrigger::STOPT
                | UsageReportTrigger::MACAR,
        ) {
            start_time = None;
            end_time = None;
        }

        UsageReport {
            urr_id: self.urr_id,
            ur_seqn,
            trigger: self.trigger,
            volume_measurement,
            duration_measurement,
            start_time,
            end_time,
            query_urr_reference: (self.query_urr_reference != 0)
                .then_some(self.query_urr_reference),
        }
    }
}
