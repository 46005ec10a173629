//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::net::UnixDatagram;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::SendError;
use tracing::trace;

use crate::error::IoError;
use crate::packet::ie::reports::{
    UsageReportTrigger, VolumeMeasurement, VolumeMeasurementFlags,
};
use crate::packet::ie::rules::ApplyAction;
use crate::report::{DldReport, Report, SesReport, UsaReport};
use crate::tasks::messages::input::SessReportMsg;

// Side-channel event types.
pub const MSG_TYPE_BUFFERED_PACKET: u8 = 1;
pub const MSG_TYPE_USAGE_REPORTS: u8 = 2;
pub const MSG_TYPE_QOS_MONITORING: u8 = 3;

const MAX_DATAGRAM_SIZE: usize = 96 * 1024;

//
// Reader over a side-channel datagram.
//
// The forwarder and the control plane are co-located, so the framing uses the
// native byte order.
//
struct Reader<'a> {
    buf: &'a [u8],
}

// ===== impl Reader =====

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf }
    }

    fn get_u8(&mut self) -> Option<u8> {
        let (value, rest) = self.buf.split_first()?;
        self.buf = rest;
        Some(*value)
    }

    fn get_u16(&mut self) -> Option<u16> {
        let (value, rest) = self.buf.split_at_checked(2)?;
        self.buf = rest;
        Some(u16::from_ne_bytes(value.try_into().ok()?))
    }

    fn get_u32(&mut self) -> Option<u32> {
        let (value, rest) = self.buf.split_at_checked(4)?;
        self.buf = rest;
        Some(u32::from_ne_bytes(value.try_into().ok()?))
    }

    fn get_u64(&mut self) -> Option<u64> {
        let (value, rest) = self.buf.split_at_checked(8)?;
        self.buf = rest;
        Some(u64::from_ne_bytes(value.try_into().ok()?))
    }

    fn rest(self) -> &'a [u8] {
        self.buf
    }
}

// ===== global functions =====

pub(crate) fn socket_rx(path: &Path) -> Result<UnixDatagram, std::io::Error> {
    // A stale socket file from a previous run would fail the bind.
    let _ = std::fs::remove_file(path);
    UnixDatagram::bind(path)
}

// Decodes one side-channel datagram into the reports it carries.
//
// Short or unrecognizable datagrams yield None and are dropped by the caller.
pub fn decode_event(data: &[u8]) -> Option<SessReportMsg> {
    let mut reader = Reader::new(data);
    let msg_type = reader.get_u8()?;
    let seid = reader.get_u64()?;

    let mut reports = Vec::new();
    match msg_type {
        MSG_TYPE_BUFFERED_PACKET => {
            let pdr_id = reader.get_u16()?;
            let action = reader.get_u16()?;
            let pkt = reader.rest();
            reports.push(Report::Dldr(DldReport {
                pdr_id,
                apply_action: ApplyAction::from_bits_truncate(action as u8),
                buffered_packet: Some(Bytes::copy_from_slice(pkt)),
            }));
        }
        MSG_TYPE_USAGE_REPORTS => {
            let count = reader.get_u16()?;
            for _ in 0..count {
                let urr_id = reader.get_u32()?;
                let ur_seqn = reader.get_u32()?;
                let trigger =
                    UsageReportTrigger::from_sidechan(reader.get_u64()?);
                let vol_flags = VolumeMeasurementFlags::from_bits_truncate(
                    reader.get_u8()?,
                );
                let volume = VolumeMeasurement {
                    flags: vol_flags,
                    total_volume: reader.get_u64()?,
                    uplink_volume: reader.get_u64()?,
                    downlink_volume: reader.get_u64()?,
                    total_packets: reader.get_u64()?,
                    uplink_packets: reader.get_u64()?,
                    downlink_packets: reader.get_u64()?,
                };
                let query_urr_reference = reader.get_u32()?;
                let start_time = decode_time_ns(reader.get_u64()?);
                let end_time = decode_time_ns(reader.get_u64()?);
                reports.push(Report::Usar(UsaReport {
                    urr_id,
                    ur_seqn,
                    trigger,
                    volume,
                    query_urr_reference,
                    start_time,
                    end_time,
                }));
            }
        }
        MSG_TYPE_QOS_MONITORING => {
            let qfi = reader.get_u8()?;
            let packet_delay = reader.get_u32()?;
            let event_time = decode_time_ns(reader.get_u64()?)?;
            let start_time = decode_time_ns(reader.get_u64()?)?;
            reports.push(Report::Sesr(SesReport {
                qfi,
                packet_delay,
                event_time,
                start_time,
            }));
        }
        _ => return None,
    }

    Some(SessReportMsg { seid, reports })
}

fn decode_time_ns(ns: u64) -> Option<DateTime<Utc>> {
    if ns == 0 {
        return None;
    }
    Some(DateTime::from_timestamp_nanos(ns as i64))
}

pub(crate) async fn read_loop(
    socket: Arc<UnixDatagram>,
    sess_report_txp: Sender<SessReportMsg>,
) -> Result<(), SendError<SessReportMsg>> {
    let mut buf = vec![0; MAX_DATAGRAM_SIZE];

    loop {
        match socket.recv(&mut buf).await {
            Ok(num_bytes) => {
                // Decode the event, dropping short or unknown datagrams.
                let Some(msg) = decode_event(&buf[0..num_bytes]) else {
                    trace!(len = %num_bytes, "ignoring malformed side-channel datagram");
                    continue;
                };

                sess_report_txp.send(msg).await?;
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {
                continue;
            }
            Err(error) => {
                IoError::SideChannelRecvError(error).log();
                return Ok(());
            }
        }
    }
}
