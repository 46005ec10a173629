//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Bytes, BytesMut};

use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::ie::reports::{
    DownlinkDataReport, SessionReport, UsageReport,
};
use crate::packet::ie::{Cause, IeIter, IeKind, IeType, ReportType};
use crate::packet::{Header, MessageBody, MsgType};

// Session Report Request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionReportRequest {
    pub seid: u64,
    pub seq: u32,
    pub report_type: ReportType,
    pub downlink_data_report: Option<DownlinkDataReport>,
    pub usage_reports: Vec<UsageReport>,
    pub session_reports: Vec<SessionReport>,
}

// Session Report Response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SessionReportResponse {
    pub seid: u64,
    pub seq: u32,
    pub cause: Cause,
}

// ===== impl SessionReportRequest =====

impl MessageBody for SessionReportRequest {
    const MSG_TYPE: MsgType = MsgType::SessionReportRequest;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.report_type.encode(buf);
        if let Some(report) = &self.downlink_data_report {
            report.encode(buf);
        }
        for report in &self.usage_reports {
            report.encode_as(IeType::UsageReportSrr, buf);
        }
        for report in &self.session_reports {
            report.encode(buf);
        }
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut report_type = None;
        let mut downlink_data_report = None;
        let mut usage_reports = Vec::new();
        let mut session_reports = Vec::new();
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            match IeType::decode(ie_type) {
                Some(IeType::ReportType) => {
                    report_type = Some(ReportType::decode_value(&mut value)?);
                }
                Some(IeType::DownlinkDataReport) => {
                    downlink_data_report =
                        Some(DownlinkDataReport::decode_value(&mut value)?);
                }
                Some(IeType::UsageReportSrr) => {
                    usage_reports.push(UsageReport::decode(value)?);
                }
                Some(IeType::SessionReport) => {
                    session_reports
                        .push(SessionReport::decode_value(&mut value)?);
                }
                _ => (),
            }
        }
        Ok(SessionReportRequest {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            report_type: report_type
                .ok_or(DecodeError::MissingIe(IeType::ReportType as u16))?,
            downlink_data_report,
            usage_reports,
            session_reports,
        })
    }
}

// ===== impl SessionReportResponse =====

impl MessageBody for SessionReportResponse {
    const MSG_TYPE: MsgType = MsgType::SessionReportResponse;

    fn seid(&self) -> Option<u64> {
        Some(self.seid)
    }

    fn seq(&self) -> u32 {
        self.seq
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.cause.encode(buf);
    }

    fn decode_body(hdr: &Header, buf: Bytes) -> DecodeResult<Self> {
        let mut cause = None;
        for ie in IeIter::new(buf) {
            let (ie_type, mut value) = ie?;
            if let Some(IeType::Cause) = IeType::decode(ie_type) {
                cause = Some(Cause::decode_value(&mut value)?);
            }
        }
        Ok(SessionReportResponse {
            seid: hdr.seid.unwrap_or(0),
            seq: hdr.seq,
            cause: cause
                .ok_or(DecodeError::MissingIe(IeType::Cause as u16))?,
        })
    }
}
