//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use chrono::DateTime;
use upf_pfcp::packet::Message;
use upf_pfcp::packet::ie::reports::{
    DownlinkDataReport, QosMonitoringMeasurement, QosMonitoringReport,
    SessionReport, UsageReport, UsageReportTrigger, VolumeMeasurement,
    VolumeMeasurementFlags,
};
use upf_pfcp::packet::ie::{Cause, ReportType};
use upf_pfcp::packet::messages::report::{
    SessionReportRequest, SessionReportResponse,
};

use super::{test_decode_msg, test_encode_msg};

//
// Test messages.
//

static REPORT_REQ_DLDR: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x38, 0x00, 0x1b, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x99, // seid
            0x00, 0x00, 0x02, 0x00, // seq
            // Report Type
            0x00, 0x27, 0x00, 0x01, 0x01,
            // Downlink Data Report
            0x00, 0x53, 0x00, 0x06, 0x00, 0x38, 0x00, 0x02, 0x00, 0x03,
        ],
        Message::SessionReportRequest(SessionReportRequest {
            seid: 0x99,
            seq: 2,
            report_type: ReportType::DLDR,
            downlink_data_report: Some(DownlinkDataReport { pdr_id: 3 }),
            usage_reports: Vec::new(),
            session_reports: Vec::new(),
        }),
    )
});

static REPORT_REQ_USAR: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x38, 0x00, 0x49, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x99, // seid
            0x00, 0x00, 0x03, 0x00, // seq
            // Report Type
            0x00, 0x27, 0x00, 0x01, 0x02,
            // Usage Report
            0x00, 0x50, 0x00, 0x34, // grouped IE header
            0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00, 0x08, // urr id
            0x00, 0x68, 0x00, 0x04, 0x00, 0x00, 0x00, 0x02, // ur-seqn
            0x00, 0x3f, 0x00, 0x03, 0x01, 0x00, 0x00, // trigger
            0x00, 0x42, 0x00, 0x19, 0x07, // volume measurement
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, // total
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x28, // uplink
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3c, // downlink
        ],
        Message::SessionReportRequest(SessionReportRequest {
            seid: 0x99,
            seq: 3,
            report_type: ReportType::USAR,
            downlink_data_report: None,
            usage_reports: vec![UsageReport {
                urr_id: 8,
                ur_seqn: 2,
                trigger: UsageReportTrigger::PERIO,
                volume_measurement: Some(VolumeMeasurement {
                    flags: VolumeMeasurementFlags::TOVOL
                        | VolumeMeasurementFlags::ULVOL
                        | VolumeMeasurementFlags::DLVOL,
                    total_volume: 100,
                    uplink_volume: 40,
                    downlink_volume: 60,
                    total_packets: 0,
                    uplink_packets: 0,
                    downlink_packets: 0,
                }),
                duration_measurement: None,
                start_time: None,
                end_time: None,
                query_urr_reference: None,
            }],
            session_reports: Vec::new(),
        }),
    )
});

static REPORT_REQ_SESR: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x38, 0x00, 0x3c, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x99, // seid
            0x00, 0x00, 0x04, 0x00, // seq
            // Report Type
            0x00, 0x27, 0x00, 0x01, 0x20,
            // Session Report
            0x00, 0xd6, 0x00, 0x27, // grouped IE header
            0x00, 0xd7, 0x00, 0x01, 0x01, // srr id
            0x00, 0xf7, 0x00, 0x1e, // qos monitoring report
            0x00, 0x7c, 0x00, 0x01, 0x09, // qfi
            0x00, 0xf8, 0x00, 0x05, 0x01, 0x00, 0x00, 0x00, 0xfa, // meas
            0x00, 0x9c, 0x00, 0x04, 0xe8, 0xfe, 0x6f, 0x80, // event ts
            0x00, 0x4b, 0x00, 0x04, 0xe8, 0xfe, 0x6f, 0x44, // start time
        ],
        Message::SessionReportRequest(SessionReportRequest {
            seid: 0x99,
            seq: 4,
            report_type: ReportType::SESR,
            downlink_data_report: None,
            usage_reports: Vec::new(),
            session_reports: vec![SessionReport {
                srr_id: 1,
                qos_monitoring_report: Some(QosMonitoringReport {
                    qfi: 9,
                    measurement: QosMonitoringMeasurement {
                        downlink_delay: Some(250),
                        uplink_delay: None,
                        round_trip_delay: None,
                    },
                    event_time_stamp: DateTime::from_timestamp(
                        1_700_000_000,
                        0,
                    )
                    .unwrap(),
                    start_time: Some(
                        DateTime::from_timestamp(1_699_999_940, 0).unwrap(),
                    ),
                }),
            }],
        }),
    )
});

static REPORT_RSP: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x39, 0x00, 0x11, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // seid
            0x00, 0x00, 0x02, 0x00, // seq
            // Cause
            0x00, 0x13, 0x00, 0x01, 0x41,
        ],
        Message::SessionReportResponse(SessionReportResponse {
            seid: 0,
            seq: 2,
            cause: Cause::SessionContextNotFound,
        }),
    )
});

//
// Tests.
//

#[test]
fn test_encode_report_req_dldr() {
    let (ref bytes, ref msg) = *REPORT_REQ_DLDR;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_report_req_dldr() {
    let (ref bytes, ref msg) = *REPORT_REQ_DLDR;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_report_req_usar() {
    let (ref bytes, ref msg) = *REPORT_REQ_USAR;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_report_req_usar() {
    let (ref bytes, ref msg) = *REPORT_REQ_USAR;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_report_req_sesr() {
    let (ref bytes, ref msg) = *REPORT_REQ_SESR;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_report_req_sesr() {
    let (ref bytes, ref msg) = *REPORT_REQ_SESR;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_report_rsp() {
    let (ref bytes, ref msg) = *REPORT_RSP;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_report_rsp() {
    let (ref bytes, ref msg) = *REPORT_RSP;
    test_decode_msg(bytes, msg);
}

// The three-octet usage report trigger follows the low-bit-first layout.
#[test]
fn test_usage_report_trigger_octets() {
    let trigger = UsageReportTrigger::PERIO
        | UsageReportTrigger::VOLQU
        | UsageReportTrigger::QUVTI;
    assert_eq!(trigger.bits(), 0x0008_0101);
}
