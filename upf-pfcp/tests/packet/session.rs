//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use chrono::DateTime;
use upf_pfcp::packet::Message;
use upf_pfcp::packet::error::DecodeError;
use upf_pfcp::packet::ie::reports::{
    UsageReport, UsageReportTrigger, VolumeMeasurement,
    VolumeMeasurementFlags,
};
use upf_pfcp::packet::ie::rules::{
    ApplyAction, Bitrate, CreateBar, CreateFar, CreatePdr, CreateQer,
    CreateUrr, DestinationInterface, ForwardingParameters, Fteid, GateState,
    GateStatus, MeasurementMethod, OuterHeaderCreation, Pdi, QueryUrr,
    ReportingTriggers, SdfFilter, SourceInterface, UeIpAddress, UpdateFar,
};
use upf_pfcp::packet::ie::{Cause, Fseid, NodeId};
use upf_pfcp::packet::messages::session::{
    SessionDeletionRequest, SessionDeletionResponse,
    SessionEstablishmentRequest, SessionEstablishmentResponse,
    SessionModificationRequest, SessionModificationResponse,
};

use super::{test_decode_msg, test_encode_msg};

//
// Test messages.
//

static ESTABLISHMENT_REQ: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x32, 0x00, 0xa5, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // seid
            0x00, 0x00, 0x09, 0x00, // seq
            // Node ID
            0x00, 0x3c, 0x00, 0x05, 0x00, 0x0a, 0xc8, 0x01, 0x02,
            // CP F-SEID
            0x00, 0x39, 0x00, 0x0d, 0x02, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            0x66, 0x77, 0x0a, 0xc8, 0x01, 0x02,
            // Create FAR
            0x00, 0x03, 0x00, 0x0d, 0x00, 0x6c, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x2c, 0x00, 0x01, 0x0c,
            // Create QER
            0x00, 0x07, 0x00, 0x0d, 0x00, 0x6d, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x7c, 0x00, 0x01, 0x0a,
            // Create URR
            0x00, 0x06, 0x00, 0x14, 0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x08, 0x00, 0x3e, 0x00, 0x01, 0x02, 0x00, 0x25, 0x00, 0x03, 0x01,
            0x00, 0x00,
            // Create BAR
            0x00, 0x55, 0x00, 0x05, 0x00, 0x58, 0x00, 0x01, 0x01,
            // Create PDR
            0x00, 0x01, 0x00, 0x38, 0x00, 0x38, 0x00, 0x02, 0x00, 0x03, 0x00,
            0x1d, 0x00, 0x04, 0x00, 0x00, 0x00, 0xff, 0x00, 0x02, 0x00, 0x0e,
            0x00, 0x14, 0x00, 0x01, 0x01, 0x00, 0x5d, 0x00, 0x05, 0x02, 0x3c,
            0x3c, 0x00, 0x01, 0x00, 0x6c, 0x00, 0x04, 0x00, 0x00, 0x00, 0x02,
            0x00, 0x6d, 0x00, 0x04, 0x00, 0x00, 0x00, 0x04, 0x00, 0x51, 0x00,
            0x04, 0x00, 0x00, 0x00, 0x08,
        ],
        Message::SessionEstablishmentRequest(SessionEstablishmentRequest {
            seid: 0,
            seq: 9,
            node_id: Some(NodeId::Ipv4("10.200.1.2".parse().unwrap())),
            fseid: Some(Fseid::new(
                0x0011223344556677,
                Some("10.200.1.2".parse().unwrap()),
                None,
            )),
            create_fars: vec![CreateFar {
                far_id: 2,
                apply_action: ApplyAction::BUFF | ApplyAction::NOCP,
                forwarding_parameters: None,
                bar_id: None,
            }],
            create_qers: vec![CreateQer {
                qer_id: 4,
                correlation_id: None,
                gate_status: None,
                mbr: None,
                gbr: None,
                qfi: Some(10),
                rqi: None,
                paging_policy_indicator: None,
            }],
            create_urrs: vec![CreateUrr {
                urr_id: 8,
                measurement_method: MeasurementMethod::VOLUM,
                reporting_triggers: ReportingTriggers::PERIO,
                measurement_period: None,
                volume_threshold: None,
                volume_quota: None,
                time_threshold: None,
                time_quota: None,
                quota_validity_time: None,
                measurement_information: None,
            }],
            create_bars: vec![CreateBar {
                bar_id: 1,
                ddn_delay: None,
                suggested_buffering_packets: None,
            }],
            create_pdrs: vec![CreatePdr {
                pdr_id: 3,
                precedence: Some(255),
                pdi: Some(Pdi {
                    source_interface: SourceInterface::Core,
                    f_teid: None,
                    network_instance: None,
                    ue_ip_address: Some(UeIpAddress {
                        source_or_destination: false,
                        ipv4: Some("60.60.0.1".parse().unwrap()),
                        ipv6: None,
                    }),
                    sdf_filter: None,
                    application_id: None,
                }),
                outer_header_removal: None,
                far_id: Some(2),
                qer_ids: vec![4],
                urr_ids: vec![8],
            }],
        }),
    )
});

static ESTABLISHMENT_REQ_UPLINK: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x32, 0x00, 0xc6, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // seid
            0x00, 0x00, 0x0a, 0x00, // seq
            // Node ID
            0x00, 0x3c, 0x00, 0x05, 0x00, 0x0a, 0xc8, 0x01, 0x02,
            // CP F-SEID
            0x00, 0x39, 0x00, 0x0d, 0x02, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            0x66, 0x77, 0x0a, 0xc8, 0x01, 0x02,
            // Create FAR
            0x00, 0x03, 0x00, 0x16, 0x00, 0x6c, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x2c, 0x00, 0x01, 0x02, 0x00, 0x04, 0x00, 0x05, 0x00,
            0x2a, 0x00, 0x01, 0x01,
            // Create QER
            0x00, 0x07, 0x00, 0x1b, 0x00, 0x6d, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x19, 0x00, 0x01, 0x00, 0x00, 0x1a, 0x00, 0x0a, 0x00,
            0x00, 0x01, 0x86, 0xa0, 0x00, 0x00, 0x03, 0x0d, 0x40,
            // Create PDR
            0x00, 0x01, 0x00, 0x63, 0x00, 0x38, 0x00, 0x02, 0x00, 0x01, 0x00,
            0x1d, 0x00, 0x04, 0x00, 0x00, 0x00, 0x64, 0x00, 0x02, 0x00, 0x3c,
            0x00, 0x14, 0x00, 0x01, 0x00, 0x00, 0x15, 0x00, 0x09, 0x01, 0x11,
            0x22, 0x33, 0x44, 0x0a, 0x0a, 0x0a, 0x01, 0x00, 0x17, 0x00, 0x26,
            0x01, 0x00, 0x00, 0x22, 0x70, 0x65, 0x72, 0x6d, 0x69, 0x74, 0x20,
            0x6f, 0x75, 0x74, 0x20, 0x69, 0x70, 0x20, 0x66, 0x72, 0x6f, 0x6d,
            0x20, 0x61, 0x6e, 0x79, 0x20, 0x74, 0x6f, 0x20, 0x61, 0x73, 0x73,
            0x69, 0x67, 0x6e, 0x65, 0x64, 0x00, 0x5f, 0x00, 0x01, 0x00, 0x00,
            0x6c, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00, 0x6d, 0x00, 0x04,
            0x00, 0x00, 0x00, 0x02,
        ],
        Message::SessionEstablishmentRequest(SessionEstablishmentRequest {
            seid: 0,
            seq: 10,
            node_id: Some(NodeId::Ipv4("10.200.1.2".parse().unwrap())),
            fseid: Some(Fseid::new(
                0x0011223344556677,
                Some("10.200.1.2".parse().unwrap()),
                None,
            )),
            create_fars: vec![CreateFar {
                far_id: 1,
                apply_action: ApplyAction::FORW,
                forwarding_parameters: Some(ForwardingParameters {
                    destination_interface: Some(DestinationInterface::Core),
                    network_instance: None,
                    outer_header_creation: None,
                    forwarding_policy: None,
                }),
                bar_id: None,
            }],
            create_qers: vec![CreateQer {
                qer_id: 2,
                correlation_id: None,
                gate_status: Some(GateStatus {
                    uplink: GateState::Open,
                    downlink: GateState::Open,
                }),
                mbr: Some(Bitrate {
                    uplink: 100_000,
                    downlink: 200_000,
                }),
                gbr: None,
                qfi: None,
                rqi: None,
                paging_policy_indicator: None,
            }],
            create_urrs: Vec::new(),
            create_bars: Vec::new(),
            create_pdrs: vec![CreatePdr {
                pdr_id: 1,
                precedence: Some(100),
                pdi: Some(Pdi {
                    source_interface: SourceInterface::Access,
                    f_teid: Some(Fteid {
                        teid: 0x11223344,
                        ipv4: Some("10.10.10.1".parse().unwrap()),
                        ipv6: None,
                    }),
                    network_instance: None,
                    ue_ip_address: None,
                    sdf_filter: Some(SdfFilter {
                        flow_description: Some(
                            "permit out ip from any to assigned".to_owned(),
                        ),
                        tos_traffic_class: None,
                        security_parameter_index: None,
                        flow_label: None,
                        filter_id: None,
                    }),
                    application_id: None,
                }),
                outer_header_removal: Some(0),
                far_id: Some(1),
                qer_ids: vec![2],
                urr_ids: Vec::new(),
            }],
        }),
    )
});

static ESTABLISHMENT_RSP: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x33, 0x00, 0x2b, // header
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, // seid
            0x00, 0x00, 0x09, 0x00, // seq
            // Node ID
            0x00, 0x3c, 0x00, 0x05, 0x00, 0x7f, 0x00, 0x00, 0x08,
            // Cause
            0x00, 0x13, 0x00, 0x01, 0x01,
            // UP F-SEID
            0x00, 0x39, 0x00, 0x0d, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x01, 0x7f, 0x00, 0x00, 0x08,
        ],
        Message::SessionEstablishmentResponse(SessionEstablishmentResponse {
            seid: 0x0011223344556677,
            seq: 9,
            node_id: NodeId::Ipv4("127.0.0.8".parse().unwrap()),
            cause: Cause::RequestAccepted,
            fseid: Some(Fseid::new(1, Some("127.0.0.8".parse().unwrap()), None)),
        }),
    )
});

static MODIFICATION_REQ: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x34, 0x00, 0x4c, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // seid
            0x00, 0x00, 0x0b, 0x00, // seq
            // Remove URR
            0x00, 0x11, 0x00, 0x08, 0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x08,
            // Update FAR
            0x00, 0x0a, 0x00, 0x24, 0x00, 0x6c, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x2c, 0x00, 0x01, 0x02, 0x00, 0x0b, 0x00, 0x13, 0x00,
            0x2a, 0x00, 0x01, 0x01, 0x00, 0x54, 0x00, 0x0a, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x01, 0x1e, 0x1e, 0x1e, 0x01,
            // Query URR
            0x00, 0x4d, 0x00, 0x08, 0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x08,
        ],
        Message::SessionModificationRequest(SessionModificationRequest {
            seid: 1,
            seq: 11,
            remove_urrs: vec![8],
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::FORW),
                update_forwarding_parameters: Some(ForwardingParameters {
                    destination_interface: Some(DestinationInterface::Core),
                    network_instance: None,
                    outer_header_creation: Some(OuterHeaderCreation {
                        description: OuterHeaderCreation::DESC_GTPU_UDP_IPV4,
                        teid: Some(1),
                        ipv4: Some("30.30.30.1".parse().unwrap()),
                        ipv6: None,
                        port: None,
                    }),
                    forwarding_policy: None,
                }),
                bar_id: None,
            }],
            query_urrs: vec![QueryUrr { urr_id: 8 }],
            ..Default::default()
        }),
    )
});

static MODIFICATION_RSP: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x35, 0x00, 0x69, // header
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, // seid
            0x00, 0x00, 0x0b, 0x00, // seq
            // Cause
            0x00, 0x13, 0x00, 0x01, 0x01,
            // Usage Report
            0x00, 0x4e, 0x00, 0x54, // grouped IE header
            0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00, 0x08, // urr id
            0x00, 0x68, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, // ur-seqn
            0x00, 0x3f, 0x00, 0x03, 0x80, 0x00, 0x00, // trigger
            0x00, 0x42, 0x00, 0x19, 0x07, // volume measurement
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, // total
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x28, // uplink
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3c, // downlink
            0x00, 0x43, 0x00, 0x04, 0x00, 0x00, 0x00, 0x1e, // duration
            0x00, 0x4b, 0x00, 0x04, 0xe8, 0xfe, 0x6f, 0x62, // start time
            0x00, 0x4c, 0x00, 0x04, 0xe8, 0xfe, 0x6f, 0x80, // end time
            0x00, 0x7d, 0x00, 0x04, 0x00, 0x00, 0x00, 0x07, // query ref
        ],
        Message::SessionModificationResponse(SessionModificationResponse {
            seid: 0x0011223344556677,
            seq: 11,
            cause: Cause::RequestAccepted,
            usage_reports: vec![UsageReport {
                urr_id: 8,
                ur_seqn: 1,
                trigger: UsageReportTrigger::IMMER,
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
                duration_measurement: Some(30),
                start_time: Some(
                    DateTime::from_timestamp(1_699_999_970, 0).unwrap(),
                ),
                end_time: Some(
                    DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                ),
                query_urr_reference: Some(7),
            }],
        }),
    )
});

static DELETION_REQ: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x36, 0x00, 0x0c, // header
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // seid
            0x00, 0x00, 0x0c, 0x00, // seq
        ],
        Message::SessionDeletionRequest(SessionDeletionRequest {
            seid: 1,
            seq: 12,
        }),
    )
});

static DELETION_RSP: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    (
        vec![
            0x21, 0x37, 0x00, 0x49, // header
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, // seid
            0x00, 0x00, 0x0c, 0x00, // seq
            // Cause
            0x00, 0x13, 0x00, 0x01, 0x01,
            // Usage Report
            0x00, 0x4f, 0x00, 0x34, // grouped IE header
            0x00, 0x51, 0x00, 0x04, 0x00, 0x00, 0x00, 0x08, // urr id
            0x00, 0x68, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, // ur-seqn
            0x00, 0x3f, 0x00, 0x03, 0x00, 0x08, 0x00, // trigger
            0x00, 0x42, 0x00, 0x19, 0x07, // volume measurement
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, // total
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x28, // uplink
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x3c, // downlink
        ],
        Message::SessionDeletionResponse(SessionDeletionResponse {
            seid: 0x0011223344556677,
            seq: 12,
            cause: Cause::RequestAccepted,
            usage_reports: vec![UsageReport {
                urr_id: 8,
                ur_seqn: 0,
                trigger: UsageReportTrigger::TERMR,
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
        }),
    )
});

//
// Tests.
//

#[test]
fn test_encode_establishment_req() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_REQ;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_establishment_req() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_REQ;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_establishment_req_uplink() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_REQ_UPLINK;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_establishment_req_uplink() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_REQ_UPLINK;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_establishment_rsp() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_RSP;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_establishment_rsp() {
    let (ref bytes, ref msg) = *ESTABLISHMENT_RSP;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_modification_req() {
    let (ref bytes, ref msg) = *MODIFICATION_REQ;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_modification_req() {
    let (ref bytes, ref msg) = *MODIFICATION_REQ;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_modification_rsp() {
    let (ref bytes, ref msg) = *MODIFICATION_RSP;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_modification_rsp() {
    let (ref bytes, ref msg) = *MODIFICATION_RSP;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_deletion_req() {
    let (ref bytes, ref msg) = *DELETION_REQ;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_deletion_req() {
    let (ref bytes, ref msg) = *DELETION_REQ;
    test_decode_msg(bytes, msg);
}

#[test]
fn test_encode_deletion_rsp() {
    let (ref bytes, ref msg) = *DELETION_RSP;
    test_encode_msg(bytes, msg);
}

#[test]
fn test_decode_deletion_rsp() {
    let (ref bytes, ref msg) = *DELETION_RSP;
    test_decode_msg(bytes, msg);
}

// A Create PDR without its rule ID is rejected at decode time.
#[test]
fn test_decode_create_pdr_missing_id() {
    let bytes = vec![
        0x21, 0x32, 0x00, 0x18, // header
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // seid
        0x00, 0x00, 0x09, 0x00, // seq
        // Create PDR holding only a Precedence IE
        0x00, 0x01, 0x00, 0x08, 0x00, 0x1d, 0x00, 0x04, 0x00, 0x00, 0x00,
        0x00,
    ];
    assert_eq!(Message::decode(&bytes), Err(DecodeError::MissingIe(56)));
}
