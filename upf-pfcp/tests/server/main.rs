//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;
use upf_pfcp::forwarder::{Driver, DriverResult, Empty};
use upf_pfcp::master::{Master, ProtocolInputChannelsTx, ServerConfig};
use upf_pfcp::packet::Message;
use upf_pfcp::packet::ie::reports::{
    UsageReportTrigger, VolumeMeasurement, VolumeMeasurementFlags,
};
use upf_pfcp::packet::ie::rules::{
    ApplyAction, CreateBar, CreateFar, CreatePdr, CreateQer, CreateUrr,
    DestinationInterface, ForwardingParameters, MeasurementMethod,
    OuterHeaderCreation, QueryUrr, ReportingTriggers, UpdateBar, UpdateFar,
    UpdatePdr, UpdateQer, UpdateUrr,
};
use upf_pfcp::packet::ie::{Cause, Fseid, NodeId, ReportType};
use upf_pfcp::packet::messages::association::AssociationSetupRequest;
use upf_pfcp::packet::messages::heartbeat::HeartbeatRequest;
use upf_pfcp::packet::messages::report::SessionReportResponse;
use upf_pfcp::packet::messages::session::{
    SessionDeletionRequest, SessionEstablishmentRequest,
    SessionModificationRequest,
};
use upf_pfcp::report::{DldReport, Report, UsaReport};
use upf_pfcp::tasks::messages::input::SessReportMsg;

const SMF_NODE_ID: &str = "10.200.1.2";
const CP_SEID: u64 = 0x0011223344556677;

//
// Scripted forwarder driver recording every call.
//

#[derive(Debug, Default)]
struct DriverState {
    create_far_calls: usize,
    create_pdr_calls: usize,
    written_packets: Vec<(SocketAddr, Vec<u8>)>,
    usage_volume: Option<VolumeMeasurement>,
}

#[derive(Debug, Default)]
struct TestDriver {
    state: Arc<Mutex<DriverState>>,
}

impl TestDriver {
    fn new() -> (TestDriver, Arc<Mutex<DriverState>>) {
        let driver = TestDriver::default();
        let state = driver.state.clone();
        (driver, state)
    }
}

impl Driver for TestDriver {
    fn create_pdr(
        &mut self,
        _seid: u64,
        _pdr: &CreatePdr,
    ) -> DriverResult<()> {
        self.state.lock().unwrap().create_pdr_calls += 1;
        Ok(())
    }

    fn update_pdr(
        &mut self,
        _seid: u64,
        _pdr: &UpdatePdr,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn remove_pdr(&mut self, _seid: u64, _pdr_id: u16) -> DriverResult<()> {
        Ok(())
    }

    fn create_far(
        &mut self,
        _seid: u64,
        _far: &CreateFar,
    ) -> DriverResult<()> {
        self.state.lock().unwrap().create_far_calls += 1;
        Ok(())
    }

    fn update_far(
        &mut self,
        _seid: u64,
        _far: &UpdateFar,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn remove_far(&mut self, _seid: u64, _far_id: u32) -> DriverResult<()> {
        Ok(())
    }

    fn create_qer(
        &mut self,
        _seid: u64,
        _qer: &CreateQer,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn update_qer(
        &mut self,
        _seid: u64,
        _qer: &UpdateQer,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn remove_qer(&mut self, _seid: u64, _qer_id: u32) -> DriverResult<()> {
        Ok(())
    }

    fn create_urr(
        &mut self,
        _seid: u64,
        _urr: &CreateUrr,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn update_urr(
        &mut self,
        _seid: u64,
        _urr: &UpdateUrr,
    ) -> DriverResult<Vec<UsaReport>> {
        Ok(Vec::new())
    }

    fn remove_urr(
        &mut self,
        seid: u64,
        urr_id: u32,
    ) -> DriverResult<Vec<UsaReport>> {
        self.query_urr(seid, urr_id)
    }

    fn create_bar(
        &mut self,
        _seid: u64,
        _bar: &CreateBar,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn update_bar(
        &mut self,
        _seid: u64,
        _bar: &UpdateBar,
    ) -> DriverResult<()> {
        Ok(())
    }

    fn remove_bar(&mut self, _seid: u64, _bar_id: u8) -> DriverResult<()> {
        Ok(())
    }

    fn query_urr(
        &mut self,
        _seid: u64,
        urr_id: u32,
    ) -> DriverResult<Vec<UsaReport>> {
        let state = self.state.lock().unwrap();
        let Some(volume) = state.usage_volume else {
            return Ok(Vec::new());
        };
        Ok(vec![UsaReport {
            urr_id,
            ur_seqn: 0,
            trigger: UsageReportTrigger::empty(),
            volume,
            query_urr_reference: 0,
            start_time: None,
            end_time: None,
        }])
    }

    fn write_packet(
        &mut self,
        dst: SocketAddr,
        pkt: &[u8],
    ) -> DriverResult<()> {
        self.state
            .lock()
            .unwrap()
            .written_packets
            .push((dst, pkt.to_vec()));
        Ok(())
    }

    fn close(&mut self) {}
}

//
// Test harness: a running server plus a socket playing the SMF.
//

struct TestUpf {
    addr: SocketAddr,
    smf: UdpSocket,
    channels: ProtocolInputChannelsTx,
    _shutdown_tx: mpsc::Sender<()>,
    seq: u32,
}

async fn start_upf(driver: Box<dyn Driver>) -> TestUpf {
    start_upf_with(driver, Duration::from_secs(3), 3, None).await
}

async fn start_upf_with(
    driver: Box<dyn Driver>,
    retrans_timeout: Duration,
    max_retrans: u8,
    sidechan_path: Option<std::path::PathBuf>,
) -> TestUpf {
    let config = ServerConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        node_id: "127.0.0.8".to_owned(),
        retrans_timeout,
        max_retrans,
        buffer_queue_len: 4,
        sidechan_path,
    };
    let (master, rx) = Master::new(config, driver).await.unwrap();
    let addr = master.local_addr().unwrap();
    let channels = master.tx.clone();

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(master.run(rx, shutdown_rx));

    let smf = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    TestUpf {
        addr,
        smf,
        channels,
        _shutdown_tx: shutdown_tx,
        seq: 0,
    }
}

impl TestUpf {
    fn next_seq(&mut self) -> u32 {
        self.seq += 1;
        self.seq
    }

    async fn send(&self, msg: &Message) {
        self.smf.send_to(&msg.encode(), self.addr).await.unwrap();
    }

    async fn send_raw(&self, buf: &[u8]) {
        self.smf.send_to(buf, self.addr).await.unwrap();
    }

    async fn recv_raw(&self) -> Vec<u8> {
        let mut buf = [0; 8192];
        let (num_bytes, _) =
            timeout(Duration::from_secs(5), self.smf.recv_from(&mut buf))
                .await
                .expect("timed out waiting for a datagram")
                .unwrap();
        buf[0..num_bytes].to_vec()
    }

    async fn recv(&self) -> Message {
        let buf = self.recv_raw().await;
        Message::decode(&buf).unwrap()
    }

    async fn expect_silence(&self, duration: Duration) {
        let mut buf = [0; 8192];
        if let Ok(result) =
            timeout(duration, self.smf.recv_from(&mut buf)).await
        {
            let (num_bytes, _) = result.unwrap();
            panic!(
                "unexpected datagram: {:?}",
                Message::decode(&buf[0..num_bytes])
            );
        }
    }

    async fn associate(&mut self) {
        let seq = self.next_seq();
        let req = Message::AssociationSetupRequest(AssociationSetupRequest {
            seq,
            node_id: NodeId::from_name(SMF_NODE_ID),
            recovery_time_stamp: None,
        });
        self.send(&req).await;
        let rsp = self.recv().await;
        let rsp = rsp.as_association_setup_response().unwrap();
        assert_eq!(rsp.cause, Cause::RequestAccepted);
        assert_eq!(rsp.node_id, NodeId::from_name("127.0.0.8"));
    }

    // Establishes a session and returns the local SEID the UPF assigned.
    async fn establish(&mut self, req: SessionEstablishmentRequest) -> u64 {
        self.send(&Message::SessionEstablishmentRequest(req)).await;
        let rsp = self.recv().await;
        let rsp = rsp.as_session_establishment_response().unwrap();
        assert_eq!(rsp.cause, Cause::RequestAccepted);
        rsp.fseid.expect("missing UP F-SEID").seid
    }

    async fn push_reports(&self, seid: u64, reports: Vec<Report>) {
        self.channels
            .sess_report_rx
            .send(SessReportMsg { seid, reports })
            .await
            .unwrap();
    }
}

fn establishment_req(seq: u32) -> SessionEstablishmentRequest {
    SessionEstablishmentRequest {
        seid: 0,
        seq,
        node_id: Some(NodeId::from_name(SMF_NODE_ID)),
        fseid: Some(Fseid::new(CP_SEID, Some(SMF_NODE_ID.parse().unwrap()), None)),
        create_fars: Vec::new(),
        create_qers: Vec::new(),
        create_urrs: Vec::new(),
        create_bars: Vec::new(),
        create_pdrs: Vec::new(),
    }
}

fn buffering_far(far_id: u32) -> CreateFar {
    CreateFar {
        far_id,
        apply_action: ApplyAction::BUFF | ApplyAction::NOCP,
        forwarding_parameters: None,
        bar_id: None,
    }
}

fn qos_qer(qer_id: u32, qfi: u8) -> CreateQer {
    CreateQer {
        qer_id,
        correlation_id: None,
        gate_status: None,
        mbr: None,
        gbr: None,
        qfi: Some(qfi),
        rqi: None,
        paging_policy_indicator: None,
    }
}

fn downlink_pdr(pdr_id: u16, far_id: u32, qer_ids: Vec<u32>) -> CreatePdr {
    CreatePdr {
        pdr_id,
        precedence: Some(255),
        pdi: None,
        outer_header_removal: None,
        far_id: Some(far_id),
        qer_ids,
        urr_ids: Vec::new(),
    }
}

fn periodic_urr(urr_id: u32, period: u32) -> CreateUrr {
    CreateUrr {
        urr_id,
        measurement_method: MeasurementMethod::VOLUM,
        reporting_triggers: ReportingTriggers::PERIO,
        measurement_period: Some(period),
        volume_threshold: None,
        volume_quota: None,
        time_threshold: None,
        time_quota: None,
        quota_validity_time: None,
        measurement_information: None,
    }
}

fn buffered_dldr(pdr_id: u16, action: ApplyAction, pkt: &[u8]) -> Report {
    Report::Dldr(DldReport {
        pdr_id,
        apply_action: action,
        buffered_packet: Some(Bytes::copy_from_slice(pkt)),
    })
}

fn test_volume() -> VolumeMeasurement {
    VolumeMeasurement {
        flags: VolumeMeasurementFlags::TOVOL
            | VolumeMeasurementFlags::ULVOL
            | VolumeMeasurementFlags::DLVOL,
        total_volume: 100,
        uplink_volume: 40,
        downlink_volume: 60,
        total_packets: 0,
        uplink_packets: 0,
        downlink_packets: 0,
    }
}

//
// Tests.
//

#[tokio::test]
async fn test_heartbeat() {
    let mut upf = start_upf(Box::new(Empty::default())).await;

    let seq = upf.next_seq();
    upf.send(&Message::HeartbeatRequest(HeartbeatRequest {
        seq,
        recovery_time_stamp: None,
    }))
    .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_heartbeat_response().unwrap();
    assert_eq!(rsp.seq, seq);
}

#[tokio::test]
async fn test_association_and_establishment() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    // Local SEIDs are slot-based, starting from one.
    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    req.create_pdrs = vec![downlink_pdr(3, 2, vec![])];
    assert_eq!(upf.establish(req).await, 1);

    let seq = upf.next_seq();
    assert_eq!(upf.establish(establishment_req(seq)).await, 2);
}

#[tokio::test]
async fn test_establishment_without_association() {
    let mut upf = start_upf(Box::new(Empty::default())).await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionEstablishmentRequest(establishment_req(seq)))
        .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_session_establishment_response().unwrap();
    assert_eq!(rsp.cause, Cause::NoEstablishedPfcpAssociation);
}

#[tokio::test]
async fn test_establishment_missing_fseid_dropped() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.fseid = None;
    upf.send(&Message::SessionEstablishmentRequest(req)).await;

    upf.expect_silence(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_retransmit_dedup() {
    let (driver, state) = TestDriver::new();
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    let req = Message::SessionEstablishmentRequest(req);
    let req_buf = req.encode().to_vec();

    upf.send_raw(&req_buf).await;
    let rsp1 = upf.recv_raw().await;

    // A replayed request yields byte-identical bytes and no further rule
    // creation.
    upf.send_raw(&req_buf).await;
    let rsp2 = upf.recv_raw().await;
    assert_eq!(rsp1, rsp2);
    assert_eq!(state.lock().unwrap().create_far_calls, 1);
}

#[tokio::test]
async fn test_deletion_unknown_seid() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionDeletionRequest(SessionDeletionRequest {
        seid: 0x1234,
        seq,
    }))
    .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_session_deletion_response().unwrap();
    assert_eq!(rsp.cause, Cause::SessionContextNotFound);
}

#[tokio::test]
async fn test_modification_unknown_seid() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid: 0x1234,
            seq,
            ..Default::default()
        },
    ))
    .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_session_modification_response().unwrap();
    assert_eq!(rsp.cause, Cause::SessionContextNotFound);
}

#[tokio::test]
async fn test_dldr_notification_at_queue_transition() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    req.create_pdrs = vec![downlink_pdr(3, 2, vec![])];
    let seid = upf.establish(req).await;

    // Three buffered packets arrive; only the empty-to-nonempty transition
    // produces a Downlink Data Report.
    let action = ApplyAction::BUFF | ApplyAction::NOCP;
    for _ in 0..3 {
        upf.push_reports(
            seid,
            vec![buffered_dldr(3, action, &[0xee, 0xbb, 0xdd, 0xcc])],
        )
        .await;
    }

    let rsp = upf.recv().await;
    let report = rsp.as_session_report_request().unwrap();
    assert_eq!(report.report_type, ReportType::DLDR);
    assert_eq!(report.downlink_data_report.unwrap().pdr_id, 3);
    let report_seq = report.seq;
    upf.send(&Message::SessionReportResponse(SessionReportResponse {
        seid: 0,
        seq: report_seq,
        cause: Cause::RequestAccepted,
    }))
    .await;
    upf.expect_silence(Duration::from_millis(300)).await;

    // Drain the queue (BUFF -> DROP), then a fourth packet notifies again.
    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::DROP),
                update_forwarding_parameters: None,
                bar_id: None,
            }],
            ..Default::default()
        },
    ))
    .await;
    let rsp = upf.recv().await;
    assert!(
        rsp.as_session_modification_response().unwrap().cause.accepted()
    );

    upf.push_reports(
        seid,
        vec![buffered_dldr(3, action, &[0xee, 0xbb, 0xdd, 0xcc])],
    )
    .await;
    let rsp = upf.recv().await;
    let report = rsp.as_session_report_request().unwrap();
    assert_eq!(report.report_type, ReportType::DLDR);
    assert_eq!(report.downlink_data_report.unwrap().pdr_id, 3);
}

#[tokio::test]
async fn test_far_buff_to_drop_discards() {
    let (driver, state) = TestDriver::new();
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![CreateFar {
        far_id: 2,
        apply_action: ApplyAction::BUFF,
        forwarding_parameters: None,
        bar_id: None,
    }];
    req.create_pdrs = vec![downlink_pdr(1, 2, vec![])];
    let seid = upf.establish(req).await;

    for _ in 0..4 {
        upf.push_reports(
            seid,
            vec![buffered_dldr(1, ApplyAction::BUFF, &[0x01])],
        )
        .await;
    }
    // Buffering without NOCP stays quiet; this also lets the loop drain the
    // report channel before the modification arrives on the UDP channel.
    upf.expect_silence(Duration::from_millis(200)).await;

    // BUFF -> DROP empties the queue without any GTP-U emission.
    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::DROP),
                update_forwarding_parameters: None,
                bar_id: None,
            }],
            ..Default::default()
        },
    ))
    .await;
    let rsp = upf.recv().await;
    assert!(
        rsp.as_session_modification_response().unwrap().cause.accepted()
    );
    assert!(state.lock().unwrap().written_packets.is_empty());

    // A later switch to FORW finds nothing left to forward.
    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::BUFF),
                update_forwarding_parameters: None,
                bar_id: None,
            }],
            ..Default::default()
        },
    ))
    .await;
    upf.recv().await;
    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::FORW),
                update_forwarding_parameters: Some(forwarding_to(
                    "30.30.30.1",
                    1,
                )),
                bar_id: None,
            }],
            ..Default::default()
        },
    ))
    .await;
    upf.recv().await;
    assert!(state.lock().unwrap().written_packets.is_empty());
}

#[tokio::test]
async fn test_far_buff_to_forw_emits_gtpu() {
    let (driver, state) = TestDriver::new();
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![CreateFar {
        far_id: 2,
        apply_action: ApplyAction::BUFF,
        forwarding_parameters: None,
        bar_id: None,
    }];
    req.create_qers = vec![qos_qer(4, 10)];
    req.create_pdrs = vec![downlink_pdr(1, 2, vec![4])];
    let seid = upf.establish(req).await;

    // Buffer a few downlink packets.
    let pkt = [0xee, 0xbb, 0xdd, 0xcc];
    for _ in 0..3 {
        upf.push_reports(seid, vec![buffered_dldr(1, ApplyAction::BUFF, &pkt)])
            .await;
    }
    // Buffering without NOCP stays quiet; this also lets the loop drain the
    // report channel before the modification arrives on the UDP channel.
    upf.expect_silence(Duration::from_millis(200)).await;

    // BUFF -> FORW re-encapsulates every buffered packet in GTP-U.
    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            update_fars: vec![UpdateFar {
                far_id: 2,
                apply_action: Some(ApplyAction::FORW),
                update_forwarding_parameters: Some(forwarding_to(
                    "30.30.30.1",
                    1,
                )),
                bar_id: None,
            }],
            ..Default::default()
        },
    ))
    .await;
    let rsp = upf.recv().await;
    assert!(
        rsp.as_session_modification_response().unwrap().cause.accepted()
    );

    let state = state.lock().unwrap();
    assert_eq!(state.written_packets.len(), 3);
    let expected_dst: SocketAddr = "30.30.30.1:2152".parse().unwrap();
    let expected_pdu = [
        0x34, 0xff, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x85, 0x01, 0x00, 0x0a, 0x00, 0xee, 0xbb, 0xdd, 0xcc,
    ];
    for (dst, pdu) in &state.written_packets {
        assert_eq!(*dst, expected_dst);
        assert_eq!(pdu.as_slice(), expected_pdu);
    }
}

#[tokio::test]
async fn test_periodic_usage_reports() {
    let (driver, state) = TestDriver::new();
    state.lock().unwrap().usage_volume = Some(test_volume());
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_urrs = vec![periodic_urr(8, 1)];
    upf.establish(req).await;

    // Successive periodic reports carry the PERIO trigger and monotonically
    // increasing sequence numbers.
    let mut last_seqn = None;
    for _ in 0..2 {
        let rsp = upf.recv().await;
        let report = rsp.as_session_report_request().unwrap();
        assert_eq!(report.report_type, ReportType::USAR);
        let usar = &report.usage_reports[0];
        assert_eq!(usar.urr_id, 8);
        assert!(usar.trigger.contains(UsageReportTrigger::PERIO));
        if let Some(last) = last_seqn {
            assert!(usar.ur_seqn > last);
        }
        last_seqn = Some(usar.ur_seqn);

        let report_seq = report.seq;
        upf.send(&Message::SessionReportResponse(SessionReportResponse {
            seid: 0,
            seq: report_seq,
            cause: Cause::RequestAccepted,
        }))
        .await;
    }
}

#[tokio::test]
async fn test_modification_query_urr() {
    let (driver, state) = TestDriver::new();
    state.lock().unwrap().usage_volume = Some(test_volume());
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_urrs = vec![CreateUrr {
        measurement_period: None,
        reporting_triggers: ReportingTriggers::VOLTH,
        ..periodic_urr(8, 0)
    }];
    let seid = upf.establish(req).await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            query_urrs: vec![QueryUrr { urr_id: 8 }],
            ..Default::default()
        },
    ))
    .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_session_modification_response().unwrap();
    assert!(rsp.cause.accepted());
    let usar = &rsp.usage_reports[0];
    assert_eq!(usar.urr_id, 8);
    assert!(usar.trigger.contains(UsageReportTrigger::IMMER));
    assert_eq!(usar.volume_measurement.unwrap().total_volume, 100);
}

#[tokio::test]
async fn test_deletion_returns_final_usage_reports() {
    let (driver, state) = TestDriver::new();
    state.lock().unwrap().usage_volume = Some(test_volume());
    let mut upf = start_upf(Box::new(driver)).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_urrs = vec![CreateUrr {
        measurement_period: None,
        reporting_triggers: ReportingTriggers::VOLTH,
        ..periodic_urr(8, 0)
    }];
    let seid = upf.establish(req).await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionDeletionRequest(SessionDeletionRequest {
        seid,
        seq,
    }))
    .await;

    let rsp = upf.recv().await;
    let rsp = rsp.as_session_deletion_response().unwrap();
    assert!(rsp.cause.accepted());
    let usar = &rsp.usage_reports[0];
    assert_eq!(usar.urr_id, 8);
    assert!(usar.trigger.contains(UsageReportTrigger::TERMR));
}

#[tokio::test]
async fn test_report_unknown_seid_dropped() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    upf.push_reports(
        42,
        vec![Report::Usar(UsaReport {
            urr_id: 8,
            ur_seqn: 0,
            trigger: UsageReportTrigger::VOLTH,
            volume: test_volume(),
            query_urr_reference: 0,
            start_time: None,
            end_time: None,
        })],
    )
    .await;

    upf.expect_silence(Duration::from_millis(300)).await;
}

#[tokio::test]
async fn test_report_rsp_context_not_found_deletes_session() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    req.create_pdrs = vec![downlink_pdr(3, 2, vec![])];
    let seid = upf.establish(req).await;

    // Trigger a Downlink Data Report.
    upf.push_reports(
        seid,
        vec![Report::Dldr(DldReport {
            pdr_id: 3,
            apply_action: ApplyAction::NOCP,
            buffered_packet: None,
        })],
    )
    .await;
    let rsp = upf.recv().await;
    let report_seq = rsp.as_session_report_request().unwrap().seq;

    // The SMF answers with a zero SEID and "context not found": the session
    // is gone on its side, so the UPF drops it too.
    upf.send(&Message::SessionReportResponse(SessionReportResponse {
        seid: 0,
        seq: report_seq,
        cause: Cause::SessionContextNotFound,
    }))
    .await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            ..Default::default()
        },
    ))
    .await;
    let rsp = upf.recv().await;
    assert_eq!(
        rsp.as_session_modification_response().unwrap().cause,
        Cause::SessionContextNotFound
    );
}

#[tokio::test]
async fn test_association_wipe_closes_sessions() {
    let mut upf = start_upf(Box::new(Empty::default())).await;
    upf.associate().await;

    let seq = upf.next_seq();
    let seid = upf.establish(establishment_req(seq)).await;

    // A new Association Setup for the same Node ID wipes every session the
    // node owns, regardless of the recovery timestamp.
    upf.associate().await;

    let seq = upf.next_seq();
    upf.send(&Message::SessionModificationRequest(
        SessionModificationRequest {
            seid,
            seq,
            ..Default::default()
        },
    ))
    .await;
    let rsp = upf.recv().await;
    assert_eq!(
        rsp.as_session_modification_response().unwrap().cause,
        Cause::SessionContextNotFound
    );

    // The vacated slot is reused by the next establishment.
    let seq = upf.next_seq();
    assert_eq!(upf.establish(establishment_req(seq)).await, seid);
}

#[tokio::test]
async fn test_report_request_retransmission() {
    let mut upf = start_upf_with(
        Box::new(Empty::default()),
        Duration::from_millis(150),
        2,
        None,
    )
    .await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    req.create_pdrs = vec![downlink_pdr(3, 2, vec![])];
    let seid = upf.establish(req).await;

    upf.push_reports(
        seid,
        vec![Report::Dldr(DldReport {
            pdr_id: 3,
            apply_action: ApplyAction::NOCP,
            buffered_packet: None,
        })],
    )
    .await;

    // The unanswered request is retransmitted byte-identically until the
    // retry budget runs out.
    let first = upf.recv_raw().await;
    let retrans1 = upf.recv_raw().await;
    let retrans2 = upf.recv_raw().await;
    assert_eq!(first, retrans1);
    assert_eq!(first, retrans2);
    upf.expect_silence(Duration::from_millis(500)).await;
}

#[tokio::test]
async fn test_sidechan_buffered_packet() {
    let path = std::env::temp_dir()
        .join(format!("upfd-test-sidechan-{}.sock", std::process::id()));
    let mut upf = start_upf_with(
        Box::new(Empty::default()),
        Duration::from_secs(3),
        3,
        Some(path.clone()),
    )
    .await;
    upf.associate().await;

    let seq = upf.next_seq();
    let mut req = establishment_req(seq);
    req.create_fars = vec![buffering_far(2)];
    req.create_pdrs = vec![downlink_pdr(3, 2, vec![])];
    let seid = upf.establish(req).await;

    // Frame a type-1 (buffered downlink) event in the native byte order.
    let mut frame = Vec::new();
    frame.push(1u8);
    frame.extend_from_slice(&seid.to_ne_bytes());
    frame.extend_from_slice(&3u16.to_ne_bytes());
    frame.extend_from_slice(&0x0cu16.to_ne_bytes());
    frame.extend_from_slice(&[0xee, 0xbb, 0xdd, 0xcc]);

    let fwd = tokio::net::UnixDatagram::unbound().unwrap();
    fwd.send_to(&frame, &path).await.unwrap();

    let rsp = upf.recv().await;
    let report = rsp.as_session_report_request().unwrap();
    assert_eq!(report.report_type, ReportType::DLDR);
    assert_eq!(report.downlink_data_report.unwrap().pdr_id, 3);

    // Short datagrams are dropped without any report.
    fwd.send_to(&[1, 2, 3], &path).await.unwrap();
    upf.expect_silence(Duration::from_millis(300)).await;

    let _ = std::fs::remove_file(&path);
}

// ===== helper functions =====

fn forwarding_to(peer: &str, teid: u32) -> ForwardingParameters {
    ForwardingParameters {
        destination_interface: Some(DestinationInterface::Access),
        network_instance: None,
        outer_header_creation: Some(OuterHeaderCreation {
            description: OuterHeaderCreation::DESC_GTPU_UDP_IPV4,
            teid: Some(teid),
            ipv4: Some(peer.parse().unwrap()),
            ipv6: None,
            port: None,
        }),
        forwarding_policy: None,
    }
}
