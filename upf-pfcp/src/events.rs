//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;

use crate::debug::Debug;
use crate::error::Error;
use crate::master::Master;
use crate::network;
use crate::node::Node;
use crate::packet::ie::reports::{
    DownlinkDataReport, QosMonitoringMeasurement, QosMonitoringReport,
    SessionReport, UsageReport, UsageReportTrigger,
};
use crate::packet::ie::rules::ApplyAction;
use crate::packet::ie::{Cause, Fseid, IeType, NodeId, ReportType};
use crate::packet::messages::association::{
    AssociationReleaseRequest, AssociationReleaseResponse,
    AssociationSetupRequest, AssociationSetupResponse,
    AssociationUpdateRequest, AssociationUpdateResponse,
};
use crate::packet::messages::heartbeat::{HeartbeatRequest, HeartbeatResponse};
use crate::packet::messages::report::SessionReportRequest;
use crate::packet::messages::session::{
    SessionDeletionRequest, SessionDeletionResponse,
    SessionEstablishmentRequest, SessionEstablishmentResponse,
    SessionModificationRequest, SessionModificationResponse,
};
use crate::packet::{Message, MsgType};
use crate::report::{DldReport, Report, SesReport, UsaReport};
use crate::rules;
use crate::session::PushOutcome;
use crate::tasks;
use crate::tasks::messages::ProtocolInputMsg;
use crate::tasks::messages::input::TimerMsg;
use crate::transaction::{RxState, Transaction};

// SRR identifier used for QoS monitoring reports.
const QOS_MONITORING_SRR_ID: u8 = 1;

// ===== event dispatch =====

pub(crate) async fn process_protocol_msg(
    master: &mut Master,
    msg: ProtocolInputMsg,
) -> Result<(), Error> {
    match msg {
        // Received PFCP message.
        ProtocolInputMsg::UdpRxPacket(msg) => {
            process_udp_packet(master, msg.src, msg.msg).await
        }
        // Report pushed up by the forwarder.
        ProtocolInputMsg::SessReport(msg) => {
            process_sess_report(master, msg.seid, msg.reports).await
        }
        // Timer expiration.
        ProtocolInputMsg::Timer(msg) => process_timer_msg(master, msg).await,
    }
}

// ===== ingress datagrams =====

async fn process_udp_packet(
    master: &mut Master,
    src: SocketAddr,
    msg: Message,
) -> Result<(), Error> {
    Debug::MsgRx(&src, msg.msg_type(), msg.seq()).log();

    if msg.msg_type().is_request() {
        process_request(master, src, msg).await
    } else {
        process_response(master, src, msg).await
    }
}

async fn process_request(
    master: &mut Master,
    src: SocketAddr,
    msg: Message,
) -> Result<(), Error> {
    let seq = msg.seq();

    // Duplicate suppression: a request whose response is cached is answered
    // with the exact bytes previously sent, without re-executing the handler.
    let transaction = master
        .transactions
        .entry(src)
        .or_insert_with(|| Transaction::new(src));
    match transaction.rx_recv(seq) {
        RxState::Replay(rsp_buf) => {
            Debug::MsgDupRx(&src, seq).log();
            network::send_raw(&master.socket, src, &rsp_buf).await?;
            return Ok(());
        }
        RxState::Pending => return Ok(()),
        RxState::New => (),
    }

    let result = match msg {
        Message::HeartbeatRequest(req) => {
            Ok(Some(handle_heartbeat(master, req)))
        }
        Message::AssociationSetupRequest(req) => {
            handle_association_setup(master, src, req)
        }
        Message::AssociationUpdateRequest(req) => {
            Ok(Some(handle_association_update(master, req)))
        }
        Message::AssociationReleaseRequest(req) => {
            Ok(Some(handle_association_release(master, req)))
        }
        Message::SessionEstablishmentRequest(req) => {
            handle_session_establishment(master, src, req)
        }
        Message::SessionModificationRequest(req) => {
            handle_session_modification(master, src, req)
        }
        Message::SessionDeletionRequest(req) => {
            handle_session_deletion(master, req)
        }
        // The UPF side never serves Session Report Requests.
        _ => Ok(None),
    };

    match result {
        Ok(Some(rsp)) => master.send_response(src, &rsp).await,
        other => {
            // No response was produced: forget the pending Rx entry so a
            // retransmission of the request is dispatched again.
            if let Some(transaction) = master.transactions.get_mut(&src) {
                transaction.rx_remove(seq);
            }
            other.map(|_| ())
        }
    }
}

async fn process_response(
    master: &mut Master,
    src: SocketAddr,
    msg: Message,
) -> Result<(), Error> {
    let msg_type = msg.msg_type();
    let seq = msg.seq();

    let Some(transaction) = master.transactions.get_mut(&src) else {
        return Err(Error::UnmatchedResponse(msg_type, seq));
    };
    let Some(entry) = transaction.tx_remove(seq) else {
        return Err(Error::UnmatchedResponse(msg_type, seq));
    };

    // A Session Report Response with a zero SEID and "Session Context Not
    // Found" means the SMF has lost this session; drop it locally. Any other
    // response needs no further work, the transaction match was the point.
    if let Message::SessionReportResponse(rsp) = &msg
        && rsp.seid == 0
        && rsp.cause == Cause::SessionContextNotFound
        && let Some(ctx_lseid) = entry.ctx_lseid
    {
        delete_session_local(master, ctx_lseid);
    }

    if let Some(waiter) = entry.waiter {
        let _ = waiter.send(Ok(msg));
    }
    Ok(())
}

// ===== node handlers =====

fn handle_heartbeat(master: &Master, req: HeartbeatRequest) -> Message {
    Message::HeartbeatResponse(HeartbeatResponse {
        seq: req.seq,
        recovery_time_stamp: master.recovery_time,
    })
}

fn handle_association_setup(
    master: &mut Master,
    src: SocketAddr,
    req: AssociationSetupRequest,
) -> Result<Option<Message>, Error> {
    let node_key = req.node_id.to_string();

    // An existing association for this Node ID is wiped together with all of
    // its sessions, regardless of the Recovery Timestamp.
    if let Some(node) = master.nodes.remove(&node_key) {
        Debug::NodeDelete(&node.id).log();
        for seid in &node.seids {
            if let Some(mut sess) = master.sessions.remove(*seid) {
                rules::close_session(
                    &mut sess,
                    master.driver.as_mut(),
                    &master.timers,
                );
            }
        }
        if node.raddr != src {
            master.transactions.remove(&node.raddr);
        }
    }

    let node = Node::new(req.node_id.clone(), src);
    Debug::NodeCreate(&node.id).log();
    master.nodes.insert(node_key, node);

    Ok(Some(Message::AssociationSetupResponse(
        AssociationSetupResponse {
            seq: req.seq,
            node_id: master.node_id(),
            cause: Cause::RequestAccepted,
            recovery_time_stamp: Some(master.recovery_time),
        },
    )))
}

fn handle_association_update(
    master: &Master,
    req: AssociationUpdateRequest,
) -> Message {
    // Acknowledge-only.
    Message::AssociationUpdateResponse(AssociationUpdateResponse {
        seq: req.seq,
        node_id: master.node_id(),
        cause: Cause::RequestAccepted,
    })
}

fn handle_association_release(
    master: &Master,
    req: AssociationReleaseRequest,
) -> Message {
    // Acknowledge-only.
    Message::AssociationReleaseResponse(AssociationReleaseResponse {
        seq: req.seq,
        node_id: master.node_id(),
        cause: Cause::RequestAccepted,
    })
}

// ===== session handlers =====

fn handle_session_establishment(
    master: &mut Master,
    src: SocketAddr,
    req: SessionEstablishmentRequest,
) -> Result<Option<Message>, Error> {
    let node_id = req.node_id.clone().ok_or(Error::MissingMandatoryIe(
        MsgType::SessionEstablishmentRequest,
        IeType::NodeId,
    ))?;
    let fseid = req.fseid.ok_or(Error::MissingMandatoryIe(
        MsgType::SessionEstablishmentRequest,
        IeType::Fseid,
    ))?;

    // Sessions can only be established under an existing association.
    let node_key = node_id.to_string();
    if !master.nodes.contains_key(&node_key) {
        Error::NodeNotFound(node_id).log();
        return Ok(Some(Message::SessionEstablishmentResponse(
            SessionEstablishmentResponse {
                seid: fseid.seid,
                seq: req.seq,
                node_id: master.node_id(),
                cause: Cause::NoEstablishedPfcpAssociation,
                fseid: None,
            },
        )));
    }

    // Allocate a session under the node.
    let sess = master.sessions.insert(fseid.seid, node_id);
    let local_seid = sess.local_seid;
    let node = master.nodes.get_mut(&node_key).unwrap();
    node.raddr = src;
    node.seids.insert(local_seid);

    // Apply the Create IEs, PDRs last so they can reference sibling rules.
    // A failing rule is skipped, the rest of the request still applies.
    let Master {
        sessions,
        driver,
        timers,
        ..
    } = &mut *master;
    let sess = sessions.get_mut(local_seid).unwrap();
    let driver = driver.as_mut();
    for far in req.create_fars {
        if let Err(error) = rules::create_far(sess, driver, far) {
            error.log();
        }
    }
    for qer in req.create_qers {
        if let Err(error) = rules::create_qer(sess, driver, qer) {
            error.log();
        }
    }
    for urr in req.create_urrs {
        if let Err(error) = rules::create_urr(sess, driver, timers, urr) {
            error.log();
        }
    }
    for bar in req.create_bars {
        if let Err(error) = rules::create_bar(sess, driver, bar) {
            error.log();
        }
    }
    for pdr in req.create_pdrs {
        if let Err(error) = rules::create_pdr(sess, driver, pdr) {
            error.log();
        }
    }

    Ok(Some(Message::SessionEstablishmentResponse(
        SessionEstablishmentResponse {
            seid: fseid.seid,
            seq: req.seq,
            node_id: master.node_id(),
            cause: Cause::RequestAccepted,
            fseid: Some(Fseid::new(local_seid, master.node_ipv4(), None)),
        },
    )))
}

fn handle_session_modification(
    master: &mut Master,
    src: SocketAddr,
    req: SessionModificationRequest,
) -> Result<Option<Message>, Error> {
    let local_seid = req.seid;
    if master.sessions.get(local_seid).is_none() {
        Error::SessionNotFound(local_seid).log();
        return Ok(Some(Message::SessionModificationResponse(
            SessionModificationResponse {
                seid: 0,
                seq: req.seq,
                cause: Cause::SessionContextNotFound,
                usage_reports: Vec::new(),
            },
        )));
    }

    // An SMF-set handoff carries a Node ID: rebind the session to it.
    if let Some(new_node_id) = req.node_id.clone() {
        rebind_session_node(master, local_seid, new_node_id, src);
    }

    let Master {
        sessions,
        driver,
        timers,
        ..
    } = &mut *master;
    let sess = sessions.get_mut(local_seid).unwrap();
    let driver = driver.as_mut();

    for far in req.create_fars {
        if let Err(error) = rules::create_far(sess, driver, far) {
            error.log();
        }
    }
    for qer in req.create_qers {
        if let Err(error) = rules::create_qer(sess, driver, qer) {
            error.log();
        }
    }
    for urr in req.create_urrs {
        if let Err(error) = rules::create_urr(sess, driver, timers, urr) {
            error.log();
        }
    }
    for bar in req.create_bars {
        if let Err(error) = rules::create_bar(sess, driver, bar) {
            error.log();
        }
    }
    for pdr in req.create_pdrs {
        if let Err(error) = rules::create_pdr(sess, driver, pdr) {
            error.log();
        }
    }

    // Usage reports produced by Remove-URR, Update-URR and Query-URR all end
    // up in the response.
    let mut usage_reports: Vec<UsageReport> = Vec::new();

    for far_id in req.remove_fars {
        if let Err(error) = rules::remove_far(sess, driver, far_id) {
            error.log();
        }
    }
    for qer_id in req.remove_qers {
        if let Err(error) = rules::remove_qer(sess, driver, qer_id) {
            error.log();
        }
    }
    for urr_id in req.remove_urrs {
        match rules::remove_urr(sess, driver, timers, urr_id) {
            Ok(reports) => usage_reports.extend(reports),
            Err(error) => error.log(),
        }
    }
    for bar_id in req.remove_bars {
        if let Err(error) = rules::remove_bar(sess, driver, bar_id) {
            error.log();
        }
    }
    for pdr_id in req.remove_pdrs {
        if let Err(error) = rules::remove_pdr(sess, driver, pdr_id) {
            error.log();
        }
    }

    for far in req.update_fars {
        if let Err(error) = rules::update_far(sess, driver, far) {
            error.log();
        }
    }
    for qer in req.update_qers {
        if let Err(error) = rules::update_qer(sess, driver, qer) {
            error.log();
        }
    }
    for urr in req.update_urrs {
        match rules::update_urr(sess, driver, timers, urr) {
            Ok(reports) => usage_reports.extend(
                reports.into_iter().map(|usar| usar.into_ie(sess)),
            ),
            Err(error) => error.log(),
        }
    }
    for bar in req.update_bars {
        if let Err(error) = rules::update_bar(sess, driver, bar) {
            error.log();
        }
    }
    for pdr in req.update_pdrs {
        if let Err(error) = rules::update_pdr(sess, driver, pdr) {
            error.log();
        }
    }

    for query in req.query_urrs {
        match rules::query_urr(sess, driver, query.urr_id) {
            Ok(reports) => usage_reports.extend(
                reports.into_iter().map(|usar| usar.into_ie(sess)),
            ),
            Err(error) => error.log(),
        }
    }

    Ok(Some(Message::SessionModificationResponse(
        SessionModificationResponse {
            seid: sess.remote_seid,
            seq: req.seq,
            cause: Cause::RequestAccepted,
            usage_reports,
        },
    )))
}

fn handle_session_deletion(
    master: &mut Master,
    req: SessionDeletionRequest,
) -> Result<Option<Message>, Error> {
    let local_seid = req.seid;
    let Some(mut sess) = master.sessions.remove(local_seid) else {
        Error::SessionNotFound(local_seid).log();
        return Ok(Some(Message::SessionDeletionResponse(
            SessionDeletionResponse {
                seid: 0,
                seq: req.seq,
                cause: Cause::SessionContextNotFound,
                usage_reports: Vec::new(),
            },
        )));
    };

    // Tear down all rules, collecting the final usage report of every URR.
    let usage_reports = rules::close_session(
        &mut sess,
        master.driver.as_mut(),
        &master.timers,
    );
    if let Some(node) = master.nodes.get_mut(&sess.node_id.to_string()) {
        node.seids.remove(&local_seid);
    }

    Ok(Some(Message::SessionDeletionResponse(
        SessionDeletionResponse {
            seid: sess.remote_seid,
            seq: req.seq,
            cause: Cause::RequestAccepted,
            usage_reports,
        },
    )))
}

// ===== forwarder reports =====

async fn process_sess_report(
    master: &mut Master,
    seid: u64,
    reports: Vec<Report>,
) -> Result<(), Error> {
    // Reports racing with session deletion are dropped silently.
    if master.sessions.get(seid).is_none() {
        trace!(local_seid = %seid, "report for unknown session dropped");
        return Ok(());
    }

    let mut usars: Vec<UsaReport> = Vec::new();
    for report in reports {
        match report {
            Report::Dldr(dldr) => {
                process_dldr_report(master, seid, dldr).await?;
            }
            Report::Usar(usar) => {
                usars.push(usar);
            }
            Report::Sesr(sesr) => {
                process_sesr_report(master, seid, sesr).await?;
            }
        }
    }

    // All usage reports of one side-channel event go out as one request.
    if !usars.is_empty() {
        let sess = master.sessions.get_mut(seid).unwrap();
        let usage_reports = usars
            .into_iter()
            .map(|usar| usar.into_ie(sess))
            .collect::<Vec<_>>();
        send_session_report(
            master,
            seid,
            ReportType::USAR,
            None,
            usage_reports,
            Vec::new(),
        )
        .await?;
    }

    Ok(())
}

async fn process_dldr_report(
    master: &mut Master,
    seid: u64,
    dldr: DldReport,
) -> Result<(), Error> {
    let action = dldr.apply_action;

    // Push the packet into the PDR's bounded queue. The control plane is
    // notified at the empty-to-nonempty transition, not per packet.
    let mut notify = action.contains(ApplyAction::NOCP);
    if let Some(pkt) = dldr.buffered_packet
        && action.contains(ApplyAction::BUFF)
    {
        let max_len = master.config.buffer_queue_len;
        let sess = master.sessions.get_mut(seid).unwrap();
        match sess.push_buffered(dldr.pdr_id, pkt, max_len) {
            PushOutcome::FirstPacket => {
                Debug::PacketBuffered(seid, dldr.pdr_id, 1).log();
            }
            PushOutcome::Queued => {
                let queue_len = sess.buffered_len(dldr.pdr_id);
                Debug::PacketBuffered(seid, dldr.pdr_id, queue_len).log();
                notify = false;
            }
            PushOutcome::Dropped => {
                Debug::PacketDropped(seid, dldr.pdr_id).log();
                notify = false;
            }
        }
    }

    if notify {
        send_session_report(
            master,
            seid,
            ReportType::DLDR,
            Some(DownlinkDataReport {
                pdr_id: dldr.pdr_id,
            }),
            Vec::new(),
            Vec::new(),
        )
        .await?;
    }
    Ok(())
}

async fn process_sesr_report(
    master: &mut Master,
    seid: u64,
    sesr: SesReport,
) -> Result<(), Error> {
    let session_report = SessionReport {
        srr_id: QOS_MONITORING_SRR_ID,
        qos_monitoring_report: Some(QosMonitoringReport {
            qfi: sesr.qfi,
            measurement: QosMonitoringMeasurement {
                downlink_delay: Some(sesr.packet_delay),
                uplink_delay: None,
                round_trip_delay: None,
            },
            event_time_stamp: sesr.event_time,
            start_time: Some(sesr.start_time),
        }),
    };
    send_session_report(
        master,
        seid,
        ReportType::SESR,
        None,
        Vec::new(),
        vec![session_report],
    )
    .await
}

// Builds a Session Report Request for the session and sends it to its node's
// PFCP address. The response is not awaited on the event loop; a detached
// task logs the outcome.
async fn send_session_report(
    master: &mut Master,
    local_seid: u64,
    report_type: ReportType,
    downlink_data_report: Option<DownlinkDataReport>,
    usage_reports: Vec<UsageReport>,
    session_reports: Vec<SessionReport>,
) -> Result<(), Error> {
    let sess = master
        .sessions
        .get(local_seid)
        .ok_or(Error::SessionNotFound(local_seid))?;
    let remote_seid = sess.remote_seid;
    let node_key = sess.node_id.to_string();
    let node = master
        .nodes
        .get(&node_key)
        .ok_or_else(|| Error::NodeNotFound(sess.node_id.clone()))?;
    let raddr = node.raddr;

    Debug::ReportDispatch(local_seid, report_type_name(report_type)).log();

    let msg = Message::SessionReportRequest(SessionReportRequest {
        seid: remote_seid,
        seq: 0,
        report_type,
        downlink_data_report,
        usage_reports,
        session_reports,
    });
    let (waiter_tx, waiter_rx) = oneshot::channel();
    master
        .send_request(raddr, msg, Some(local_seid), Some(waiter_tx))
        .await?;
    tasks::response_logger(waiter_rx);
    Ok(())
}

// ===== timer events =====

async fn process_timer_msg(
    master: &mut Master,
    msg: TimerMsg,
) -> Result<(), Error> {
    match msg {
        TimerMsg::PerioTimeout { period } => {
            process_perio_timeout(master, period).await
        }
        TimerMsg::ExpiryTimeout { seid, urr_id } => {
            process_expiry_timeout(master, seid, urr_id).await
        }
        TimerMsg::ReqTimeout { raddr, seq } => {
            process_req_timeout(master, raddr, seq).await
        }
        TimerMsg::RxExpire { raddr, seq } => {
            if let Some(transaction) = master.transactions.get_mut(&raddr) {
                transaction.rx_remove(seq);
                if transaction.is_empty() {
                    master.transactions.remove(&raddr);
                }
            }
            Ok(())
        }
    }
}

async fn process_perio_timeout(
    master: &mut Master,
    period: Duration,
) -> Result<(), Error> {
    Debug::PerioTimeout(&period).log();

    // The session store is authoritative for which URRs measure with this
    // period.
    let period_secs = period.as_secs() as u32;
    let affected = master
        .sessions
        .iter()
        .filter_map(|sess| {
            let urr_ids = sess
                .urrs
                .iter()
                .filter(|(_, urr)| {
                    urr.measurement_period == Some(period_secs)
                })
                .map(|(urr_id, _)| *urr_id)
                .collect::<Vec<_>>();
            (!urr_ids.is_empty()).then_some((sess.local_seid, urr_ids))
        })
        .collect::<Vec<_>>();

    for (seid, urr_ids) in affected {
        let mut usage_reports = Vec::new();
        {
            let Master {
                sessions, driver, ..
            } = &mut *master;
            let sess = sessions.get_mut(seid).unwrap();
            for urr_id in urr_ids {
                match driver.query_urr(seid, urr_id) {
                    Ok(reports) => {
                        for mut usar in reports {
                            usar.trigger |= UsageReportTrigger::PERIO;
                            usage_reports.push(usar.into_ie(sess));
                        }
                    }
                    Err(error) => {
                        Error::Driver("query-urr", error).log();
                    }
                }
            }
        }
        if usage_reports.is_empty() {
            continue;
        }
        if let Err(error) = send_session_report(
            master,
            seid,
            ReportType::USAR,
            None,
            usage_reports,
            Vec::new(),
        )
        .await
        {
            error.log();
        }
    }
    Ok(())
}

async fn process_expiry_timeout(
    master: &mut Master,
    seid: u64,
    urr_id: u32,
) -> Result<(), Error> {
    Debug::ExpiryTimeout(seid, urr_id).log();

    // The one-shot has fired; drop the timer service's entry.
    master.timers.del_expiry(seid, urr_id);

    let mut usage_reports = Vec::new();
    {
        let Master {
            sessions, driver, ..
        } = &mut *master;
        let Some(sess) = sessions.get_mut(seid) else {
            return Ok(());
        };
        match driver.query_urr(seid, urr_id) {
            Ok(reports) => {
                for mut usar in reports {
                    usar.trigger |= UsageReportTrigger::QUVTI;
                    usage_reports.push(usar.into_ie(sess));
                }
            }
            Err(error) => {
                Error::Driver("query-urr", error).log();
            }
        }
    }
    if usage_reports.is_empty() {
        return Ok(());
    }
    send_session_report(
        master,
        seid,
        ReportType::USAR,
        None,
        usage_reports,
        Vec::new(),
    )
    .await
}

async fn process_req_timeout(
    master: &mut Master,
    raddr: SocketAddr,
    seq: u32,
) -> Result<(), Error> {
    let Some(transaction) = master.transactions.get_mut(&raddr) else {
        return Ok(());
    };
    let Some(entry) = transaction.tx_get_mut(seq) else {
        return Ok(());
    };

    if entry.retry < master.config.max_retrans {
        // Retransmit and rearm the timer.
        entry.retry += 1;
        Debug::MsgRetransTx(&raddr, seq, entry.retry).log();
        network::send_raw(&master.socket, raddr, &entry.msg_buf).await?;
        entry.timer = tasks::req_timeout_timer(
            raddr,
            seq,
            master.config.retrans_timeout,
            &master.tx.timer,
        );
    } else {
        // Retry budget exhausted: drop the entry and notify the waiter.
        let entry = transaction.tx_remove(seq).unwrap();
        Error::ReqTimeout(raddr, seq).log();
        if let Some(waiter) = entry.waiter {
            let _ = waiter.send(Err(Error::ReqTimeout(raddr, seq)));
        }
    }
    Ok(())
}

// ===== helper functions =====

// Moves the session from its current node to the one the SMF named.
fn rebind_session_node(
    master: &mut Master,
    local_seid: u64,
    new_node_id: NodeId,
    src: SocketAddr,
) {
    let sess = master.sessions.get_mut(local_seid).unwrap();
    let old_key = sess.node_id.to_string();
    let new_key = new_node_id.to_string();
    if old_key == new_key {
        return;
    }

    sess.node_id = new_node_id.clone();
    if let Some(old_node) = master.nodes.get_mut(&old_key) {
        old_node.seids.remove(&local_seid);
    }
    let node = master.nodes.entry(new_key).or_insert_with(|| {
        Debug::NodeCreate(&new_node_id).log();
        Node::new(new_node_id, src)
    });
    node.seids.insert(local_seid);
}

// Deletes a session the SMF no longer knows about.
fn delete_session_local(master: &mut Master, local_seid: u64) {
    if let Some(mut sess) = master.sessions.remove(local_seid) {
        let Master {
            driver,
            timers,
            nodes,
            ..
        } = &mut *master;
        rules::close_session(&mut sess, driver.as_mut(), timers);
        if let Some(node) = nodes.get_mut(&sess.node_id.to_string()) {
            node.seids.remove(&local_seid);
        }
    }
}

fn report_type_name(report_type: ReportType) -> &'static str {
    if report_type.contains(ReportType::DLDR) {
        "DLDR"
    } else if report_type.contains(ReportType::USAR) {
        "USAR"
    } else if report_type.contains(ReportType::SESR) {
        "SESR"
    } else {
        "other"
    }
}
