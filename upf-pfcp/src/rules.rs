//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tracing::trace;

use crate::debug::Debug;
use crate::error::Error;
use crate::forwarder::Driver;
use crate::gtpu;
use crate::packet::ie::IeType;
use crate::packet::ie::reports::{UsageReport, UsageReportTrigger};
use crate::packet::ie::rules::{
    ApplyAction, CreateBar, CreateFar, CreatePdr, CreateQer, CreateUrr,
    UpdateBar, UpdateFar, UpdatePdr, UpdateQer, UpdateUrr,
};
use crate::report::UsaReport;
use crate::session::{
    BarInfo, FarInfo, PdrInfo, QerInfo, Session, UrrInfo,
};
use crate::tasks::TimerClient;

//
// Rule engine.
//
// Each operation follows the same contract: the rule parameters are handed to
// the forwarder driver, and on success the session's authoritative rule
// record is updated to match. A driver failure leaves the record untouched,
// so the ID sets always reflect what the driver accepted.
//

// ===== PDR =====

pub(crate) fn create_pdr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    pdr: CreatePdr,
) -> Result<(), Error> {
    check_pdr_references(
        sess,
        pdr.pdr_id,
        pdr.far_id,
        &pdr.qer_ids,
        &pdr.urr_ids,
    )?;

    driver
        .create_pdr(sess.local_seid, &pdr)
        .map_err(|error| Error::Driver("create-pdr", error))?;

    sess.pdrs.insert(
        pdr.pdr_id,
        PdrInfo {
            precedence: pdr.precedence,
            pdi: pdr.pdi,
            outer_header_removal: pdr.outer_header_removal,
            far_id: pdr.far_id,
            qer_ids: pdr.qer_ids,
            urr_ids: pdr.urr_ids,
        },
    );
    Ok(())
}

pub(crate) fn update_pdr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    pdr: UpdatePdr,
) -> Result<(), Error> {
    if !sess.pdrs.contains_key(&pdr.pdr_id) {
        return Err(Error::RuleNotFound(IeType::PdrId, pdr.pdr_id as u32));
    }
    check_pdr_references(
        sess,
        pdr.pdr_id,
        pdr.far_id,
        &pdr.qer_ids,
        &pdr.urr_ids,
    )?;

    driver
        .update_pdr(sess.local_seid, &pdr)
        .map_err(|error| Error::Driver("update-pdr", error))?;

    let info = sess.pdrs.get_mut(&pdr.pdr_id).unwrap();
    if pdr.precedence.is_some() {
        info.precedence = pdr.precedence;
    }
    if pdr.pdi.is_some() {
        info.pdi = pdr.pdi;
    }
    if pdr.outer_header_removal.is_some() {
        info.outer_header_removal = pdr.outer_header_removal;
    }
    if pdr.far_id.is_some() {
        info.far_id = pdr.far_id;
    }
    if !pdr.qer_ids.is_empty() {
        info.qer_ids = pdr.qer_ids;
    }
    if !pdr.urr_ids.is_empty() {
        info.urr_ids = pdr.urr_ids;
    }
    Ok(())
}

pub(crate) fn remove_pdr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    pdr_id: u16,
) -> Result<(), Error> {
    driver
        .remove_pdr(sess.local_seid, pdr_id)
        .map_err(|error| Error::Driver("remove-pdr", error))?;

    sess.pdrs.remove(&pdr_id);
    // The buffer queue of a removed PDR goes with it.
    sess.buffers.remove(&pdr_id);
    Ok(())
}

// ===== FAR =====

pub(crate) fn create_far(
    sess: &mut Session,
    driver: &mut dyn Driver,
    far: CreateFar,
) -> Result<(), Error> {
    driver
        .create_far(sess.local_seid, &far)
        .map_err(|error| Error::Driver("create-far", error))?;

    sess.fars.insert(
        far.far_id,
        FarInfo {
            apply_action: far.apply_action,
            forwarding_parameters: far.forwarding_parameters,
            bar_id: far.bar_id,
        },
    );
    Ok(())
}

pub(crate) fn update_far(
    sess: &mut Session,
    driver: &mut dyn Driver,
    far: UpdateFar,
) -> Result<(), Error> {
    let Some(info) = sess.fars.get(&far.far_id) else {
        return Err(Error::RuleNotFound(IeType::FarId, far.far_id));
    };
    let old_action = info.apply_action;

    driver
        .update_far(sess.local_seid, &far)
        .map_err(|error| Error::Driver("update-far", error))?;

    let info = sess.fars.get_mut(&far.far_id).unwrap();
    if let Some(apply_action) = far.apply_action {
        info.apply_action = apply_action;
    }
    if far.update_forwarding_parameters.is_some() {
        info.forwarding_parameters = far.update_forwarding_parameters;
    }
    if far.bar_id.is_some() {
        info.bar_id = far.bar_id;
    }

    // Leaving the buffering state empties the queues of every PDR that
    // references this FAR.
    if let Some(new_action) = far.apply_action
        && old_action.contains(ApplyAction::BUFF)
        && !new_action.contains(ApplyAction::BUFF)
    {
        apply_action_transition(sess, driver, far.far_id, new_action);
    }
    Ok(())
}

pub(crate) fn remove_far(
    sess: &mut Session,
    driver: &mut dyn Driver,
    far_id: u32,
) -> Result<(), Error> {
    driver
        .remove_far(sess.local_seid, far_id)
        .map_err(|error| Error::Driver("remove-far", error))?;

    sess.fars.remove(&far_id);
    Ok(())
}

// ===== QER =====

pub(crate) fn create_qer(
    sess: &mut Session,
    driver: &mut dyn Driver,
    qer: CreateQer,
) -> Result<(), Error> {
    driver
        .create_qer(sess.local_seid, &qer)
        .map_err(|error| Error::Driver("create-qer", error))?;

    sess.qers.insert(
        qer.qer_id,
        QerInfo {
            correlation_id: qer.correlation_id,
            gate_status: qer.gate_status,
            mbr: qer.mbr,
            gbr: qer.gbr,
            qfi: qer.qfi,
            rqi: qer.rqi,
            paging_policy_indicator: qer.paging_policy_indicator,
        },
    );
    Ok(())
}

pub(crate) fn update_qer(
    sess: &mut Session,
    driver: &mut dyn Driver,
    qer: UpdateQer,
) -> Result<(), Error> {
    if !sess.qers.contains_key(&qer.qer_id) {
        return Err(Error::RuleNotFound(IeType::QerId, qer.qer_id));
    }

    driver
        .update_qer(sess.local_seid, &qer)
        .map_err(|error| Error::Driver("update-qer", error))?;

    let info = sess.qers.get_mut(&qer.qer_id).unwrap();
    if qer.correlation_id.is_some() {
        info.correlation_id = qer.correlation_id;
    }
    if qer.gate_status.is_some() {
        info.gate_status = qer.gate_status;
    }
    if qer.mbr.is_some() {
        info.mbr = qer.mbr;
    }
    if qer.gbr.is_some() {
        info.gbr = qer.gbr;
    }
    if qer.qfi.is_some() {
        info.qfi = qer.qfi;
    }
    if qer.rqi.is_some() {
        info.rqi = qer.rqi;
    }
    if qer.paging_policy_indicator.is_some() {
        info.paging_policy_indicator = qer.paging_policy_indicator;
    }
    Ok(())
}

pub(crate) fn remove_qer(
    sess: &mut Session,
    driver: &mut dyn Driver,
    qer_id: u32,
) -> Result<(), Error> {
    driver
        .remove_qer(sess.local_seid, qer_id)
        .map_err(|error| Error::Driver("remove-qer", error))?;

    sess.qers.remove(&qer_id);
    Ok(())
}

// ===== URR =====

pub(crate) fn create_urr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    timers: &TimerClient,
    urr: CreateUrr,
) -> Result<(), Error> {
    driver
        .create_urr(sess.local_seid, &urr)
        .map_err(|error| Error::Driver("create-urr", error))?;

    if let Some(period) = urr.measurement_period {
        timers.add_periodic(
            sess.local_seid,
            urr.urr_id,
            Duration::from_secs(period as u64),
        );
    }
    if let Some(validity) = urr.quota_validity_time {
        timers.add_expiry(
            sess.local_seid,
            urr.urr_id,
            Duration::from_secs(validity as u64),
        );
    }

    sess.urrs.insert(
        urr.urr_id,
        UrrInfo {
            measurement_method: urr.measurement_method,
            reporting_triggers: urr.reporting_triggers,
            measurement_period: urr.measurement_period,
            volume_threshold: urr.volume_threshold,
            volume_quota: urr.volume_quota,
            time_threshold: urr.time_threshold,
            time_quota: urr.time_quota,
            quota_validity_time: urr.quota_validity_time,
            measurement_information: urr.measurement_information,
            ur_seqn: 0,
        },
    );
    Ok(())
}

pub(crate) fn update_urr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    timers: &TimerClient,
    urr: UpdateUrr,
) -> Result<Vec<UsaReport>, Error> {
    if !sess.urrs.contains_key(&urr.urr_id) {
        return Err(Error::RuleNotFound(IeType::UrrId, urr.urr_id));
    }

    let reports = driver
        .update_urr(sess.local_seid, &urr)
        .map_err(|error| Error::Driver("update-urr", error))?;

    // A changed measurement period moves the URR to another periodic group.
    if let Some(period) = urr.measurement_period {
        timers.del_periodic(sess.local_seid, urr.urr_id);
        timers.add_periodic(
            sess.local_seid,
            urr.urr_id,
            Duration::from_secs(period as u64),
        );
    }
    if let Some(validity) = urr.quota_validity_time {
        timers.add_expiry(
            sess.local_seid,
            urr.urr_id,
            Duration::from_secs(validity as u64),
        );
    }

    let info = sess.urrs.get_mut(&urr.urr_id).unwrap();
    if let Some(method) = urr.measurement_method {
        info.measurement_method = method;
    }
    if let Some(triggers) = urr.reporting_triggers {
        info.reporting_triggers = triggers;
    }
    if urr.measurement_period.is_some() {
        info.measurement_period = urr.measurement_period;
    }
    if urr.volume_threshold.is_some() {
        info.volume_threshold = urr.volume_threshold;
    }
    if urr.volume_quota.is_some() {
        info.volume_quota = urr.volume_quota;
    }
    if urr.time_threshold.is_some() {
        info.time_threshold = urr.time_threshold;
    }
    if urr.time_quota.is_some() {
        info.time_quota = urr.time_quota;
    }
    if urr.quota_validity_time.is_some() {
        info.quota_validity_time = urr.quota_validity_time;
    }
    if urr.measurement_information.is_some() {
        info.measurement_information = urr.measurement_information;
    }
    Ok(reports)
}

// Removes the URR, returning its final usage report in wire form. The
// conversion happens before the rule record is dropped, while the sequence
// counter and measurement parameters are still around.
pub(crate) fn remove_urr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    timers: &TimerClient,
    urr_id: u32,
) -> Result<Vec<UsageReport>, Error> {
    let reports = driver
        .remove_urr(sess.local_seid, urr_id)
        .map_err(|error| Error::Driver("remove-urr", error))?;
    let mut final_reports = Vec::with_capacity(reports.len());
    for mut usar in reports {
        usar.trigger |= UsageReportTrigger::TERMR;
        final_reports.push(usar.into_ie(sess));
    }

    timers.del_periodic(sess.local_seid, urr_id);
    timers.del_expiry(sess.local_seid, urr_id);
    sess.urrs.remove(&urr_id);
    Ok(final_reports)
}

// Fetches current usage counters on behalf of a Query URR operation.
pub(crate) fn query_urr(
    sess: &mut Session,
    driver: &mut dyn Driver,
    urr_id: u32,
) -> Result<Vec<UsaReport>, Error> {
    if !sess.urrs.contains_key(&urr_id) {
        return Err(Error::RuleNotFound(IeType::UrrId, urr_id));
    }

    let mut reports = driver
        .query_urr(sess.local_seid, urr_id)
        .map_err(|error| Error::Driver("query-urr", error))?;
    for report in &mut reports {
        report.trigger |= UsageReportTrigger::IMMER;
    }
    Ok(reports)
}

// ===== BAR =====

pub(crate) fn create_bar(
    sess: &mut Session,
    driver: &mut dyn Driver,
    bar: CreateBar,
) -> Result<(), Error> {
    driver
        .create_bar(sess.local_seid, &bar)
        .map_err(|error| Error::Driver("create-bar", error))?;

    sess.bars.insert(
        bar.bar_id,
        BarInfo {
            ddn_delay: bar.ddn_delay,
            suggested_buffering_packets: bar.suggested_buffering_packets,
        },
    );
    Ok(())
}

pub(crate) fn update_bar(
    sess: &mut Session,
    driver: &mut dyn Driver,
    bar: UpdateBar,
) -> Result<(), Error> {
    if !sess.bars.contains_key(&bar.bar_id) {
        return Err(Error::RuleNotFound(IeType::BarId, bar.bar_id as u32));
    }

    driver
        .update_bar(sess.local_seid, &bar)
        .map_err(|error| Error::Driver("update-bar", error))?;

    let info = sess.bars.get_mut(&bar.bar_id).unwrap();
    if bar.ddn_delay.is_some() {
        info.ddn_delay = bar.ddn_delay;
    }
    if bar.suggested_buffering_packets.is_some() {
        info.suggested_buffering_packets = bar.suggested_buffering_packets;
    }
    Ok(())
}

pub(crate) fn remove_bar(
    sess: &mut Session,
    driver: &mut dyn Driver,
    bar_id: u8,
) -> Result<(), Error> {
    driver
        .remove_bar(sess.local_seid, bar_id)
        .map_err(|error| Error::Driver("remove-bar", error))?;

    sess.bars.remove(&bar_id);
    Ok(())
}

// ===== session teardown =====

// Removes every rule of the session in reverse creation order, so dependents
// vanish before their dependencies. Final usage reports of the removed URRs
// are collected for the caller.
pub(crate) fn close_session(
    sess: &mut Session,
    driver: &mut dyn Driver,
    timers: &TimerClient,
) -> Vec<UsageReport> {
    let mut reports = Vec::new();

    let pdr_ids = sess.pdrs.keys().copied().collect::<Vec<_>>();
    for pdr_id in pdr_ids {
        if let Err(error) = remove_pdr(sess, driver, pdr_id) {
            error.log();
        }
    }
    let bar_ids = sess.bars.keys().copied().collect::<Vec<_>>();
    for bar_id in bar_ids {
        if let Err(error) = remove_bar(sess, driver, bar_id) {
            error.log();
        }
    }
    let urr_ids = sess.urrs.keys().copied().collect::<Vec<_>>();
    for urr_id in urr_ids {
        match remove_urr(sess, driver, timers, urr_id) {
            Ok(urr_reports) => reports.extend(urr_reports),
            Err(error) => error.log(),
        }
    }
    let qer_ids = sess.qers.keys().copied().collect::<Vec<_>>();
    for qer_id in qer_ids {
        if let Err(error) = remove_qer(sess, driver, qer_id) {
            error.log();
        }
    }
    let far_ids = sess.fars.keys().copied().collect::<Vec<_>>();
    for far_id in far_ids {
        if let Err(error) = remove_far(sess, driver, far_id) {
            error.log();
        }
    }

    reports
}

// ===== helper functions =====

// A PDR may only reference rules that exist in the same session.
fn check_pdr_references(
    sess: &Session,
    pdr_id: u16,
    far_id: Option<u32>,
    qer_ids: &[u32],
    urr_ids: &[u32],
) -> Result<(), Error> {
    if let Some(far_id) = far_id
        && !sess.fars.contains_key(&far_id)
    {
        return Err(Error::DanglingRuleReference(pdr_id, IeType::FarId, far_id));
    }
    for qer_id in qer_ids {
        if !sess.qers.contains_key(qer_id) {
            return Err(Error::DanglingRuleReference(
                pdr_id,
                IeType::QerId,
                *qer_id,
            ));
        }
    }
    for urr_id in urr_ids {
        if !sess.urrs.contains_key(urr_id) {
            return Err(Error::DanglingRuleReference(
                pdr_id,
                IeType::UrrId,
                *urr_id,
            ));
        }
    }
    Ok(())
}

// Executes the buffering side of an Apply-Action transition away from BUFF.
//
// BUFF to DROP discards every buffered packet of every PDR referencing the
// FAR. BUFF to FORW re-encapsulates each buffered packet in GTP-U, tagging it
// with the QFI of the PDR's companion QER, and hands it to the forwarder's
// outbound writer.
fn apply_action_transition(
    sess: &mut Session,
    driver: &mut dyn Driver,
    far_id: u32,
    new_action: ApplyAction,
) {
    let pdr_ids = sess.pdrs_referencing_far(far_id);

    if new_action.contains(ApplyAction::DROP) {
        for pdr_id in pdr_ids {
            let mut dropped = 0;
            while sess.pop_buffered(pdr_id).is_some() {
                dropped += 1;
            }
            trace!(local_seid = %sess.local_seid, %pdr_id, %dropped,
                "discarded buffered packets");
        }
        return;
    }

    if !new_action.contains(ApplyAction::FORW) {
        return;
    }

    // Resolve the tunnel endpoint from the FAR's outer header creation.
    let Some(ohc) = sess
        .fars
        .get(&far_id)
        .and_then(|far| far.forwarding_parameters.as_ref())
        .and_then(|params| params.outer_header_creation)
    else {
        trace!(local_seid = %sess.local_seid, %far_id,
            "no outer header creation, leaving buffered packets in place");
        return;
    };
    let Some(peer) = ohc.ipv4.map(IpAddr::V4).or(ohc.ipv6.map(IpAddr::V6))
    else {
        return;
    };
    let port = match ohc.port {
        Some(port) => port,
        None if ohc.has_teid() => gtpu::GTPU_PORT,
        None => return,
    };
    let dst = SocketAddr::new(peer, port);
    let teid = ohc.teid.unwrap_or(0);

    for pdr_id in pdr_ids {
        // The companion QER supplies the QoS flow identifier.
        let qfi = sess
            .pdrs
            .get(&pdr_id)
            .and_then(|pdr| pdr.qer_ids.first())
            .and_then(|qer_id| sess.qers.get(qer_id))
            .and_then(|qer| qer.qfi);

        while let Some(pkt) = sess.pop_buffered(pdr_id) {
            let pdu = gtpu::encode_tpdu(teid, qfi, &pkt);
            if let Err(error) = driver.write_packet(dst, &pdu) {
                Error::Driver("write-packet", error).log();
                continue;
            }
            Debug::GtpuForward(sess.local_seid, pdr_id, &dst).log();
        }
    }
}
