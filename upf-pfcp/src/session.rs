//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, VecDeque};

use bytes::Bytes;

use crate::debug::Debug;
use crate::packet::ie::NodeId;
use crate::packet::ie::rules::{
    ApplyAction, Bitrate, ForwardingParameters, GateStatus,
    MeasurementInformation, MeasurementMethod, Pdi, ReportingTriggers, Volume,
};

// A PFCP session and its rule tables.
//
// The rule records are the authoritative copy of the IE-encoded parameters
// relevant to reporting; the forwarder keeps a parallel copy for packet
// processing which is never consulted when synthesizing reports.
#[derive(Debug)]
pub struct Session {
    pub local_seid: u64,
    pub remote_seid: u64,
    // Owning remote node, resolved on demand through the server's node table.
    pub node_id: NodeId,
    pub pdrs: BTreeMap<u16, PdrInfo>,
    pub fars: BTreeMap<u32, FarInfo>,
    pub qers: BTreeMap<u32, QerInfo>,
    pub urrs: BTreeMap<u32, UrrInfo>,
    pub bars: BTreeMap<u8, BarInfo>,
    // Buffered downlink packets, keyed by PDR ID. Queues are created lazily
    // on the first push and destroyed with the session.
    pub buffers: BTreeMap<u16, VecDeque<Bytes>>,
}

#[derive(Debug)]
pub struct PdrInfo {
    pub precedence: Option<u32>,
    pub pdi: Option<Pdi>,
    pub outer_header_removal: Option<u8>,
    pub far_id: Option<u32>,
    pub qer_ids: Vec<u32>,
    pub urr_ids: Vec<u32>,
}

#[derive(Debug)]
pub struct FarInfo {
    pub apply_action: ApplyAction,
    pub forwarding_parameters: Option<ForwardingParameters>,
    pub bar_id: Option<u8>,
}

#[derive(Debug, Default)]
pub struct QerInfo {
    pub correlation_id: Option<u32>,
    pub gate_status: Option<GateStatus>,
    pub mbr: Option<Bitrate>,
    pub gbr: Option<Bitrate>,
    pub qfi: Option<u8>,
    pub rqi: Option<bool>,
    pub paging_policy_indicator: Option<u8>,
}

#[derive(Debug)]
pub struct UrrInfo {
    pub measurement_method: MeasurementMethod,
    pub reporting_triggers: ReportingTriggers,
    pub measurement_period: Option<u32>,
    pub volume_threshold: Option<Volume>,
    pub volume_quota: Option<Volume>,
    pub time_threshold: Option<u32>,
    pub time_quota: Option<u32>,
    pub quota_validity_time: Option<u32>,
    pub measurement_information: Option<MeasurementInformation>,
    // Sequence counter included in every usage report emitted for this URR.
    pub ur_seqn: u32,
}

#[derive(Debug, Default)]
pub struct BarInfo {
    pub ddn_delay: Option<u8>,
    pub suggested_buffering_packets: Option<u8>,
}

// Outcome of pushing a packet into a PDR's buffer queue.
#[derive(Debug, Eq, PartialEq)]
pub enum PushOutcome {
    // The queue was empty before this push.
    FirstPacket,
    Queued,
    // The queue is full; the packet was dropped.
    Dropped,
}

//
// Local session table.
//
// Sessions live in a dense slot vector with a free-list of vacated indices;
// the local SEID of a session is its slot index plus one, keeping SEID zero
// as the invalid sentinel.
//
#[derive(Debug, Default)]
pub struct Sessions {
    slots: Vec<Option<Session>>,
    free: Vec<usize>,
}

// ===== impl Session =====

impl Session {
    fn new(local_seid: u64, remote_seid: u64, node_id: NodeId) -> Session {
        Debug::SessionCreate(local_seid, remote_seid).log();

        Session {
            local_seid,
            remote_seid,
            node_id,
            pdrs: Default::default(),
            fars: Default::default(),
            qers: Default::default(),
            urrs: Default::default(),
            bars: Default::default(),
            buffers: Default::default(),
        }
    }

    // Pushes a buffered downlink packet into the PDR's queue, creating the
    // queue on first use. A full queue drops the packet rather than blocking
    // the side channel.
    pub(crate) fn push_buffered(
        &mut self,
        pdr_id: u16,
        pkt: Bytes,
        max_len: usize,
    ) -> PushOutcome {
        let queue = self.buffers.entry(pdr_id).or_default();
        if queue.len() >= max_len {
            return PushOutcome::Dropped;
        }
        let outcome = if queue.is_empty() {
            PushOutcome::FirstPacket
        } else {
            PushOutcome::Queued
        };
        queue.push_back(pkt);
        outcome
    }

    pub(crate) fn pop_buffered(&mut self, pdr_id: u16) -> Option<Bytes> {
        self.buffers.get_mut(&pdr_id)?.pop_front()
    }

    pub(crate) fn buffered_len(&self, pdr_id: u16) -> usize {
        self.buffers.get(&pdr_id).map_or(0, |queue| queue.len())
    }

    // Returns the IDs of all PDRs referencing the given FAR.
    pub(crate) fn pdrs_referencing_far(&self, far_id: u32) -> Vec<u16> {
        self.pdrs
            .iter()
            .filter(|(_, pdr)| pdr.far_id == Some(far_id))
            .map(|(pdr_id, _)| *pdr_id)
            .collect()
    }

    // Allocates the next sequence number of the given URR. Counters start at
    // zero and increase monotonically for the session's lifetime.
    pub(crate) fn next_ur_seqn(&mut self, urr_id: u32) -> u32 {
        match self.urrs.get_mut(&urr_id) {
            Some(urr) => {
                let seqn = urr.ur_seqn;
                urr.ur_seqn += 1;
                seqn
            }
            None => 0,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        Debug::SessionDelete(self.local_seid).log();
    }
}

// ===== impl Sessions =====

impl Sessions {
    // Allocates a session slot, reusing a vacated index when one exists.
    pub(crate) fn insert(
        &mut self,
        remote_seid: u64,
        node_id: NodeId,
    ) -> &mut Session {
        match self.free.pop() {
            Some(index) => {
                let local_seid = index as u64 + 1;
                self.slots[index] =
                    Some(Session::new(local_seid, remote_seid, node_id));
                self.slots[index].as_mut().unwrap()
            }
            None => {
                let local_seid = self.slots.len() as u64 + 1;
                self.slots.push(Some(Session::new(
                    local_seid,
                    remote_seid,
                    node_id,
                )));
                self.slots.last_mut().unwrap().as_mut().unwrap()
            }
        }
    }

    pub fn get(&self, local_seid: u64) -> Option<&Session> {
        if local_seid == 0 {
            return None;
        }
        self.slots.get(local_seid as usize - 1)?.as_ref()
    }

    pub fn get_mut(&mut self, local_seid: u64) -> Option<&mut Session> {
        if local_seid == 0 {
            return None;
        }
        self.slots.get_mut(local_seid as usize - 1)?.as_mut()
    }

    // Removes the session, vacating its slot for reuse.
    pub(crate) fn remove(&mut self, local_seid: u64) -> Option<Session> {
        if local_seid == 0 {
            return None;
        }
        let index = local_seid as usize - 1;
        let sess = self.slots.get_mut(index)?.take()?;
        self.free.push(index);
        Some(sess)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
