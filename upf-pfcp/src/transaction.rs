//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::oneshot;
use upf_utils::task::TimeoutTask;

use crate::error::Error;
use crate::packet::Message;

// Sequence numbers are 24 bits on the wire.
const SEQ_MASK: u32 = 0x00FF_FFFF;

pub type TxWaiter = oneshot::Sender<Result<Message, Error>>;

//
// Request/response bookkeeping for one remote peer address.
//
// The Tx table tracks requests this server originated, keyed by sequence
// number, so responses can be matched and unanswered requests retransmitted.
// The Rx table caches the response bytes most recently sent for each observed
// request sequence number, so a retransmitted request replays the cached
// response without re-executing the handler.
//
#[derive(Debug)]
pub struct Transaction {
    pub raddr: SocketAddr,
    tx_seq: u32,
    tx: HashMap<u32, TxEntry>,
    rx: HashMap<u32, RxEntry>,
}

#[derive(Debug)]
pub struct TxEntry {
    // Serialized request, kept for retransmission.
    pub msg_buf: Bytes,
    pub retry: u8,
    // Local SEID of the session the request concerns, when any.
    pub ctx_lseid: Option<u64>,
    pub waiter: Option<TxWaiter>,
    pub timer: TimeoutTask,
}

#[derive(Debug)]
struct RxEntry {
    rsp_buf: Option<Bytes>,
    _timer: Option<TimeoutTask>,
}

// Duplicate-suppression verdict for an incoming request.
#[derive(Debug)]
pub enum RxState {
    // First time this sequence number is seen; dispatch the request.
    New,
    // A cached response exists; replay it without dispatching.
    Replay(Bytes),
    // The request is being handled and no response was produced yet.
    Pending,
}

// ===== impl Transaction =====

impl Transaction {
    pub(crate) fn new(raddr: SocketAddr) -> Transaction {
        Transaction {
            raddr,
            tx_seq: 1,
            tx: Default::default(),
            rx: Default::default(),
        }
    }

    // Allocates the next request sequence number, skipping zero on wrap.
    pub(crate) fn next_seq(&mut self) -> u32 {
        let seq = self.tx_seq;
        self.tx_seq = (self.tx_seq + 1) & SEQ_MASK;
        if self.tx_seq == 0 {
            self.tx_seq = 1;
        }
        seq
    }

    pub(crate) fn tx_insert(&mut self, seq: u32, entry: TxEntry) {
        self.tx.insert(seq, entry);
    }

    pub(crate) fn tx_get_mut(&mut self, seq: u32) -> Option<&mut TxEntry> {
        self.tx.get_mut(&seq)
    }

    // Matches a received response against the outstanding request, removing
    // the entry and stopping its retransmission timer.
    pub(crate) fn tx_remove(&mut self, seq: u32) -> Option<TxEntry> {
        self.tx.remove(&seq)
    }

    // Duplicate suppression for an incoming request.
    pub(crate) fn rx_recv(&mut self, seq: u32) -> RxState {
        match self.rx.entry(seq) {
            Entry::Vacant(entry) => {
                entry.insert(RxEntry {
                    rsp_buf: None,
                    _timer: None,
                });
                RxState::New
            }
            Entry::Occupied(entry) => match &entry.get().rsp_buf {
                Some(rsp_buf) => RxState::Replay(rsp_buf.clone()),
                None => RxState::Pending,
            },
        }
    }

    // Stores the response sent for a request, together with the timer that
    // eventually expires the cache entry.
    pub(crate) fn rx_store(&mut self, seq: u32, rsp_buf: Bytes, timer: TimeoutTask) {
        self.rx.insert(
            seq,
            RxEntry {
                rsp_buf: Some(rsp_buf),
                _timer: Some(timer),
            },
        );
    }

    pub(crate) fn rx_remove(&mut self, seq: u32) {
        self.rx.remove(&seq);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tx.is_empty() && self.rx.is_empty()
    }

    // Aborts all outstanding requests, notifying their waiters.
    pub(crate) fn shutdown(&mut self) {
        for (_, entry) in self.tx.drain() {
            if let Some(waiter) = entry.waiter {
                let _ = waiter.send(Err(Error::ReqAborted));
            }
        }
        self.rx.clear();
    }
}
