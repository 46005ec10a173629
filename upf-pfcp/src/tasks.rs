//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{HashMap, HashSet};
use std::collections::hash_map::Entry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{UdpSocket, UnixDatagram};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, trace};
use upf_utils::task::{IntervalTask, Task, TimeoutTask};
use upf_utils::{Sender, UnboundedSender};

use crate::error::Error;
use crate::forwarder::sidechan;
use crate::network;
use crate::packet::Message;

//
// UPF tasks diagram:
//
//                                +--------------+
//                  udp_rx (1x) ->|              |
//             sidechan_rx (1x) ->|    master    |-> (Nx) response_logger
//            timer events (Nx) ->|              |
//                                +--------------+
//                                      ^
//                                      | commands
//                                      v
//                                +--------------+
//                                | timer server |
//                                +--------------+
//

// Inter-task message types.
pub mod messages {
    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;

    // Input messages (child task -> main task).
    pub mod input {
        use std::net::SocketAddr;
        use std::time::Duration;

        use crate::packet::Message;
        use crate::report::Report;

        #[derive(Debug)]
        pub enum ProtocolMsg {
            UdpRxPacket(UdpRxPacketMsg),
            SessReport(SessReportMsg),
            Timer(TimerMsg),
        }

        #[derive(Debug)]
        pub struct UdpRxPacketMsg {
            pub src: SocketAddr,
            pub msg: Message,
        }

        #[derive(Debug)]
        pub struct SessReportMsg {
            pub seid: u64,
            pub reports: Vec<Report>,
        }

        #[derive(Debug)]
        pub enum TimerMsg {
            // Shared ticker of a periodic-measurement group fired.
            PerioTimeout { period: Duration },
            // Quota validity timer of one URR fired.
            ExpiryTimeout { seid: u64, urr_id: u32 },
            // Retransmission timer of an outstanding request fired.
            ReqTimeout { raddr: SocketAddr, seq: u32 },
            // Cached response of a handled request expired.
            RxExpire { raddr: SocketAddr, seq: u32 },
        }
    }
}

// Timer service commands.
#[derive(Debug)]
enum TimerCmd {
    AddPeriodic {
        seid: u64,
        urr_id: u32,
        period: Duration,
    },
    DelPeriodic {
        seid: u64,
        urr_id: u32,
    },
    AddExpiry {
        seid: u64,
        urr_id: u32,
        expiry: Duration,
    },
    DelExpiry {
        seid: u64,
        urr_id: u32,
    },
}

// Handle used by the main task to drive the timer service.
#[derive(Clone, Debug)]
pub struct TimerClient {
    cmd_tx: UnboundedSender<TimerCmd>,
}

// Periodic-measurement timers and quota expiry timers, owned by a dedicated
// task so real-time clocks never run on the event loop.
#[derive(Debug, Default)]
struct TimerServer {
    // Periodic groups: URRs sharing a measurement period share one ticker.
    perio: HashMap<Duration, PerioGroup>,
    // Quota validity timers, one per (SEID, URR ID).
    expiry: HashMap<(u64, u32), TimeoutTask>,
}

#[derive(Debug)]
struct PerioGroup {
    members: HashSet<(u64, u32)>,
    _ticker: IntervalTask,
}

// ===== UPF tasks =====

// UDP Rx task.
pub(crate) fn udp_rx(
    socket: &Arc<UdpSocket>,
    udp_packet_rxp: &Sender<messages::input::UdpRxPacketMsg>,
) -> Task<()> {
    let socket = socket.clone();
    let udp_packet_rxp = udp_packet_rxp.clone();
    Task::spawn_supervised(move || {
        let socket = socket.clone();
        let udp_packet_rxp = udp_packet_rxp.clone();
        async move {
            let _ = network::read_loop(socket, udp_packet_rxp).await;
        }
        .in_current_span()
    })
}

// Forwarder side-channel Rx task.
pub(crate) fn sidechan_rx(
    socket: &Arc<UnixDatagram>,
    sess_report_rxp: &Sender<messages::input::SessReportMsg>,
) -> Task<()> {
    let socket = socket.clone();
    let sess_report_rxp = sess_report_rxp.clone();
    Task::spawn_supervised(move || {
        let socket = socket.clone();
        let sess_report_rxp = sess_report_rxp.clone();
        async move {
            let _ = sidechan::read_loop(socket, sess_report_rxp).await;
        }
        .in_current_span()
    })
}

// Request retransmission timer.
pub(crate) fn req_timeout_timer(
    raddr: SocketAddr,
    seq: u32,
    timeout: Duration,
    timer_txp: &Sender<messages::input::TimerMsg>,
) -> TimeoutTask {
    let timer_txp = timer_txp.clone();
    TimeoutTask::new(timeout, move || async move {
        let msg = messages::input::TimerMsg::ReqTimeout { raddr, seq };
        let _ = timer_txp.send(msg).await;
    })
}

// Cached-response expiry timer. The cache outlives the peer's full retry
// budget so every duplicate can be answered from it.
pub(crate) fn rx_expiry_timer(
    raddr: SocketAddr,
    seq: u32,
    timeout: Duration,
    timer_txp: &Sender<messages::input::TimerMsg>,
) -> TimeoutTask {
    let timer_txp = timer_txp.clone();
    TimeoutTask::new(timeout, move || async move {
        let msg = messages::input::TimerMsg::RxExpire { raddr, seq };
        let _ = timer_txp.send(msg).await;
    })
}

// Logs the outcome of a report-initiated request without blocking the event
// loop on the response.
pub(crate) fn response_logger(
    waiter: oneshot::Receiver<Result<Message, Error>>,
) {
    let mut task = Task::spawn(
        async move {
            match waiter.await {
                Ok(Ok(rsp)) => {
                    trace!(msg_type = %rsp.msg_type(), "report acknowledged");
                }
                Ok(Err(error)) => {
                    error.log();
                }
                Err(_) => (),
            }
        }
        .in_current_span(),
    );
    task.detach();
}

// Spawns the timer service.
pub(crate) fn timer_server(
    timer_txp: &Sender<messages::input::TimerMsg>,
) -> (TimerClient, Task<()>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
    let timer_txp = timer_txp.clone();

    let task = Task::spawn(
        async move {
            let mut server = TimerServer::default();
            while let Some(cmd) = cmd_rx.recv().await {
                server.process(cmd, &timer_txp);
            }
        }
        .in_current_span(),
    );

    (TimerClient { cmd_tx }, task)
}

// ===== impl TimerClient =====

impl TimerClient {
    pub(crate) fn add_periodic(&self, seid: u64, urr_id: u32, period: Duration) {
        let _ = self.cmd_tx.send(TimerCmd::AddPeriodic {
            seid,
            urr_id,
            period,
        });
    }

    pub(crate) fn del_periodic(&self, seid: u64, urr_id: u32) {
        let _ = self.cmd_tx.send(TimerCmd::DelPeriodic { seid, urr_id });
    }

    pub(crate) fn add_expiry(&self, seid: u64, urr_id: u32, expiry: Duration) {
        let _ = self.cmd_tx.send(TimerCmd::AddExpiry {
            seid,
            urr_id,
            expiry,
        });
    }

    pub(crate) fn del_expiry(&self, seid: u64, urr_id: u32) {
        let _ = self.cmd_tx.send(TimerCmd::DelExpiry { seid, urr_id });
    }
}

// ===== impl TimerServer =====

impl TimerServer {
    fn process(
        &mut self,
        cmd: TimerCmd,
        timer_txp: &Sender<messages::input::TimerMsg>,
    ) {
        match cmd {
            TimerCmd::AddPeriodic {
                seid,
                urr_id,
                period,
            } => {
                let group =
                    self.perio.entry(period).or_insert_with(|| PerioGroup {
                        members: Default::default(),
                        _ticker: perio_ticker(period, timer_txp),
                    });
                group.members.insert((seid, urr_id));
            }
            TimerCmd::DelPeriodic { seid, urr_id } => {
                // Stop the ticker once its last member is gone.
                self.perio.retain(|_, group| {
                    group.members.remove(&(seid, urr_id));
                    !group.members.is_empty()
                });
            }
            TimerCmd::AddExpiry {
                seid,
                urr_id,
                expiry,
            } => match self.expiry.entry((seid, urr_id)) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().reset(Some(expiry));
                }
                Entry::Vacant(entry) => {
                    entry.insert(expiry_timer(seid, urr_id, expiry, timer_txp));
                }
            },
            TimerCmd::DelExpiry { seid, urr_id } => {
                self.expiry.remove(&(seid, urr_id));
            }
        }
    }
}

// ===== helper functions =====

fn perio_ticker(
    period: Duration,
    timer_txp: &Sender<messages::input::TimerMsg>,
) -> IntervalTask {
    let timer_txp = timer_txp.clone();
    IntervalTask::new(period, false, move || {
        let timer_txp = timer_txp.clone();
        async move {
            let msg = messages::input::TimerMsg::PerioTimeout { period };
            let _ = timer_txp.send(msg).await;
        }
    })
}

fn expiry_timer(
    seid: u64,
    urr_id: u32,
    expiry: Duration,
    timer_txp: &Sender<messages::input::TimerMsg>,
) -> TimeoutTask {
    let timer_txp = timer_txp.clone();
    TimeoutTask::new(expiry, move || async move {
        let msg = messages::input::TimerMsg::ExpiryTimeout { seid, urr_id };
        let _ = timer_txp.send(msg).await;
    })
}
