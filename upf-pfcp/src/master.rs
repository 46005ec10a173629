//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use upf_utils::task::Task;
use upf_utils::{Receiver, Sender};

use crate::error::{Error, IoError};
use crate::forwarder::Driver;
use crate::network;
use crate::node::Node;
use crate::packet::Message;
use crate::packet::ie::NodeId;
use crate::session::Sessions;
use crate::tasks::messages::ProtocolInputMsg;
use crate::tasks::messages::input::{
    SessReportMsg, TimerMsg, UdpRxPacketMsg,
};
use crate::tasks::{self, TimerClient};
use crate::transaction::{Transaction, TxEntry, TxWaiter};
use crate::{events, forwarder};

// PFCP server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    // PFCP endpoint to bind.
    pub bind: SocketAddr,
    // Own Node ID (IP literal or FQDN).
    pub node_id: String,
    // Request retransmission interval.
    pub retrans_timeout: Duration,
    // Retransmission attempts before a request is given up.
    pub max_retrans: u8,
    // Bound of each per-PDR buffered-packet queue.
    pub buffer_queue_len: usize,
    // Side-channel socket the forwarder delivers reports to.
    pub sidechan_path: Option<PathBuf>,
}

// PFCP server.
//
// All session state, transaction tables and the node table are owned here and
// only ever touched from the event loop in `run`.
pub struct Master {
    pub config: ServerConfig,
    pub recovery_time: DateTime<Utc>,
    pub socket: Arc<UdpSocket>,
    // Remote nodes, keyed by Node ID.
    pub nodes: HashMap<String, Node>,
    // Local session table.
    pub sessions: Sessions,
    // Transaction tables, keyed by peer transport address. Kept separate from
    // the node table: a Node ID can move between addresses, and an
    // association can be wiped and rebuilt while transactions stay put.
    pub transactions: HashMap<SocketAddr, Transaction>,
    // Timer service handle.
    pub timers: TimerClient,
    // Forwarder driver.
    pub driver: Box<dyn Driver>,
    // Input channel senders, handed to child tasks and timers.
    pub tx: ProtocolInputChannelsTx,
    // Child tasks.
    _udp_rx_task: Task<()>,
    _sidechan_rx_task: Option<Task<()>>,
    _timer_task: Task<()>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    pub udp_packet_rx: Sender<UdpRxPacketMsg>,
    pub sess_report_rx: Sender<SessReportMsg>,
    pub timer: Sender<TimerMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    pub udp_packet_rx: Receiver<UdpRxPacketMsg>,
    pub sess_report_rx: Receiver<SessReportMsg>,
    pub timer: Receiver<TimerMsg>,
}

// ===== impl ServerConfig =====

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            bind: SocketAddr::from((
                Ipv4Addr::UNSPECIFIED,
                network::PFCP_PORT,
            )),
            node_id: "127.0.0.8".to_owned(),
            retrans_timeout: Duration::from_secs(3),
            max_retrans: 3,
            buffer_queue_len: 64,
            sidechan_path: None,
        }
    }
}

// ===== impl Master =====

impl Master {
    pub async fn new(
        config: ServerConfig,
        driver: Box<dyn Driver>,
    ) -> Result<(Master, ProtocolInputChannelsRx), Error> {
        let (udp_packet_rxp, udp_packet_rxc) = mpsc::channel(32);
        let (sess_report_rxp, sess_report_rxc) = mpsc::channel(32);
        let (timerp, timerc) = mpsc::channel(32);

        let tx = ProtocolInputChannelsTx {
            udp_packet_rx: udp_packet_rxp,
            sess_report_rx: sess_report_rxp,
            timer: timerp,
        };
        let rx = ProtocolInputChannelsRx {
            udp_packet_rx: udp_packet_rxc,
            sess_report_rx: sess_report_rxc,
            timer: timerc,
        };

        // Bind the PFCP endpoint and start the UDP Rx task.
        let socket = network::socket(config.bind)
            .await
            .map_err(IoError::UdpSocketError)?;
        let socket = Arc::new(socket);
        let udp_rx_task = tasks::udp_rx(&socket, &tx.udp_packet_rx);

        // Open the forwarder side channel when one is configured.
        let sidechan_rx_task = match &config.sidechan_path {
            Some(path) => {
                let sidechan_socket = forwarder::sidechan::socket_rx(path)
                    .map_err(IoError::SideChannelSocketError)?;
                let sidechan_socket = Arc::new(sidechan_socket);
                Some(tasks::sidechan_rx(&sidechan_socket, &tx.sess_report_rx))
            }
            None => None,
        };

        // Start the timer service.
        let (timers, timer_task) = tasks::timer_server(&tx.timer);

        let master = Master {
            config,
            recovery_time: Utc::now(),
            socket,
            nodes: Default::default(),
            sessions: Default::default(),
            transactions: Default::default(),
            timers,
            driver,
            tx,
            _udp_rx_task: udp_rx_task,
            _sidechan_rx_task: sidechan_rx_task,
            _timer_task: timer_task,
        };

        Ok((master, rx))
    }

    // Address the PFCP endpoint is actually bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    // Own Node ID in IE form.
    pub(crate) fn node_id(&self) -> NodeId {
        NodeId::from_name(&self.config.node_id)
    }

    // IPv4 address advertised in the UP F-SEID.
    pub(crate) fn node_ipv4(&self) -> Option<Ipv4Addr> {
        match self.config.node_id.parse::<IpAddr>() {
            Ok(IpAddr::V4(addr)) => Some(addr),
            _ => match self.config.bind.ip() {
                IpAddr::V4(addr) if !addr.is_unspecified() => Some(addr),
                _ => None,
            },
        }
    }

    // Runs the event loop until shutdown is signaled.
    pub async fn run(
        mut self,
        mut rx: ProtocolInputChannelsRx,
        mut shutdown_rx: Receiver<()>,
    ) {
        loop {
            let msg = tokio::select! {
                _ = shutdown_rx.recv() => break,
                msg = rx.udp_packet_rx.recv() => {
                    msg.map(ProtocolInputMsg::UdpRxPacket)
                }
                msg = rx.sess_report_rx.recv() => {
                    msg.map(ProtocolInputMsg::SessReport)
                }
                msg = rx.timer.recv() => {
                    msg.map(ProtocolInputMsg::Timer)
                }
            };
            let Some(msg) = msg else {
                break;
            };

            if let Err(error) =
                events::process_protocol_msg(&mut self, msg).await
            {
                error.log();
            }
        }

        self.shutdown();
    }

    // Stops all timers, aborts outstanding requests and releases the
    // forwarder. The socket and the child tasks go down with the instance.
    fn shutdown(mut self) {
        for transaction in self.transactions.values_mut() {
            transaction.shutdown();
        }
        self.driver.close();
    }

    // Sends a request through the peer's Tx table, arming its retransmission
    // timer.
    pub(crate) async fn send_request(
        &mut self,
        raddr: SocketAddr,
        mut msg: Message,
        ctx_lseid: Option<u64>,
        waiter: Option<TxWaiter>,
    ) -> Result<u32, Error> {
        let transaction = self
            .transactions
            .entry(raddr)
            .or_insert_with(|| Transaction::new(raddr));
        let seq = transaction.next_seq();
        msg.set_seq(seq);

        let msg_buf = network::send_message(&self.socket, raddr, &msg).await?;
        let timer = tasks::req_timeout_timer(
            raddr,
            seq,
            self.config.retrans_timeout,
            &self.tx.timer,
        );
        transaction.tx_insert(
            seq,
            TxEntry {
                msg_buf,
                retry: 0,
                ctx_lseid,
                waiter,
                timer,
            },
        );
        Ok(seq)
    }

    // Sends a response and caches its bytes in the peer's Rx table for the
    // duration of the peer's full retry budget.
    pub(crate) async fn send_response(
        &mut self,
        raddr: SocketAddr,
        rsp: &Message,
    ) -> Result<(), Error> {
        let rsp_buf = network::send_message(&self.socket, raddr, rsp).await?;

        let seq = rsp.seq();
        let rx_timeout =
            self.config.retrans_timeout * (self.config.max_retrans as u32 + 1);
        let timer = tasks::rx_expiry_timer(raddr, seq, rx_timeout, &self.tx.timer);
        let transaction = self
            .transactions
            .entry(raddr)
            .or_insert_with(|| Transaction::new(raddr));
        transaction.rx_store(seq, rsp_buf, timer);
        Ok(())
    }
}
