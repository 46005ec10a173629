//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::SendError;
use tracing::trace;

use crate::debug::Debug;
use crate::error::IoError;
use crate::packet::error::DecodeError;
use crate::packet::{Message, VersionNotSupportedResponse};
use crate::tasks::messages::input::UdpRxPacketMsg;

pub const PFCP_PORT: u16 = 8805;

const MAX_DATAGRAM_SIZE: usize = 8192;

pub(crate) async fn socket(
    addr: SocketAddr,
) -> Result<UdpSocket, std::io::Error> {
    UdpSocket::bind(addr).await
}

// Sends an encoded PFCP message, returning the bytes put on the wire so the
// transaction layer can cache them.
pub(crate) async fn send_message(
    socket: &UdpSocket,
    addr: SocketAddr,
    msg: &Message,
) -> Result<Bytes, IoError> {
    let buf = msg.encode().freeze();

    Debug::MsgTx(&addr, msg.msg_type(), msg.seq()).log();
    socket
        .send_to(&buf, addr)
        .await
        .map_err(IoError::UdpSendError)?;

    Ok(buf)
}

// Retransmits previously encoded bytes unchanged.
pub(crate) async fn send_raw(
    socket: &UdpSocket,
    addr: SocketAddr,
    buf: &Bytes,
) -> Result<(), IoError> {
    socket
        .send_to(buf, addr)
        .await
        .map_err(IoError::UdpSendError)?;

    Ok(())
}

pub(crate) async fn read_loop(
    socket: Arc<UdpSocket>,
    udp_packet_rxp: Sender<UdpRxPacketMsg>,
) -> Result<(), SendError<UdpRxPacketMsg>> {
    let mut buf = [0; MAX_DATAGRAM_SIZE];

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((num_bytes, src)) => {
                // Decode the message, discarding malformed ones.
                let msg = match Message::decode(&buf[0..num_bytes]) {
                    Ok(msg) => msg,
                    Err(DecodeError::InvalidVersion(version)) => {
                        trace!(%src, %version, "unsupported PFCP version");
                        send_version_not_supported(
                            &socket,
                            src,
                            &buf[0..num_bytes],
                        )
                        .await;
                        continue;
                    }
                    Err(error) => {
                        trace!(%src, %error, "ignoring undecodable message");
                        continue;
                    }
                };

                // Notify the main task about the received message.
                let msg = UdpRxPacketMsg { src, msg };
                udp_packet_rxp.send(msg).await?;
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {
                // Retry if the syscall was interrupted (EINTR).
                continue;
            }
            Err(error) => {
                IoError::UdpRecvError(error).log();
                return Ok(());
            }
        }
    }
}

// Best-effort Version Not Supported Response. The sequence number is
// recovered from the fixed header offsets when the datagram is long enough.
async fn send_version_not_supported(
    socket: &UdpSocket,
    src: SocketAddr,
    data: &[u8],
) {
    let seq = match data.get(4..7) {
        Some(bytes) => u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        None => 0,
    };
    let rsp =
        Message::VersionNotSupportedResponse(VersionNotSupportedResponse {
            seq,
        });
    if let Err(error) = send_message(socket, src, &rsp).await {
        error.log();
    }
}
