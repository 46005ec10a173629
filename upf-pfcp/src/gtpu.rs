//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{BufMut, BytesMut};

//
// GTP-U header, as prepended to drained downlink packets.
//
// Encoding format:
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// | Ver |P|R|E|S|N|  Message Type |         Length                |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                             TEID                              |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |        Sequence Number        |  N-PDU Number |   Next Ext    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//

// GTP-U on UDP.
pub const GTPU_PORT: u16 = 2152;

// Version 1, protocol type GTP, extension header flag set.
const FLAGS_WITH_EXT: u8 = 0x34;
// Version 1, protocol type GTP, no optional fields.
const FLAGS_PLAIN: u8 = 0x30;

const MSG_TYPE_TPDU: u8 = 255;

// PDU Session Container extension header type.
const EXT_TYPE_PDU_SESSION: u8 = 0x85;

// Encodes a T-PDU carrying a drained downlink packet.
//
// When a QoS flow is known, a PDU Session Container extension header with the
// downlink PDU type and the QFI is attached.
pub fn encode_tpdu(teid: u32, qfi: Option<u8>, payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(16 + payload.len());

    match qfi {
        Some(qfi) => {
            // Optional fields (4) plus the extension header (4).
            let len = (payload.len() + 8) as u16;
            buf.put_u8(FLAGS_WITH_EXT);
            buf.put_u8(MSG_TYPE_TPDU);
            buf.put_u16(len);
            buf.put_u32(teid);
            // Sequence number and N-PDU number are present but meaningless
            // once the E flag is set.
            buf.put_u16(0);
            buf.put_u8(0);
            buf.put_u8(EXT_TYPE_PDU_SESSION);
            // Extension length in 4-octet units.
            buf.put_u8(1);
            // PDU type 0: DL PDU Session Information.
            buf.put_u8(0);
            buf.put_u8(qfi & 0x3F);
            // No further extension headers.
            buf.put_u8(0);
        }
        None => {
            buf.put_u8(FLAGS_PLAIN);
            buf.put_u8(MSG_TYPE_TPDU);
            buf.put_u16(payload.len() as u16);
            buf.put_u32(teid);
        }
    }
    buf.put_slice(payload);

    buf
}
