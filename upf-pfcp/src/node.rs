//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::SocketAddr;

use derive_new::new;

use crate::packet::ie::NodeId;

//
// A remote PFCP node (normally an SMF) with an established association.
//
// The node owns its sessions through a membership set of local SEIDs; the
// sessions themselves carry only the node's identifier, which breaks the
// reference cycle between the two tables.
//
#[derive(Debug, new)]
pub struct Node {
    pub id: NodeId,
    // Transport address the node was last seen at. A node may change address
    // while keeping its identity.
    pub raddr: SocketAddr,
    #[new(default)]
    pub seids: BTreeSet<u64>,
}
