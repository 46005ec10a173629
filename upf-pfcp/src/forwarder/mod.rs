//
// Copyright (c) The upfd Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod sidechan;

use std::net::SocketAddr;

use crate::packet::ie::rules::{
    CreateBar, CreateFar, CreatePdr, CreateQer, CreateUrr, UpdateBar,
    UpdateFar, UpdatePdr, UpdateQer, UpdateUrr,
};
use crate::report::UsaReport;

pub type DriverResult<T> = Result<T, DriverError>;

//
// Forwarder driver.
//
// The packet-processing rule tables of the data plane are driven through this
// interface. The driver holds its own copy of every installed rule for packet
// matching; the control plane never reads that copy back, except through
// `query_urr` for usage counters.
//
// Driver calls execute on the server's event loop and must not block: a
// driver needing a kernel or netlink round-trip is expected to complete it in
// microseconds or to asynchronize internally.
//
pub trait Driver: Send {
    fn create_pdr(&mut self, seid: u64, pdr: &CreatePdr) -> DriverResult<()>;
    fn update_pdr(&mut self, seid: u64, pdr: &UpdatePdr) -> DriverResult<()>;
    fn remove_pdr(&mut self, seid: u64, pdr_id: u16) -> DriverResult<()>;

    fn create_far(&mut self, seid: u64, far: &CreateFar) -> DriverResult<()>;
    fn update_far(&mut self, seid: u64, far: &UpdateFar) -> DriverResult<()>;
    fn remove_far(&mut self, seid: u64, far_id: u32) -> DriverResult<()>;

    fn create_qer(&mut self, seid: u64, qer: &CreateQer) -> DriverResult<()>;
    fn update_qer(&mut self, seid: u64, qer: &UpdateQer) -> DriverResult<()>;
    fn remove_qer(&mut self, seid: u64, qer_id: u32) -> DriverResult<()>;

    fn create_urr(&mut self, seid: u64, urr: &CreateUrr) -> DriverResult<()>;
    fn update_urr(&mut self, seid: u64, urr: &UpdateUrr)
    -> DriverResult<Vec<UsaReport>>;
    fn remove_urr(&mut self, seid: u64, urr_id: u32)
    -> DriverResult<Vec<UsaReport>>;

    fn create_bar(&mut self, seid: u64, bar: &CreateBar) -> DriverResult<()>;
    fn update_bar(&mut self, seid: u64, bar: &UpdateBar) -> DriverResult<()>;
    fn remove_bar(&mut self, seid: u64, bar_id: u8) -> DriverResult<()>;

    // Fetches fresh usage counters for one URR.
    fn query_urr(&mut self, seid: u64, urr_id: u32)
    -> DriverResult<Vec<UsaReport>>;

    // Outbound user-plane writer, used to forward drained downlink packets.
    fn write_packet(&mut self, dst: SocketAddr, pkt: &[u8]) -> DriverResult<()>;

    fn close(&mut self);
}

// Forwarder driver errors.
#[derive(Debug)]
pub enum DriverError {
    NotSupported,
    Rule(String),
    Io(std::io::Error),
}

// A forwarder that accepts every rule and never reports anything. Used when
// no data plane is attached.
#[derive(Debug, Default)]
pub struct Empty {}

// ===== impl DriverError =====

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::NotSupported => {
                write!(f, "operation not supported by the forwarder")
            }
            DriverError::Rule(reason) => {
                write!(f, "rule rejected by the forwarder: {reason}")
            }
            DriverError::Io(..) => {
                write!(f, "forwarder I/O error")
            }
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DriverError {
    fn from(error: std::io::Error) -> DriverError {
        DriverError::Io(error)
    }
}

// ===== impl Empty =====

impl Driver for Empty {
    fn create_pdr(&mut self, _seid: u64, _pdr: &CreatePdr) -> DriverResult<()> {
        Ok(())
    }

    fn update_pdr(&mut self, _seid: u64, _pdr: &UpdatePdr) -> DriverResult<()> {
        Ok(())
    }

    fn remove_pdr(&mut self, _seid: u64, _pdr_id: u16) -> DriverResult<()> {
        Ok(())
    }

    fn create_far(&mut self, _seid: u64, _far: &CreateFar) -> DriverResult<()> {
        Ok(())
    }

    fn update_far(&mut self, _seid: u64, _far: &UpdateFar) -> DriverResult<()> {
        Ok(())
    }

    fn remove_far(&mut self, _seid: u64, _far_id: u32) -> DriverResult<()> {
        Ok(())
    }

    fn create_qer(&mut self, _seid: u64, _qer: &CreateQer) -> DriverResult<()> {
        Ok(())
    }

    fn update_qer(&mut self, _seid: u64, _qer: &UpdateQer) -> DriverResult<()> {
        Ok(())
    }

    fn remove_qer(&mut self, _seid: u64, _qer_id: u32) -> DriverResult<()> {
        Ok(())
    }

    fn create_urr(&mut self, _seid: u64, _urr: &CreateUrr) -> DriverResult<()> {
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
        _seid: u64,
        _urr_id: u32,
    ) -> DriverResult<Vec<UsaReport>> {
        Ok(Vec::new())
    }

    fn create_bar(&mut self, _seid: u64, _bar: &CreateBar) -> DriverResult<()> {
        Ok(())
    }

    fn update_bar(&mut self, _seid: u64, _bar: &UpdateBar) -> DriverResult<()> {
        Ok(())
    }

    fn remove_bar(&mut self, _seid: u64, _bar_id: u8) -> DriverResult<()> {
        Ok(())
    }

    fn query_urr(
        &mut self,
        _seid: u64,
        _urr_id: u32,
    ) -> DriverResult<Vec<UsaReport>> {
        Ok(Vec::new())
    }

    fn write_packet(
        &mut self,
        _dst: SocketAddr,
        _pkt: &[u8],
    ) -> DriverResult<()> {
        Ok(())
    }

    fn close(&mut self) {}
}
