use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{cdc::Synchronizer, reset::ResetConditioner, util::trait_alias};

pub trait Timing {
    fn now(&self) -> u64;
    fn domain(&self) -> DomainKind;
}

pub trait Reset {
    fn in_reset(&self) -> bool;
    // Other domain out of reset, through a synchronizer.
    fn peer_ready(&self) -> bool;
}

trait_alias!(pub trait Context = Timing + Reset);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainKind {
    Bus,
    Uart,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DomainKind::Bus => "bus",
            DomainKind::Uart => "uart",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    kind: DomainKind,
    cycle: u64,
    pub reset: ResetConditioner,
    peer_ready: Synchronizer<bool>,
}

impl Domain {
    pub fn new(kind: DomainKind, reset_hold: u32) -> Self {
        Self {
            kind,
            cycle: 0,
            reset: ResetConditioner::new(reset_hold),
            peer_ready: Synchronizer::new(false),
        }
    }

    pub fn set_rstn(&mut self, rstn: bool) {
        self.reset.set_rstn(rstn);
        if !rstn {
            self.peer_ready.clear(false);
        }
    }

    // Register updates at the end of an edge.
    pub fn edge(&mut self, peer_is_ready: bool) {
        self.peer_ready.tick(peer_is_ready);
        self.reset.tick();
        self.cycle += 1;
    }
}

impl Timing for Domain {
    fn now(&self) -> u64 {
        self.cycle
    }

    fn domain(&self) -> DomainKind {
        self.kind
    }
}

impl Reset for Domain {
    fn in_reset(&self) -> bool {
        !self.reset.is_ready()
    }

    fn peer_ready(&self) -> bool {
        self.peer_ready.get()
    }
}
