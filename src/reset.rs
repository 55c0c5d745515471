use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetState {
    Asserted,
    Releasing { count: u32 },
    Ready,
}

// Asynchronous assert, synchronous release after `hold` edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConditioner {
    state: ResetState,
    hold: u32,
    rstn: bool,
}

impl ResetConditioner {
    // Power-up: Asserted with the input released.
    pub fn new(hold: u32) -> Self {
        Self {
            state: ResetState::Asserted,
            hold,
            rstn: true,
        }
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ResetState::Ready
    }

    pub fn set_rstn(&mut self, rstn: bool) {
        self.rstn = rstn;
        if !rstn && self.state != ResetState::Asserted {
            debug!("reset asserted from {:?}", self.state);
            self.state = ResetState::Asserted;
        }
    }

    pub fn tick(&mut self) {
        if !self.rstn {
            self.state = ResetState::Asserted;
            return;
        }

        self.state = match self.state {
            ResetState::Asserted => ResetState::Releasing { count: 1 },
            ResetState::Releasing { count } if count >= self.hold => {
                debug!("reset released after {count} cycles");
                ResetState::Ready
            }
            ResetState::Releasing { count } => ResetState::Releasing { count: count + 1 },
            ResetState::Ready => ResetState::Ready,
        };
    }
}
