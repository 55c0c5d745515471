use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaudTimer {
    clock_hz: u64,
    baud: u64,
    fraction: u64,
}

impl BaudTimer {
    pub fn new(config: &Config) -> Self {
        Self {
            clock_hz: config.baud_clock_speed,
            baud: config.baud_rate,
            fraction: 0,
        }
    }

    pub fn restart(&mut self) {
        self.fraction = 0;
    }

    // Next tick lands mid-bit.
    pub fn restart_half(&mut self) {
        self.fraction = self.clock_hz / 2;
        trace!("baud: re-phased to mid-bit");
    }

    pub fn tick(&mut self) -> bool {
        self.fraction += self.baud;
        if self.fraction >= self.clock_hz {
            self.fraction -= self.clock_hz;
            true
        } else {
            false
        }
    }
}
