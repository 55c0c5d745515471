use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    // always 1
    Mark,
    // always 0
    Space,
}

impl Parity {
    pub fn bit(self, data: u8) -> Option<bool> {
        let ones = data.count_ones();
        match self {
            Parity::None => None,
            Parity::Odd => Some(ones % 2 == 0),
            Parity::Even => Some(ones % 2 == 1),
            Parity::Mark => Some(true),
            Parity::Space => Some(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, JsonSchema, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bus_width: usize,
    // 5..=8
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    // Hz
    pub baud_clock_speed: u64,
    pub baud_rate: u64,
    pub reset_hold_cycles: u32,
    pub fifo_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_width: DEFAULT_BUS_WIDTH,
            data_bits: DEFAULT_DATA_BITS,
            stop_bits: DEFAULT_STOP_BITS,
            parity: Parity::None,
            baud_clock_speed: DEFAULT_BAUD_CLOCK_SPEED,
            baud_rate: DEFAULT_BAUD_RATE,
            reset_hold_cycles: DEFAULT_RESET_HOLD_CYCLES,
            fifo_depth: DEFAULT_FIFO_DEPTH,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bus width must be at least 1 byte")]
    BusWidth,
    #[error("data bits must be in 5..=8, got {0}")]
    DataBits(u8),
    #[error("stop bits must be 1 or 2, got {0}")]
    StopBits(u8),
    #[error("baud rate must be non-zero")]
    BaudRateZero,
    #[error("reference clock of {0} Hz is out of range")]
    ClockTooFast(u64),
    #[error("baud rate {baud_rate} exceeds half of the {baud_clock_speed} Hz reference clock")]
    BaudTooFast { baud_rate: u64, baud_clock_speed: u64 },
    #[error("reset hold must be at least one cycle")]
    ResetHold,
    #[error("fifo depth must be a power of two >= 2, got {0}")]
    FifoDepth(usize),
    #[error("fifo depth {0} exceeds 2^31 entries")]
    FifoTooDeep(usize),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus_width == 0 {
            return Err(ConfigError::BusWidth);
        }
        if !(MIN_DATA_BITS..=MAX_DATA_BITS).contains(&self.data_bits) {
            return Err(ConfigError::DataBits(self.data_bits));
        }
        if !(1..=MAX_STOP_BITS).contains(&self.stop_bits) {
            return Err(ConfigError::StopBits(self.stop_bits));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::BaudRateZero);
        }
        if self.baud_clock_speed > MAX_BAUD_CLOCK_SPEED {
            return Err(ConfigError::ClockTooFast(self.baud_clock_speed));
        }
        if self.baud_rate.saturating_mul(2) > self.baud_clock_speed {
            return Err(ConfigError::BaudTooFast {
                baud_rate: self.baud_rate,
                baud_clock_speed: self.baud_clock_speed,
            });
        }
        if self.reset_hold_cycles == 0 {
            return Err(ConfigError::ResetHold);
        }
        if self.fifo_depth < 2 || !self.fifo_depth.is_power_of_two() {
            return Err(ConfigError::FifoDepth(self.fifo_depth));
        }
        if self.fifo_depth > MAX_FIFO_DEPTH {
            return Err(ConfigError::FifoTooDeep(self.fifo_depth));
        }
        Ok(())
    }

    pub fn frame_bits(&self) -> usize {
        let parity = usize::from(self.parity != Parity::None);
        1 + self.data_bits as usize + parity + self.stop_bits as usize
    }

    pub fn cycles_per_bit(&self) -> f64 {
        self.baud_clock_speed as f64 / self.baud_rate as f64
    }
}
