pub const DEFAULT_BUS_WIDTH: usize = 1;
pub const DEFAULT_DATA_BITS: u8 = 8;
pub const DEFAULT_STOP_BITS: u8 = 1;
pub const DEFAULT_BAUD_CLOCK_SPEED: u64 = 2_000_000;
pub const DEFAULT_BAUD_RATE: u64 = 115_200;
pub const DEFAULT_RESET_HOLD_CYCLES: u32 = 4;
pub const DEFAULT_FIFO_DEPTH: usize = 2;

pub const MIN_DATA_BITS: u8 = 5;
pub const MAX_DATA_BITS: u8 = 8;
pub const MAX_STOP_BITS: u8 = 2;
// Keeps the baud accumulator in range
pub const MAX_BAUD_CLOCK_SPEED: u64 = u64::MAX / 2;
// FIFO pointers are u32 with one wrap bit
pub const MAX_FIFO_DEPTH: usize = 1 << 31;

// Flops in every synchronizer chain
pub const SYNC_STAGES: usize = 2;
