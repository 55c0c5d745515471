use std::collections::VecDeque;

use bitvec::prelude::*;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    baud::BaudTimer,
    cdc::{AsyncFifo, Synchronizer},
    config::Config,
    context::Context,
    frame::StreamBeat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RxState {
    WaitStart,
    StartBit,
    Sampling { bit: u8, data: u8 },
    ParityBit { data: u8 },
    StopCheck { data: u8, remaining: u8, parity_ok: bool },
    Emit { data: u8 },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxCounters {
    pub frames_received: u64,
    pub framing_errors: u64,
    pub parity_errors: u64,
    pub overruns: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RxSampler {
    state: RxState,
    line: Synchronizer<bool>,
    prev: bool,
    queue: VecDeque<u8>,
    capacity: usize,
    baud: BaudTimer,
    counters: RxCounters,
}

impl RxSampler {
    pub fn new(config: &Config) -> Self {
        let capacity = config.bus_width * 2;
        Self {
            state: RxState::WaitStart,
            line: Synchronizer::new(true),
            prev: true,
            queue: VecDeque::with_capacity(capacity),
            capacity,
            baud: BaudTimer::new(config),
            counters: RxCounters::default(),
        }
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    pub fn counters(&self) -> RxCounters {
        self.counters
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    // `rx` is the raw, unsynchronized line level.
    pub fn tick(
        &mut self,
        ctx: &impl Context,
        config: &Config,
        rx: bool,
        beats: &mut AsyncFifo<StreamBeat>,
    ) {
        if ctx.in_reset() {
            if self.state != RxState::WaitStart || !self.queue.is_empty() {
                debug!(
                    "[{} {}] rx: reset dropped {} queued bytes",
                    ctx.domain(),
                    ctx.now(),
                    self.queue.len()
                );
            }
            self.state = RxState::WaitStart;
            self.queue.clear();
            self.line.clear(true);
            self.prev = true;
            return;
        }

        self.offer_beat(ctx, config, beats);

        let line = self.line.get();
        self.state = self.step(ctx, config, line);
        self.prev = line;
        self.line.tick(rx);
    }

    fn step(&mut self, ctx: &impl Context, config: &Config, line: bool) -> RxState {
        let state = self.state;

        if state == RxState::WaitStart {
            if self.prev && !line {
                trace!("[{} {}] rx: start edge", ctx.domain(), ctx.now());
                self.baud.restart_half();
                return RxState::StartBit;
            }
            return state;
        }

        if let RxState::Emit { data } = state {
            self.emit(ctx, data);
            return RxState::WaitStart;
        }

        if !self.baud.tick() {
            return state;
        }

        match state {
            RxState::StartBit => {
                if line {
                    trace!("[{} {}] rx: start bit glitch", ctx.domain(), ctx.now());
                    RxState::WaitStart
                } else {
                    RxState::Sampling { bit: 0, data: 0 }
                }
            }
            RxState::Sampling { bit, mut data } => {
                data.view_bits_mut::<Lsb0>().set(bit as usize, line);
                trace!("[{} {}] rx: bit {bit} = {}", ctx.domain(), ctx.now(), line as u8);
                if bit + 1 < config.data_bits {
                    RxState::Sampling { bit: bit + 1, data }
                } else if config.parity.bit(data).is_some() {
                    RxState::ParityBit { data }
                } else {
                    RxState::StopCheck {
                        data,
                        remaining: config.stop_bits,
                        parity_ok: true,
                    }
                }
            }
            RxState::ParityBit { data } => RxState::StopCheck {
                data,
                remaining: config.stop_bits,
                parity_ok: config.parity.bit(data) == Some(line),
            },
            RxState::StopCheck {
                data,
                remaining,
                parity_ok,
            } => {
                if !line {
                    self.counters.framing_errors += 1;
                    warn!(
                        "[{} {}] rx: framing error, dropped 0x{data:02X}",
                        ctx.domain(),
                        ctx.now()
                    );
                    RxState::WaitStart
                } else if remaining > 1 {
                    RxState::StopCheck {
                        data,
                        remaining: remaining - 1,
                        parity_ok,
                    }
                } else if !parity_ok {
                    self.counters.parity_errors += 1;
                    warn!(
                        "[{} {}] rx: parity error, dropped 0x{data:02X}",
                        ctx.domain(),
                        ctx.now()
                    );
                    RxState::WaitStart
                } else {
                    RxState::Emit { data }
                }
            }
            RxState::WaitStart | RxState::Emit { .. } => unreachable!(),
        }
    }

    fn emit(&mut self, ctx: &impl Context, data: u8) {
        if self.queue.len() >= self.capacity {
            self.counters.overruns += 1;
            warn!(
                "[{} {}] rx: overrun, dropped 0x{data:02X}",
                ctx.domain(),
                ctx.now()
            );
            return;
        }
        debug!("[{} {}] rx: frame 0x{data:02X}", ctx.domain(), ctx.now());
        self.queue.push_back(data);
        self.counters.frames_received += 1;
    }

    fn offer_beat(&mut self, ctx: &impl Context, config: &Config, beats: &mut AsyncFifo<StreamBeat>) {
        if self.queue.len() < config.bus_width || beats.is_full() {
            return;
        }
        let beat = StreamBeat::new(self.queue.drain(..config.bus_width).collect::<Vec<_>>());
        trace!("[{} {}] rx: beat assembled {beat:?}", ctx.domain(), ctx.now());
        if beats.push(beat).is_err() {
            unreachable!("checked for room above");
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RxFront {
    beats_emitted: u64,
}

impl RxFront {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beats_emitted(&self) -> u64 {
        self.beats_emitted
    }

    pub fn valid<'a>(
        &self,
        ctx: &impl Context,
        beats: &'a AsyncFifo<StreamBeat>,
    ) -> Option<&'a StreamBeat> {
        if ctx.in_reset() {
            return None;
        }
        beats.front()
    }

    pub fn tick(
        &mut self,
        ctx: &impl Context,
        tready: bool,
        beats: &mut AsyncFifo<StreamBeat>,
    ) -> Option<StreamBeat> {
        if ctx.in_reset() {
            while let Some(beat) = beats.pop() {
                debug!("[{} {}] rx: reset dropped {beat:?}", ctx.domain(), ctx.now());
            }
            return None;
        }

        if !tready || self.valid(ctx, beats).is_none() {
            return None;
        }
        let beat = beats.pop()?;
        debug!("[{} {}] rx: emitted {beat:?}", ctx.domain(), ctx.now());
        self.beats_emitted += 1;
        Some(beat)
    }
}
