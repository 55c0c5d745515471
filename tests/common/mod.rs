#![allow(dead_code)]

use std::collections::VecDeque;

use axis_uart::{Bridge, BusEdge, Config, StreamBeat, UartFrame};
use bitvec::prelude::*;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Drives the bridge's `rx` line, one call per UART-domain cycle.
pub struct UartSource {
    cycles_per_bit: f64,
    frames: VecDeque<Vec<bool>>,
    current: Option<(Vec<bool>, u64)>,
    cycle: u64,
}

impl UartSource {
    pub fn new(config: &Config) -> Self {
        Self {
            cycles_per_bit: config.cycles_per_bit(),
            frames: VecDeque::new(),
            current: None,
            cycle: 0,
        }
    }

    pub fn write(&mut self, config: &Config, data: &[u8]) {
        for &b in data {
            self.frames.push_back(UartFrame::new(b, config).bits().collect());
        }
    }

    /// Queue raw line levels, one entry per bit period.
    pub fn write_bits(&mut self, bits: Vec<bool>) {
        self.frames.push_back(bits);
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.frames.is_empty()
    }

    pub fn step(&mut self) -> bool {
        let now = self.cycle;
        self.cycle += 1;

        loop {
            if let Some((bits, start)) = &self.current {
                let idx = ((now - start) as f64 / self.cycles_per_bit) as usize;
                if let Some(&level) = bits.get(idx) {
                    return level;
                }
            }
            self.current = self.frames.pop_front().map(|bits| (bits, now));
            if self.current.is_none() {
                return true;
            }
        }
    }
}

/// Decodes the bridge's `tx` line, one call per UART-domain cycle.
pub struct UartSink {
    config: Config,
    cycles_per_bit: f64,
    start: Option<u64>,
    bits: Vec<bool>,
    prev: bool,
    cycle: u64,
    pub bytes: VecDeque<u8>,
    /// UART cycle of every detected start bit
    pub frame_starts: Vec<u64>,
    pub framing_errors: usize,
    pub parity_errors: usize,
}

impl UartSink {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            cycles_per_bit: config.cycles_per_bit(),
            start: None,
            bits: vec![],
            prev: true,
            cycle: 0,
            bytes: VecDeque::new(),
            frame_starts: vec![],
            framing_errors: 0,
            parity_errors: 0,
        }
    }

    /// Forget a frame in progress and everything decoded so far.
    pub fn clear(&mut self) {
        self.start = None;
        self.bits.clear();
        self.bytes.clear();
        self.frame_starts.clear();
    }

    pub fn is_busy(&self) -> bool {
        self.start.is_some()
    }

    pub fn sample(&mut self, level: bool) {
        let now = self.cycle;
        self.cycle += 1;

        match self.start {
            None => {
                if self.prev && !level {
                    self.start = Some(now);
                    self.bits.clear();
                    self.frame_starts.push(now);
                }
            }
            Some(start) => {
                let at = start as f64 + (self.bits.len() as f64 + 0.5) * self.cycles_per_bit;
                if now as f64 >= at {
                    self.bits.push(level);
                    if self.bits.len() == self.config.frame_bits() {
                        self.decode();
                        self.start = None;
                    }
                }
            }
        }
        self.prev = level;
    }

    fn decode(&mut self) {
        let data_bits = self.config.data_bits as usize;
        let mut data = 0u8;
        for (i, &level) in self.bits[1..=data_bits].iter().enumerate() {
            data.view_bits_mut::<Lsb0>().set(i, level);
        }

        let mut pos = 1 + data_bits;
        if let Some(parity) = self.config.parity.bit(data) {
            if self.bits[pos] != parity {
                self.parity_errors += 1;
                return;
            }
            pos += 1;
        }
        if self.bits[0] || !self.bits[pos..].iter().all(|&b| b) {
            self.framing_errors += 1;
            return;
        }
        self.bytes.push_back(data);
    }
}

/// Test bench around a [`Bridge`], with both clocks derived from one time base.
pub struct Bench {
    pub bridge: Bridge,
    pub config: Config,
    pub source: UartSource,
    pub sink: UartSink,
    bus_period: u64,
    uart_period: u64,
    time: u64,
    bus_cycle: u64,
}

const TIMEOUT: u64 = 1_000_000;

impl Bench {
    pub fn new(config: Config) -> Self {
        Self::with_periods(config, 1, 1)
    }

    pub fn with_periods(config: Config, bus_period: u64, uart_period: u64) -> Self {
        init_logger();
        Self {
            bridge: Bridge::new(config.clone()).unwrap(),
            source: UartSource::new(&config),
            sink: UartSink::new(&config),
            config,
            bus_period,
            uart_period,
            time: 0,
            bus_cycle: 0,
        }
    }

    pub fn bus_cycle(&self) -> u64 {
        self.bus_cycle
    }

    /// Bus-domain cycles spanned by one UART frame, rounded up.
    pub fn bus_cycles_per_frame(&self) -> u64 {
        let uart_cycles = self.config.cycles_per_bit() * self.config.frame_bits() as f64;
        (uart_cycles * self.uart_period as f64 / self.bus_period as f64).ceil() as u64
    }

    /// Hold both resets for a couple of edges, then release them.
    pub fn reset(&mut self) {
        self.bridge.set_arstn(false);
        self.bridge.set_uart_rstn(false);
        self.run(2);
        self.bridge.set_arstn(true);
        self.bridge.set_uart_rstn(true);
    }

    /// Advance the time base by one unit.
    pub fn step(&mut self) -> Option<BusEdge> {
        let t = self.time;
        self.time += 1;

        if t % self.uart_period == 0 {
            let level = self.source.step();
            self.bridge.set_rx(level);
            self.bridge.tick_uart();
            self.sink.sample(self.bridge.tx());
        }
        if t % self.bus_period == 0 {
            self.bus_cycle += 1;
            return Some(self.bridge.tick_bus());
        }
        None
    }

    pub fn run(&mut self, units: u64) {
        for _ in 0..units {
            self.step();
        }
    }

    pub fn run_bus_cycles(&mut self, cycles: u64) {
        let end = self.bus_cycle + cycles;
        while self.bus_cycle < end {
            self.step();
        }
    }

    pub fn step_until(&mut self, mut cond: impl FnMut(&mut Self) -> bool) {
        for _ in 0..TIMEOUT {
            if cond(self) {
                return;
            }
            self.step();
        }
        panic!("timed out");
    }

    /// Offer `beat` on `s_axis` until it is taken. Returns the bus cycle of the handshake.
    pub fn send(&mut self, beat: StreamBeat) -> u64 {
        self.bridge.set_s_axis(Some(beat)).unwrap();
        for _ in 0..TIMEOUT {
            if let Some(edge) = self.step() {
                if edge.accepted {
                    self.bridge.set_s_axis(None).unwrap();
                    return self.bus_cycle;
                }
            }
        }
        panic!("beat never accepted");
    }

    /// Wait until `n` bytes have been decoded from `tx` and take them.
    pub fn uart_read(&mut self, n: usize) -> Vec<u8> {
        self.step_until(|b| b.sink.bytes.len() >= n);
        self.sink.bytes.drain(..n).collect()
    }

    pub fn uart_write(&mut self, data: &[u8]) {
        self.source.write(&self.config, data);
    }

    /// Accept the next beat from `m_axis`.
    pub fn recv(&mut self) -> StreamBeat {
        self.bridge.set_m_axis_tready(true);
        for _ in 0..TIMEOUT {
            if let Some(BusEdge {
                emitted: Some(beat),
                ..
            }) = self.step()
            {
                self.bridge.set_m_axis_tready(false);
                return beat;
            }
        }
        panic!("no beat on m_axis");
    }
}
