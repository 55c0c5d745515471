use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    cdc::AsyncFifo,
    config::{Config, Parity},
    context::{Domain, DomainKind},
    frame::StreamBeat,
    reset::ResetState,
    rx::{RxFront, RxSampler},
    tx::{TxFront, TxRequest, TxShifter},
    Error,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BusEdge {
    pub accepted: bool,
    pub emitted: Option<StreamBeat>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub beats_accepted: u64,
    pub frames_sent: u64,
    pub frames_received: u64,
    pub framing_errors: u64,
    pub parity_errors: u64,
    pub overruns: u64,
    pub beats_emitted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pins {
    s_axis: Option<StreamBeat>,
    m_axis_tready: bool,
    rx: bool,
}

/// AXI-Stream to UART bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    config: Config,

    bus: Domain,
    uart: Domain,

    tx_front: TxFront,
    tx_shifter: TxShifter,
    rx_sampler: RxSampler,
    rx_front: RxFront,

    tx_requests: AsyncFifo<TxRequest>,
    tx_acks: AsyncFifo<u32>,
    rx_beats: AsyncFifo<StreamBeat>,

    pins: Pins,
}

impl Bridge {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        info!(
            "bridge: {} byte beats, {}{}{} at {} baud from {} Hz ({:.2} cycles/bit)",
            config.bus_width,
            config.data_bits,
            match config.parity {
                Parity::None => 'N',
                Parity::Odd => 'O',
                Parity::Even => 'E',
                Parity::Mark => 'M',
                Parity::Space => 'S',
            },
            config.stop_bits,
            config.baud_rate,
            config.baud_clock_speed,
            config.cycles_per_bit()
        );

        Ok(Self {
            bus: Domain::new(DomainKind::Bus, config.reset_hold_cycles),
            uart: Domain::new(DomainKind::Uart, config.reset_hold_cycles),
            tx_front: TxFront::new(),
            tx_shifter: TxShifter::new(&config),
            rx_sampler: RxSampler::new(&config),
            rx_front: RxFront::new(),
            tx_requests: AsyncFifo::new(config.fifo_depth),
            tx_acks: AsyncFifo::new(config.fifo_depth),
            rx_beats: AsyncFifo::new(config.fifo_depth),
            pins: Pins {
                s_axis: None,
                m_axis_tready: false,
                rx: true,
            },
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Inputs

    pub fn set_arstn(&mut self, rstn: bool) {
        self.bus.set_rstn(rstn);
    }

    pub fn set_uart_rstn(&mut self, rstn: bool) {
        self.uart.set_rstn(rstn);
    }

    // None drops tvalid.
    pub fn set_s_axis(&mut self, beat: Option<StreamBeat>) -> Result<(), Error> {
        if let Some(beat) = &beat {
            if beat.width() != self.config.bus_width {
                return Err(Error::BeatWidth {
                    expected: self.config.bus_width,
                    actual: beat.width(),
                });
            }
        }
        self.pins.s_axis = beat;
        Ok(())
    }

    pub fn set_m_axis_tready(&mut self, ready: bool) {
        self.pins.m_axis_tready = ready;
    }

    pub fn set_rx(&mut self, level: bool) {
        self.pins.rx = level;
    }

    // Outputs

    pub fn s_axis_tready(&self) -> bool {
        self.tx_front.ready(&self.bus, &self.tx_requests)
    }

    pub fn m_axis_tvalid(&self) -> bool {
        self.m_axis_tdata().is_some()
    }

    pub fn m_axis_tdata(&self) -> Option<&StreamBeat> {
        self.rx_front.valid(&self.bus, &self.rx_beats)
    }

    pub fn tx(&self) -> bool {
        self.tx_shifter.line(&self.uart)
    }

    pub fn bus_reset_state(&self) -> ResetState {
        self.bus.reset.state()
    }

    pub fn uart_reset_state(&self) -> ResetState {
        self.uart.reset.state()
    }

    // Clocks

    pub fn tick_bus(&mut self) -> BusEdge {
        let accepted = self.tx_front.tick(
            &self.bus,
            self.pins.s_axis.as_ref(),
            &mut self.tx_requests,
            &mut self.tx_acks,
        );
        let emitted = self
            .rx_front
            .tick(&self.bus, self.pins.m_axis_tready, &mut self.rx_beats);

        self.tx_requests.tick_write();
        self.tx_acks.tick_read();
        self.rx_beats.tick_read();
        self.bus.edge(self.uart.reset.is_ready());

        BusEdge { accepted, emitted }
    }

    pub fn tick_uart(&mut self) {
        self.tx_shifter.tick(
            &self.uart,
            &self.config,
            &mut self.tx_requests,
            &mut self.tx_acks,
        );
        self.rx_sampler
            .tick(&self.uart, &self.config, self.pins.rx, &mut self.rx_beats);

        self.tx_requests.tick_read();
        self.tx_acks.tick_write();
        self.rx_beats.tick_write();
        self.uart.edge(self.bus.reset.is_ready());
    }

    pub fn stats(&self) -> Stats {
        let rx = self.rx_sampler.counters();
        Stats {
            beats_accepted: self.tx_front.beats_accepted(),
            frames_sent: self.tx_shifter.frames_sent(),
            frames_received: rx.frames_received,
            framing_errors: rx.framing_errors,
            parity_errors: rx.parity_errors,
            overruns: rx.overruns,
            beats_emitted: self.rx_front.beats_emitted(),
        }
    }

    pub fn save_state(&self) -> Result<Vec<u8>, Error> {
        Ok(bincode::serialize(self)?)
    }

    // Config must match the one the snapshot was taken with.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), Error> {
        let bridge: Bridge = bincode::deserialize(data)?;
        if bridge.config != self.config {
            return Err(Error::ConfigMismatch);
        }
        *self = bridge;
        Ok(())
    }
}
