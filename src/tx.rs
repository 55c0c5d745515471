use std::collections::VecDeque;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    baud::BaudTimer,
    cdc::AsyncFifo,
    config::Config,
    context::Context,
    frame::{StreamBeat, UartFrame},
};

// The tag comes back once the beat's last stop bit has left the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRequest {
    pub tag: u32,
    pub beat: StreamBeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxPhase {
    Idle,
    Draining { tag: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxFront {
    phase: TxPhase,
    next_tag: u32,
    beats_accepted: u64,
}

impl TxFront {
    pub fn new() -> Self {
        Self {
            phase: TxPhase::Idle,
            next_tag: 0,
            beats_accepted: 0,
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    pub fn beats_accepted(&self) -> u64 {
        self.beats_accepted
    }

    pub fn ready(&self, ctx: &impl Context, requests: &AsyncFifo<TxRequest>) -> bool {
        !ctx.in_reset() && ctx.peer_ready() && self.phase == TxPhase::Idle && !requests.is_full()
    }

    // Returns whether the beat was accepted on this edge.
    pub fn tick(
        &mut self,
        ctx: &impl Context,
        beat: Option<&StreamBeat>,
        requests: &mut AsyncFifo<TxRequest>,
        acks: &mut AsyncFifo<u32>,
    ) -> bool {
        let ready = self.ready(ctx, requests);

        while let Some(tag) = acks.pop() {
            match self.phase {
                TxPhase::Draining { tag: current } if current == tag => {
                    debug!("[{} {}] tx: beat {tag} complete", ctx.domain(), ctx.now());
                    self.phase = TxPhase::Idle;
                }
                _ => trace!("[{} {}] tx: stale completion {tag}", ctx.domain(), ctx.now()),
            }
        }

        if ctx.in_reset() {
            if let TxPhase::Draining { tag } = self.phase {
                debug!("[{} {}] tx: forgetting beat {tag} on reset", ctx.domain(), ctx.now());
            }
            self.phase = TxPhase::Idle;
            return false;
        }

        let Some(beat) = beat.filter(|_| ready) else {
            return false;
        };

        let tag = self.next_tag;
        self.next_tag = self.next_tag.wrapping_add(1);
        debug!("[{} {}] tx: accepted beat {tag} {beat:?}", ctx.domain(), ctx.now());

        if requests
            .push(TxRequest {
                tag,
                beat: beat.clone(),
            })
            .is_err()
        {
            unreachable!("ready implies room in the request fifo");
        }
        self.phase = TxPhase::Draining { tag };
        self.beats_accepted += 1;
        true
    }
}

impl Default for TxFront {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftState {
    Idle,
    SendingBit { frame: UartFrame, pos: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxShifter {
    state: ShiftState,
    queue: VecDeque<u8>,
    current: Option<u32>,
    pending_ack: Option<u32>,
    baud: BaudTimer,
    frames_sent: u64,
}

impl TxShifter {
    pub fn new(config: &Config) -> Self {
        Self {
            state: ShiftState::Idle,
            queue: VecDeque::with_capacity(config.bus_width),
            current: None,
            pending_ack: None,
            baud: BaudTimer::new(config),
            frames_sent: 0,
        }
    }

    pub fn state(&self) -> ShiftState {
        self.state
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn line(&self, ctx: &impl Context) -> bool {
        if ctx.in_reset() {
            return true;
        }
        match self.state {
            ShiftState::Idle => true,
            ShiftState::SendingBit { frame, pos } => frame.bit(pos),
        }
    }

    pub fn tick(
        &mut self,
        ctx: &impl Context,
        config: &Config,
        requests: &mut AsyncFifo<TxRequest>,
        acks: &mut AsyncFifo<u32>,
    ) {
        self.flush_ack(acks);

        if ctx.in_reset() {
            self.abandon(ctx, requests, acks);
            return;
        }

        match self.state {
            ShiftState::Idle => {
                if self.pending_ack.is_some() {
                    return;
                }
                if let Some(req) = requests.pop() {
                    trace!(
                        "[{} {}] tx: draining beat {} {:?}",
                        ctx.domain(),
                        ctx.now(),
                        req.tag,
                        req.beat
                    );
                    self.queue.extend(req.beat.data());
                    self.current = Some(req.tag);
                    self.next_frame(ctx, config, acks);
                }
            }
            ShiftState::SendingBit { frame, pos } => {
                if !self.baud.tick() {
                    return;
                }
                let pos = pos + 1;
                if pos < frame.len() {
                    trace!("[{} {}] tx: bit {pos}", ctx.domain(), ctx.now());
                    self.state = ShiftState::SendingBit { frame, pos };
                } else {
                    self.frames_sent += 1;
                    self.next_frame(ctx, config, acks);
                }
            }
        }
    }

    fn next_frame(&mut self, ctx: &impl Context, config: &Config, acks: &mut AsyncFifo<u32>) {
        if let Some(byte) = self.queue.pop_front() {
            debug!("[{} {}] tx: frame 0x{byte:02X}", ctx.domain(), ctx.now());
            self.state = ShiftState::SendingBit {
                frame: UartFrame::new(byte, config),
                pos: 0,
            };
            self.baud.restart();
        } else {
            self.state = ShiftState::Idle;
            if let Some(tag) = self.current.take() {
                self.complete(tag, acks);
            }
        }
    }

    // Partial frames are dropped; abandoned beats still report completion so
    // the bus side never waits on them.
    fn abandon(
        &mut self,
        ctx: &impl Context,
        requests: &mut AsyncFifo<TxRequest>,
        acks: &mut AsyncFifo<u32>,
    ) {
        if self.state != ShiftState::Idle || !self.queue.is_empty() {
            debug!(
                "[{} {}] tx: reset dropped {} queued bytes",
                ctx.domain(),
                ctx.now(),
                self.queue.len()
            );
        }
        self.state = ShiftState::Idle;
        self.queue.clear();

        if let Some(tag) = self.current.take() {
            self.complete(tag, acks);
        }
        while self.pending_ack.is_none() {
            let Some(req) = requests.pop() else {
                break;
            };
            debug!("[{} {}] tx: reset dropped beat {}", ctx.domain(), ctx.now(), req.tag);
            self.complete(req.tag, acks);
        }
    }

    fn complete(&mut self, tag: u32, acks: &mut AsyncFifo<u32>) {
        debug_assert!(self.pending_ack.is_none());
        self.pending_ack = Some(tag);
        self.flush_ack(acks);
    }

    fn flush_ack(&mut self, acks: &mut AsyncFifo<u32>) {
        if let Some(tag) = self.pending_ack {
            if acks.push(tag).is_ok() {
                self.pending_ack = None;
            }
        }
    }
}
