use log::trace;
use serde::{Deserialize, Serialize};

use crate::consts::SYNC_STAGES;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synchronizer<T> {
    stages: [T; SYNC_STAGES],
}

impl<T: Copy> Synchronizer<T> {
    pub fn new(init: T) -> Self {
        Self {
            stages: [init; SYNC_STAGES],
        }
    }

    pub fn get(&self) -> T {
        self.stages[SYNC_STAGES - 1]
    }

    pub fn tick(&mut self, input: T) {
        self.stages.rotate_right(1);
        self.stages[0] = input;
    }

    // Asynchronous clear.
    pub fn clear(&mut self, value: T) {
        self.stages = [value; SYNC_STAGES];
    }
}

fn to_gray(bin: u32) -> u32 {
    bin ^ (bin >> 1)
}

fn from_gray(gray: u32) -> u32 {
    let mut bin = gray;
    let mut shift = gray >> 1;
    while shift != 0 {
        bin ^= shift;
        shift >>= 1;
    }
    bin
}

// Gray-coded dual-clock FIFO. Full and empty lag the other side by SYNC_STAGES edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncFifo<T> {
    slots: Vec<Option<T>>,
    wr_ptr: u32,
    rd_ptr: u32,
    // Pointers as seen from the opposite domain
    rd_gray_sync: Synchronizer<u32>,
    wr_gray_sync: Synchronizer<u32>,
}

impl<T> AsyncFifo<T> {
    pub fn new(depth: usize) -> Self {
        assert!(depth.is_power_of_two() && depth >= 2);
        Self {
            slots: (0..depth).map(|_| None).collect(),
            wr_ptr: 0,
            rd_ptr: 0,
            rd_gray_sync: Synchronizer::new(0),
            wr_gray_sync: Synchronizer::new(0),
        }
    }

    fn depth(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot(&self, ptr: u32) -> usize {
        (ptr & (self.depth() - 1)) as usize
    }

    // Write domain

    pub fn is_full(&self) -> bool {
        let rd = from_gray(self.rd_gray_sync.get());
        self.wr_ptr.wrapping_sub(rd) >= self.depth()
    }

    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let slot = self.slot(self.wr_ptr);
        self.slots[slot] = Some(item);
        self.wr_ptr = self.wr_ptr.wrapping_add(1);
        trace!("cdc: push, wr_ptr = {}", self.wr_ptr);
        Ok(())
    }

    pub fn tick_write(&mut self) {
        self.rd_gray_sync.tick(to_gray(self.rd_ptr));
    }

    // Read domain

    pub fn is_empty(&self) -> bool {
        let wr = from_gray(self.wr_gray_sync.get());
        wr == self.rd_ptr
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.slot(self.rd_ptr)].as_ref()
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let slot = self.slot(self.rd_ptr);
        let item = self.slots[slot].take();
        self.rd_ptr = self.rd_ptr.wrapping_add(1);
        trace!("cdc: pop, rd_ptr = {}", self.rd_ptr);
        item
    }

    pub fn tick_read(&mut self) {
        self.wr_gray_sync.tick(to_gray(self.wr_ptr));
    }
}
