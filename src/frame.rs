use std::fmt;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// One transfer on the parallel stream interface. Lane 0 is `data[0]`.
///
/// With `data_bits < 8` only the low `data_bits` of each lane are sent, and
/// received lanes have the upper bits clear.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBeat {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
}

impl StreamBeat {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn splat(byte: u8, width: usize) -> Self {
        Self {
            data: vec![byte; width],
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.data.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for StreamBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamBeat[")?;
        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02X}")?;
        }
        write!(f, "]")
    }
}

// Packed LSB first: start bit, data bits, optional parity bit, stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UartFrame {
    bits: u16,
    len: u8,
}

impl UartFrame {
    pub fn new(data: u8, config: &Config) -> Self {
        let data_bits = config.data_bits as usize;
        let mut bits = 0u16;
        let view = bits.view_bits_mut::<Lsb0>();

        // Start bit stays 0
        let mut pos = 1;
        view[pos..pos + data_bits].store(data & mask(config.data_bits));
        pos += data_bits;
        if let Some(parity) = config.parity.bit(data & mask(config.data_bits)) {
            view.set(pos, parity);
            pos += 1;
        }
        for _ in 0..config.stop_bits {
            view.set(pos, true);
            pos += 1;
        }

        Self {
            bits,
            len: pos as u8,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, pos: usize) -> bool {
        self.bits.view_bits::<Lsb0>()[pos]
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.view_bits::<Lsb0>()[..self.len()].iter().by_vals()
    }
}

pub fn mask(data_bits: u8) -> u8 {
    (0xFFu16 >> (8 - data_bits.min(8))) as u8
}
