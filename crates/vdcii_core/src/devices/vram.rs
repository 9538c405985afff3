/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    devices::vram.rs

    Video memory. A flat byte array with one synchronous read port and one
    write port. The read latch captures the byte at the address presented
    on a strobed cycle and is visible on the following cycle, which is the
    cycle the arbiter acknowledges. A write and a read of the same address
    in one cycle returns the new data.

*/

use std::str::FromStr;

use serde_derive::Deserialize;
use strum_macros::{Display, EnumIter};

use crate::{bus::MemoryCycle, error::VdcError};

#[derive(Copy, Clone, Debug, Default, Deserialize, Display, EnumIter, PartialEq, Eq)]
pub enum VramSize {
    #[default]
    #[serde(alias = "16K", alias = "16k")]
    #[strum(serialize = "16K")]
    K16,
    #[serde(alias = "64K", alias = "64k")]
    #[strum(serialize = "64K")]
    K64,
}

impl VramSize {
    pub fn len(&self) -> usize {
        match self {
            VramSize::K16 => 0x4000,
            VramSize::K64 => 0x10000,
        }
    }

    pub fn addr_mask(&self) -> u16 {
        (self.len() - 1) as u16
    }

    pub fn addr_bits(&self) -> u32 {
        match self {
            VramSize::K16 => 14,
            VramSize::K64 => 16,
        }
    }
}

impl FromStr for VramSize {
    type Err = VdcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "16K" | "K16" | "16" => Ok(VramSize::K16),
            "64K" | "K64" | "64" => Ok(VramSize::K64),
            _ => Err(VdcError::InvalidVramSize(value.to_string())),
        }
    }
}

pub struct Vram {
    size: VramSize,
    mem: Vec<u8>,
    read_latch: u8,
}

impl Vram {
    pub fn new(size: VramSize) -> Self {
        Self {
            size,
            mem: vec![0; size.len()],
            read_latch: 0,
        }
    }

    pub fn size(&self) -> VramSize {
        self.size
    }

    /// The byte read on the previous strobed cycle.
    #[inline]
    pub fn read_latch(&self) -> u8 {
        self.read_latch
    }

    /// Apply the routed memory cycle on the clock edge.
    pub fn commit(&mut self, cycle: &MemoryCycle) {
        if !cycle.stb {
            return;
        }
        let addr = (cycle.adr & self.size.addr_mask()) as usize;
        if cycle.we {
            self.mem[addr] = cycle.dat;
        }
        self.read_latch = self.mem[addr];
    }

    /// Read without disturbing the read latch.
    pub fn peek(&self, addr: u16) -> u8 {
        self.mem[(addr & self.size.addr_mask()) as usize]
    }

    /// Write without going through the bus.
    pub fn poke(&mut self, addr: u16, data: u8) {
        let mask = self.size.addr_mask();
        self.mem[(addr & mask) as usize] = data;
    }

    /// Copy an image into memory at `offset`.
    pub fn load(&mut self, offset: usize, image: &[u8]) -> Result<(), VdcError> {
        if offset + image.len() > self.mem.len() {
            return Err(VdcError::ImageTooLarge {
                len: image.len(),
                offset,
                size: self.size,
            });
        }
        self.mem[offset..offset + image.len()].copy_from_slice(image);
        log::debug!("Loaded {} bytes into video memory at {:04X}", image.len(), offset);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mem
    }
}
