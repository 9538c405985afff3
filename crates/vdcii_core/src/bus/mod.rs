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

    bus::mod.rs

    Video memory bus signals. Every initiator (the video fetch engine and
    the memory port engine) drives a BusRequest each cycle and observes a
    BusResponse. A strobe that is not stalled is acknowledged exactly one
    cycle later; read data is valid in the acknowledge cycle.

*/

pub mod arbiter;

pub use arbiter::{Arbiter, ArbiterOutputs, Grant};

pub const NO_IO_BYTE: u8 = 0xFF;

/// Host CPU interface of a device. Accesses are sampled on the device's
/// next clock edge; the value returned by a read reflects registered state.
pub trait HostPort {
    /// Read a byte from the specified port. The default implementation
    /// returns NO_IO_BYTE (0xFF).
    fn read_u8(&mut self, _port: u16) -> u8 {
        NO_IO_BYTE
    }

    /// Write a byte to the specified port.
    fn write_u8(&mut self, port: u16, data: u8);
}

/// Initiator side of a bus cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BusRequest {
    pub cyc: bool,
    pub stb: bool,
    pub we:  bool,
    pub adr: u16,
    pub dat: u8,
}

impl BusRequest {
    pub const IDLE: BusRequest = BusRequest {
        cyc: false,
        stb: false,
        we:  false,
        adr: 0,
        dat: 0,
    };

    /// Cycle held open while waiting on an acknowledge, no new strobe.
    pub const HOLD: BusRequest = BusRequest {
        cyc: true,
        stb: false,
        we:  false,
        adr: 0,
        dat: 0,
    };

    pub fn read(adr: u16) -> Self {
        BusRequest {
            cyc: true,
            stb: true,
            we: false,
            adr,
            dat: 0,
        }
    }

    pub fn write(adr: u16, dat: u8) -> Self {
        BusRequest {
            cyc: true,
            stb: true,
            we: true,
            adr,
            dat,
        }
    }
}

/// Responder side of a bus cycle, as seen by one initiator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BusResponse {
    pub stall: bool,
    pub ack:   bool,
    pub dat:   u8,
}

/// The single request routed to video memory in a given cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryCycle {
    pub stb: bool,
    pub we:  bool,
    pub adr: u16,
    pub dat: u8,
}
