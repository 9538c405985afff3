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

    devices::mpe.rs

    Memory Port Engine. Services host accesses to video memory through the
    update location pointer: prefetch on pointer write, read with
    auto-increment, write, and block copy / block fill. The engine is the
    CPU-side client of the arbiter and is driven by one trigger per cycle
    from the register file.

    The register file owns the pointers, the byte count, the write latch and
    the block copy flag. The engine owns the read latch and reports the
    increment/decrement pulses the register file must apply on the same
    clock edge.

*/

use strum_macros::{Display, EnumIter};

use crate::bus::{BusRequest, BusResponse};

/// One-shot trigger from the register file. At most one per cycle.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum MpeRequest {
    /// Either half of the update location was written.
    WritePointer,
    /// The data register was read.
    ReadData,
    /// The data register was written.
    WriteData,
    /// The byte count register was written.
    WriteByteCount,
}

#[derive(Copy, Clone, Debug, Default, Display, EnumIter, PartialEq, Eq)]
pub enum MpeState {
    #[default]
    Idle,
    PrefetchAddress,
    PrefetchWait,
    StoreAddress,
    StoreWait,
    BlockAddress,
    BlockWait,
    BlockStore,
    BlockStoreWait,
}

/// Register file values referenced by the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MpeRegisters {
    pub update_location: u16,
    pub copy_source: u16,
    pub byte_count: u8,
    pub data_write: u8,
    pub block_copy: bool,
}

/// Pointer maintenance requests, applied by the register file on the
/// edge ending the cycle in which they are asserted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MpePulses {
    pub incr_update_location: bool,
    pub incr_copy_source: bool,
    pub decr_byte_count: bool,
}

impl MpePulses {
    pub fn any(&self) -> bool {
        self.incr_update_location || self.incr_copy_source || self.decr_byte_count
    }
}

pub struct MemoryPortEngine {
    state: MpeState,
    data_read: u8,
    // Set once a block iteration has completed, so a zero count seen in
    // BlockAddress distinguishes loop exit from a zero-length request.
    block_active: bool,
    addr_mask: u16,
    block_iterations: u64,
}

impl MemoryPortEngine {
    pub fn new(addr_mask: u16) -> Self {
        Self {
            state: MpeState::Idle,
            data_read: 0,
            block_active: false,
            addr_mask,
            block_iterations: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = MpeState::Idle;
        self.data_read = 0;
        self.block_active = false;
        self.block_iterations = 0;
    }

    #[inline]
    pub fn state(&self) -> MpeState {
        self.state
    }

    /// True only while idle. The host must not issue a trigger otherwise.
    #[inline]
    pub fn ready(&self) -> bool {
        self.state == MpeState::Idle
    }

    /// The CPU-readable data latch.
    #[inline]
    pub fn data_read(&self) -> u8 {
        self.data_read
    }

    pub fn block_iterations(&self) -> u64 {
        self.block_iterations
    }

    /// Bus request driven this cycle. Depends on registered state only.
    pub fn bus_request(&self, regs: &MpeRegisters) -> BusRequest {
        let upd = regs.update_location & self.addr_mask;
        match self.state {
            MpeState::Idle => BusRequest::IDLE,
            MpeState::PrefetchAddress => BusRequest::read(upd),
            MpeState::StoreAddress => BusRequest::write(upd, regs.data_write),
            MpeState::BlockAddress => {
                if regs.byte_count != 0 && regs.block_copy {
                    BusRequest::read(regs.copy_source & self.addr_mask)
                }
                else {
                    BusRequest::IDLE
                }
            }
            MpeState::BlockStore => BusRequest::write(upd, self.data_read),
            MpeState::PrefetchWait | MpeState::StoreWait | MpeState::BlockWait | MpeState::BlockStoreWait => {
                BusRequest::HOLD
            }
        }
    }

    /// Increment/decrement pulses asserted this cycle.
    pub fn pulses(&self, request: Option<MpeRequest>, rsp: &BusResponse, regs: &MpeRegisters) -> MpePulses {
        let mut pulses = MpePulses::default();
        match self.state {
            MpeState::Idle => {
                if let Some(MpeRequest::ReadData) = request {
                    pulses.incr_update_location = true;
                }
            }
            MpeState::StoreWait => {
                pulses.incr_update_location = rsp.ack;
            }
            MpeState::BlockStoreWait => {
                if rsp.ack {
                    pulses.incr_update_location = true;
                    pulses.decr_byte_count = true;
                    pulses.incr_copy_source = regs.block_copy;
                }
            }
            _ => {}
        }
        pulses
    }

    /// Clock edge. A trigger presented while not idle is ignored.
    pub fn commit(&mut self, request: Option<MpeRequest>, rsp: &BusResponse, regs: &MpeRegisters) {
        self.state = match self.state {
            MpeState::Idle => match request {
                Some(MpeRequest::WritePointer) | Some(MpeRequest::ReadData) => MpeState::PrefetchAddress,
                Some(MpeRequest::WriteData) => MpeState::StoreAddress,
                Some(MpeRequest::WriteByteCount) => {
                    self.block_active = false;
                    MpeState::BlockAddress
                }
                None => MpeState::Idle,
            },
            MpeState::PrefetchAddress => {
                if rsp.stall {
                    MpeState::PrefetchAddress
                }
                else {
                    MpeState::PrefetchWait
                }
            }
            MpeState::PrefetchWait => {
                if rsp.ack {
                    self.data_read = rsp.dat;
                    MpeState::Idle
                }
                else {
                    MpeState::PrefetchWait
                }
            }
            MpeState::StoreAddress => {
                if rsp.stall {
                    MpeState::StoreAddress
                }
                else {
                    MpeState::StoreWait
                }
            }
            MpeState::StoreWait => {
                if rsp.ack {
                    MpeState::PrefetchAddress
                }
                else {
                    MpeState::StoreWait
                }
            }
            MpeState::BlockAddress => {
                if regs.byte_count == 0 {
                    let next = if self.block_active {
                        MpeState::PrefetchAddress
                    }
                    else {
                        MpeState::Idle
                    };
                    self.block_active = false;
                    next
                }
                else if regs.block_copy {
                    if rsp.stall {
                        MpeState::BlockAddress
                    }
                    else {
                        MpeState::BlockWait
                    }
                }
                else {
                    self.data_read = regs.data_write;
                    MpeState::BlockStore
                }
            }
            MpeState::BlockWait => {
                if rsp.ack {
                    self.data_read = rsp.dat;
                    MpeState::BlockStore
                }
                else {
                    MpeState::BlockWait
                }
            }
            MpeState::BlockStore => {
                if rsp.stall {
                    MpeState::BlockStore
                }
                else {
                    MpeState::BlockStoreWait
                }
            }
            MpeState::BlockStoreWait => {
                if rsp.ack {
                    self.block_active = true;
                    self.block_iterations += 1;
                    MpeState::BlockAddress
                }
                else {
                    MpeState::BlockStoreWait
                }
            }
        };
    }
}
