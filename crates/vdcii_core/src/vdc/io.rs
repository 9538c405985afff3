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

    vdc::io.rs

    Host port of the VDC-II. Two addresses: the address register (write:
    register select, read: status) and the data register (the selected
    register). Register accesses take effect on the next clock edge.

*/

use super::*;
use crate::bus::HostPort;

pub const VDC_ADDRESS_PORT: u16 = 0xD600;
pub const VDC_DATA_PORT: u16 = 0xD601;
pub const VDC_PORT_MASK: u16 = 0x0001;

pub const VDC_VERSION: u8 = 0x02;

const STATUS_READY: u8 = 0b1000_0000;
const STATUS_LIGHTPEN: u8 = 0b0100_0000;
const STATUS_VBLANK: u8 = 0b0010_0000;
const STATUS_FIXED: u8 = 0b0001_1000;
const REGISTER_SELECT_MASK: u8 = 0b0011_1111;

impl HostPort for Vdc {
    fn read_u8(&mut self, port: u16) -> u8 {
        if port & VDC_PORT_MASK == 0 {
            self.handle_status_read()
        }
        else {
            let reg = self.register_select;
            self.queue_access(RegAccess::Read { reg });
            self.regs.read(reg, self.mpe.data_read())
        }
    }

    fn write_u8(&mut self, port: u16, data: u8) {
        if port & VDC_PORT_MASK == 0 {
            self.register_select = data & REGISTER_SELECT_MASK;
        }
        else {
            let reg = self.register_select;
            self.queue_access(RegAccess::Write { reg, data });
        }
    }
}

impl Vdc {
    fn handle_status_read(&self) -> u8 {
        let vblank = !self.vsyncgen.outputs(&self.regs.vsync_registers()).display_enable;
        let mut byte = STATUS_FIXED | VDC_VERSION;
        if self.mpe.ready() {
            byte |= STATUS_READY;
        }
        if vblank {
            byte |= STATUS_VBLANK;
        }
        // Light pen is not modeled.
        byte &= !STATUS_LIGHTPEN;
        byte
    }

    pub fn register_select(&self) -> u8 {
        self.register_select
    }

    /// Select `reg` and queue a write of `data` to it.
    pub fn write_register(&mut self, reg: u8, data: u8) {
        self.write_u8(VDC_ADDRESS_PORT, reg);
        self.write_u8(VDC_DATA_PORT, data);
    }

    /// Select `reg` and read it. A read of the data register queues the
    /// memory port engine's read-and-increment.
    pub fn read_register(&mut self, reg: u8) -> u8 {
        self.write_u8(VDC_ADDRESS_PORT, reg);
        self.read_u8(VDC_DATA_PORT)
    }

    /// Poll the status register until the memory port engine is ready,
    /// ticking between polls, as host software does before each data port
    /// access. Returns false if `limit` cycles pass first.
    pub fn wait_ready(&mut self, limit: u64) -> bool {
        let mut cycles = 0;
        loop {
            if self.pending.is_none() && self.read_u8(VDC_ADDRESS_PORT) & STATUS_READY != 0 {
                return true;
            }
            if cycles >= limit {
                return false;
            }
            self.tick();
            cycles += 1;
        }
    }
}
