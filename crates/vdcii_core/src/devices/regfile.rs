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

    devices::regfile.rs

    The 8563 compatible register bank. Registers R0 through R37 are
    addressed through the host port's register select. Register writes and
    data port reads generate the memory port engine's triggers, and the
    engine's increment/decrement pulses are applied here on the same edge.

    Registers not modeled here read as 0xFF and ignore writes. Unused bits
    of modeled registers read as 1.

*/

use modular_bitfield::prelude::*;

use crate::{
    devices::{
        fetch_scheduler::{RowAddressGenerator, RowRegisters},
        mpe::{MpePulses, MpeRegisters, MpeRequest},
        syncgen::SyncRegisters,
        video_fetch::FetchRegisters,
    },
    error::VdcError,
};

pub const REGISTER_MAX: usize = 37;

const DEFAULT_HORIZONTAL_TOTAL: u8 = 0x7E;
const DEFAULT_HORIZONTAL_DISPLAYED: u8 = 0x50;
const DEFAULT_HORIZONTAL_SYNC_POS: u8 = 0x66;
const DEFAULT_SYNC_WIDTHS: u8 = 0x49;
const DEFAULT_VERTICAL_TOTAL: u8 = 0x20;
const DEFAULT_VERTICAL_DISPLAYED: u8 = 0x19;
const DEFAULT_VERTICAL_SYNC_POS: u8 = 0x1D;
const DEFAULT_CHAR_TOTAL_VERTICAL: u8 = 0x07;
const DEFAULT_ATTRIBUTE_BASE: u16 = 0x0800;
const DEFAULT_CHAR_HORIZONTAL: u8 = 0x78;
const DEFAULT_CONTROL: u8 = 0x20;
const DEFAULT_MODE: u8 = 0x40;
const DEFAULT_PENS: u8 = 0xF0;
const DEFAULT_FONT_BASE: u8 = 0x20;
const DEFAULT_SYNC_POLARITY: u8 = 0xFF;

const VCT_MASK: u8 = 0x1F;
const TALL_FONT_BIT: u8 = 0x10;

/// R3
#[bitfield]
#[derive(Copy, Clone)]
pub struct SyncWidths {
    pub hsw: B4,
    pub vsw: B4,
}

/// R22
#[bitfield]
#[derive(Copy, Clone)]
pub struct CharHorizontal {
    pub hcd: B4,
    pub hct: B4,
}

/// R24
#[bitfield]
#[derive(Copy, Clone)]
pub struct ControlRegister {
    pub vscroll: B5,
    pub blink_rate: bool,
    pub reverse: bool,
    pub block_copy: bool,
}

/// R25
#[bitfield]
#[derive(Copy, Clone)]
pub struct ModeRegister {
    pub hscroll: B4,
    pub dotclock: bool,
    pub semigraphic: bool,
    pub attr_enable: bool,
    pub bitmap: bool,
}

/// R26
#[bitfield]
#[derive(Copy, Clone)]
pub struct PenRegister {
    pub bg: B4,
    pub fg: B4,
}

/// R28
#[bitfield]
#[derive(Copy, Clone)]
pub struct FontBaseRegister {
    #[skip]
    unused: B5,
    pub font_base: B3,
}

/// R37
#[bitfield]
#[derive(Copy, Clone)]
pub struct SyncPolarity {
    #[skip]
    unused: B6,
    pub vsync_xor: bool,
    pub hsync_xor: bool,
}

/// A host access to the selected register, sampled on a clock edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RegAccess {
    Write { reg: u8, data: u8 },
    Read { reg: u8 },
}

pub struct RegisterFile {
    horizontal_total: u8,
    horizontal_displayed: u8,
    horizontal_sync_pos: u8,
    sync_widths: SyncWidths,
    vertical_total: u8,
    vertical_adjust: u8,
    vertical_displayed: u8,
    vertical_sync_pos: u8,
    char_total_vertical: u8,
    char_base: u16,
    update_location: u16,
    attr_base: u16,
    char_horizontal: CharHorizontal,
    control: ControlRegister,
    mode: ModeRegister,
    pens: PenRegister,
    address_increment: u8,
    font_base: FontBaseRegister,
    byte_count: u8,
    data_write: u8,
    copy_source: u16,
    sync_polarity: SyncPolarity,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            horizontal_total: DEFAULT_HORIZONTAL_TOTAL,
            horizontal_displayed: DEFAULT_HORIZONTAL_DISPLAYED,
            horizontal_sync_pos: DEFAULT_HORIZONTAL_SYNC_POS,
            sync_widths: SyncWidths::from_bytes([DEFAULT_SYNC_WIDTHS]),
            vertical_total: DEFAULT_VERTICAL_TOTAL,
            vertical_adjust: 0,
            vertical_displayed: DEFAULT_VERTICAL_DISPLAYED,
            vertical_sync_pos: DEFAULT_VERTICAL_SYNC_POS,
            char_total_vertical: DEFAULT_CHAR_TOTAL_VERTICAL,
            char_base: 0,
            update_location: 0,
            attr_base: DEFAULT_ATTRIBUTE_BASE,
            char_horizontal: CharHorizontal::from_bytes([DEFAULT_CHAR_HORIZONTAL]),
            control: ControlRegister::from_bytes([DEFAULT_CONTROL]),
            mode: ModeRegister::from_bytes([DEFAULT_MODE]),
            pens: PenRegister::from_bytes([DEFAULT_PENS]),
            address_increment: 0,
            font_base: FontBaseRegister::from_bytes([DEFAULT_FONT_BASE]),
            byte_count: 0,
            data_write: 0,
            copy_source: 0,
            sync_polarity: SyncPolarity::from_bytes([DEFAULT_SYNC_POLARITY]),
        }
    }
}

#[inline]
fn set_hi(word: &mut u16, byte: u8) {
    *word = (*word & 0x00FF) | ((byte as u16) << 8);
}

#[inline]
fn set_lo(word: &mut u16, byte: u8) {
    *word = (*word & 0xFF00) | byte as u16;
}

impl RegisterFile {
    pub fn new() -> Self {
        Default::default()
    }

    /// Memory port engine trigger produced by a host access.
    pub fn decode(access: Option<RegAccess>) -> Option<MpeRequest> {
        match access? {
            RegAccess::Write { reg: 18 | 19, .. } => Some(MpeRequest::WritePointer),
            RegAccess::Write { reg: 30, .. } => Some(MpeRequest::WriteByteCount),
            RegAccess::Write { reg: 31, .. } => Some(MpeRequest::WriteData),
            RegAccess::Read { reg: 31 } => Some(MpeRequest::ReadData),
            _ => None,
        }
    }

    /// Value returned to the host for a read of `reg`. `data_read` is the
    /// memory port engine's read latch.
    pub fn read(&self, reg: u8, data_read: u8) -> u8 {
        match reg {
            0 => self.horizontal_total,
            1 => self.horizontal_displayed,
            2 => self.horizontal_sync_pos,
            3 => self.sync_widths.into_bytes()[0],
            4 => self.vertical_total,
            5 => self.vertical_adjust | !0x1F,
            6 => self.vertical_displayed,
            7 => self.vertical_sync_pos,
            9 => self.char_total_vertical | !VCT_MASK,
            12 => (self.char_base >> 8) as u8,
            13 => self.char_base as u8,
            18 => (self.update_location >> 8) as u8,
            19 => self.update_location as u8,
            20 => (self.attr_base >> 8) as u8,
            21 => self.attr_base as u8,
            22 => self.char_horizontal.into_bytes()[0],
            24 => self.control.into_bytes()[0],
            25 => self.mode.into_bytes()[0],
            26 => self.pens.into_bytes()[0],
            27 => self.address_increment,
            28 => self.font_base.into_bytes()[0] | 0x1F,
            30 => self.byte_count,
            31 => data_read,
            32 => (self.copy_source >> 8) as u8,
            33 => self.copy_source as u8,
            37 => self.sync_polarity.into_bytes()[0] | 0x3F,
            _ => 0xFF,
        }
    }

    /// Clock edge. Applies the host write, if any, then the engine's
    /// pointer pulses. A write to a register being stepped this cycle is
    /// dropped.
    pub fn commit(&mut self, access: Option<RegAccess>, pulses: &MpePulses) {
        if let Some(RegAccess::Write { reg, data }) = access {
            let stepped = match reg {
                18 | 19 => pulses.incr_update_location,
                30 => pulses.decr_byte_count,
                32 | 33 => pulses.incr_copy_source,
                _ => false,
            };
            if stepped {
                log::warn!("Write to R{} dropped, register is being stepped", reg);
            }
            else {
                self.write(reg, data);
            }
        }

        if pulses.incr_update_location {
            self.update_location = self.update_location.wrapping_add(1);
        }
        if pulses.incr_copy_source {
            self.copy_source = self.copy_source.wrapping_add(1);
        }
        if pulses.decr_byte_count {
            self.byte_count = self.byte_count.wrapping_sub(1);
        }
    }

    fn write(&mut self, reg: u8, data: u8) {
        match reg {
            0 => self.horizontal_total = data,
            1 => self.horizontal_displayed = data,
            2 => self.horizontal_sync_pos = data,
            3 => self.sync_widths = SyncWidths::from_bytes([data]),
            4 => self.vertical_total = data,
            5 => self.vertical_adjust = data & 0x1F,
            6 => self.vertical_displayed = data,
            7 => self.vertical_sync_pos = data,
            9 => self.char_total_vertical = data & VCT_MASK,
            12 => set_hi(&mut self.char_base, data),
            13 => set_lo(&mut self.char_base, data),
            18 => set_hi(&mut self.update_location, data),
            19 => set_lo(&mut self.update_location, data),
            20 => set_hi(&mut self.attr_base, data),
            21 => set_lo(&mut self.attr_base, data),
            22 => self.char_horizontal = CharHorizontal::from_bytes([data]),
            24 => self.control = ControlRegister::from_bytes([data]),
            25 => self.mode = ModeRegister::from_bytes([data]),
            26 => self.pens = PenRegister::from_bytes([data]),
            27 => self.address_increment = data,
            28 => self.font_base = FontBaseRegister::from_bytes([data]),
            30 => self.byte_count = data,
            31 => self.data_write = data,
            32 => set_hi(&mut self.copy_source, data),
            33 => set_lo(&mut self.copy_source, data),
            37 => self.sync_polarity = SyncPolarity::from_bytes([data]),
            _ => log::debug!("Write to unimplemented register R{}: {:02X}", reg, data),
        }
    }

    /// Store a register value directly, without engine side effects.
    pub fn poke(&mut self, reg: usize, data: u8) -> Result<(), VdcError> {
        if reg > REGISTER_MAX {
            return Err(VdcError::RegisterOutOfRange(reg));
        }
        self.write(reg as u8, data);
        Ok(())
    }

    /// Register value as the host would read it, without side effects.
    pub fn peek(&self, reg: usize, data_read: u8) -> Result<u8, VdcError> {
        if reg > REGISTER_MAX {
            return Err(VdcError::RegisterOutOfRange(reg));
        }
        Ok(self.read(reg as u8, data_read))
    }

    pub fn update_location(&self) -> u16 {
        self.update_location
    }

    pub fn copy_source(&self) -> u16 {
        self.copy_source
    }

    pub fn byte_count(&self) -> u8 {
        self.byte_count
    }

    pub fn bitmap_mode(&self) -> bool {
        self.mode.bitmap()
    }

    pub fn hsync_xor(&self) -> bool {
        self.sync_polarity.hsync_xor()
    }

    pub fn vsync_xor(&self) -> bool {
        self.sync_polarity.vsync_xor()
    }

    pub fn mpe_registers(&self) -> MpeRegisters {
        MpeRegisters {
            update_location: self.update_location,
            copy_source: self.copy_source,
            byte_count: self.byte_count,
            data_write: self.data_write,
            block_copy: self.control.block_copy(),
        }
    }

    pub fn fetch_registers(&self, rows: &RowAddressGenerator) -> FetchRegisters {
        FetchRegisters {
            attr_base: rows.attr_row(),
            char_base: rows.char_row(),
            ra: rows.ra(),
            font_base: self.font_base.font_base(),
            tall_font: self.char_total_vertical & TALL_FONT_BIT != 0,
            attr_enable: self.mode.attr_enable(),
            bitmap_mode: self.mode.bitmap(),
        }
    }

    pub fn row_registers(&self) -> RowRegisters {
        RowRegisters {
            attr_base: self.attr_base,
            char_base: self.char_base,
            stride: self.horizontal_displayed as u16 + self.address_increment as u16,
            vct: self.char_total_vertical & VCT_MASK,
            bitmap_mode: self.mode.bitmap(),
        }
    }

    pub fn hsync_registers(&self) -> SyncRegisters {
        SyncRegisters {
            char_total: self.char_horizontal.hct(),
            total: self.horizontal_total,
            sync_pos: self.horizontal_sync_pos,
            sync_width: self.sync_widths.hsw(),
            displayed: self.horizontal_displayed,
            adjust: 0,
        }
    }

    pub fn vsync_registers(&self) -> SyncRegisters {
        SyncRegisters {
            char_total: self.char_total_vertical & VCT_MASK,
            total: self.vertical_total,
            sync_pos: self.vertical_sync_pos,
            sync_width: self.sync_widths.vsw(),
            displayed: self.vertical_displayed,
            adjust: self.vertical_adjust,
        }
    }
}
