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

    devices::syncgen.rs

    MC6845 style sync generator. One instance counts dots within a
    character and characters within a line; a second instance, clocked once
    per scanline by the first, counts raster lines within a character row
    and rows within a frame.

    The counters only move on cycles where `dotclken` is asserted. Sync
    counting additionally requires `syncen`, which gives the horizontal
    instance character resolution.

*/

/// Timing parameters for one axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncRegisters {
    /// Last dot (raster line) of a character (row).
    pub char_total: u8,
    /// Last character (row) of a line (frame).
    pub total: u8,
    pub sync_pos: u8,
    pub sync_width: u8,
    pub displayed: u8,
    /// Extra dots (raster lines) after the last character (row).
    pub adjust: u8,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOutputs {
    /// Last dot of a character.
    pub char_clock: bool,
    pub sync: bool,
    pub display_enable: bool,
    /// Last character of the sync pulse. Clocks the next axis.
    pub raster_clock: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SyncGen {
    dot: u8,
    chr: u8,
    sync_ctr: u8,
    disp_ctr: u8,
    adj_ctr: u8,
}

impl SyncGen {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn reset(&mut self) {
        *self = SyncGen::new();
    }

    /// Current character (row) counter.
    pub fn chr(&self) -> u8 {
        self.chr
    }

    /// Current dot (raster line) counter.
    pub fn dot(&self) -> u8 {
        self.dot
    }

    #[inline]
    pub fn outputs(&self, regs: &SyncRegisters) -> SyncOutputs {
        SyncOutputs {
            char_clock: self.dot == regs.char_total,
            sync: self.sync_ctr != 0,
            display_enable: self.disp_ctr != 0,
            raster_clock: self.sync_ctr == 1,
        }
    }

    pub fn commit(&mut self, regs: &SyncRegisters, dotclken: bool, syncen: bool) {
        if !dotclken {
            return;
        }

        let out = self.outputs(regs);
        let adj = self.adj_ctr != 0;
        let at_total = self.chr == regs.total;
        let go_sync = self.chr == regs.sync_pos;

        let mut dot = self.dot;
        let mut chr = self.chr;
        let mut adj_ctr = self.adj_ctr;
        let mut sync_ctr = self.sync_ctr;
        let mut disp_ctr = self.disp_ctr;
        let mut wrap = false;

        if adj {
            adj_ctr -= 1;
        }

        if out.char_clock {
            dot = 0;
        }
        else if !adj {
            dot = dot.wrapping_add(1);
        }

        if !adj && out.char_clock {
            if !at_total {
                chr = chr.wrapping_add(1);
            }
            else if regs.adjust == 0 {
                chr = 0;
                wrap = true;
            }
            else {
                adj_ctr = regs.adjust;
            }
        }
        if self.adj_ctr == 1 {
            chr = 0;
            wrap = true;
        }

        if syncen && out.char_clock && go_sync {
            sync_ctr = regs.sync_width;
        }
        else if syncen && !go_sync && out.sync {
            sync_ctr -= 1;
        }

        if wrap {
            disp_ctr = regs.displayed;
        }
        else if out.char_clock && !adj && out.display_enable {
            disp_ctr -= 1;
        }

        self.dot = dot;
        self.chr = chr;
        self.adj_ctr = adj_ctr;
        self.sync_ctr = sync_ctr;
        self.disp_ctr = disp_ctr;
    }
}
