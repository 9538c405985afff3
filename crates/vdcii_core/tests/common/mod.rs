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

    tests::common::mod.rs

    Shared setup for the integration tests: a small 16 column, 4 row
    screen that completes a frame in a few tens of thousands of clocks.

*/

#![allow(dead_code)]

use vdcii_core::{
    devices::vram::VramSize,
    tracelogger::TraceLogger,
    vdc::CycleStatus,
    Vdc,
};

pub const CHAR_BASE: u16 = 0x0000;
pub const ATTR_BASE: u16 = 0x0800;
pub const FONT_BASE: u16 = 0x2000;
pub const SCRATCH: u16 = 0x1000;

pub const COLUMNS: usize = 16;
pub const ROWS: usize = 4;
pub const ROW_LINES: usize = 8;
pub const LINE_CYCLES: u64 = 40 * 8;
pub const FRAME_CYCLES: u64 = LINE_CYCLES * 8 * 10;

pub const MODE_TEXT: u8 = 0x40;
pub const MODE_BITMAP: u8 = 0x80;

pub fn small_screen(mode: u8) -> Vdc {
    let mut vdc = Vdc::new(VramSize::K16, TraceLogger::None);
    let regs: [(usize, u8); 19] = [
        (0, 39),   // 40 characters per line
        (1, COLUMNS as u8),
        (2, 24),
        (3, 0x24), // vsync 2 lines, hsync 4 characters
        (4, 9),    // 10 rows per frame
        (5, 0),
        (6, ROWS as u8),
        (7, 6),
        (9, ROW_LINES as u8 - 1),
        (12, (CHAR_BASE >> 8) as u8),
        (13, CHAR_BASE as u8),
        (20, (ATTR_BASE >> 8) as u8),
        (21, ATTR_BASE as u8),
        (22, 0x78), // 8 dots per character
        (24, 0x00),
        (25, mode),
        (26, 0xF0),
        (27, 0),
        (28, ((FONT_BASE >> 13) as u8) << 5),
    ];
    for (reg, val) in regs {
        vdc.set_register(reg, val).unwrap();
    }
    vdc
}

pub fn font_byte(code: u16, ra: u16) -> u8 {
    ((code as u8).wrapping_mul(3)) ^ ((ra as u8) << 4) ^ ((code >> 8) as u8 * 0x80)
}

/// Fill the whole 512 character font region.
pub fn load_font(vdc: &mut Vdc) {
    for code in 0..0x200u16 {
        for ra in 0..16u16 {
            vdc.vram_mut().poke(FONT_BASE + (code << 4) + ra, font_byte(code, ra));
        }
    }
}

/// Screen and attribute memory for every displayed cell.
pub fn load_screen(vdc: &mut Vdc) {
    for i in 0..(COLUMNS * ROWS) as u16 {
        vdc.vram_mut().poke(CHAR_BASE + i, (0x20 + i * 7) as u8);
        // Every fifth cell selects the alternate character set.
        let alt = if i % 5 == 0 { 0x80 } else { 0x00 };
        vdc.vram_mut().poke(ATTR_BASE + i, alt | (i as u8 & 0x3F));
    }
}

/// Run until the first vertical sync has started.
pub fn run_to_first_frame(vdc: &mut Vdc) {
    let ran = vdc.run_frames(1, FRAME_CYCLES * 2);
    assert!(ran < FRAME_CYCLES * 2, "no vertical sync");
}

/// Tick until `lines` displayed lines have gone by, returning the pair shown
/// on the last dot of every displayed character, line by line.
pub fn collect_lines(vdc: &mut Vdc, lines: usize) -> Vec<Vec<u16>> {
    let mut out = Vec::new();
    let mut line = Vec::new();
    let limit = FRAME_CYCLES * 3;
    let mut cycles = 0;
    while out.len() < lines {
        vdc.tick();
        cycles += 1;
        assert!(cycles < limit, "display lines not produced");
        let status = vdc.last_cycle();
        if status.timing.den {
            if status.timing.char_clock {
                line.push(vdc.outputs().pair);
            }
        }
        else if !line.is_empty() {
            out.push(std::mem::take(&mut line));
        }
    }
    out
}

/// Tick `cycles` times, recording every cycle.
pub fn record(vdc: &mut Vdc, cycles: u64) -> Vec<CycleStatus> {
    let mut trace = Vec::with_capacity(cycles as usize);
    for _ in 0..cycles {
        vdc.tick();
        trace.push(*vdc.last_cycle());
    }
    trace
}
