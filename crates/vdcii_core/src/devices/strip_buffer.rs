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

    devices::strip_buffer.rs

    Double buffered strip of four character pairs. A pair holds the
    attribute in the high byte and the character code (or, after the font
    phase, the font bitmap byte) in the low byte.

    The back buffer is written by the video fetch engine and is also read
    on the engine's character code path. The front buffer is read by the
    display pipeline. A swap toggles ownership on the following clock edge.

*/

pub const STRIP_PAIRS: usize = 4;

/// Back buffer write port for one cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StripWrite {
    pub addr: usize,
    pub attr_we: bool,
    pub char_we: bool,
}

impl StripWrite {
    pub fn is_write(&self) -> bool {
        self.attr_we || self.char_we
    }
}

#[derive(Clone, Debug, Default)]
pub struct StripBuffer {
    cols:  [[u16; STRIP_PAIRS]; 2],
    back:  usize,
    swaps: u64,
}

impl StripBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Physical index of the buffer currently written by the fetch engine.
    #[inline]
    pub fn back_index(&self) -> usize {
        self.back
    }

    /// Physical index of the buffer currently read by the display pipeline.
    #[inline]
    pub fn front_index(&self) -> usize {
        self.back ^ 1
    }

    #[inline]
    pub fn back_pair(&self, addr: usize) -> u16 {
        self.cols[self.back][addr & (STRIP_PAIRS - 1)]
    }

    #[inline]
    pub fn front_pair(&self, addr: usize) -> u16 {
        self.cols[self.front_index()][addr & (STRIP_PAIRS - 1)]
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// Clock edge. Writes land in the back buffer selected before the swap.
    pub fn commit(&mut self, write: &StripWrite, data: u8, swap: bool) {
        let slot = &mut self.cols[self.back][write.addr & (STRIP_PAIRS - 1)];
        if write.attr_we {
            *slot = (*slot & 0x00FF) | ((data as u16) << 8);
        }
        if write.char_we {
            *slot = (*slot & 0xFF00) | data as u16;
        }
        if swap {
            self.back ^= 1;
            self.swaps += 1;
        }
    }
}
