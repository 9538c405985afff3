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

    devices::fetch_scheduler.rs

    Fetch Scheduler. Decides, per scanline, when the video fetch engine
    starts a burst and when the strip buffer swaps.

    After horizontal sync, if the line is inside the vertical display window,
    the first strip of the line is prefetched with a pointer reload and
    swapped to the front as soon as it lands. The next strip is requested as
    display enable rises, and every fourth character clock thereafter the
    strips are swapped and the following burst is started, so a full strip
    is always waiting in the back buffer when the display needs it.

    The row address generator keeps the start-of-row pointers handed to the
    engine on reload, and the raster row within a character row used for
    font addressing.

*/

use std::fmt;

use crate::devices::strip_buffer::STRIP_PAIRS;

const LAST_COLUMN: u8 = STRIP_PAIRS as u8 - 1;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    WaitSync,
    WaitDisplayWindow,
    Prefetching,
    WaitDisplayEnable,
    Column(u8),
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::WaitSync => write!(f, "WaitSync"),
            SchedulerState::WaitDisplayWindow => write!(f, "WaitDisplayWindow"),
            SchedulerState::Prefetching => write!(f, "Prefetching"),
            SchedulerState::WaitDisplayEnable => write!(f, "WaitDisplayEnable"),
            SchedulerState::Column(n) => write!(f, "Column{}", n),
        }
    }
}

/// Timing signals from the sync generators.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingInputs {
    pub hsync: bool,
    pub vsync: bool,
    /// Vertical display window.
    pub vden: bool,
    /// Display enable, horizontal and vertical.
    pub den: bool,
    /// Last dot of a character.
    pub char_clock: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SchedulerOutputs {
    pub go: bool,
    pub reload: bool,
    pub swap: bool,
    pub pair_addr: usize,
    /// Last displayed character of a line has been shown.
    pub line_done: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FetchScheduler {
    state: SchedulerState,
}

impl FetchScheduler {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn outputs(&self, t: &TimingInputs, vfe_done: bool) -> SchedulerOutputs {
        let mut out = SchedulerOutputs::default();
        match self.state {
            SchedulerState::WaitSync => {}
            SchedulerState::WaitDisplayWindow => {
                if !t.hsync && t.vden {
                    out.go = true;
                    out.reload = true;
                }
            }
            SchedulerState::Prefetching => {
                out.swap = vfe_done;
            }
            SchedulerState::WaitDisplayEnable => {
                out.go = t.den;
            }
            SchedulerState::Column(n) => {
                out.pair_addr = n as usize;
                if !t.den {
                    out.line_done = true;
                }
                else if t.char_clock && n == LAST_COLUMN {
                    out.go = true;
                    out.swap = true;
                }
            }
        }
        out
    }

    pub fn commit(&mut self, t: &TimingInputs, vfe_done: bool) {
        self.state = match self.state {
            SchedulerState::WaitSync => {
                if t.hsync {
                    SchedulerState::WaitDisplayWindow
                }
                else {
                    SchedulerState::WaitSync
                }
            }
            SchedulerState::WaitDisplayWindow => {
                if t.hsync {
                    SchedulerState::WaitDisplayWindow
                }
                else if t.vden {
                    SchedulerState::Prefetching
                }
                else {
                    SchedulerState::WaitSync
                }
            }
            SchedulerState::Prefetching => {
                if vfe_done {
                    SchedulerState::WaitDisplayEnable
                }
                else {
                    SchedulerState::Prefetching
                }
            }
            SchedulerState::WaitDisplayEnable => {
                if t.den {
                    if t.char_clock {
                        SchedulerState::Column(1)
                    }
                    else {
                        SchedulerState::Column(0)
                    }
                }
                else if t.hsync {
                    // Display enable never came on this line.
                    SchedulerState::WaitDisplayWindow
                }
                else {
                    SchedulerState::WaitDisplayEnable
                }
            }
            SchedulerState::Column(n) => {
                if !t.den {
                    SchedulerState::WaitSync
                }
                else if t.char_clock {
                    SchedulerState::Column((n + 1) % STRIP_PAIRS as u8)
                }
                else {
                    SchedulerState::Column(n)
                }
            }
        };
    }
}

/// Register file inputs to the row address generator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RowRegisters {
    pub attr_base: u16,
    pub char_base: u16,
    /// Horizontal displayed plus address increment.
    pub stride: u16,
    /// Last raster row of a character row.
    pub vct: u8,
    pub bitmap_mode: bool,
}

#[derive(Clone, Debug, Default)]
pub struct RowAddressGenerator {
    attr_row: u16,
    char_row: u16,
    ra: u8,
}

impl RowAddressGenerator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn attr_row(&self) -> u16 {
        self.attr_row
    }

    pub fn char_row(&self) -> u16 {
        self.char_row
    }

    pub fn ra(&self) -> u8 {
        self.ra
    }

    pub fn commit(&mut self, regs: &RowRegisters, vsync: bool, line_done: bool) {
        if vsync {
            self.attr_row = regs.attr_base;
            self.char_row = regs.char_base;
            self.ra = 0;
            return;
        }
        if !line_done {
            return;
        }
        if !regs.bitmap_mode && self.ra != regs.vct {
            self.ra = (self.ra + 1) & 0x1F;
            return;
        }
        self.ra = 0;
        self.attr_row = self.attr_row.wrapping_add(regs.stride);
        self.char_row = self.char_row.wrapping_add(regs.stride);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(sched: &mut FetchScheduler, t: TimingInputs, done: bool) -> SchedulerOutputs {
        let out = sched.outputs(&t, done);
        sched.commit(&t, done);
        out
    }

    const HSYNC: TimingInputs = TimingInputs {
        hsync: true,
        vsync: false,
        vden: true,
        den: false,
        char_clock: false,
    };

    const BLANK: TimingInputs = TimingInputs {
        hsync: false,
        vsync: false,
        vden: true,
        den: false,
        char_clock: false,
    };

    #[test]
    fn test_prefetch_after_sync_in_window() {
        let mut sched = FetchScheduler::new();
        assert_eq!(sched.state(), SchedulerState::WaitSync);

        step(&mut sched, HSYNC, false);
        assert_eq!(sched.state(), SchedulerState::WaitDisplayWindow);
        let out = step(&mut sched, HSYNC, false);
        assert!(!out.go);

        let out = step(&mut sched, BLANK, false);
        assert!(out.go && out.reload && !out.swap);
        assert_eq!(sched.state(), SchedulerState::Prefetching);

        for _ in 0..5 {
            let out = step(&mut sched, BLANK, false);
            assert!(!out.go && !out.swap);
        }
        let out = step(&mut sched, BLANK, true);
        assert!(out.swap && !out.go);
        assert_eq!(sched.state(), SchedulerState::WaitDisplayEnable);
    }

    #[test]
    fn test_outside_window_returns_to_wait_sync() {
        let mut sched = FetchScheduler::new();
        step(&mut sched, HSYNC, false);
        let out = step(&mut sched, TimingInputs { vden: false, ..BLANK }, false);
        assert!(!out.go);
        assert_eq!(sched.state(), SchedulerState::WaitSync);
    }

    #[test]
    fn test_columns_swap_every_fourth_character() {
        let mut sched = FetchScheduler::new();
        step(&mut sched, HSYNC, false);
        step(&mut sched, BLANK, false);
        step(&mut sched, BLANK, true);

        let disp = TimingInputs { den: true, ..BLANK };
        let tick = TimingInputs { char_clock: true, ..disp };

        let out = step(&mut sched, disp, false);
        assert!(out.go && !out.reload && !out.swap);
        assert_eq!(sched.state(), SchedulerState::Column(0));

        let mut swaps = 0;
        let mut gos = 0;
        let mut addrs = Vec::new();
        for _ in 0..8 {
            let out = step(&mut sched, disp, false);
            addrs.push(out.pair_addr);
            let out = step(&mut sched, tick, false);
            addrs.push(out.pair_addr);
            swaps += out.swap as u32;
            gos += out.go as u32;
            assert_eq!(out.go, out.swap);
            assert!(!out.reload);
        }
        assert_eq!(swaps, 2);
        assert_eq!(gos, 2);
        assert_eq!(&addrs[0..8], &[0, 0, 1, 1, 2, 2, 3, 3]);

        let out = step(&mut sched, BLANK, false);
        assert!(out.line_done && !out.go && !out.swap);
        assert_eq!(sched.state(), SchedulerState::WaitSync);
    }

    #[test]
    fn test_display_enable_on_char_clock_skips_column0() {
        let mut sched = FetchScheduler::new();
        step(&mut sched, HSYNC, false);
        step(&mut sched, BLANK, false);
        step(&mut sched, BLANK, true);
        step(
            &mut sched,
            TimingInputs {
                den: true,
                char_clock: true,
                ..BLANK
            },
            false,
        );
        assert_eq!(sched.state(), SchedulerState::Column(1));
    }

    #[test]
    fn test_missing_display_enable_recovers_on_sync() {
        let mut sched = FetchScheduler::new();
        step(&mut sched, HSYNC, false);
        step(&mut sched, BLANK, false);
        step(&mut sched, BLANK, true);
        step(&mut sched, HSYNC, false);
        assert_eq!(sched.state(), SchedulerState::WaitDisplayWindow);
    }

    fn rows(bitmap_mode: bool) -> RowRegisters {
        RowRegisters {
            attr_base: 0x0800,
            char_base: 0x0000,
            stride: 80,
            vct: 7,
            bitmap_mode,
        }
    }

    #[test]
    fn test_row_generator_text_mode() {
        let regs = rows(false);
        let mut rg = RowAddressGenerator::new();
        rg.commit(&regs, true, false);
        assert_eq!((rg.attr_row(), rg.char_row(), rg.ra()), (0x0800, 0x0000, 0));

        for expected in 1..=7 {
            rg.commit(&regs, false, true);
            assert_eq!(rg.ra(), expected);
            assert_eq!(rg.char_row(), 0);
        }
        rg.commit(&regs, false, true);
        assert_eq!(rg.ra(), 0);
        assert_eq!(rg.char_row(), 80);
        assert_eq!(rg.attr_row(), 0x0800 + 80);

        // Lines without display enable leave the generator alone.
        rg.commit(&regs, false, false);
        assert_eq!(rg.char_row(), 80);

        rg.commit(&regs, true, false);
        assert_eq!(rg.char_row(), 0);
    }

    #[test]
    fn test_row_generator_bitmap_mode() {
        let regs = rows(true);
        let mut rg = RowAddressGenerator::new();
        rg.commit(&regs, true, false);
        for line in 1..=3u16 {
            rg.commit(&regs, false, true);
            assert_eq!(rg.char_row(), 80 * line);
            assert_eq!(rg.ra(), 0);
        }
    }
}
