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

    devices::video_fetch.rs

    Video Fetch Engine. Reads one strip (four columns) of attribute,
    character and font bytes from video memory into the back half of the
    strip buffer.

    The engine is two state machines walking the same sequence. The address
    generator presents addresses and advances whenever it is not stalled.
    The data receiver advances on each acknowledge and routes the returned
    byte into the strip buffer. A burst starts only when both are idle, and
    the address generator does not enter the font phase until the receiver
    has drained every character fetch, since font addresses are built from
    the character codes already in the strip buffer.

*/

use std::fmt;

use crate::{
    bus::{BusRequest, BusResponse},
    devices::strip_buffer::{StripWrite, STRIP_PAIRS},
};

const LAST_SLOT: u8 = STRIP_PAIRS as u8 - 1;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Attr(u8),
    Char(u8),
    Font(u8),
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => write!(f, "Idle"),
            FetchState::Attr(n) => write!(f, "A{}", n + 1),
            FetchState::Char(n) => write!(f, "C{}", n + 1),
            FetchState::Font(n) => write!(f, "F{}", n + 1),
        }
    }
}

impl FetchState {
    fn start(attr_enable: bool) -> Self {
        if attr_enable {
            FetchState::Attr(0)
        }
        else {
            FetchState::Char(0)
        }
    }

    /// Next state in the burst sequence.
    pub fn advance(self, bitmap_mode: bool) -> Self {
        match self {
            FetchState::Idle => FetchState::Idle,
            FetchState::Attr(LAST_SLOT) => FetchState::Char(0),
            FetchState::Attr(n) => FetchState::Attr(n + 1),
            FetchState::Char(LAST_SLOT) if bitmap_mode => FetchState::Idle,
            FetchState::Char(LAST_SLOT) => FetchState::Font(0),
            FetchState::Char(n) => FetchState::Char(n + 1),
            FetchState::Font(LAST_SLOT) => FetchState::Idle,
            FetchState::Font(n) => FetchState::Font(n + 1),
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    #[inline]
    pub fn slot(&self) -> usize {
        match self {
            FetchState::Idle => 0,
            FetchState::Attr(n) | FetchState::Char(n) | FetchState::Font(n) => *n as usize,
        }
    }
}

/// Register file and row address inputs to the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchRegisters {
    pub attr_base:   u16,
    pub char_base:   u16,
    pub ra:          u8,
    pub font_base:   u8,
    pub tall_font:   bool,
    pub attr_enable: bool,
    pub bitmap_mode: bool,
}

/// Start pulse from the fetch scheduler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchCommand {
    pub go: bool,
    pub reload: bool,
}

pub struct VideoFetchEngine {
    ag: FetchState,
    dr: FetchState,
    attr_ptr: u16,
    char_ptr: u16,
    bitmap_mode: bool,
    attr_enable: bool,
    done: bool,
    addr_mask: u16,
    bursts: u64,
    dropped_go: u64,
}

impl VideoFetchEngine {
    pub fn new(addr_mask: u16) -> Self {
        Self {
            ag: FetchState::Idle,
            dr: FetchState::Idle,
            attr_ptr: 0,
            char_ptr: 0,
            bitmap_mode: false,
            attr_enable: false,
            done: false,
            addr_mask,
            bursts: 0,
            dropped_go: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = VideoFetchEngine::new(self.addr_mask);
    }

    pub fn address_state(&self) -> FetchState {
        self.ag
    }

    pub fn receive_state(&self) -> FetchState {
        self.dr
    }

    pub fn attr_ptr(&self) -> u16 {
        self.attr_ptr
    }

    pub fn char_ptr(&self) -> u16 {
        self.char_ptr
    }

    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    pub fn dropped_go(&self) -> u64 {
        self.dropped_go
    }

    /// Both machines idle; a start pulse will be honored.
    #[inline]
    pub fn can_accept(&self) -> bool {
        self.ag.is_idle() && self.dr.is_idle()
    }

    /// One cycle pulse, the first cycle both machines are idle after a burst.
    #[inline]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Back buffer pair feeding the font address this cycle.
    #[inline]
    pub fn pair_addr(&self) -> usize {
        match self.ag {
            FetchState::Font(n) => n as usize,
            _ => 0,
        }
    }

    #[inline]
    fn go_font(&self) -> bool {
        self.dr == FetchState::Font(0)
    }

    /// Font memory address for the character in `pair`.
    pub fn font_address(&self, regs: &FetchRegisters, pair: u16) -> u16 {
        let mut charcode = (pair & 0x00FF) as u32;
        if self.attr_enable && (pair & 0x8000) != 0 {
            charcode |= 0x100;
        }
        let font_base = (regs.font_base & 0x07) as u32;
        let addr = if regs.tall_font {
            (regs.ra as u32 & 0x1F) | (charcode << 5) | ((font_base >> 1) << 14)
        }
        else {
            (regs.ra as u32 & 0x0F) | (charcode << 4) | (font_base << 13)
        };
        (addr as u16) & self.addr_mask
    }

    /// Bus request for this cycle. `pair` is the back buffer pair at
    /// `pair_addr()`.
    pub fn bus_request(&self, regs: &FetchRegisters, pair: u16) -> BusRequest {
        match self.ag {
            FetchState::Attr(_) => BusRequest::read(self.attr_ptr & self.addr_mask),
            FetchState::Char(_) => BusRequest::read(self.char_ptr & self.addr_mask),
            FetchState::Font(0) if !self.go_font() => BusRequest::HOLD,
            FetchState::Font(_) => BusRequest::read(self.font_address(regs, pair)),
            FetchState::Idle if !self.dr.is_idle() => BusRequest::HOLD,
            FetchState::Idle => BusRequest::IDLE,
        }
    }

    /// Strip buffer write port for this cycle.
    pub fn strip_write(&self, rsp: &BusResponse) -> StripWrite {
        match self.dr {
            FetchState::Idle => StripWrite::default(),
            FetchState::Attr(n) => StripWrite {
                addr: n as usize,
                attr_we: rsp.ack,
                char_we: false,
            },
            FetchState::Char(n) | FetchState::Font(n) => StripWrite {
                addr: n as usize,
                attr_we: false,
                char_we: rsp.ack,
            },
        }
    }

    /// Clock edge. Returns false if a start pulse was dropped because a
    /// burst was still in flight.
    pub fn commit(&mut self, cmd: &FetchCommand, regs: &FetchRegisters, rsp: &BusResponse) -> bool {
        let dr_was_busy = !self.dr.is_idle();

        if self.can_accept() {
            self.done = false;
            if cmd.go {
                self.bitmap_mode = regs.bitmap_mode;
                self.attr_enable = regs.attr_enable;
                if cmd.reload {
                    self.attr_ptr = regs.attr_base;
                    self.char_ptr = regs.char_base;
                }
                self.ag = FetchState::start(self.attr_enable);
                self.dr = self.ag;
                self.bursts += 1;
            }
            return true;
        }

        let ag_moves = match self.ag {
            FetchState::Idle => false,
            FetchState::Font(0) => self.go_font() && !rsp.stall,
            _ => !rsp.stall,
        };
        if ag_moves {
            match self.ag {
                FetchState::Attr(_) => self.attr_ptr = self.attr_ptr.wrapping_add(1),
                FetchState::Char(_) => self.char_ptr = self.char_ptr.wrapping_add(1),
                _ => {}
            }
            self.ag = self.ag.advance(self.bitmap_mode);
        }

        if rsp.ack {
            self.dr = self.dr.advance(self.bitmap_mode);
        }
        self.done = dr_was_busy && self.dr.is_idle();

        if cmd.go {
            self.dropped_go += 1;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bus::Arbiter,
        devices::{
            strip_buffer::StripBuffer,
            vram::{Vram, VramSize},
        },
    };

    struct Rig {
        vfe:   VideoFetchEngine,
        arb:   Arbiter,
        vram:  Vram,
        strip: StripBuffer,
        regs:  FetchRegisters,
        // Accepted strobe addresses and strip writes, in order.
        strobes: Vec<u16>,
        writes:  Vec<StripWrite>,
    }

    impl Rig {
        fn new(regs: FetchRegisters) -> Self {
            Self {
                vfe: VideoFetchEngine::new(VramSize::K16.addr_mask()),
                arb: Arbiter::new(),
                vram: Vram::new(VramSize::K16),
                strip: StripBuffer::new(),
                regs,
                strobes: Vec::new(),
                writes: Vec::new(),
            }
        }

        fn tick_with(&mut self, cmd: FetchCommand, cpu: BusRequest) -> bool {
            let pair = self.strip.back_pair(self.vfe.pair_addr());
            let video = self.vfe.bus_request(&self.regs, pair);
            let out = self.arb.outputs(&video, &cpu, self.vram.read_latch());
            let write = self.vfe.strip_write(&out.video);

            if video.stb && !out.video.stall {
                self.strobes.push(video.adr);
            }
            if write.is_write() {
                self.writes.push(write);
            }

            self.vram.commit(&out.memory);
            self.arb.commit(&video, &cpu);
            let accepted = self.vfe.commit(&cmd, &self.regs, &out.video);
            self.strip.commit(&write, out.video.dat, false);
            accepted
        }

        fn tick(&mut self, cmd: FetchCommand) -> bool {
            self.tick_with(cmd, BusRequest::IDLE)
        }

        fn burst(&mut self, reload: bool) -> usize {
            self.tick(FetchCommand { go: true, reload });
            let mut cycles = 1;
            while !self.vfe.done() {
                self.tick(FetchCommand::default());
                cycles += 1;
                assert!(cycles < 64, "burst did not complete");
            }
            cycles
        }
    }

    fn text_regs() -> FetchRegisters {
        FetchRegisters {
            attr_base: 0x0800,
            char_base: 0x0000,
            ra: 3,
            font_base: 1,
            tall_font: false,
            attr_enable: true,
            bitmap_mode: false,
        }
    }

    #[test]
    fn test_sequence_advance() {
        let mut s = FetchState::start(true);
        let mut seen = vec![s];
        while !s.is_idle() {
            s = s.advance(false);
            seen.push(s);
        }
        assert_eq!(seen.len(), 13);
        assert_eq!(seen[4], FetchState::Char(0));
        assert_eq!(seen[8], FetchState::Font(0));

        assert_eq!(FetchState::Char(3).advance(true), FetchState::Idle);
        assert_eq!(FetchState::start(false), FetchState::Char(0));
        assert_eq!(FetchState::Font(2).to_string(), "F3");
    }

    #[test]
    fn test_text_burst_with_attributes() {
        let mut rig = Rig::new(text_regs());
        let codes = [0x41u8, 0x42, 0x43, 0xFF];
        let attrs = [0x01u8, 0x82, 0x03, 0x04];
        for i in 0..4 {
            rig.vram.poke(i as u16, codes[i]);
            rig.vram.poke(0x0800 + i as u16, attrs[i]);
        }
        // Font rows for each code, base 1 => 0x2000, ra 3.
        let font_addr = |code: u16| 0x2000 | (code << 4) | 3;
        rig.vram.poke(font_addr(0x41), 0xA1);
        rig.vram.poke(font_addr(0x142), 0xA2);
        rig.vram.poke(font_addr(0x43), 0xA3);
        rig.vram.poke(font_addr(0xFF), 0xA4);

        rig.burst(true);

        assert_eq!(rig.strobes.len(), 12);
        assert_eq!(&rig.strobes[0..4], &[0x0800, 0x0801, 0x0802, 0x0803]);
        assert_eq!(&rig.strobes[4..8], &[0x0000, 0x0001, 0x0002, 0x0003]);
        assert_eq!(rig.strobes[9], font_addr(0x142));

        assert_eq!(rig.writes.len(), 12);
        for (phase, chunk) in rig.writes.chunks(4).enumerate() {
            for (slot, w) in chunk.iter().enumerate() {
                assert_eq!(w.addr, slot);
                assert_eq!(w.attr_we, phase == 0);
                assert_eq!(w.char_we, phase != 0);
            }
        }

        let fonts = [0xA1u16, 0xA2, 0xA3, 0xA4];
        for i in 0..4 {
            assert_eq!(rig.strip.back_pair(i), (attrs[i] as u16) << 8 | fonts[i]);
        }
        assert!(rig.vfe.can_accept());
        assert_eq!(rig.vfe.attr_ptr(), 0x0804);
        assert_eq!(rig.vfe.char_ptr(), 0x0004);
    }

    #[test]
    fn test_bitmap_burst_without_attributes() {
        let mut regs = text_regs();
        regs.bitmap_mode = true;
        regs.attr_enable = false;
        regs.char_base = 0x1000;
        let mut rig = Rig::new(regs);
        for i in 0..4u16 {
            rig.vram.poke(0x1000 + i, 0xF0 | i as u8);
        }

        rig.burst(true);

        assert_eq!(rig.strobes, vec![0x1000, 0x1001, 0x1002, 0x1003]);
        for i in 0..4 {
            assert_eq!(rig.strip.back_pair(i) & 0xFF, 0xF0 | i as u16);
        }
    }

    #[test]
    fn test_bitmap_burst_with_attributes_fetches_eight() {
        let mut regs = text_regs();
        regs.bitmap_mode = true;
        let mut rig = Rig::new(regs);
        rig.burst(true);
        assert_eq!(rig.strobes.len(), 8);
        assert_eq!(rig.writes.len(), 8);
    }

    #[test]
    fn test_pointers_continue_without_reload() {
        let mut rig = Rig::new(text_regs());
        rig.burst(true);
        rig.burst(false);
        assert_eq!(rig.vfe.char_ptr(), 0x0008);
        assert_eq!(&rig.strobes[16..20], &[0x0004, 0x0005, 0x0006, 0x0007]);

        rig.burst(true);
        assert_eq!(rig.vfe.char_ptr(), 0x0004);
    }

    #[test]
    fn test_done_is_single_cycle_and_both_idle() {
        let mut rig = Rig::new(text_regs());
        rig.burst(true);
        assert!(rig.vfe.done());
        assert!(rig.vfe.address_state().is_idle());
        assert!(rig.vfe.receive_state().is_idle());
        rig.tick(FetchCommand::default());
        assert!(!rig.vfe.done());
    }

    #[test]
    fn test_go_while_busy_dropped() {
        let mut rig = Rig::new(text_regs());
        rig.tick(FetchCommand { go: true, reload: true });
        rig.tick(FetchCommand::default());
        assert!(!rig.tick(FetchCommand { go: true, reload: true }));
        assert_eq!(rig.vfe.dropped_go(), 1);
        while !rig.vfe.done() {
            rig.tick(FetchCommand::default());
        }
        assert_eq!(rig.strobes.len(), 12);
        assert_eq!(rig.vfe.bursts(), 1);
    }

    #[test]
    fn test_mode_latched_at_go() {
        let mut rig = Rig::new(text_regs());
        rig.tick(FetchCommand { go: true, reload: true });
        rig.regs.bitmap_mode = true;
        rig.regs.attr_enable = false;
        while !rig.vfe.done() {
            rig.tick(FetchCommand::default());
        }
        assert_eq!(rig.strobes.len(), 12);
    }

    #[test]
    fn test_font_phase_waits_for_receiver() {
        let mut rig = Rig::new(text_regs());
        rig.tick(FetchCommand { go: true, reload: true });
        loop {
            let ag = rig.vfe.address_state();
            let dr = rig.vfe.receive_state();
            if let FetchState::Font(0) = ag {
                let req = rig.vfe.bus_request(&rig.regs, 0);
                assert_eq!(req.stb, dr == FetchState::Font(0));
            }
            if let (FetchState::Font(_), FetchState::Char(_)) = (ag, dr) {
                let req = rig.vfe.bus_request(&rig.regs, 0);
                assert!(!req.stb || ag != FetchState::Font(0));
            }
            rig.tick(FetchCommand::default());
            if rig.vfe.done() {
                break;
            }
        }
    }

    #[test]
    fn test_tall_font_address() {
        let vfe = VideoFetchEngine::new(VramSize::K64.addr_mask());
        let regs = FetchRegisters {
            ra: 0x1D,
            font_base: 0b110,
            tall_font: true,
            ..Default::default()
        };
        assert_eq!(vfe.font_address(&regs, 0x0041), 0x1D | (0x41 << 5) | (0b11 << 14));

        let regs = FetchRegisters {
            ra: 0x1D,
            font_base: 0b110,
            ..Default::default()
        };
        assert_eq!(vfe.font_address(&regs, 0x0041), 0x0D | (0x41 << 4) | (0b110 << 13));
    }

    #[test]
    fn test_burst_survives_cpu_contention() {
        let mut rig = Rig::new(text_regs());
        rig.tick_with(FetchCommand { go: true, reload: true }, BusRequest::write(0x3000, 0x11));
        while !rig.vfe.done() {
            rig.tick_with(FetchCommand::default(), BusRequest::write(0x3000, 0x11));
        }
        assert_eq!(rig.strobes.len(), 12);
        assert_eq!(rig.vram.peek(0x3000), 0x11);
    }
}
