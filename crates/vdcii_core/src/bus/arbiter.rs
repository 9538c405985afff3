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

    bus::arbiter.rs

    Fixed priority arbiter between the video fetch engine and the memory
    port engine. Video always wins. The grant is combinational and
    recomputed every cycle from the two cycle-active signals; acknowledges
    are registered so that ack(t+1) = granted(t) & stb(t).

*/

use strum_macros::Display;

use super::{BusRequest, BusResponse, MemoryCycle};

#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq)]
pub enum Grant {
    #[default]
    None,
    Video,
    Cpu,
}

/// Combinational outputs of the arbiter for one cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ArbiterOutputs {
    pub grant: Grant,
    pub memory: MemoryCycle,
    pub video: BusResponse,
    pub cpu: BusResponse,
}

#[derive(Clone, Debug, Default)]
pub struct Arbiter {
    video_ack: bool,
    cpu_ack: bool,
}

impl Arbiter {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn grant(video: &BusRequest, cpu: &BusRequest) -> Grant {
        if video.cyc {
            Grant::Video
        }
        else if cpu.cyc {
            Grant::Cpu
        }
        else {
            Grant::None
        }
    }

    /// Evaluate the arbiter for this cycle. `read_data` is the memory read
    /// latch, which holds the byte addressed on the previous cycle.
    pub fn outputs(&self, video: &BusRequest, cpu: &BusRequest, read_data: u8) -> ArbiterOutputs {
        let grant = Arbiter::grant(video, cpu);

        let memory = match grant {
            Grant::Video => MemoryCycle {
                stb: video.stb,
                we:  video.we,
                adr: video.adr,
                dat: video.dat,
            },
            Grant::Cpu => MemoryCycle {
                stb: cpu.stb,
                we:  cpu.we,
                adr: cpu.adr,
                dat: cpu.dat,
            },
            Grant::None => MemoryCycle::default(),
        };

        ArbiterOutputs {
            grant,
            memory,
            video: BusResponse {
                stall: grant != Grant::Video,
                ack:   self.video_ack,
                dat:   if self.video_ack { read_data } else { 0 },
            },
            cpu: BusResponse {
                stall: grant != Grant::Cpu,
                ack:   self.cpu_ack,
                dat:   if self.cpu_ack { read_data } else { 0 },
            },
        }
    }

    pub fn commit(&mut self, video: &BusRequest, cpu: &BusRequest) {
        let grant = Arbiter::grant(video, cpu);
        self.video_ack = grant == Grant::Video && video.stb;
        self.cpu_ack = grant == Grant::Cpu && cpu.stb;
    }

    pub fn video_ack_pending(&self) -> bool {
        self.video_ack
    }

    pub fn cpu_ack_pending(&self) -> bool {
        self.cpu_ack
    }
}
