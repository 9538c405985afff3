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

    vdc::mod.rs

    VDC-II top level. Composes the register file, sync generators, fetch
    scheduler, video fetch engine, strip buffer, memory port engine,
    arbiter and video memory, and clocks them together.

    Each call to tick() is one clock. Every combinational output is
    evaluated from registered state first; then every register is
    committed. No component observes another component's next state
    within the same cycle.

*/

pub mod io;

use crate::{
    bus::{Arbiter, BusRequest, BusResponse, Grant},
    devices::{
        fetch_scheduler::{FetchScheduler, RowAddressGenerator, SchedulerOutputs, SchedulerState, TimingInputs},
        mpe::{MemoryPortEngine, MpePulses, MpeRequest, MpeState},
        regfile::{RegAccess, RegisterFile},
        strip_buffer::{StripBuffer, StripWrite},
        syncgen::SyncGen,
        video_fetch::{FetchCommand, FetchState, VideoFetchEngine},
        vram::{Vram, VramSize},
    },
    error::VdcError,
    tracelogger::TraceLogger,
};

macro_rules! trace {
    ($self:ident, $($t:tt)*) => {{
        if $self.trace_logger.is_some() {
            $self.trace_logger.println(&format!($($t)*));
        }
    }};
}

/// Pins visible to the outside world, as of the last tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VdcOutputs {
    /// Horizontal sync after polarity selection.
    pub hsync: bool,
    /// Vertical sync after polarity selection.
    pub vsync: bool,
    pub display_enable: bool,
    pub vblank: bool,
    /// Front buffer pair for the current column.
    pub pair: u16,
    pub ready: bool,
}

/// Signals of the last evaluated cycle. Used by tracing and by tests that
/// check bus and buffer invariants from outside the core.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleStatus {
    pub cycle: u64,
    pub timing: TimingInputs,
    pub schedule: SchedulerOutputs,
    pub grant: Grant,
    pub video: BusRequest,
    pub cpu: BusRequest,
    pub video_rsp: BusResponse,
    pub cpu_rsp: BusResponse,
    pub request: Option<MpeRequest>,
    pub pulses: MpePulses,
    pub mpe: MpeState,
    pub address_gen: FetchState,
    pub receiver: FetchState,
    pub strip_write: StripWrite,
    pub strip_back: usize,
    pub strip_front: usize,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VdcStats {
    pub cycles: u64,
    pub frames: u64,
    pub bursts: u64,
    pub swaps: u64,
    pub dropped_go: u64,
    pub ignored_requests: u64,
    pub video_cycles: u64,
    pub cpu_cycles: u64,
    pub cpu_stall_cycles: u64,
    pub block_iterations: u64,
}

pub struct Vdc {
    vram: Vram,
    arbiter: Arbiter,
    mpe: MemoryPortEngine,
    vfe: VideoFetchEngine,
    strip: StripBuffer,
    scheduler: FetchScheduler,
    rows: RowAddressGenerator,
    regs: RegisterFile,
    hsyncgen: SyncGen,
    vsyncgen: SyncGen,

    register_select: u8,
    pending: Option<RegAccess>,
    outputs: VdcOutputs,
    status: CycleStatus,
    last_vsync: bool,
    stats: VdcStats,
    trace_logger: TraceLogger,
}

impl Default for Vdc {
    fn default() -> Self {
        Vdc::new(VramSize::default(), TraceLogger::None)
    }
}

impl Vdc {
    pub fn new(vram_size: VramSize, trace_logger: TraceLogger) -> Self {
        let mask = vram_size.addr_mask();
        log::debug!(
            "Creating VDC-II with {} of video memory ({} address bits)",
            vram_size,
            vram_size.addr_bits()
        );
        Self {
            vram: Vram::new(vram_size),
            arbiter: Arbiter::new(),
            mpe: MemoryPortEngine::new(mask),
            vfe: VideoFetchEngine::new(mask),
            strip: StripBuffer::new(),
            scheduler: FetchScheduler::new(),
            rows: RowAddressGenerator::new(),
            regs: RegisterFile::new(),
            hsyncgen: SyncGen::new(),
            vsyncgen: SyncGen::new(),
            register_select: 0,
            pending: None,
            outputs: VdcOutputs {
                ready: true,
                ..Default::default()
            },
            status: CycleStatus::default(),
            last_vsync: false,
            stats: VdcStats::default(),
            trace_logger,
        }
    }

    /// Return every component to its power-on state. Video memory contents
    /// are retained.
    pub fn reset(&mut self) {
        let mask = self.vram.size().addr_mask();
        self.arbiter = Arbiter::new();
        self.mpe = MemoryPortEngine::new(mask);
        self.vfe = VideoFetchEngine::new(mask);
        self.strip = StripBuffer::new();
        self.scheduler = FetchScheduler::new();
        self.rows = RowAddressGenerator::new();
        self.regs = RegisterFile::new();
        self.hsyncgen.reset();
        self.vsyncgen.reset();
        self.register_select = 0;
        self.pending = None;
        self.outputs = VdcOutputs {
            ready: true,
            ..Default::default()
        };
        self.status = CycleStatus::default();
        self.last_vsync = false;
        self.stats = VdcStats::default();
        log::debug!("VDC-II reset");
    }

    pub fn vram(&self) -> &Vram {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut Vram {
        &mut self.vram
    }

    pub fn load_vram(&mut self, offset: usize, image: &[u8]) -> Result<(), VdcError> {
        self.vram.load(offset, image)
    }

    /// Set a register directly, bypassing the host port and its side effects.
    pub fn set_register(&mut self, reg: usize, data: u8) -> Result<(), VdcError> {
        self.regs.poke(reg, data)
    }

    pub fn register(&self, reg: usize) -> Result<u8, VdcError> {
        self.regs.peek(reg, self.mpe.data_read())
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn ready(&self) -> bool {
        self.mpe.ready()
    }

    pub fn mpe_state(&self) -> MpeState {
        self.mpe.state()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn fetch_states(&self) -> (FetchState, FetchState) {
        (self.vfe.address_state(), self.vfe.receive_state())
    }

    /// Front buffer pair at `addr`, as the display pipeline would read it.
    pub fn front_pair(&self, addr: usize) -> u16 {
        self.strip.front_pair(addr)
    }

    pub fn outputs(&self) -> VdcOutputs {
        self.outputs
    }

    pub fn last_cycle(&self) -> &CycleStatus {
        &self.status
    }

    pub fn stats(&self) -> VdcStats {
        let mut stats = self.stats;
        stats.bursts = self.vfe.bursts();
        stats.dropped_go = self.vfe.dropped_go();
        stats.swaps = self.strip.swaps();
        stats.block_iterations = self.mpe.block_iterations();
        stats
    }

    pub fn trace_logger(&self) -> &TraceLogger {
        &self.trace_logger
    }

    pub fn flush_trace(&mut self) {
        self.trace_logger.flush();
    }

    /// Queue a register access for the next clock edge. Only one access can
    /// be sampled per clock.
    fn queue_access(&mut self, access: RegAccess) {
        if let Some(prev) = self.pending.replace(access) {
            log::warn!("Host access {:?} replaced by {:?} before a clock edge", prev, access);
        }
    }

    /// Run one clock.
    pub fn tick(&mut self) {
        // Evaluate.
        let hregs = self.regs.hsync_registers();
        let vregs = self.regs.vsync_registers();
        let ho = self.hsyncgen.outputs(&hregs);
        let vo = self.vsyncgen.outputs(&vregs);

        let timing = TimingInputs {
            hsync: ho.sync,
            vsync: vo.sync,
            vden: vo.display_enable,
            den: ho.display_enable && vo.display_enable,
            char_clock: ho.char_clock,
        };

        let vfe_done = self.vfe.done();
        let schedule = self.scheduler.outputs(&timing, vfe_done);

        let fetch_regs = self.regs.fetch_registers(&self.rows);
        let pair = self.strip.back_pair(self.vfe.pair_addr());
        let video = self.vfe.bus_request(&fetch_regs, pair);

        let mpe_regs = self.regs.mpe_registers();
        let access = self.pending.take();
        let request = RegisterFile::decode(access);
        let cpu = self.mpe.bus_request(&mpe_regs);

        let arb = self.arbiter.outputs(&video, &cpu, self.vram.read_latch());
        let pulses = self.mpe.pulses(request, &arb.cpu, &mpe_regs);
        let strip_write = self.vfe.strip_write(&arb.video);

        self.outputs = VdcOutputs {
            hsync: ho.sync ^ self.regs.hsync_xor(),
            vsync: vo.sync ^ self.regs.vsync_xor(),
            display_enable: timing.den,
            vblank: !vo.display_enable,
            pair: self.strip.front_pair(schedule.pair_addr),
            ready: self.mpe.ready(),
        };

        self.status = CycleStatus {
            cycle: self.stats.cycles,
            timing,
            schedule,
            grant: arb.grant,
            video,
            cpu,
            video_rsp: arb.video,
            cpu_rsp: arb.cpu,
            request,
            pulses,
            mpe: self.mpe.state(),
            address_gen: self.vfe.address_state(),
            receiver: self.vfe.receive_state(),
            strip_write,
            strip_back: self.strip.back_index(),
            strip_front: self.strip.front_index(),
        };

        match arb.grant {
            Grant::Video => self.stats.video_cycles += 1,
            Grant::Cpu => self.stats.cpu_cycles += 1,
            Grant::None => {}
        }
        if cpu.cyc && arb.cpu.stall {
            self.stats.cpu_stall_cycles += 1;
        }

        self.trace_cycle();

        // Commit.
        let mpe_before = self.mpe.state();
        let sched_before = self.scheduler.state();

        self.vram.commit(&arb.memory);
        self.arbiter.commit(&video, &cpu);

        let cmd = FetchCommand {
            go: schedule.go,
            reload: schedule.reload,
        };
        if !self.vfe.commit(&cmd, &fetch_regs, &arb.video) {
            log::warn!(
                "Fetch burst request at cycle {} dropped, previous burst still in flight",
                self.stats.cycles
            );
        }

        if let Some(req) = request {
            if !self.mpe.ready() {
                self.stats.ignored_requests += 1;
                log::warn!("Memory port request {} ignored, engine busy in {}", req, mpe_before);
            }
        }
        self.mpe.commit(request, &arb.cpu, &mpe_regs);

        self.strip.commit(&strip_write, arb.video.dat, schedule.swap);
        self.scheduler.commit(&timing, vfe_done);
        self.rows
            .commit(&self.regs.row_registers(), timing.vsync, schedule.line_done);
        self.regs.commit(access, &pulses);

        // A horizontal sync width of zero stops the vertical counters.
        let vclk = ho.raster_clock && ho.char_clock;
        self.vsyncgen.commit(&vregs, vclk, vclk);
        self.hsyncgen.commit(&hregs, true, ho.char_clock);

        if vo.sync && !self.last_vsync {
            self.stats.frames += 1;
        }
        self.last_vsync = vo.sync;
        self.stats.cycles += 1;

        if mpe_before != self.mpe.state() {
            trace!(self, "MPE: {} -> {}", mpe_before, self.mpe.state());
        }
        if sched_before != self.scheduler.state() {
            trace!(self, "SCHED: {} -> {}", sched_before, self.scheduler.state());
        }
        if schedule.swap {
            trace!(self, "SWAP: front is now buffer {}", self.strip.front_index());
        }
    }

    fn trace_cycle(&mut self) {
        if !self.trace_logger.is_some() {
            return;
        }
        let s = self.status;
        let bus = |r: &BusRequest| {
            if !r.cyc {
                "----:--".to_string()
            }
            else if r.stb {
                format!("{:04X}:{}", r.adr, if r.we { 'W' } else { 'R' })
            }
            else {
                "....:..".to_string()
            }
        };
        trace!(
            self,
            "{:010} G:{:<5} V:{} C:{} VA:{} CA:{} AG:{:<4} DR:{:<4} MPE:{}",
            s.cycle,
            s.grant,
            bus(&s.video),
            bus(&s.cpu),
            s.video_rsp.ack as u8,
            s.cpu_rsp.ack as u8,
            s.address_gen,
            s.receiver,
            s.mpe
        );
    }

    /// Run until the memory port engine is ready again, or `limit` cycles.
    /// Returns the number of cycles run.
    pub fn run_until_ready(&mut self, limit: u64) -> u64 {
        let mut cycles = 0;
        // Any queued access must be sampled before ready can be trusted.
        if self.pending.is_some() {
            self.tick();
            cycles += 1;
        }
        while !self.mpe.ready() && cycles < limit {
            self.tick();
            cycles += 1;
        }
        cycles
    }

    pub fn run_cycles(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    /// Run until `frames` more vertical syncs have started, or `limit` cycles.
    pub fn run_frames(&mut self, frames: u64, limit: u64) -> u64 {
        let target = self.stats.frames + frames;
        let mut cycles = 0;
        while self.stats.frames < target && cycles < limit {
            self.tick();
            cycles += 1;
        }
        cycles
    }
}
