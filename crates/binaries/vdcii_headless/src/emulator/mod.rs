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

    vdcii_headless::emulator::mod.rs

    Definition of the [Emulator] struct, which owns the configuration and
    the VDC being run.

*/

use anyhow::{Context, Error};
use vdcii_config::{ConfigFileParams, TraceMode};
use vdcii_core::{tracelogger::TraceLogger, Vdc};

pub struct Emulator {
    pub config: ConfigFileParams,
    pub vdc: Vdc,
}

impl Emulator {
    pub fn new(config: ConfigFileParams) -> Self {
        let trace_logger = match (config.emulator.trace_mode, config.emulator.trace_file.as_ref()) {
            (TraceMode::File, Some(path)) => TraceLogger::from_filename(path),
            (TraceMode::File, None) => {
                log::warn!("Trace mode is File but no trace_file was given. Tracing disabled.");
                TraceLogger::None
            }
            (TraceMode::Console, _) => TraceLogger::Console,
            (TraceMode::None, _) => TraceLogger::None,
        };

        let vdc = Vdc::new(config.vdc.vram_size, trace_logger);
        Self { config, vdc }
    }

    /// Apply initial registers and VRAM images from the configuration.
    pub fn apply_config(&mut self) -> Result<(), Error> {
        log::debug!("Applying configuration to VDC state...");

        for entry in self.config.vdc.register.iter() {
            self.vdc
                .set_register(entry.reg, entry.value)
                .with_context(|| format!("Bad register entry R{}", entry.reg))?;
        }

        for image in self.config.vdc.image.iter() {
            let bytes = std::fs::read(&image.filename)
                .with_context(|| format!("Error opening VRAM image {:?}", image.filename))?;
            self.vdc
                .load_vram(image.offset, &bytes)
                .with_context(|| format!("Error loading VRAM image {:?}", image.filename))?;
            log::debug!(
                "Loaded {} bytes from {:?} at {:04X}",
                bytes.len(),
                image.filename,
                image.offset
            );
        }

        Ok(())
    }

    /// Run for the configured number of cycles, or frames if no cycle count was given.
    pub fn run(&mut self) {
        if let Some(cycles) = self.config.emulator.cycles {
            log::debug!("Running {} cycles", cycles);
            self.vdc.run_cycles(cycles);
            return;
        }

        let frames = self.config.emulator.frames.unwrap_or(1);
        let limit = frames.saturating_mul(self.config.emulator.frame_limit);
        log::debug!("Running {} frames", frames);

        let start_frames = self.vdc.stats().frames;
        self.vdc.run_frames(frames, limit);
        let ran = self.vdc.stats().frames - start_frames;
        if ran < frames {
            log::warn!(
                "Cycle limit reached after {} of {} frames. Check the sync registers.",
                ran,
                frames
            );
        }
    }

    pub fn print_stats(&self) {
        let stats = self.vdc.stats();
        println!("  video bursts:      {}", stats.bursts);
        println!("  strip swaps:       {}", stats.swaps);
        println!("  video cycles:      {}", stats.video_cycles);
        println!("  cpu cycles:        {}", stats.cpu_cycles);
        println!("  cpu stall cycles:  {}", stats.cpu_stall_cycles);
        println!("  block iterations:  {}", stats.block_iterations);
        if stats.dropped_go > 0 || stats.ignored_requests > 0 {
            println!(
                "  dropped fetch starts: {} ignored port requests: {}",
                stats.dropped_go, stats.ignored_requests
            );
        }
    }
}
