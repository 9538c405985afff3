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

    vdcii_headless::lib.rs

    Headless runner main library component.

*/

//! vdcii headless runner main library component.

#![forbid(unsafe_code)]

mod emulator;

use std::time::Instant;

use anyhow::Context;

use crate::emulator::Emulator;

pub const DEFAULT_CONFIG_FILE: &str = "./vdcii.toml";

pub fn run() -> Result<(), anyhow::Error> {
    env_logger::init();

    // Resolve the configuration by parsing the configuration toml and merging it with command line
    // arguments.
    let config = vdcii_config::read_config_file(DEFAULT_CONFIG_FILE).with_context(|| {
        format!(
            "Failed to read configuration. Create {} or provide a path with --config_file.",
            DEFAULT_CONFIG_FILE
        )
    })?;

    let mut emu = Emulator::new(config);
    emu.apply_config()?;

    let start = Instant::now();
    emu.run();
    let elapsed = start.elapsed();

    emu.vdc.flush_trace();

    let stats = emu.vdc.stats();
    println!("Ran {} cycles ({} frames) in {:.3}s", stats.cycles, stats.frames, elapsed.as_secs_f64());
    if elapsed.as_secs_f64() > 0.0 {
        println!("  {:.0} cycles/s", stats.cycles as f64 / elapsed.as_secs_f64());
    }
    emu.print_stats();

    Ok(())
}
