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

    vdcii_config::bpaf_config::mod.rs

    Command line arguments. Anything given here overrides the
    configuration file.

*/

use std::path::PathBuf;

use vdcii_core::devices::vram::VramSize;

use bpaf::Bpaf;

use crate::TraceMode;

#[derive(Bpaf, Debug, Default)]
#[bpaf(options, version, generate(cli_args))]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    /// Number of frames to run
    #[bpaf(long)]
    pub frames: Option<u64>,

    /// Number of cycles to run. Takes priority over --frames
    #[bpaf(long)]
    pub cycles: Option<u64>,

    #[bpaf(long("trace_file"), long("tracefile"))]
    pub trace_file: Option<PathBuf>,

    #[bpaf(long("trace_mode"), long("tracemode"))]
    pub trace_mode: Option<TraceMode>,

    #[bpaf(long("vram_size"), long("vramsize"))]
    pub vram_size: Option<VramSize>,
}
