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

    vdcii_config::lib.rs

    Configuration file parsing.

*/

//! The `vdcii_config` crate parses the runner's TOML configuration file and
//! overlays command line arguments on top of it. Command line arguments
//! always take priority over the configuration file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

#[cfg(feature = "use_bpaf")]
pub use bpaf_config::{cli_args, CmdLineArgs};

use cfg_if::cfg_if;
use serde_derive::Deserialize;
use vdcii_core::devices::vram::VramSize;

const fn _default_frame_limit() -> u64 {
    // Larger than one frame at any 8-bit register setting.
    256 * 16 * 256 * 32
}

/// Command line arguments are not read without bpaf.
#[cfg(not(feature = "use_bpaf"))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    pub config_file: Option<PathBuf>,
    pub frames: Option<u64>,
    pub cycles: Option<u64>,
    pub trace_file: Option<PathBuf>,
    pub trace_mode: Option<TraceMode>,
    pub vram_size: Option<VramSize>,
}

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum TraceMode {
    #[default]
    None,
    File,
    Console,
}

impl FromStr for TraceMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "none" => Ok(TraceMode::None),
            "file" => Ok(TraceMode::File),
            "console" => Ok(TraceMode::Console),
            _ => Err("Bad value for tracemode".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    pub frames: Option<u64>,
    pub cycles: Option<u64>,
    #[serde(default = "_default_frame_limit")]
    pub frame_limit: u64,
    #[serde(default)]
    pub trace_mode: TraceMode,
    pub trace_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct VramImage {
    pub filename: PathBuf,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct RegisterValue {
    pub reg:   usize,
    pub value: u8,
}

#[derive(Debug, Default, Deserialize)]
pub struct Vdc {
    #[serde(default)]
    pub vram_size: VramSize,
    #[serde(default)]
    pub image: Vec<VramImage>,
    #[serde(default)]
    pub register: Vec<RegisterValue>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigFileParams {
    pub emulator: Emulator,
    #[serde(default)]
    pub vdc: Vdc,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(cycles) = shell_args.cycles {
            self.emulator.cycles = Some(cycles);
        }
        if let Some(frames) = shell_args.frames {
            self.emulator.frames = Some(frames);
        }
        if let Some(trace_file) = shell_args.trace_file {
            self.emulator.trace_file = Some(trace_file);
            // A trace file on the command line implies file tracing.
            if shell_args.trace_mode.is_none() {
                self.emulator.trace_mode = TraceMode::File;
            }
        }
        if let Some(trace_mode) = shell_args.trace_mode {
            self.emulator.trace_mode = trace_mode;
        }
        if let Some(vram_size) = shell_args.vram_size {
            self.vdc.vram_size = vram_size;
        }
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);

    Ok(toml_args)
}

fn shell_args() -> CmdLineArgs {
    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            cli_args().run()
        } else {
            log::debug!("Argument reading disabled...");
            CmdLineArgs::default()
        }
    }
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args = shell_args();

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

/// Read the TOML configuration from a string, parse and overlay command line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    read_config(toml_string, shell_args())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [emulator]
        frames = 2
        trace_mode = "Console"

        [vdc]
        vram_size = "64K"

        [[vdc.image]]
        filename = "font.bin"
        offset = 0x2000

        [[vdc.register]]
        reg = 25
        value = 0x80

        [[vdc.register]]
        reg = 27
        value = 0
    "#;

    #[test]
    fn test_parse_config() {
        let config = read_config(CONFIG, CmdLineArgs::default()).unwrap();
        assert_eq!(config.emulator.frames, Some(2));
        assert_eq!(config.emulator.cycles, None);
        assert_eq!(config.emulator.frame_limit, _default_frame_limit());
        assert_eq!(config.emulator.trace_mode, TraceMode::Console);
        assert_eq!(config.vdc.vram_size, VramSize::K64);
        assert_eq!(config.vdc.image.len(), 1);
        assert_eq!(config.vdc.image[0].offset, 0x2000);
        assert_eq!(config.vdc.register.len(), 2);
        assert_eq!(config.vdc.register[0].reg, 25);
        assert_eq!(config.vdc.register[0].value, 0x80);
    }

    #[test]
    fn test_minimal_config() {
        let config = read_config("[emulator]\n", CmdLineArgs::default()).unwrap();
        assert_eq!(config.vdc.vram_size, VramSize::K16);
        assert_eq!(config.emulator.trace_mode, TraceMode::None);
        assert!(config.vdc.register.is_empty());
    }

    #[test]
    fn test_overlay_overrides_file() {
        let args = CmdLineArgs {
            cycles: Some(1000),
            trace_file: Some(PathBuf::from("trace.log")),
            vram_size: Some(VramSize::K16),
            ..Default::default()
        };
        let config = read_config(CONFIG, args).unwrap();
        assert_eq!(config.emulator.cycles, Some(1000));
        assert_eq!(config.emulator.frames, Some(2));
        assert_eq!(config.emulator.trace_mode, TraceMode::File);
        assert_eq!(config.vdc.vram_size, VramSize::K16);
    }

    #[test]
    fn test_bad_toml() {
        assert!(read_config("[emulator\nframes = 1", CmdLineArgs::default()).is_err());
        assert!(read_config("[emulator]\n[vdc]\nvram_size = \"32K\"", CmdLineArgs::default()).is_err());
    }

    #[test]
    fn test_trace_mode_parse() {
        assert_eq!("console".parse::<TraceMode>(), Ok(TraceMode::Console));
        assert_eq!("File".parse::<TraceMode>(), Ok(TraceMode::File));
        assert!("csv".parse::<TraceMode>().is_err());
    }
}
