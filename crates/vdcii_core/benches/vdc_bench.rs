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

    benches::vdc_bench.rs

    Benchmarks for the VDC-II core.

*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vdcii_core::{devices::vram::VramSize, tracelogger::TraceLogger, Vdc};

// Cycles in one frame at the power-on register defaults.
const DEFAULT_FRAME_CYCLES: u64 = 8 * (0x7E + 1) * ((0x20 + 1) * 8);

fn text_screen() -> Vdc {
    let mut vdc = Vdc::new(VramSize::K64, TraceLogger::None);
    let image: Vec<u8> = (0..VramSize::K64.len()).map(|i| (i * 7) as u8).collect();
    vdc.load_vram(0, &image).unwrap();
    vdc
}

pub fn vdc_tick_bench(c: &mut Criterion) {
    c.bench_function("vdc_bench_tick", |b| {
        let mut vdc = text_screen();

        b.iter(|| {
            vdc.tick();
        });
    });

    c.bench_function("vdc_bench_frame", |b| {
        let mut vdc = text_screen();

        b.iter(|| {
            vdc.run_cycles(black_box(DEFAULT_FRAME_CYCLES));
        });
    });

    c.bench_function("vdc_bench_block_fill", |b| {
        let mut vdc = text_screen();

        b.iter(|| {
            vdc.write_register(18, 0x40);
            vdc.write_register(19, 0x00);
            vdc.wait_ready(1000);
            vdc.write_register(31, black_box(0xAA));
            vdc.wait_ready(1000);
            vdc.write_register(30, 0xFF);
            vdc.wait_ready(4000);
        });
    });
}

criterion_group!(benches, vdc_tick_bench);
criterion_main!(benches);
