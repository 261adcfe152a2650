// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for status decoding and label encoding.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use spoolkit_core::Operation;
use spoolkit_core::codec::{CUPS_TABLES, SPOOLER_TABLES, winspool};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Decode a spooler printer status with several bits set, and the
/// enumerated CUPS job state.
fn bench_decode(c: &mut Criterion) {
    let busy = winspool::PRINTER_STATUS_BUSY
        | winspool::PRINTER_STATUS_PRINTING
        | winspool::PRINTER_STATUS_TONER_LOW
        | winspool::PRINTER_STATUS_DOOR_OPEN;

    c.bench_function("decode spooler printer status (4 bits)", |b| {
        b.iter(|| black_box(SPOOLER_TABLES.printer_status.decode(black_box(busy))));
    });

    c.bench_function("decode cups job status", |b| {
        b.iter(|| black_box(CUPS_TABLES.job_status.decode(black_box(5))));
    });

    // No entry matches; exercises the fallback label path.
    c.bench_function("decode unmatched job status", |b| {
        b.iter(|| black_box(SPOOLER_TABLES.job_status.decode(black_box(0x4000_0000))));
    });
}

/// Encode labels through the lazily built index.
fn bench_encode(c: &mut Criterion) {
    c.bench_function("encode job command", |b| {
        b.iter(|| {
            let code = SPOOLER_TABLES
                .job_commands
                .encode(black_box("LAST-PAGE-EJECTED"), Operation::SetJobCommand);
            assert!(code.is_ok());
        });
    });

    c.bench_function("normalize cups format", |b| {
        b.iter(|| black_box(CUPS_TABLES.formats.normalize(black_box("application/postscript"))));
    });
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
