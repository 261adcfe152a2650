// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spoolkit core: types, codec tables and error definitions shared across all
// crates.

pub mod codec;
pub mod config;
pub mod error;
pub mod types;

pub use codec::{CodecTables, CodeKind, CodeTable, FormatTable, NativeCode};
pub use config::SpoolConfig;
pub use error::{Operation, SpoolError};
pub use types::*;
