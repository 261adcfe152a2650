// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native print service backends.
//
// `PrintingBackend` is the single seam between normalized records and the
// host's print service. CUPS is reached over IPP, the Windows spooler
// through winspool, and `MemorySpooler` stands in for either in tests.

pub mod cups;
pub mod memory;
pub mod ppd;
pub mod traits;

#[cfg(windows)]
pub mod windows;

use spoolkit_core::config::SpoolConfig;

pub use cups::CupsBackend;
pub use memory::{FailStage, INJECTED_FAILURE_CODE, MemorySpooler};
pub use traits::{PrintingBackend, SpoolSession};

/// The print service of the host this binary was built for.
pub fn native_backend(config: &SpoolConfig) -> Box<dyn PrintingBackend> {
    #[cfg(windows)]
    {
        let _ = config;
        Box::new(windows::WindowsSpooler::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(CupsBackend::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(windows))]
    fn native_backend_is_cups_off_windows() {
        let backend = native_backend(&SpoolConfig::default());
        assert_eq!(backend.platform_name(), "CUPS");
        assert!(backend.tables().job_commands.lookup("CANCEL").is_some());
    }

    #[test]
    #[cfg(windows)]
    fn native_backend_is_spooler_on_windows() {
        let backend = native_backend(&SpoolConfig::default());
        assert_eq!(backend.platform_name(), "Windows spooler");
    }
}
