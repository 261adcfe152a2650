// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend-agnostic trait definitions for native print services.
//
// Each native service (CUPS, the Windows spooler, the in-memory spooler used
// for tests) implements `PrintingBackend` once. Normalized records and codec
// tables are shared; only the native calls underneath differ.

use std::path::Path;

use spoolkit_core::codec::{CodecTables, NativeCode};
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{Job, JobId, JobOptions, JobScope, OptionNode, Printer};

/// Capability surface of one native print service.
///
/// Every method blocks for the duration of the native call. Implementations
/// hold no mutable state across calls.
pub trait PrintingBackend: Send + Sync {
    /// Human-readable service name, used in `UnsupportedOnPlatform` errors.
    fn platform_name(&self) -> &'static str;

    /// Codec tables matching this service's native codes.
    fn tables(&self) -> &'static CodecTables;

    /// Every destination in native order, each with its active jobs.
    fn list_printers(&self) -> Result<Vec<Printer>>;

    fn get_printer(&self, name: &str) -> Result<Printer>;

    fn default_printer_name(&self) -> Result<Option<String>>;

    /// Driver capability tree of a destination.
    fn driver_options(&self, _printer: &str) -> Result<OptionNode> {
        Err(SpoolError::UnsupportedOnPlatform {
            operation: Operation::GetDriverOptions,
            platform: self.platform_name(),
        })
    }

    fn jobs(&self, printer: &str, scope: JobScope) -> Result<Vec<Job>>;

    /// A single job; `NotFound` when the id is not known to the destination.
    fn job(&self, printer: &str, id: JobId) -> Result<Job>;

    /// Apply an already-encoded job command.
    ///
    /// `Ok(false)` means the service accepted the request but the job's
    /// current state made the command a no-op.
    fn control_job(&self, printer: &str, id: JobId, command: NativeCode) -> Result<bool>;

    /// Start a submission against `printer`.
    fn open_session<'a>(&'a self, printer: &str) -> Result<Box<dyn SpoolSession + 'a>>;

    /// Submit a file in a single native call.
    fn print_file(
        &self,
        path: &Path,
        doc_name: &str,
        printer: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let _ = (path, doc_name, printer, options);
        Err(SpoolError::UnsupportedOnPlatform {
            operation: Operation::SubmitFile,
            platform: self.platform_name(),
        })
    }

    /// Format labels the service accepts.
    fn supported_formats(&self) -> Result<Vec<String>> {
        Ok(self.tables().formats.labels())
    }
}

/// Native job-lifecycle calls driven by the submission state machine.
///
/// The state machine calls these strictly in order: `create_job`,
/// `open_document`, any number of `write_chunk`, `close_document`,
/// `close_job`. On failure it calls `abort` once.
pub trait SpoolSession {
    /// Create the job and return the id the service assigned.
    fn create_job(&mut self, doc_name: &str, native_format: &str, options: &JobOptions)
    -> Result<JobId>;

    /// Open the job's single document.
    fn open_document(&mut self) -> Result<()>;

    /// Write one chunk; returns the number of bytes the service accepted.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize>;

    /// Close the document; returns the byte count the service confirmed.
    fn close_document(&mut self) -> Result<u64>;

    fn close_job(&mut self) -> Result<()>;

    /// Best-effort release of whatever the session has opened.
    fn abort(&mut self) -> Result<()>;
}
