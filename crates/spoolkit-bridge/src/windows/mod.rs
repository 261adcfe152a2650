// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Windows print spooler backend via `windows-sys` (winspool.drv).
//
// Unsafe code here falls into two kinds:
//
// 1. Spooler calls (OpenPrinterW, EnumPrintersW, EnumJobsW, ...). Every
//    printer handle lives in a `PrinterHandle` that closes it on drop, and
//    every enumeration buffer is a `SpoolBuffer` owned by the calling frame.
//
// 2. Reads of PRINTER_INFO_2W / JOB_INFO_2W records out of those buffers.
//    The spooler packs the records at the start of the buffer and the
//    strings they point to after them, so the pointers stay valid for as
//    long as the buffer does.

mod buffer;

use std::ptr;

use chrono::NaiveTime;
use tracing::{debug, info, instrument, warn};
use windows_sys::Win32::Foundation::{
    ERROR_INVALID_PARAMETER, ERROR_INVALID_PRINTER_NAME, GetLastError,
};
use windows_sys::Win32::Graphics::Printing::{
    ClosePrinter, DATATYPES_INFO_1W, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumJobsW,
    EnumPrintProcessorDatatypesW, EnumPrintProcessorsW, EnumPrintersW, GetDefaultPrinterW, GetJobW,
    GetPrinterW, JOB_INFO_2W, OpenPrinterW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL,
    PRINTER_HANDLE, PRINTER_INFO_2W, PRINTPROCESSOR_INFO_1W, SetJobW, StartDocPrinterW,
    StartPagePrinter, WritePrinter,
};

use spoolkit_core::codec::{CodecTables, NativeCode, SPOOLER_TABLES, winspool};
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{Job, JobDetails, JobId, JobOptions, JobScope, Printer};

use crate::traits::{PrintingBackend, SpoolSession};

use self::buffer::{SpoolBuffer, from_wide, to_wide};

const PLATFORM: &str = "Windows spooler";

/// Job states past which a job no longer counts as active.
const FINISHED: NativeCode =
    winspool::JOB_STATUS_PRINTED | winspool::JOB_STATUS_COMPLETE | winspool::JOB_STATUS_DELETED;

/// Error for the calling thread's last Win32 failure.
fn last_error(operation: Operation, what: &str) -> SpoolError {
    // SAFETY: reads thread-local state only.
    let code = unsafe { GetLastError() };
    win32_error(operation, what, code)
}

fn win32_error(operation: Operation, what: &str, code: u32) -> SpoolError {
    if code == ERROR_INVALID_PRINTER_NAME || code == ERROR_INVALID_PARAMETER {
        return SpoolError::not_found(operation, what);
    }
    let message = std::io::Error::from_raw_os_error(code as i32).to_string();
    SpoolError::native(operation, Some(i64::from(code)), format!("{what}: {message}"))
}

/// Open printer handle, closed on drop.
struct PrinterHandle(PRINTER_HANDLE);

impl PrinterHandle {
    fn open(name: &str, operation: Operation) -> Result<Self> {
        let wide = to_wide(name);
        let mut handle: PRINTER_HANDLE = ptr::null_mut();
        // SAFETY: `wide` is NUL-terminated and outlives the call.
        let ok = unsafe { OpenPrinterW(wide.as_ptr(), &mut handle, ptr::null()) };
        if ok == 0 {
            return Err(last_error(operation, &format!("printer '{name}'")));
        }
        Ok(Self(handle))
    }

    fn raw(&self) -> PRINTER_HANDLE {
        self.0
    }
}

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful OpenPrinterW.
        if unsafe { ClosePrinter(self.0) } == 0 {
            warn!("ClosePrinter failed");
        }
    }
}

/// Minutes after midnight (UTC) as a time of day; `None` when the
/// destination is always available.
fn time_window(start: u32, until: u32) -> (Option<NaiveTime>, Option<NaiveTime>) {
    if start == until {
        return (None, None);
    }
    let at = |minutes: u32| NaiveTime::from_hms_opt(minutes / 60 % 24, minutes % 60, 0);
    (at(start), at(until))
}

/// The local spooler.
#[derive(Default)]
pub struct WindowsSpooler;

impl WindowsSpooler {
    pub fn new() -> Self {
        Self
    }

    fn printer_record(&self, info: &PRINTER_INFO_2W, default: Option<&str>) -> Printer {
        // SAFETY: the record and its strings live in the caller's buffer.
        let text = |p: *const u16| unsafe { from_wide(p) };
        let name = text(info.pPrinterName).unwrap_or_default();

        let mut options = std::collections::BTreeMap::new();
        for (key, value) in [
            ("serverName", info.pServerName),
            ("shareName", info.pShareName),
            ("portName", info.pPortName),
            ("driverName", info.pDriverName),
            ("comment", info.pComment),
            ("location", info.pLocation),
            ("sepFile", info.pSepFile),
            ("printProcessor", info.pPrintProcessor),
            ("datatype", info.pDatatype),
            ("parameters", info.pParameters),
        ] {
            if let Some(value) = text(value) {
                options.insert(key.to_string(), value);
            }
        }

        let (start_time, until_time) = time_window(info.StartTime, info.UntilTime);
        Printer {
            is_default: default == Some(name.as_str()),
            name,
            instance: None,
            options,
            status: SPOOLER_TABLES.printer_status.decode(info.Status),
            status_number: info.Status,
            attributes: SPOOLER_TABLES.printer_attributes.decode(info.Attributes),
            priority: info.Priority,
            default_priority: info.DefaultPriority,
            average_ppm: info.AveragePPM,
            start_time,
            until_time,
            jobs: Vec::new(),
        }
    }

    /// Jobs of an open printer within `scope`.
    fn enum_jobs(
        &self,
        handle: &PrinterHandle,
        printer: &str,
        scope: JobScope,
        operation: Operation,
    ) -> Result<Vec<Job>> {
        let buffer = SpoolBuffer::fill(|buf, size, needed, returned| {
            // SAFETY: `buf` holds `size` writable bytes.
            unsafe { EnumJobsW(handle.raw(), 0, u32::MAX, 2, buf, size, needed, returned) }
        })
        .map_err(|code| win32_error(operation, &format!("jobs of printer '{printer}'"), code))?;

        // SAFETY: EnumJobsW packed `count` JOB_INFO_2W records at the start.
        let records = unsafe { buffer.records::<JOB_INFO_2W>() };
        Ok(records
            .iter()
            .filter(|info| scope == JobScope::All || info.Status & FINISHED == 0)
            .map(job_record)
            .collect())
    }
}

fn job_record(info: &JOB_INFO_2W) -> Job {
    // SAFETY: the record and its strings live in the caller's buffer.
    let text = |p: *const u16| unsafe { from_wide(p) };
    let (start_time, until_time) = time_window(info.StartTime, info.UntilTime);
    let format = text(info.pDatatype).unwrap_or_default();

    Job {
        id: JobId(info.JobId),
        name: text(info.pDocument).unwrap_or_default(),
        printer_name: text(info.pPrinterName).unwrap_or_default(),
        user: text(info.pUserName).unwrap_or_default(),
        format: SPOOLER_TABLES.formats.normalize(&format),
        priority: info.Priority,
        size: u64::from(info.Size),
        status: SPOOLER_TABLES.job_status.decode(info.Status),
        status_message: text(info.pStatus),
        details: JobDetails::Spooler {
            position: info.Position,
            start_time,
            until_time,
            total_pages: info.TotalPages,
            pages_printed: info.PagesPrinted,
            elapsed_ms: info.Time,
            machine_name: text(info.pMachineName),
            document: text(info.pDocument),
            driver_name: text(info.pDriverName),
        },
    }
}

impl PrintingBackend for WindowsSpooler {
    fn platform_name(&self) -> &'static str {
        PLATFORM
    }

    fn tables(&self) -> &'static CodecTables {
        &SPOOLER_TABLES
    }

    #[instrument(skip(self))]
    fn list_printers(&self) -> Result<Vec<Printer>> {
        let operation = Operation::ListPrinters;
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let buffer = SpoolBuffer::fill(|buf, size, needed, returned| {
            // SAFETY: `buf` holds `size` writable bytes.
            unsafe { EnumPrintersW(flags, ptr::null(), 2, buf, size, needed, returned) }
        })
        .map_err(|code| win32_error(operation, "printers", code))?;

        let default = self.default_printer_name()?;
        // SAFETY: EnumPrintersW packed `count` PRINTER_INFO_2W records.
        let records = unsafe { buffer.records::<PRINTER_INFO_2W>() };
        let mut printers = Vec::with_capacity(records.len());
        for info in records {
            let mut printer = self.printer_record(info, default.as_deref());
            let handle = PrinterHandle::open(&printer.name, operation)?;
            printer.jobs = self.enum_jobs(&handle, &printer.name, JobScope::Active, operation)?;
            printers.push(printer);
        }
        debug!(count = printers.len(), "enumerated printers");
        Ok(printers)
    }

    #[instrument(skip(self))]
    fn get_printer(&self, name: &str) -> Result<Printer> {
        let operation = Operation::GetPrinter;
        let handle = PrinterHandle::open(name, operation)?;
        let buffer = SpoolBuffer::fill(|buf, size, needed, returned| {
            *returned = 1;
            // SAFETY: `buf` holds `size` writable bytes.
            unsafe { GetPrinterW(handle.raw(), 2, buf, size, needed) }
        })
        .map_err(|code| win32_error(operation, &format!("printer '{name}'"), code))?;

        let default = self.default_printer_name()?;
        // SAFETY: GetPrinterW wrote one PRINTER_INFO_2W record.
        let records = unsafe { buffer.records::<PRINTER_INFO_2W>() };
        let info = records
            .first()
            .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{name}'")))?;
        let mut printer = self.printer_record(info, default.as_deref());
        printer.jobs = self.enum_jobs(&handle, name, JobScope::Active, operation)?;
        Ok(printer)
    }

    fn default_printer_name(&self) -> Result<Option<String>> {
        let mut len: u32 = 0;
        // SAFETY: a null buffer with zero length queries the required size.
        unsafe { GetDefaultPrinterW(ptr::null_mut(), &mut len) };
        if len == 0 {
            debug!("no default printer");
            return Ok(None);
        }
        let mut wide = vec![0u16; len as usize];
        // SAFETY: `wide` holds `len` UTF-16 units.
        if unsafe { GetDefaultPrinterW(wide.as_mut_ptr(), &mut len) } == 0 {
            return Err(last_error(Operation::GetDefaultPrinterName, "default printer"));
        }
        // SAFETY: GetDefaultPrinterW wrote a NUL-terminated string.
        Ok(unsafe { from_wide(wide.as_ptr()) })
    }

    #[instrument(skip(self))]
    fn jobs(&self, printer: &str, scope: JobScope) -> Result<Vec<Job>> {
        let operation = Operation::GetJobs;
        let handle = PrinterHandle::open(printer, operation)?;
        self.enum_jobs(&handle, printer, scope, operation)
    }

    #[instrument(skip(self))]
    fn job(&self, printer: &str, id: JobId) -> Result<Job> {
        let operation = Operation::GetJob;
        let handle = PrinterHandle::open(printer, operation)?;
        let what = format!("job {id} on printer '{printer}'");
        let buffer = SpoolBuffer::fill(|buf, size, needed, returned| {
            *returned = 1;
            // SAFETY: `buf` holds `size` writable bytes.
            unsafe { GetJobW(handle.raw(), id.get(), 2, buf, size, needed) }
        })
        .map_err(|code| win32_error(operation, &what, code))?;

        // SAFETY: GetJobW wrote one JOB_INFO_2W record.
        let records = unsafe { buffer.records::<JOB_INFO_2W>() };
        records
            .first()
            .map(job_record)
            .ok_or_else(|| SpoolError::not_found(operation, what))
    }

    #[instrument(skip(self))]
    fn control_job(&self, printer: &str, id: JobId, command: NativeCode) -> Result<bool> {
        let operation = Operation::SetJobCommand;
        let handle = PrinterHandle::open(printer, operation)?;
        // SAFETY: level 0 passes no job info structure.
        let ok = unsafe { SetJobW(handle.raw(), id.get(), 0, ptr::null(), command) };
        if ok == 0 {
            return Err(last_error(operation, &format!("job {id} on printer '{printer}'")));
        }
        info!(job_id = %id, command, "job command applied");
        Ok(true)
    }

    fn open_session<'a>(&'a self, printer: &str) -> Result<Box<dyn SpoolSession + 'a>> {
        let handle = PrinterHandle::open(printer, Operation::SubmitData)?;
        Ok(Box::new(SpoolerSession {
            handle,
            printer: printer.to_string(),
            job: None,
            page_open: false,
            written: 0,
        }))
    }

    /// Labels whose datatype at least one installed print processor accepts.
    #[instrument(skip(self))]
    fn supported_formats(&self) -> Result<Vec<String>> {
        let operation = Operation::GetSupportedFormats;
        let processors = SpoolBuffer::fill(|buf, size, needed, returned| {
            // SAFETY: `buf` holds `size` writable bytes.
            unsafe { EnumPrintProcessorsW(ptr::null(), ptr::null(), 1, buf, size, needed, returned) }
        })
        .map_err(|code| win32_error(operation, "print processors", code))?;

        let mut accepted = Vec::new();
        // SAFETY: EnumPrintProcessorsW packed PRINTPROCESSOR_INFO_1W records.
        for processor in unsafe { processors.records::<PRINTPROCESSOR_INFO_1W>() } {
            let name = processor.pName;
            let datatypes = SpoolBuffer::fill(|buf, size, needed, returned| {
                // SAFETY: `name` points into `processors`, which is alive.
                unsafe {
                    EnumPrintProcessorDatatypesW(ptr::null(), name, 1, buf, size, needed, returned)
                }
            })
            .map_err(|code| win32_error(operation, "print processor datatypes", code))?;
            // SAFETY: packed DATATYPES_INFO_1W records.
            for datatype in unsafe { datatypes.records::<DATATYPES_INFO_1W>() } {
                // SAFETY: string lives in `datatypes`.
                if let Some(name) = unsafe { from_wide(datatype.pName) } {
                    accepted.push(name);
                }
            }
        }

        let labels = SPOOLER_TABLES
            .formats
            .entries()
            .iter()
            .filter(|(_, native)| accepted.iter().any(|a| a == native))
            .map(|(label, _)| label.to_string())
            .collect();
        Ok(labels)
    }
}

/// StartDocPrinter / WritePrinter / EndDocPrinter session.
struct SpoolerSession {
    handle: PrinterHandle,
    printer: String,
    job: Option<JobId>,
    page_open: bool,
    written: u64,
}

impl SpoolSession for SpoolerSession {
    fn create_job(
        &mut self,
        doc_name: &str,
        native_format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        if !options.is_empty() {
            debug!(count = options.len(), "job options are not applied by the spooler");
        }
        let mut doc = to_wide(doc_name);
        let mut datatype = to_wide(native_format);
        let info = DOC_INFO_1W {
            pDocName: doc.as_mut_ptr(),
            pOutputFile: ptr::null_mut(),
            pDatatype: datatype.as_mut_ptr(),
        };
        // SAFETY: `info` points at buffers that outlive the call.
        let id = unsafe { StartDocPrinterW(self.handle.raw(), 1, &info) };
        if id == 0 {
            return Err(last_error(
                Operation::SubmitData,
                &format!("printer '{}'", self.printer),
            ));
        }
        let id = JobId(id);
        self.job = Some(id);
        debug!(job_id = %id, printer = %self.printer, "document started");
        Ok(id)
    }

    fn open_document(&mut self) -> Result<()> {
        // SAFETY: the handle is open and a document has been started.
        if unsafe { StartPagePrinter(self.handle.raw()) } == 0 {
            return Err(last_error(Operation::SubmitData, "StartPagePrinter"));
        }
        self.page_open = true;
        self.written = 0;
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        let len = u32::try_from(chunk.len()).map_err(|_| {
            SpoolError::invalid(Operation::SubmitData, "chunk exceeds 4 GiB")
        })?;
        let mut written: u32 = 0;
        // SAFETY: `chunk` is readable for `len` bytes.
        let ok = unsafe {
            WritePrinter(self.handle.raw(), chunk.as_ptr().cast(), len, &mut written)
        };
        if ok == 0 {
            return Err(last_error(Operation::SubmitData, "WritePrinter"));
        }
        self.written += u64::from(written);
        Ok(written as usize)
    }

    fn close_document(&mut self) -> Result<u64> {
        self.page_open = false;
        // SAFETY: a page was started on this handle.
        if unsafe { EndPagePrinter(self.handle.raw()) } == 0 {
            return Err(last_error(Operation::SubmitData, "EndPagePrinter"));
        }
        Ok(self.written)
    }

    fn close_job(&mut self) -> Result<()> {
        // SAFETY: a document was started on this handle.
        if unsafe { EndDocPrinter(self.handle.raw()) } == 0 {
            return Err(last_error(Operation::SubmitData, "EndDocPrinter"));
        }
        self.job = None;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        if self.page_open {
            self.page_open = false;
            // SAFETY: a page was started on this handle.
            unsafe { EndPagePrinter(self.handle.raw()) };
        }
        let Some(id) = self.job.take() else {
            return Ok(());
        };
        warn!(job_id = %id, "deleting partially submitted job");
        // SAFETY: level 0 passes no job info structure.
        let deleted = unsafe {
            SetJobW(self.handle.raw(), id.get(), 0, ptr::null(), winspool::JOB_CONTROL_DELETE)
        };
        // SAFETY: a document was started on this handle.
        let ended = unsafe { EndDocPrinter(self.handle.raw()) };
        if deleted == 0 || ended == 0 {
            return Err(last_error(Operation::SubmitData, &format!("cleanup of job {id}")));
        }
        Ok(())
    }
}

impl Drop for SpoolerSession {
    fn drop(&mut self) {
        if self.job.is_some()
            && let Err(e) = self.abort()
        {
            warn!("spooler session dropped mid-job: {e}");
        }
    }
}

