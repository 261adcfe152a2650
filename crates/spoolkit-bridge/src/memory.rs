// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process spooler for tests, CI and `spoolctl --memory`.
//
// Behaves like a single CUPS scheduler (same codec tables, same job states)
// without a network connection. Failures can be injected at any submission
// stage to exercise the cleanup paths.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use spoolkit_core::codec::{CUPS_TABLES, CodecTables, NativeCode, ipp as codes};
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{Job, JobDetails, JobId, JobOptions, JobScope, OptionNode, Printer};

use crate::ppd;
use crate::traits::{PrintingBackend, SpoolSession};

const PLATFORM: &str = "memory";

/// Native code carried by every injected failure.
pub const INJECTED_FAILURE_CODE: i64 = -1;

/// Submission stage at which an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailStage {
    CreateJob,
    OpenDocument,
    Write,
    CloseDocument,
    CloseJob,
    Abort,
}

/// Misbehaviours the spooler can be told to exhibit.
#[derive(Debug, Default, Clone)]
struct Faults {
    fail_at: Vec<FailStage>,
    /// Each write accepts this many bytes fewer than offered.
    short_write: usize,
    /// Bytes missing from the count confirmed at document close.
    short_confirm: u64,
    /// Destinations whose job list cannot be read.
    failing_job_lists: Vec<String>,
}

struct StoredJob {
    id: u32,
    name: String,
    user: String,
    format: String,
    priority: u32,
    data: Vec<u8>,
    state: NativeCode,
    options: JobOptions,
    created: chrono::DateTime<Utc>,
    completed: Option<chrono::DateTime<Utc>>,
}

struct StoredPrinter {
    name: String,
    is_default: bool,
    state: NativeCode,
    printer_type: NativeCode,
    options: BTreeMap<String, String>,
    ppd: Option<String>,
    jobs: Vec<StoredJob>,
}

struct State {
    printers: Vec<StoredPrinter>,
    next_job_id: u32,
    faults: Faults,
}

/// In-memory print service.
pub struct MemorySpooler {
    state: Mutex<State>,
}

impl Default for MemorySpooler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySpooler {
    /// An empty spooler with no destinations.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                printers: Vec::new(),
                next_job_id: 1,
                faults: Faults::default(),
            }),
        }
    }

    /// Two destinations: the default `Fixture-Printer` and a `Fixture-Label`
    /// thermal printer carrying a small PPD.
    pub fn fixture() -> Self {
        let spooler = Self::new();
        spooler.add_printer("Fixture-Printer", true);
        spooler.add_printer("Fixture-Label", false);
        spooler.set_ppd("Fixture-Label", FIXTURE_PPD);
        spooler
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an idle destination.
    pub fn add_printer(&self, name: &str, is_default: bool) {
        let mut state = self.lock();
        if is_default {
            for printer in &mut state.printers {
                printer.is_default = false;
            }
        }
        let mut printer_type = codes::TYPE_BW | codes::TYPE_COPIES | codes::TYPE_SMALL;
        if is_default {
            printer_type |= codes::TYPE_DEFAULT;
        }
        let mut options = BTreeMap::new();
        options.insert("printer-info".to_string(), name.replace('-', " "));
        options.insert("device-uri".to_string(), format!("memory:/{name}"));
        state.printers.push(StoredPrinter {
            name: name.to_string(),
            is_default,
            state: codes::PRINTER_IDLE,
            printer_type,
            options,
            ppd: None,
            jobs: Vec::new(),
        });
    }

    /// Attach PPD text to a destination, enabling driver options.
    pub fn set_ppd(&self, printer: &str, text: &str) {
        if let Some(p) = self.lock().printers.iter_mut().find(|p| p.name == printer) {
            p.ppd = Some(text.to_string());
        }
    }

    /// Set a destination option, e.g. a PPD keyword the user chose.
    pub fn set_option(&self, printer: &str, key: &str, value: &str) {
        if let Some(p) = self.lock().printers.iter_mut().find(|p| p.name == printer) {
            p.options.insert(key.to_string(), value.to_string());
        }
    }

    /// Make the next submission fail at `stage`.
    pub fn fail_at(&self, stage: FailStage) {
        self.lock().faults.fail_at.push(stage);
    }

    /// Make every job listing of `printer` fail, including the one done
    /// while enumerating destinations.
    pub fn fail_job_listing(&self, printer: &str) {
        self.lock().faults.failing_job_lists.push(printer.to_string());
    }

    /// Make every write accept `missing` bytes fewer than offered.
    pub fn short_writes(&self, missing: usize) {
        self.lock().faults.short_write = missing;
    }

    /// Make document close confirm `missing` bytes fewer than received.
    pub fn short_confirm(&self, missing: u64) {
        self.lock().faults.short_confirm = missing;
    }

    /// Bytes stored for a job, for assertions.
    pub fn job_data(&self, printer: &str, id: JobId) -> Option<Vec<u8>> {
        let state = self.lock();
        state
            .printers
            .iter()
            .find(|p| p.name == printer)?
            .jobs
            .iter()
            .find(|j| j.id == id.get())
            .map(|j| j.data.clone())
    }

    /// Options a job was created with, for assertions.
    pub fn job_options(&self, printer: &str, id: JobId) -> Option<JobOptions> {
        let state = self.lock();
        state
            .printers
            .iter()
            .find(|p| p.name == printer)?
            .jobs
            .iter()
            .find(|j| j.id == id.get())
            .map(|j| j.options.clone())
    }

    fn take_fault(&self, stage: FailStage) -> Result<()> {
        let mut state = self.lock();
        if let Some(pos) = state.faults.fail_at.iter().position(|s| *s == stage) {
            state.faults.fail_at.remove(pos);
            warn!(?stage, "injected failure");
            return Err(SpoolError::native(
                Operation::SubmitData,
                Some(INJECTED_FAILURE_CODE),
                format!("injected failure at {stage:?}"),
            ));
        }
        Ok(())
    }

    fn new_job(
        &self,
        printer: &str,
        name: &str,
        format: &str,
        options: &JobOptions,
        operation: Operation,
    ) -> Result<JobId> {
        let mut state = self.lock();
        let id = state.next_job_id;
        let stored = state
            .printers
            .iter_mut()
            .find(|p| p.name == printer)
            .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{printer}'")))?;
        stored.jobs.push(StoredJob {
            id,
            name: name.to_string(),
            user: "memory".to_string(),
            format: format.to_string(),
            priority: 50,
            data: Vec::new(),
            state: codes::JOB_PENDING,
            options: options.clone(),
            created: Utc::now(),
            completed: None,
        });
        state.next_job_id += 1;
        Ok(JobId(id))
    }

    fn with_job<T>(
        &self,
        printer: &str,
        id: JobId,
        operation: Operation,
        f: impl FnOnce(&mut StoredJob) -> T,
    ) -> Result<T> {
        let mut state = self.lock();
        let stored = state
            .printers
            .iter_mut()
            .find(|p| p.name == printer)
            .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{printer}'")))?;
        let job = stored
            .jobs
            .iter_mut()
            .find(|j| j.id == id.get())
            .ok_or_else(|| {
                SpoolError::not_found(operation, format!("job {id} on printer '{printer}'"))
            })?;
        Ok(f(job))
    }
}

fn printer_record(
    stored: &StoredPrinter,
    faults: &Faults,
    operation: Operation,
) -> Result<Printer> {
    Ok(Printer {
        name: stored.name.clone(),
        is_default: stored.is_default,
        instance: None,
        options: stored.options.clone(),
        status: CUPS_TABLES.printer_status.decode(stored.state),
        status_number: stored.state,
        attributes: CUPS_TABLES.printer_attributes.decode(stored.printer_type),
        priority: 0,
        default_priority: 50,
        average_ppm: 0,
        start_time: None,
        until_time: None,
        jobs: job_list(stored, faults, JobScope::Active, operation)?,
    })
}

fn job_list(
    stored: &StoredPrinter,
    faults: &Faults,
    scope: JobScope,
    operation: Operation,
) -> Result<Vec<Job>> {
    if faults.failing_job_lists.contains(&stored.name) {
        warn!(printer = %stored.name, "injected job listing failure");
        return Err(SpoolError::native(
            operation,
            Some(INJECTED_FAILURE_CODE),
            format!("injected failure listing jobs of '{}'", stored.name),
        ));
    }
    Ok(stored
        .jobs
        .iter()
        .filter(|j| scope == JobScope::All || is_active(j.state))
        .map(|j| job_record(&stored.name, j))
        .collect())
}

fn is_active(state: NativeCode) -> bool {
    matches!(
        state,
        codes::JOB_PENDING | codes::JOB_HELD | codes::JOB_PROCESSING | codes::JOB_STOPPED
    )
}

fn job_record(printer: &str, job: &StoredJob) -> Job {
    Job {
        id: JobId(job.id),
        name: job.name.clone(),
        printer_name: printer.to_string(),
        user: job.user.clone(),
        format: CUPS_TABLES.formats.normalize(&job.format),
        priority: job.priority,
        size: job.data.len() as u64,
        status: CUPS_TABLES.job_status.decode(job.state),
        status_message: None,
        details: JobDetails::Cups {
            creation_time: Some(job.created),
            processing_time: None,
            completed_time: job.completed,
        },
    }
}

impl PrintingBackend for MemorySpooler {
    fn platform_name(&self) -> &'static str {
        PLATFORM
    }

    fn tables(&self) -> &'static CodecTables {
        &CUPS_TABLES
    }

    fn list_printers(&self) -> Result<Vec<Printer>> {
        let state = self.lock();
        state
            .printers
            .iter()
            .map(|p| printer_record(p, &state.faults, Operation::ListPrinters))
            .collect()
    }

    fn get_printer(&self, name: &str) -> Result<Printer> {
        let operation = Operation::GetPrinter;
        let state = self.lock();
        let stored = state
            .printers
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{name}'")))?;
        printer_record(stored, &state.faults, operation)
    }

    fn default_printer_name(&self) -> Result<Option<String>> {
        let state = self.lock();
        Ok(state.printers.iter().find(|p| p.is_default).map(|p| p.name.clone()))
    }

    fn driver_options(&self, printer: &str) -> Result<OptionNode> {
        let operation = Operation::GetDriverOptions;
        let (text, options) = {
            let state = self.lock();
            let stored = state
                .printers
                .iter()
                .find(|p| p.name == printer)
                .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{printer}'")))?;
            let text = stored.ppd.clone().ok_or_else(|| {
                SpoolError::not_found(operation, format!("PPD for printer '{printer}'"))
            })?;
            (text, stored.options.clone())
        };
        let mut tree = ppd::parse_ppd(printer, &text);
        ppd::mark_from_destination(&mut tree, &options);
        Ok(tree)
    }

    fn jobs(&self, printer: &str, scope: JobScope) -> Result<Vec<Job>> {
        let state = self.lock();
        let stored = state
            .printers
            .iter()
            .find(|p| p.name == printer)
            .ok_or_else(|| SpoolError::not_found(Operation::GetJobs, format!("printer '{printer}'")))?;
        job_list(stored, &state.faults, scope, Operation::GetJobs)
    }

    fn job(&self, printer: &str, id: JobId) -> Result<Job> {
        self.with_job(printer, id, Operation::GetJob, |job| job_record(printer, job))
    }

    fn control_job(&self, printer: &str, id: JobId, command: NativeCode) -> Result<bool> {
        let operation = Operation::SetJobCommand;
        if !matches!(
            command,
            codes::OP_CANCEL_JOB | codes::OP_HOLD_JOB | codes::OP_RELEASE_JOB | codes::OP_RESTART_JOB
        ) {
            return Err(SpoolError::native(
                operation,
                Some(i64::from(command)),
                "not a job operation",
            ));
        }
        let applied = self.with_job(printer, id, operation, |job| {
            let next = match (command, job.state) {
                (codes::OP_CANCEL_JOB, s) if is_active(s) => Some(codes::JOB_CANCELED),
                (codes::OP_HOLD_JOB, codes::JOB_PENDING) => Some(codes::JOB_HELD),
                (codes::OP_RELEASE_JOB, codes::JOB_HELD) => Some(codes::JOB_PENDING),
                (codes::OP_RESTART_JOB, s) if !is_active(s) => Some(codes::JOB_PENDING),
                _ => None,
            };
            match next {
                Some(state) => {
                    job.state = state;
                    job.completed = (!is_active(state)).then(Utc::now);
                    true
                }
                None => false,
            }
        })?;
        info!(job_id = %id, command, applied, "job command");
        Ok(applied)
    }

    fn open_session<'a>(&'a self, printer: &str) -> Result<Box<dyn SpoolSession + 'a>> {
        if !self.lock().printers.iter().any(|p| p.name == printer) {
            return Err(SpoolError::not_found(
                Operation::SubmitData,
                format!("printer '{printer}'"),
            ));
        }
        Ok(Box::new(MemorySession {
            spooler: self,
            printer: printer.to_string(),
            job: None,
            document: None,
        }))
    }

    fn print_file(
        &self,
        path: &Path,
        doc_name: &str,
        printer: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let operation = Operation::SubmitFile;
        let data = std::fs::read(path).map_err(|e| SpoolError::native_io(operation, &e))?;
        let id = self.new_job(printer, doc_name, "application/octet-stream", options, operation)?;
        self.with_job(printer, id, operation, |job| job.data = data)?;
        debug!(job_id = %id, "file stored");
        Ok(id)
    }
}

/// Submission against the in-memory spooler.
struct MemorySession<'a> {
    spooler: &'a MemorySpooler,
    printer: String,
    job: Option<JobId>,
    /// Bytes received for the open document.
    document: Option<Vec<u8>>,
}

impl MemorySession<'_> {
    fn job_id(&self) -> Result<JobId> {
        self.job
            .ok_or_else(|| SpoolError::native(Operation::SubmitData, None, "no job has been created"))
    }
}

impl SpoolSession for MemorySession<'_> {
    fn create_job(
        &mut self,
        doc_name: &str,
        native_format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        self.spooler.take_fault(FailStage::CreateJob)?;
        let id = self.spooler.new_job(
            &self.printer,
            doc_name,
            native_format,
            options,
            Operation::SubmitData,
        )?;
        self.job = Some(id);
        Ok(id)
    }

    fn open_document(&mut self) -> Result<()> {
        self.job_id()?;
        self.spooler.take_fault(FailStage::OpenDocument)?;
        self.document = Some(Vec::new());
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        self.spooler.take_fault(FailStage::Write)?;
        let missing = self.spooler.lock().faults.short_write;
        let accepted = chunk.len().saturating_sub(missing);
        let document = self.document.as_mut().ok_or_else(|| {
            SpoolError::native(Operation::SubmitData, None, "no document is open")
        })?;
        document.extend_from_slice(&chunk[..accepted]);
        Ok(accepted)
    }

    fn close_document(&mut self) -> Result<u64> {
        self.spooler.take_fault(FailStage::CloseDocument)?;
        let id = self.job_id()?;
        let data = self.document.take().unwrap_or_default();
        let received = data.len() as u64;
        self.spooler
            .with_job(&self.printer, id, Operation::SubmitData, |job| job.data = data)?;
        let missing = self.spooler.lock().faults.short_confirm;
        Ok(received.saturating_sub(missing))
    }

    fn close_job(&mut self) -> Result<()> {
        self.spooler.take_fault(FailStage::CloseJob)?;
        debug!(job_id = ?self.job, "job closed");
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.spooler.take_fault(FailStage::Abort)?;
        self.document = None;
        if let Some(id) = self.job.take() {
            self.spooler
                .with_job(&self.printer, id, Operation::SubmitData, |job| {
                    job.state = codes::JOB_CANCELED;
                    job.completed = Some(Utc::now());
                })?;
        }
        Ok(())
    }
}

/// Driver description of the `Fixture-Label` destination.
const FIXTURE_PPD: &str = r#"*PPD-Adobe: "4.3"
*ModelName: "Fixture Label Printer"
*OpenGroup: General/General
*OpenUI *PageSize/Label Size: PickOne
*DefaultPageSize: w288h432
*PageSize w288h432/4x6 in: "<</PageSize[288 432]>>setpagedevice"
*PageSize w144h72/2x1 in: "<</PageSize[144 72]>>setpagedevice"
*CloseUI: *PageSize
*OpenUI *Darkness/Darkness: PickOne
*DefaultDarkness: 15
*Darkness 10/Light: ""
*Darkness 15/Normal: ""
*Darkness 25/Dark: ""
*CloseUI: *Darkness
*CloseGroup: General
"#;
