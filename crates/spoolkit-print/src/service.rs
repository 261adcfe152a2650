// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `PrintService`: the public operations over one native backend.
//
// Arguments are validated and labels encoded here, before the backend is
// touched. Backends only ever see native codes and checked ids.

use std::path::Path;

use tracing::{debug, info, instrument};

use spoolkit_bridge::{PrintingBackend, native_backend};
use spoolkit_core::config::SpoolConfig;
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{Job, JobId, JobOptions, JobScope, OptionNode, Printer};

use crate::submission::Submission;

/// Driver option carrying the selected media size.
const PAGE_SIZE_OPTION: &str = "PageSize";

/// Printers, jobs and submission over one print service.
pub struct PrintService {
    backend: Box<dyn PrintingBackend>,
    config: SpoolConfig,
}

impl PrintService {
    pub fn new(backend: Box<dyn PrintingBackend>, config: SpoolConfig) -> Self {
        Self { backend, config }
    }

    /// Service over the host's native print service.
    pub fn native(config: SpoolConfig) -> Result<Self> {
        config.validate()?;
        let backend = native_backend(&config);
        info!(platform = backend.platform_name(), "print service ready");
        Ok(Self::new(backend, config))
    }

    pub fn platform_name(&self) -> &'static str {
        self.backend.platform_name()
    }

    pub fn list_printers(&self) -> Result<Vec<Printer>> {
        self.backend.list_printers()
    }

    /// Always `None` on CUPS; scan `list_printers` for `is_default` there.
    pub fn default_printer_name(&self) -> Result<Option<String>> {
        self.backend.default_printer_name()
    }

    pub fn get_printer(&self, name: &str) -> Result<Printer> {
        require_name(name, Operation::GetPrinter)?;
        self.backend.get_printer(name)
    }

    pub fn driver_options(&self, printer: &str) -> Result<OptionNode> {
        require_name(printer, Operation::GetDriverOptions)?;
        self.backend.driver_options(printer)
    }

    /// Choice currently marked for the driver's `PageSize` option.
    pub fn selected_paper_size(&self, printer: &str) -> Result<Option<String>> {
        let operation = Operation::GetSelectedPaperSize;
        require_name(printer, operation)?;
        let tree = self
            .backend
            .driver_options(printer)
            .map_err(|e| e.reattribute(operation))?;
        Ok(tree.marked_choice(PAGE_SIZE_OPTION).map(str::to_string))
    }

    pub fn get_jobs(&self, printer: &str, scope: JobScope) -> Result<Vec<Job>> {
        require_name(printer, Operation::GetJobs)?;
        self.backend.jobs(printer, scope)
    }

    pub fn get_job(&self, printer: &str, job_id: i64) -> Result<Job> {
        let operation = Operation::GetJob;
        require_name(printer, operation)?;
        let id = JobId::from_raw(job_id, operation)?;
        self.backend.job(printer, id)
    }

    /// Apply a job command label such as `CANCEL`.
    ///
    /// `Ok(false)` when the service accepted the request but the job's state
    /// made it a no-op.
    #[instrument(skip(self))]
    pub fn set_job_command(&self, printer: &str, job_id: i64, command: &str) -> Result<bool> {
        let operation = Operation::SetJobCommand;
        require_name(printer, operation)?;
        let id = JobId::from_raw(job_id, operation)?;
        let code = self.backend.tables().job_commands.encode(command, operation)?;
        let applied = self.backend.control_job(printer, id, code)?;
        debug!(applied, "job command handled");
        Ok(applied)
    }

    /// Submit an in-memory document and return the new job's id.
    #[instrument(skip(self, data, options), fields(bytes = data.len()))]
    pub fn submit_data(
        &self,
        data: &[u8],
        printer: &str,
        doc_name: &str,
        format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let operation = Operation::SubmitData;
        require_name(printer, operation)?;
        if data.is_empty() {
            return Err(SpoolError::invalid(operation, "document data is empty"));
        }
        let native_format = self.backend.tables().formats.encode(format, operation)?;

        let session = self.backend.open_session(printer)?;
        let mut submission = Submission::new(session, self.config.write_chunk_size);
        submission.run(data, doc_name, native_format, options)
    }

    /// Submit a file in a single native call.
    #[instrument(skip(self, options), fields(path = %path.display()))]
    pub fn submit_file(
        &self,
        path: &Path,
        doc_name: &str,
        printer: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let operation = Operation::SubmitFile;
        require_name(printer, operation)?;
        if path.as_os_str().is_empty() {
            return Err(SpoolError::invalid(operation, "file path is empty"));
        }
        let id = self.backend.print_file(path, doc_name, printer, options)?;
        if id.get() == 0 {
            return Err(SpoolError::native(operation, None, "service returned job id 0"));
        }
        info!(job_id = %id, "file submitted");
        Ok(id)
    }

    pub fn supported_formats(&self) -> Result<Vec<String>> {
        self.backend.supported_formats()
    }

    pub fn supported_job_commands(&self) -> Vec<String> {
        self.backend.tables().job_commands.labels()
    }
}

fn require_name(name: &str, operation: Operation) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SpoolError::invalid(operation, "printer name is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use spoolkit_bridge::{FailStage, INJECTED_FAILURE_CODE, MemorySpooler};

    use super::*;

    const PRINTER: &str = "Fixture-Printer";

    fn service() -> PrintService {
        PrintService::new(Box::new(MemorySpooler::fixture()), SpoolConfig::default())
    }

    /// Service over a fixture spooler prepared by `configure`.
    fn service_with(configure: impl FnOnce(&MemorySpooler)) -> PrintService {
        let spooler = MemorySpooler::fixture();
        configure(&spooler);
        PrintService::new(Box::new(spooler), SpoolConfig::default())
    }

    #[test]
    fn two_destinations_listed_with_status() {
        let printers = service().list_printers().unwrap();
        assert_eq!(printers.len(), 2);
        let names: BTreeSet<_> = printers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(printers.iter().all(|p| !p.status.is_empty()));
    }

    #[test]
    fn listing_fails_whole_on_first_error() {
        let service = service_with(|s| s.fail_job_listing("Fixture-Label"));
        match service.list_printers() {
            Err(SpoolError::NativeOperationFailed { operation, code, .. }) => {
                assert_eq!(operation, Operation::ListPrinters);
                assert_eq!(code, Some(INJECTED_FAILURE_CODE));
            }
            other => panic!("expected the listing to fail, got {other:?}"),
        }
        // The healthy destination is still reachable on its own.
        assert!(service.get_jobs(PRINTER, JobScope::Active).is_ok());
    }

    #[test]
    fn every_listed_printer_resolves() {
        let service = service();
        for printer in service.list_printers().unwrap() {
            assert_eq!(service.get_printer(&printer.name).unwrap().name, printer.name);
        }
    }

    #[test]
    fn submitted_data_becomes_a_live_job() {
        let service = service();
        let id = service
            .submit_data(b"hello", PRINTER, "doc1", "TEXT", &JobOptions::new())
            .unwrap();
        assert!(id.get() > 0);

        let job = service.get_job(PRINTER, i64::from(id.get())).unwrap();
        assert!(["PRINTING", "PENDING", "PRINTED"].iter().any(|s| job.status.contains(*s)));
        assert_eq!(job.name, "doc1");
        assert_eq!(job.format, "TEXT");
        assert_eq!(job.size, 5);
    }

    #[test]
    fn unknown_command_names_discovery_operation() {
        let service = service();
        let id = service
            .submit_data(b"hello", PRINTER, "doc", "TEXT", &JobOptions::new())
            .unwrap();
        let err = service
            .set_job_command(PRINTER, i64::from(id.get()), "FOO")
            .unwrap_err();
        match &err {
            SpoolError::UnsupportedValue { discovery, value, .. } => {
                assert_eq!(*discovery, Operation::GetSupportedJobCommands);
                assert_eq!(value, "FOO");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("getSupportedJobCommands"));
        assert!(!service.supported_job_commands().contains(&"FOO".to_string()));
    }

    #[test]
    fn missing_file_is_a_native_failure() {
        let err = service()
            .submit_file(Path::new("/no/such/path"), "doc", PRINTER, &JobOptions::new())
            .unwrap_err();
        match err {
            SpoolError::NativeOperationFailed { operation, message, .. } => {
                assert_eq!(operation, Operation::SubmitFile);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn file_submission_creates_job() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7 fixture").unwrap();
        let mut options = JobOptions::new();
        options.insert("copies".into(), "2".into());

        let service = service();
        let id = service.submit_file(file.path(), "report", PRINTER, &options).unwrap();
        let job = service.get_job(PRINTER, i64::from(id.get())).unwrap();
        assert_eq!(job.name, "report");
        assert_eq!(job.size, 16);
    }

    #[test]
    fn cancel_is_always_available() {
        let service = service();
        assert!(service.supported_job_commands().contains(&"CANCEL".to_string()));
        let id = service
            .submit_data(b"hello", PRINTER, "doc", "TEXT", &JobOptions::new())
            .unwrap();
        let raw = i64::from(id.get());

        assert!(service.set_job_command(PRINTER, raw, "CANCEL").unwrap());
        assert!(service.get_jobs(PRINTER, JobScope::Active).unwrap().is_empty());
        assert_eq!(service.get_jobs(PRINTER, JobScope::All).unwrap().len(), 1);
        // Already terminal.
        assert!(!service.set_job_command(PRINTER, raw, "CANCEL").unwrap());
    }

    #[test]
    fn negative_ids_rejected_before_lookup() {
        let service = service();
        assert!(matches!(
            service.get_job(PRINTER, -1),
            Err(SpoolError::InvalidArgument { operation: Operation::GetJob, .. })
        ));
        assert!(matches!(
            service.set_job_command(PRINTER, -3, "FOO"),
            Err(SpoolError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unknown_job_not_found() {
        assert!(matches!(
            service().get_job(PRINTER, 999),
            Err(SpoolError::NotFound { .. })
        ));
    }

    #[test]
    fn unknown_format_rejected_before_session() {
        let service = service_with(|s| s.fail_at(FailStage::CreateJob));
        let err = service
            .submit_data(b"x", PRINTER, "doc", "HOLOGRAM", &JobOptions::new())
            .unwrap_err();
        assert!(matches!(
            err,
            SpoolError::UnsupportedValue { discovery: Operation::GetSupportedFormats, .. }
        ));
        // The injected fault is still armed, so nothing reached the spooler.
        assert!(service.submit_data(b"x", PRINTER, "doc", "TEXT", &JobOptions::new()).is_err());
    }

    #[test]
    fn short_write_fails_submission() {
        let service = service_with(|s| s.short_writes(1));
        let err = service
            .submit_data(b"hello", PRINTER, "doc", "TEXT", &JobOptions::new())
            .unwrap_err();
        assert!(matches!(err, SpoolError::NativeOperationFailed { .. }));
        assert!(service.get_jobs(PRINTER, JobScope::Active).unwrap().is_empty());
    }

    #[test]
    fn unconfirmed_bytes_fail_submission() {
        let service = service_with(|s| s.short_confirm(2));
        let err = service
            .submit_data(b"hello", PRINTER, "doc", "TEXT", &JobOptions::new())
            .unwrap_err();
        assert!(err.to_string().contains("confirmed 3 of 5 bytes"));
    }

    #[test]
    fn failing_cleanup_keeps_original_error() {
        let service = service_with(|s| {
            s.fail_at(FailStage::Write);
            s.fail_at(FailStage::Abort);
        });
        let err = service
            .submit_data(b"hello", PRINTER, "doc", "TEXT", &JobOptions::new())
            .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("write"));
    }

    #[test]
    fn empty_data_and_names_rejected() {
        let service = service();
        assert!(matches!(
            service.submit_data(b"", PRINTER, "doc", "TEXT", &JobOptions::new()),
            Err(SpoolError::InvalidArgument { .. })
        ));
        assert!(matches!(
            service.get_printer("  "),
            Err(SpoolError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn paper_size_follows_driver_defaults() {
        let service = service();
        assert_eq!(
            service.selected_paper_size("Fixture-Label").unwrap().as_deref(),
            Some("w288h432")
        );
        let err = service.selected_paper_size("Fixture-Printer").unwrap_err();
        assert_eq!(err.operation(), Some(Operation::GetSelectedPaperSize));
    }

    #[test]
    fn paper_size_follows_destination_option() {
        let service = service_with(|s| s.set_option("Fixture-Label", "PageSize", "w144h72"));
        assert_eq!(
            service.selected_paper_size("Fixture-Label").unwrap().as_deref(),
            Some("w144h72")
        );
    }

    #[test]
    fn formats_are_table_labels() {
        let formats = service().supported_formats().unwrap();
        assert!(formats.contains(&"PDF".to_string()));
        assert!(formats.contains(&"TEXT".to_string()));
    }
}
