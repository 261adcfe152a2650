// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS backend over IPP.
//
// Talks to the CUPS scheduler with the `ipp` crate's blocking client:
//   - CUPS-Get-Printers / Get-Printer-Attributes   destinations
//   - Get-Jobs                                     job catalog
//   - Create-Job + Send-Document                   streamed submission
//   - Print-Job                                    file submission
//   - Cancel/Hold/Release/Restart-Job              job control
//   - CUPS-Get-PPD                                 driver options

pub mod attributes;

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ipp::model::{Operation as IppOperation, StatusCode};
use ipp::prelude::{
    DelimiterTag, IppAttribute, IppClient, IppPayload, IppRequestResponse, IppValue, IppVersion,
    Uri,
};
use tracing::{debug, error, info, instrument, warn};

use spoolkit_core::codec::{CUPS_TABLES, CodecTables, NativeCode, ipp as codes};
use spoolkit_core::config::SpoolConfig;
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{Job, JobId, JobOptions, JobScope, OptionNode, Printer};

use crate::ppd;
use crate::traits::{PrintingBackend, SpoolSession};

use self::attributes::{JOB_ATTRIBUTES, int_attr, job_from_attributes, option_value};

const PLATFORM: &str = "CUPS";

/// Blocking IPP connection settings for one CUPS scheduler.
pub struct CupsBackend {
    /// Scheduler URI without a trailing slash.
    server: String,
    user: String,
    ignore_tls_errors: bool,
}

impl CupsBackend {
    pub fn new(config: &SpoolConfig) -> Self {
        Self {
            server: config.cups_server.trim_end_matches('/').to_string(),
            user: config.effective_user(),
            ignore_tls_errors: config.ignore_tls_errors,
        }
    }

    fn server_uri(&self, operation: Operation) -> Result<Uri> {
        format!("{}/", self.server).parse().map_err(|e| {
            SpoolError::native(operation, None, format!("invalid server URI '{}': {e}", self.server))
        })
    }

    /// Queue URI of a destination. Names are validated before they reach the
    /// scheduler.
    fn printer_uri(&self, name: &str, operation: Operation) -> Result<Uri> {
        if name.is_empty() || name.contains(['/', '#', '?']) || name.contains(char::is_whitespace) {
            return Err(SpoolError::invalid(
                operation,
                format!("'{name}' is not a valid destination name"),
            ));
        }
        format!("{}/printers/{name}", self.server)
            .parse()
            .map_err(|e| SpoolError::invalid(operation, format!("destination '{name}': {e}")))
    }

    /// New request carrying `printer-uri` and `requesting-user-name`.
    fn request(&self, op: IppOperation, printer_uri: &Uri) -> IppRequestResponse {
        let mut req = IppRequestResponse::new(IppVersion::v1_1(), op, Some(printer_uri.clone()));
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                "requesting-user-name",
                IppValue::NameWithoutLanguage(self.user.clone()),
            ),
        );
        req
    }

    /// Send a request and return the response whatever its status.
    fn send_raw(
        &self,
        target: &Uri,
        req: IppRequestResponse,
        operation: Operation,
        what: &str,
    ) -> Result<IppRequestResponse> {
        let client = IppClient::builder(target.clone())
            .ignore_tls_errors(self.ignore_tls_errors)
            .build();
        client
            .send(req)
            .map_err(|e| SpoolError::native(operation, None, format!("{what}: {e}")))
    }

    /// Send a request, mapping every non-success status to an error.
    fn send(
        &self,
        target: &Uri,
        req: IppRequestResponse,
        operation: Operation,
        what: &str,
        subject: &str,
    ) -> Result<IppRequestResponse> {
        let resp = self.send_raw(target, req, operation, what)?;
        check_status(resp, operation, what, subject)
    }

    /// Printer record without its jobs.
    fn fetch_printer(&self, name: &str, operation: Operation) -> Result<Printer> {
        let uri = self.printer_uri(name, operation)?;
        let mut req = self.request(IppOperation::GetPrinterAttributes, &uri);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("requested-attributes", keywords(&["all"])),
        );

        let resp = self.send(
            &uri,
            req,
            operation,
            "Get-Printer-Attributes",
            &format!("printer '{name}'"),
        )?;
        resp.attributes()
            .groups_of(DelimiterTag::PrinterAttributes)
            .find_map(|group| attributes::printer_from_attributes(group.attributes(), Vec::new()))
            .ok_or_else(|| SpoolError::not_found(operation, format!("printer '{name}'")))
    }
}

impl PrintingBackend for CupsBackend {
    fn platform_name(&self) -> &'static str {
        PLATFORM
    }

    fn tables(&self) -> &'static CodecTables {
        &CUPS_TABLES
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn list_printers(&self) -> Result<Vec<Printer>> {
        let operation = Operation::ListPrinters;
        let uri = self.server_uri(operation)?;
        let mut req = self.request(IppOperation::CupsGetPrinters, &uri);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("requested-attributes", keywords(&["all"])),
        );

        debug!("sending CUPS-Get-Printers");
        let resp = self.send_raw(&uri, req, operation, "CUPS-Get-Printers")?;
        // The scheduler answers not-found when no destination is configured.
        if resp.header().status_code() == StatusCode::ClientErrorNotFound {
            info!("no destinations configured");
            return Ok(Vec::new());
        }
        let resp = check_status(resp, operation, "CUPS-Get-Printers", "destinations")?;

        let mut printers = Vec::new();
        for group in resp.attributes().groups_of(DelimiterTag::PrinterAttributes) {
            let Some(mut printer) =
                attributes::printer_from_attributes(group.attributes(), Vec::new())
            else {
                warn!("skipping printer group without printer-name");
                continue;
            };
            printer.jobs = self
                .jobs(&printer.name, JobScope::Active)
                .map_err(|e| e.reattribute(operation))?;
            printers.push(printer);
        }
        debug!(count = printers.len(), "received destinations");
        Ok(printers)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn get_printer(&self, name: &str) -> Result<Printer> {
        let mut printer = self.fetch_printer(name, Operation::GetPrinter)?;
        printer.jobs = self
            .jobs(name, JobScope::Active)
            .map_err(|e| e.reattribute(Operation::GetPrinter))?;
        Ok(printer)
    }

    fn default_printer_name(&self) -> Result<Option<String>> {
        // CUPS-Get-Default reports the server default, not the user's
        // lpoptions default; callers scan `is_default` instead.
        debug!("default destination is not reported on CUPS");
        Ok(None)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn driver_options(&self, printer: &str) -> Result<OptionNode> {
        let operation = Operation::GetDriverOptions;
        let printer_uri = self.printer_uri(printer, operation)?;
        let server = self.server_uri(operation)?;
        let req = self.request(IppOperation::CupsGetPPD, &printer_uri);

        let resp = self.send(
            &server,
            req,
            operation,
            "CUPS-Get-PPD",
            &format!("PPD for printer '{printer}'"),
        )?;
        let mut bytes = Vec::new();
        resp.into_payload()
            .read_to_end(&mut bytes)
            .map_err(|e| SpoolError::native_io(operation, &e))?;
        debug!(bytes = bytes.len(), "received PPD");

        let mut tree = ppd::parse_ppd_bytes(printer, &bytes);
        let destination = self.fetch_printer(printer, operation)?;
        ppd::mark_from_destination(&mut tree, &destination.options);
        Ok(tree)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn jobs(&self, printer: &str, scope: JobScope) -> Result<Vec<Job>> {
        let operation = Operation::GetJobs;
        let uri = self.printer_uri(printer, operation)?;
        let mut req = self.request(IppOperation::GetJobs, &uri);
        let which = match scope {
            JobScope::Active => "not-completed",
            JobScope::All => "all",
        };
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("which-jobs", IppValue::Keyword(which.to_string())),
        );
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("requested-attributes", keywords(JOB_ATTRIBUTES)),
        );

        let resp = self.send(&uri, req, operation, "Get-Jobs", &format!("printer '{printer}'"))?;
        let jobs: Vec<Job> = resp
            .attributes()
            .groups_of(DelimiterTag::JobAttributes)
            .filter_map(|group| job_from_attributes(group.attributes()))
            .map(|mut job| {
                if job.printer_name.is_empty() {
                    job.printer_name = printer.to_string();
                }
                job
            })
            .collect();
        debug!(count = jobs.len(), "received job list");
        Ok(jobs)
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn job(&self, printer: &str, id: JobId) -> Result<Job> {
        self.jobs(printer, JobScope::All)
            .map_err(|e| e.reattribute(Operation::GetJob))?
            .into_iter()
            .find(|job| job.id == id)
            .ok_or_else(|| {
                SpoolError::not_found(Operation::GetJob, format!("job {id} on printer '{printer}'"))
            })
    }

    #[instrument(skip(self), fields(server = %self.server))]
    fn control_job(&self, printer: &str, id: JobId, command: NativeCode) -> Result<bool> {
        let operation = Operation::SetJobCommand;
        let (op, name) = match command {
            codes::OP_CANCEL_JOB => (IppOperation::CancelJob, "Cancel-Job"),
            codes::OP_HOLD_JOB => (IppOperation::HoldJob, "Hold-Job"),
            codes::OP_RELEASE_JOB => (IppOperation::ReleaseJob, "Release-Job"),
            codes::OP_RESTART_JOB => (IppOperation::RestartJob, "Restart-Job"),
            other => {
                return Err(SpoolError::native(
                    operation,
                    Some(i64::from(other)),
                    "not a job operation",
                ));
            }
        };
        let job_id = i32::try_from(id.get())
            .map_err(|_| SpoolError::invalid(operation, format!("job id {id} is out of range")))?;

        let uri = self.printer_uri(printer, operation)?;
        let mut req = self.request(op, &uri);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(IppAttribute::JOB_ID, IppValue::Integer(job_id)),
        );

        info!(job_id, op = name, "sending job command");
        let resp = self.send_raw(&uri, req, operation, name)?;
        if resp.header().status_code() == StatusCode::ClientErrorNotPossible {
            info!(job_id, op = name, "job state does not allow the command");
            return Ok(false);
        }
        check_status(resp, operation, name, &format!("job {id} on printer '{printer}'"))?;
        Ok(true)
    }

    fn open_session<'a>(&'a self, printer: &str) -> Result<Box<dyn SpoolSession + 'a>> {
        let uri = self.printer_uri(printer, Operation::SubmitData)?;
        Ok(Box::new(CupsSession {
            backend: self,
            printer: printer.to_string(),
            uri,
            job_id: None,
            doc_name: String::new(),
            format: String::new(),
            buffer: Vec::new(),
        }))
    }

    #[instrument(skip(self, options), fields(server = %self.server))]
    fn print_file(
        &self,
        path: &Path,
        doc_name: &str,
        printer: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let operation = Operation::SubmitFile;
        let uri = self.printer_uri(printer, operation)?;
        let file = File::open(path).map_err(|e| {
            error!(path = %path.display(), "cannot open file for printing: {e}");
            SpoolError::native_io(operation, &e)
        })?;

        let mut req = self.request(IppOperation::PrintJob, &uri);
        add_job_description(&mut req, doc_name, options);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                "document-format",
                IppValue::MimeMediaType("application/octet-stream".to_string()),
            ),
        );
        *req.payload_mut() = IppPayload::new(file);

        info!(path = %path.display(), "sending Print-Job");
        let resp = self.send(&uri, req, operation, "Print-Job", &format!("printer '{printer}'"))?;
        let id = response_job_id(&resp, operation, "Print-Job")?;
        info!(job_id = %id, "file accepted by scheduler");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Streamed submission
// ---------------------------------------------------------------------------

/// Create-Job / Send-Document session.
///
/// Chunks are collected in memory and streamed as the Send-Document payload
/// when the document closes; the payload reader counts what the client
/// actually sent.
struct CupsSession<'a> {
    backend: &'a CupsBackend,
    printer: String,
    uri: Uri,
    job_id: Option<i32>,
    doc_name: String,
    format: String,
    buffer: Vec<u8>,
}

impl CupsSession<'_> {
    fn created_job(&self) -> Result<i32> {
        self.job_id.ok_or_else(|| {
            SpoolError::native(Operation::SubmitData, None, "no job has been created")
        })
    }
}

impl SpoolSession for CupsSession<'_> {
    fn create_job(
        &mut self,
        doc_name: &str,
        native_format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let operation = Operation::SubmitData;
        let mut req = self.backend.request(IppOperation::CreateJob, &self.uri);
        add_job_description(&mut req, doc_name, options);

        let resp = self.backend.send(
            &self.uri,
            req,
            operation,
            "Create-Job",
            &format!("printer '{}'", self.printer),
        )?;
        let id = response_job_id(&resp, operation, "Create-Job")?;
        debug!(job_id = %id, printer = %self.printer, "job created");

        let native_id = i32::try_from(id.get())
            .map_err(|_| SpoolError::native(operation, None, format!("job id {id} is out of range")))?;
        self.job_id = Some(native_id);
        self.doc_name = doc_name.to_string();
        self.format = native_format.to_string();
        Ok(id)
    }

    fn open_document(&mut self) -> Result<()> {
        self.created_job()?;
        self.buffer.clear();
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        self.buffer.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn close_document(&mut self) -> Result<u64> {
        let operation = Operation::SubmitData;
        let job_id = self.created_job()?;

        let mut req = self.backend.request(IppOperation::SendDocument, &self.uri);
        let attrs = req.attributes_mut();
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(IppAttribute::JOB_ID, IppValue::Integer(job_id)),
        );
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("document-name", IppValue::NameWithoutLanguage(self.doc_name.clone())),
        );
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                "document-format",
                IppValue::MimeMediaType(self.format.clone()),
            ),
        );
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("last-document", IppValue::Boolean(true)),
        );

        let sent = Arc::new(AtomicU64::new(0));
        let payload = CountingReader {
            inner: Cursor::new(std::mem::take(&mut self.buffer)),
            count: Arc::clone(&sent),
        };
        *req.payload_mut() = IppPayload::new(payload);

        debug!(job_id, "sending Send-Document");
        self.backend.send(
            &self.uri,
            req,
            operation,
            "Send-Document",
            &format!("job {job_id} on printer '{}'", self.printer),
        )?;
        Ok(sent.load(Ordering::Acquire))
    }

    fn close_job(&mut self) -> Result<()> {
        // The last-document flag on Send-Document already closed the job.
        debug!(job_id = ?self.job_id, "job closed");
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        let Some(job_id) = self.job_id.take() else {
            return Ok(());
        };
        let mut req = self.backend.request(IppOperation::CancelJob, &self.uri);
        req.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(IppAttribute::JOB_ID, IppValue::Integer(job_id)),
        );
        warn!(job_id, "cancelling partially submitted job");
        self.backend
            .send(
                &self.uri,
                req,
                Operation::SubmitData,
                "Cancel-Job",
                &format!("job {job_id}"),
            )
            .map(|_| ())
    }
}

/// Reader that records how many bytes were pulled through it.
struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::AcqRel);
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn keywords(values: &[&str]) -> IppValue {
    IppValue::Array(
        values
            .iter()
            .map(|v| IppValue::Keyword((*v).to_string()))
            .collect(),
    )
}

/// `job-name` plus the caller's options as job template attributes.
fn add_job_description(req: &mut IppRequestResponse, doc_name: &str, options: &JobOptions) {
    let attrs = req.attributes_mut();
    attrs.add(
        DelimiterTag::OperationAttributes,
        IppAttribute::new(
            "job-name",
            IppValue::NameWithoutLanguage(doc_name.to_string()),
        ),
    );
    for (key, value) in options {
        attrs.add(
            DelimiterTag::JobAttributes,
            IppAttribute::new(key, option_value(value)),
        );
    }
}

/// Positive `job-id` from a job-creating response.
fn response_job_id(resp: &IppRequestResponse, operation: Operation, what: &str) -> Result<JobId> {
    resp.attributes()
        .groups_of(DelimiterTag::JobAttributes)
        .find_map(|group| int_attr(group.attributes(), IppAttribute::JOB_ID))
        .and_then(|id| u32::try_from(id).ok())
        .filter(|id| *id > 0)
        .map(JobId)
        .ok_or_else(|| {
            SpoolError::native(operation, None, format!("{what} response carried no job-id"))
        })
}

/// Map a non-success status to `NotFound` or `NativeOperationFailed`,
/// keeping the scheduler's code and status message.
fn check_status(
    resp: IppRequestResponse,
    operation: Operation,
    what: &str,
    subject: &str,
) -> Result<IppRequestResponse> {
    let status = resp.header().status_code();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::ClientErrorNotFound {
        return Err(SpoolError::not_found(operation, subject));
    }

    let code = i64::from(resp.header().operation_or_status);
    let message = resp
        .attributes()
        .groups_of(DelimiterTag::OperationAttributes)
        .find_map(|group| group.attributes().get("status-message"))
        .map(|attr| format!("{what}: {}", attr.value()))
        .unwrap_or_else(|| format!("{what} returned status {status:?}"));
    error!(status = ?status, "{message}");
    Err(SpoolError::native(operation, Some(code), message))
}
