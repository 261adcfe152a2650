// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staged job submission.
//
// A submission walks Pending → Created → DocumentOpen → Writing → Closed.
// Any failing stage moves it to Failed, releases whatever the session opened
// and reports the stage's own error. Byte counts are checked twice: the sum
// of what each write accepted, and what the service confirms at close.

use tracing::{debug, info, warn};

use spoolkit_bridge::SpoolSession;
use spoolkit_core::error::{Operation, Result, SpoolError};
use spoolkit_core::types::{JobId, JobOptions};

/// Where a submission currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing sent yet.
    Pending,
    /// The service assigned a job id.
    Created,
    /// The job's document is open for writing.
    DocumentOpen,
    /// At least one chunk has been written.
    Writing,
    /// Document and job closed.
    Closed,
    Failed,
}

/// One document submitted through a native session.
pub struct Submission<'s> {
    session: Box<dyn SpoolSession + 's>,
    state: SubmissionState,
    chunk_size: usize,
    job: Option<JobId>,
    written: u64,
}

impl<'s> Submission<'s> {
    pub fn new(session: Box<dyn SpoolSession + 's>, chunk_size: usize) -> Self {
        Self {
            session,
            state: SubmissionState::Pending,
            chunk_size: chunk_size.max(1),
            job: None,
            written: 0,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Bytes the service has accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Send `data` as a single-document job.
    pub fn run(
        &mut self,
        data: &[u8],
        doc_name: &str,
        native_format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        if self.state != SubmissionState::Pending {
            return Err(SpoolError::invalid(
                Operation::SubmitData,
                format!("submission already {:?}", self.state),
            ));
        }
        match self.drive(data, doc_name, native_format, options) {
            Ok(id) => {
                info!(job_id = %id, bytes = self.written, "job submitted");
                Ok(id)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn drive(
        &mut self,
        data: &[u8],
        doc_name: &str,
        native_format: &str,
        options: &JobOptions,
    ) -> Result<JobId> {
        let id = self.session.create_job(doc_name, native_format, options)?;
        if id.get() == 0 {
            return Err(SpoolError::native(
                Operation::SubmitData,
                None,
                "service returned job id 0",
            ));
        }
        self.job = Some(id);
        self.state = SubmissionState::Created;
        debug!(job_id = %id, format = native_format, "job created");

        self.session.open_document()?;
        self.state = SubmissionState::DocumentOpen;

        for chunk in data.chunks(self.chunk_size) {
            let accepted = self.session.write_chunk(chunk)?;
            self.written += accepted as u64;
            self.state = SubmissionState::Writing;
        }
        let expected = data.len() as u64;
        if self.written != expected {
            return Err(byte_mismatch("written", self.written, expected));
        }

        let confirmed = self.session.close_document()?;
        if confirmed != expected {
            return Err(byte_mismatch("confirmed", confirmed, expected));
        }

        self.session.close_job()?;
        self.state = SubmissionState::Closed;
        Ok(id)
    }

    /// Move to Failed and release the session. Cleanup errors are logged only.
    fn fail(&mut self, cause: &SpoolError) {
        let reached = self.state;
        self.state = SubmissionState::Failed;
        if reached == SubmissionState::Pending {
            return;
        }
        warn!(job_id = ?self.job, stage = ?reached, "submission failed: {cause}");
        if let Err(cleanup) = self.session.abort() {
            warn!(job_id = ?self.job, "cleanup after failed submission also failed: {cleanup}");
        }
    }
}

fn byte_mismatch(what: &str, got: u64, expected: u64) -> SpoolError {
    SpoolError::native(
        Operation::SubmitData,
        None,
        format!("{what} {got} of {expected} bytes"),
    )
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Session that follows a script and records every call.
    #[derive(Default)]
    struct Script {
        calls: Vec<String>,
        chunks: Vec<usize>,
        fail: Option<&'static str>,
        job_id: u32,
        drop_per_write: usize,
        confirm_short: u64,
        abort_fails: bool,
    }

    struct Scripted(Rc<RefCell<Script>>);

    impl Scripted {
        fn step(&self, name: &'static str) -> Result<()> {
            let mut script = self.0.borrow_mut();
            script.calls.push(name.to_string());
            if script.fail == Some(name) {
                let message = format!("{name} refused");
                return Err(SpoolError::native(Operation::SubmitData, Some(1001), message));
            }
            Ok(())
        }
    }

    impl SpoolSession for Scripted {
        fn create_job(&mut self, _: &str, _: &str, _: &JobOptions) -> Result<JobId> {
            self.step("create_job")?;
            Ok(JobId(self.0.borrow().job_id))
        }

        fn open_document(&mut self) -> Result<()> {
            self.step("open_document")
        }

        fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
            self.step("write_chunk")?;
            let mut script = self.0.borrow_mut();
            script.chunks.push(chunk.len());
            Ok(chunk.len().saturating_sub(script.drop_per_write))
        }

        fn close_document(&mut self) -> Result<u64> {
            self.step("close_document")?;
            let script = self.0.borrow();
            let total: usize = script.chunks.iter().sum();
            Ok(total as u64 - script.confirm_short)
        }

        fn close_job(&mut self) -> Result<()> {
            self.step("close_job")
        }

        fn abort(&mut self) -> Result<()> {
            self.step("abort")?;
            if self.0.borrow().abort_fails {
                return Err(SpoolError::native(Operation::SubmitData, Some(5), "abort refused"));
            }
            Ok(())
        }
    }

    fn scripted(configure: impl FnOnce(&mut Script)) -> (Rc<RefCell<Script>>, Box<Scripted>) {
        let mut script = Script {
            job_id: 12,
            ..Script::default()
        };
        configure(&mut script);
        let shared = Rc::new(RefCell::new(script));
        (shared.clone(), Box::new(Scripted(shared)))
    }

    fn calls(script: &Rc<RefCell<Script>>) -> Vec<String> {
        script.borrow().calls.clone()
    }

    #[test]
    fn success_walks_every_stage() {
        let (script, session) = scripted(|_| {});
        let mut submission = Submission::new(session, 4);
        let id = submission
            .run(b"hello world", "doc", "text/plain", &JobOptions::new())
            .unwrap();

        assert_eq!(id, JobId(12));
        assert_eq!(submission.state(), SubmissionState::Closed);
        assert_eq!(submission.written(), 11);
        assert_eq!(script.borrow().chunks, vec![4, 4, 3]);
        assert_eq!(
            calls(&script),
            vec![
                "create_job",
                "open_document",
                "write_chunk",
                "write_chunk",
                "write_chunk",
                "close_document",
                "close_job"
            ]
        );
    }

    #[test]
    fn create_failure_skips_cleanup() {
        let (script, session) = scripted(|s| s.fail = Some("create_job"));
        let mut submission = Submission::new(session, 4);
        let err = submission.run(b"data", "doc", "text/plain", &JobOptions::new()).unwrap_err();

        assert!(err.to_string().contains("create_job refused"));
        assert_eq!(submission.state(), SubmissionState::Failed);
        assert_eq!(calls(&script), vec!["create_job"]);
    }

    #[test]
    fn write_failure_aborts_and_keeps_original_error() {
        let (script, session) = scripted(|s| {
            s.fail = Some("write_chunk");
            s.abort_fails = true;
        });
        let mut submission = Submission::new(session, 4);
        let err = submission.run(b"data", "doc", "text/plain", &JobOptions::new()).unwrap_err();

        match err {
            SpoolError::NativeOperationFailed { code, message, .. } => {
                assert_eq!(code, Some(1001));
                assert!(message.contains("write_chunk"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls(&script).last().map(String::as_str), Some("abort"));
    }

    #[test]
    fn short_write_is_a_failure() {
        let (script, session) = scripted(|s| s.drop_per_write = 1);
        let mut submission = Submission::new(session, 8);
        let err = submission.run(b"hello", "doc", "text/plain", &JobOptions::new()).unwrap_err();

        assert!(err.to_string().contains("written 4 of 5 bytes"));
        assert_eq!(submission.state(), SubmissionState::Failed);
        let calls = calls(&script);
        assert!(!calls.contains(&"close_document".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("abort"));
    }

    #[test]
    fn unconfirmed_bytes_are_a_failure() {
        let (script, session) = scripted(|s| s.confirm_short = 2);
        let mut submission = Submission::new(session, 8);
        let err = submission.run(b"hello", "doc", "text/plain", &JobOptions::new()).unwrap_err();

        assert!(err.to_string().contains("confirmed 3 of 5 bytes"));
        assert!(!calls(&script).contains(&"close_job".to_string()));
    }

    #[test]
    fn zero_job_id_rejected() {
        let (script, session) = scripted(|s| s.job_id = 0);
        let mut submission = Submission::new(session, 8);
        assert!(submission.run(b"x", "doc", "text/plain", &JobOptions::new()).is_err());
        assert_eq!(calls(&script), vec!["create_job"]);
    }

    #[test]
    fn finished_submission_cannot_rerun() {
        let (_, session) = scripted(|_| {});
        let mut submission = Submission::new(session, 8);
        submission.run(b"x", "doc", "text/plain", &JobOptions::new()).unwrap();
        let err = submission.run(b"x", "doc", "text/plain", &JobOptions::new()).unwrap_err();
        assert!(matches!(err, SpoolError::InvalidArgument { .. }));
    }
}
