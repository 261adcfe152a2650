// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spoolkit print: the `PrintService` facade over a native backend, and the
// staged submission that streams document data into a job.

pub mod service;
pub mod submission;

pub use service::PrintService;
pub use submission::{Submission, SubmissionState};
