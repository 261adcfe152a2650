// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Status codec: tables translating native status, attribute, job-command and
// data-format codes into portable labels and back.
//
// Two table sets exist, one per backend:
//   - CUPS_TABLES     IPP enums (RFC 8011 §5.3.7 / §5.4.11) and the CUPS
//                     `printer-type` bitmask
//   - SPOOLER_TABLES  winspool.h PRINTER_STATUS_*, PRINTER_ATTRIBUTE_*,
//                     JOB_STATUS_* and JOB_CONTROL_* values
//
// The entries are `static` data. The reverse index used by `encode` is built
// on first use through a `OnceLock`, so concurrent first access is safe and
// every racer observes the same map.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Operation, Result, SpoolError};
use crate::types::LabelSet;

/// A native status/attribute/command code.
pub type NativeCode = u32;

/// How a native code is matched against a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// Each set bit is an independent condition. A zero-valued entry matches
    /// only a zero code.
    Bitmask,
    /// The code is a single enumerated value.
    Enumerated,
}

/// Label ↔ native code table.
pub struct CodeTable {
    kind: CodeKind,
    /// Operation that lists the labels of this table.
    discovery: Operation,
    entries: &'static [(&'static str, NativeCode)],
    index: OnceLock<HashMap<&'static str, NativeCode>>,
}

impl CodeTable {
    pub const fn new(
        kind: CodeKind,
        discovery: Operation,
        entries: &'static [(&'static str, NativeCode)],
    ) -> Self {
        Self {
            kind,
            discovery,
            entries,
            index: OnceLock::new(),
        }
    }

    pub fn entries(&self) -> &'static [(&'static str, NativeCode)] {
        self.entries
    }

    /// Labels in table order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.to_string()).collect()
    }

    /// Decode a native code into its labels. Never returns an empty set:
    /// unmatched codes yield a single `unsupported:<code>` label.
    pub fn decode(&self, code: NativeCode) -> LabelSet {
        let mut labels: LabelSet = self
            .entries
            .iter()
            .filter(|(_, value)| match self.kind {
                CodeKind::Bitmask if *value == 0 => code == 0,
                CodeKind::Bitmask => code & value == *value,
                CodeKind::Enumerated => code == *value,
            })
            .map(|(label, _)| label.to_string())
            .collect();

        if labels.is_empty() {
            labels.insert(unsupported_label(code));
        }
        labels
    }

    /// Exact lookup of a label.
    pub fn lookup(&self, label: &str) -> Option<NativeCode> {
        self.index
            .get_or_init(|| self.entries.iter().copied().collect())
            .get(label)
            .copied()
    }

    /// Encode a label for `operation`, failing with `UnsupportedValue` when the
    /// label is not in the table.
    pub fn encode(&self, label: &str, operation: Operation) -> Result<NativeCode> {
        self.lookup(label).ok_or_else(|| SpoolError::UnsupportedValue {
            operation,
            value: label.to_string(),
            discovery: self.discovery,
        })
    }
}

/// Fallback label for a code no table entry matches.
pub fn unsupported_label(code: NativeCode) -> String {
    format!("unsupported:{code}")
}

/// Label ↔ native data-format table.
pub struct FormatTable {
    entries: &'static [(&'static str, &'static str)],
    index: OnceLock<HashMap<&'static str, &'static str>>,
}

impl FormatTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            entries,
            index: OnceLock::new(),
        }
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(label, _)| label.to_string()).collect()
    }

    /// Resolve a caller-requested format. Unknown labels are rejected.
    pub fn encode(&self, label: &str, operation: Operation) -> Result<&'static str> {
        self.index
            .get_or_init(|| self.entries.iter().copied().collect())
            .get(label)
            .copied()
            .ok_or_else(|| SpoolError::UnsupportedValue {
                operation,
                value: label.to_string(),
                discovery: Operation::GetSupportedFormats,
            })
    }

    /// Normalize a native format seen on a job: the label when known, the
    /// native string unchanged otherwise.
    pub fn normalize(&self, native: &str) -> String {
        self.entries
            .iter()
            .find(|(_, value)| *value == native)
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| native.to_string())
    }
}

/// Complete table set of one backend.
pub struct CodecTables {
    pub platform: &'static str,
    pub printer_status: CodeTable,
    pub printer_attributes: CodeTable,
    pub job_status: CodeTable,
    pub job_commands: CodeTable,
    pub formats: FormatTable,
}

// ---------------------------------------------------------------------------
// Native code constants
// ---------------------------------------------------------------------------

/// IPP and CUPS codes.
pub mod ipp {
    use super::NativeCode;

    // printer-state
    pub const PRINTER_IDLE: NativeCode = 3;
    pub const PRINTER_PROCESSING: NativeCode = 4;
    pub const PRINTER_STOPPED: NativeCode = 5;

    // job-state
    pub const JOB_PENDING: NativeCode = 3;
    pub const JOB_HELD: NativeCode = 4;
    pub const JOB_PROCESSING: NativeCode = 5;
    pub const JOB_STOPPED: NativeCode = 6;
    pub const JOB_CANCELED: NativeCode = 7;
    pub const JOB_ABORTED: NativeCode = 8;
    pub const JOB_COMPLETED: NativeCode = 9;

    // operation-id of the job-control requests
    pub const OP_CANCEL_JOB: NativeCode = 0x0008;
    pub const OP_HOLD_JOB: NativeCode = 0x000C;
    pub const OP_RELEASE_JOB: NativeCode = 0x000D;
    pub const OP_RESTART_JOB: NativeCode = 0x000E;

    // CUPS printer-type bits (cups.h `cups_ptype_e`)
    pub const TYPE_CLASS: NativeCode = 0x0000_0001;
    pub const TYPE_REMOTE: NativeCode = 0x0000_0002;
    pub const TYPE_BW: NativeCode = 0x0000_0004;
    pub const TYPE_COLOR: NativeCode = 0x0000_0008;
    pub const TYPE_DUPLEX: NativeCode = 0x0000_0010;
    pub const TYPE_STAPLE: NativeCode = 0x0000_0020;
    pub const TYPE_COPIES: NativeCode = 0x0000_0040;
    pub const TYPE_COLLATE: NativeCode = 0x0000_0080;
    pub const TYPE_PUNCH: NativeCode = 0x0000_0100;
    pub const TYPE_COVER: NativeCode = 0x0000_0200;
    pub const TYPE_BIND: NativeCode = 0x0000_0400;
    pub const TYPE_SORT: NativeCode = 0x0000_0800;
    pub const TYPE_SMALL: NativeCode = 0x0000_1000;
    pub const TYPE_MEDIUM: NativeCode = 0x0000_2000;
    pub const TYPE_LARGE: NativeCode = 0x0000_4000;
    pub const TYPE_VARIABLE: NativeCode = 0x0000_8000;
    pub const TYPE_IMPLICIT: NativeCode = 0x0001_0000;
    pub const TYPE_DEFAULT: NativeCode = 0x0002_0000;
    pub const TYPE_FAX: NativeCode = 0x0004_0000;
    pub const TYPE_REJECTING: NativeCode = 0x0008_0000;
    pub const TYPE_DELETE: NativeCode = 0x0010_0000;
    pub const TYPE_NOT_SHARED: NativeCode = 0x0020_0000;
    pub const TYPE_AUTHENTICATED: NativeCode = 0x0040_0000;
    pub const TYPE_COMMANDS: NativeCode = 0x0080_0000;
    pub const TYPE_DISCOVERED: NativeCode = 0x0100_0000;
    pub const TYPE_SCANNER: NativeCode = 0x0200_0000;
    pub const TYPE_MFP: NativeCode = 0x0400_0000;
    pub const TYPE_3D: NativeCode = 0x0800_0000;
}

/// Windows spooler codes (winspool.h).
pub mod winspool {
    use super::NativeCode;

    pub const PRINTER_STATUS_PAUSED: NativeCode = 0x0000_0001;
    pub const PRINTER_STATUS_ERROR: NativeCode = 0x0000_0002;
    pub const PRINTER_STATUS_PENDING_DELETION: NativeCode = 0x0000_0004;
    pub const PRINTER_STATUS_PAPER_JAM: NativeCode = 0x0000_0008;
    pub const PRINTER_STATUS_PAPER_OUT: NativeCode = 0x0000_0010;
    pub const PRINTER_STATUS_MANUAL_FEED: NativeCode = 0x0000_0020;
    pub const PRINTER_STATUS_PAPER_PROBLEM: NativeCode = 0x0000_0040;
    pub const PRINTER_STATUS_OFFLINE: NativeCode = 0x0000_0080;
    pub const PRINTER_STATUS_IO_ACTIVE: NativeCode = 0x0000_0100;
    pub const PRINTER_STATUS_BUSY: NativeCode = 0x0000_0200;
    pub const PRINTER_STATUS_PRINTING: NativeCode = 0x0000_0400;
    pub const PRINTER_STATUS_OUTPUT_BIN_FULL: NativeCode = 0x0000_0800;
    pub const PRINTER_STATUS_NOT_AVAILABLE: NativeCode = 0x0000_1000;
    pub const PRINTER_STATUS_WAITING: NativeCode = 0x0000_2000;
    pub const PRINTER_STATUS_PROCESSING: NativeCode = 0x0000_4000;
    pub const PRINTER_STATUS_INITIALIZING: NativeCode = 0x0000_8000;
    pub const PRINTER_STATUS_WARMING_UP: NativeCode = 0x0001_0000;
    pub const PRINTER_STATUS_TONER_LOW: NativeCode = 0x0002_0000;
    pub const PRINTER_STATUS_NO_TONER: NativeCode = 0x0004_0000;
    pub const PRINTER_STATUS_PAGE_PUNT: NativeCode = 0x0008_0000;
    pub const PRINTER_STATUS_USER_INTERVENTION: NativeCode = 0x0010_0000;
    pub const PRINTER_STATUS_OUT_OF_MEMORY: NativeCode = 0x0020_0000;
    pub const PRINTER_STATUS_DOOR_OPEN: NativeCode = 0x0040_0000;
    pub const PRINTER_STATUS_SERVER_UNKNOWN: NativeCode = 0x0080_0000;
    pub const PRINTER_STATUS_POWER_SAVE: NativeCode = 0x0100_0000;

    pub const PRINTER_ATTRIBUTE_QUEUED: NativeCode = 0x0000_0001;
    pub const PRINTER_ATTRIBUTE_DIRECT: NativeCode = 0x0000_0002;
    pub const PRINTER_ATTRIBUTE_DEFAULT: NativeCode = 0x0000_0004;
    pub const PRINTER_ATTRIBUTE_SHARED: NativeCode = 0x0000_0008;
    pub const PRINTER_ATTRIBUTE_NETWORK: NativeCode = 0x0000_0010;
    pub const PRINTER_ATTRIBUTE_HIDDEN: NativeCode = 0x0000_0020;
    pub const PRINTER_ATTRIBUTE_LOCAL: NativeCode = 0x0000_0040;
    pub const PRINTER_ATTRIBUTE_ENABLE_DEVQ: NativeCode = 0x0000_0080;
    pub const PRINTER_ATTRIBUTE_KEEPPRINTEDJOBS: NativeCode = 0x0000_0100;
    pub const PRINTER_ATTRIBUTE_DO_COMPLETE_FIRST: NativeCode = 0x0000_0200;
    pub const PRINTER_ATTRIBUTE_WORK_OFFLINE: NativeCode = 0x0000_0400;
    pub const PRINTER_ATTRIBUTE_ENABLE_BIDI: NativeCode = 0x0000_0800;
    pub const PRINTER_ATTRIBUTE_RAW_ONLY: NativeCode = 0x0000_1000;
    pub const PRINTER_ATTRIBUTE_PUBLISHED: NativeCode = 0x0000_2000;
    pub const PRINTER_ATTRIBUTE_FAX: NativeCode = 0x0000_4000;
    pub const PRINTER_ATTRIBUTE_TS: NativeCode = 0x0000_8000;
    pub const PRINTER_ATTRIBUTE_PUSHED_USER: NativeCode = 0x0002_0000;
    pub const PRINTER_ATTRIBUTE_PUSHED_MACHINE: NativeCode = 0x0004_0000;
    pub const PRINTER_ATTRIBUTE_MACHINE: NativeCode = 0x0008_0000;
    pub const PRINTER_ATTRIBUTE_FRIENDLY_NAME: NativeCode = 0x0010_0000;

    pub const JOB_STATUS_PAUSED: NativeCode = 0x0000_0001;
    pub const JOB_STATUS_ERROR: NativeCode = 0x0000_0002;
    pub const JOB_STATUS_DELETING: NativeCode = 0x0000_0004;
    pub const JOB_STATUS_SPOOLING: NativeCode = 0x0000_0008;
    pub const JOB_STATUS_PRINTING: NativeCode = 0x0000_0010;
    pub const JOB_STATUS_OFFLINE: NativeCode = 0x0000_0020;
    pub const JOB_STATUS_PAPEROUT: NativeCode = 0x0000_0040;
    pub const JOB_STATUS_PRINTED: NativeCode = 0x0000_0080;
    pub const JOB_STATUS_DELETED: NativeCode = 0x0000_0100;
    pub const JOB_STATUS_BLOCKED_DEVQ: NativeCode = 0x0000_0200;
    pub const JOB_STATUS_USER_INTERVENTION: NativeCode = 0x0000_0400;
    pub const JOB_STATUS_RESTART: NativeCode = 0x0000_0800;
    pub const JOB_STATUS_COMPLETE: NativeCode = 0x0000_1000;
    pub const JOB_STATUS_RETAINED: NativeCode = 0x0000_2000;

    pub const JOB_CONTROL_PAUSE: NativeCode = 1;
    pub const JOB_CONTROL_RESUME: NativeCode = 2;
    pub const JOB_CONTROL_CANCEL: NativeCode = 3;
    pub const JOB_CONTROL_RESTART: NativeCode = 4;
    pub const JOB_CONTROL_DELETE: NativeCode = 5;
    pub const JOB_CONTROL_SENT_TO_PRINTER: NativeCode = 6;
    pub const JOB_CONTROL_LAST_PAGE_EJECTED: NativeCode = 7;
    pub const JOB_CONTROL_RETAIN: NativeCode = 8;
    pub const JOB_CONTROL_RELEASE: NativeCode = 9;
}

// ---------------------------------------------------------------------------
// Table sets
// ---------------------------------------------------------------------------

pub static CUPS_TABLES: CodecTables = CodecTables {
    platform: "CUPS",
    printer_status: CodeTable::new(
        CodeKind::Enumerated,
        Operation::ListPrinters,
        &[
            ("IDLE", ipp::PRINTER_IDLE),
            ("PROCESSING", ipp::PRINTER_PROCESSING),
            ("STOPPED", ipp::PRINTER_STOPPED),
        ],
    ),
    printer_attributes: CodeTable::new(
        CodeKind::Bitmask,
        Operation::ListPrinters,
        &[
            ("CLASS", ipp::TYPE_CLASS),
            ("REMOTE", ipp::TYPE_REMOTE),
            ("BW", ipp::TYPE_BW),
            ("COLOR", ipp::TYPE_COLOR),
            ("DUPLEX", ipp::TYPE_DUPLEX),
            ("STAPLE", ipp::TYPE_STAPLE),
            ("COPIES", ipp::TYPE_COPIES),
            ("COLLATE", ipp::TYPE_COLLATE),
            ("PUNCH", ipp::TYPE_PUNCH),
            ("COVER", ipp::TYPE_COVER),
            ("BIND", ipp::TYPE_BIND),
            ("SORT", ipp::TYPE_SORT),
            ("SMALL", ipp::TYPE_SMALL),
            ("MEDIUM", ipp::TYPE_MEDIUM),
            ("LARGE", ipp::TYPE_LARGE),
            ("VARIABLE", ipp::TYPE_VARIABLE),
            ("IMPLICIT", ipp::TYPE_IMPLICIT),
            ("DEFAULT", ipp::TYPE_DEFAULT),
            ("FAX", ipp::TYPE_FAX),
            ("REJECTING", ipp::TYPE_REJECTING),
            ("DELETE", ipp::TYPE_DELETE),
            ("NOT-SHARED", ipp::TYPE_NOT_SHARED),
            ("AUTHENTICATED", ipp::TYPE_AUTHENTICATED),
            ("COMMANDS", ipp::TYPE_COMMANDS),
            ("DISCOVERED", ipp::TYPE_DISCOVERED),
            ("SCANNER", ipp::TYPE_SCANNER),
            ("MFP", ipp::TYPE_MFP),
            ("3D", ipp::TYPE_3D),
        ],
    ),
    job_status: CodeTable::new(
        CodeKind::Enumerated,
        Operation::GetJobs,
        &[
            ("PENDING", ipp::JOB_PENDING),
            ("PAUSED", ipp::JOB_HELD),
            ("PRINTING", ipp::JOB_PROCESSING),
            ("STOPPED", ipp::JOB_STOPPED),
            ("CANCELLED", ipp::JOB_CANCELED),
            ("ABORTED", ipp::JOB_ABORTED),
            ("PRINTED", ipp::JOB_COMPLETED),
        ],
    ),
    job_commands: CodeTable::new(
        CodeKind::Enumerated,
        Operation::GetSupportedJobCommands,
        &[
            ("CANCEL", ipp::OP_CANCEL_JOB),
            ("PAUSE", ipp::OP_HOLD_JOB),
            ("RESUME", ipp::OP_RELEASE_JOB),
            ("RESTART", ipp::OP_RESTART_JOB),
        ],
    ),
    formats: FormatTable::new(&[
        ("RAW", "application/vnd.cups-raw"),
        ("TEXT", "text/plain"),
        ("PDF", "application/pdf"),
        ("JPEG", "image/jpeg"),
        ("POSTSCRIPT", "application/postscript"),
        ("COMMAND", "application/vnd.cups-command"),
        ("AUTO", "application/octet-stream"),
    ]),
};

pub static SPOOLER_TABLES: CodecTables = CodecTables {
    platform: "Windows spooler",
    printer_status: CodeTable::new(
        CodeKind::Bitmask,
        Operation::ListPrinters,
        &[
            ("READY", 0),
            ("PAUSED", winspool::PRINTER_STATUS_PAUSED),
            ("ERROR", winspool::PRINTER_STATUS_ERROR),
            ("PENDING-DELETION", winspool::PRINTER_STATUS_PENDING_DELETION),
            ("PAPER-JAM", winspool::PRINTER_STATUS_PAPER_JAM),
            ("PAPER-OUT", winspool::PRINTER_STATUS_PAPER_OUT),
            ("MANUAL-FEED", winspool::PRINTER_STATUS_MANUAL_FEED),
            ("PAPER-PROBLEM", winspool::PRINTER_STATUS_PAPER_PROBLEM),
            ("OFFLINE", winspool::PRINTER_STATUS_OFFLINE),
            ("IO-ACTIVE", winspool::PRINTER_STATUS_IO_ACTIVE),
            ("BUSY", winspool::PRINTER_STATUS_BUSY),
            ("PRINTING", winspool::PRINTER_STATUS_PRINTING),
            ("OUTPUT-BIN-FULL", winspool::PRINTER_STATUS_OUTPUT_BIN_FULL),
            ("NOT-AVAILABLE", winspool::PRINTER_STATUS_NOT_AVAILABLE),
            ("WAITING", winspool::PRINTER_STATUS_WAITING),
            ("PROCESSING", winspool::PRINTER_STATUS_PROCESSING),
            ("INITIALIZING", winspool::PRINTER_STATUS_INITIALIZING),
            ("WARMING-UP", winspool::PRINTER_STATUS_WARMING_UP),
            ("TONER-LOW", winspool::PRINTER_STATUS_TONER_LOW),
            ("NO-TONER", winspool::PRINTER_STATUS_NO_TONER),
            ("PAGE-PUNT", winspool::PRINTER_STATUS_PAGE_PUNT),
            ("USER-INTERVENTION", winspool::PRINTER_STATUS_USER_INTERVENTION),
            ("OUT-OF-MEMORY", winspool::PRINTER_STATUS_OUT_OF_MEMORY),
            ("DOOR-OPEN", winspool::PRINTER_STATUS_DOOR_OPEN),
            ("SERVER-UNKNOWN", winspool::PRINTER_STATUS_SERVER_UNKNOWN),
            ("POWER-SAVE", winspool::PRINTER_STATUS_POWER_SAVE),
        ],
    ),
    printer_attributes: CodeTable::new(
        CodeKind::Bitmask,
        Operation::ListPrinters,
        &[
            ("QUEUED", winspool::PRINTER_ATTRIBUTE_QUEUED),
            ("DIRECT", winspool::PRINTER_ATTRIBUTE_DIRECT),
            ("DEFAULT", winspool::PRINTER_ATTRIBUTE_DEFAULT),
            ("SHARED", winspool::PRINTER_ATTRIBUTE_SHARED),
            ("NETWORK", winspool::PRINTER_ATTRIBUTE_NETWORK),
            ("HIDDEN", winspool::PRINTER_ATTRIBUTE_HIDDEN),
            ("LOCAL", winspool::PRINTER_ATTRIBUTE_LOCAL),
            ("ENABLE-DEVQ", winspool::PRINTER_ATTRIBUTE_ENABLE_DEVQ),
            ("KEEPPRINTEDJOBS", winspool::PRINTER_ATTRIBUTE_KEEPPRINTEDJOBS),
            ("DO-COMPLETE-FIRST", winspool::PRINTER_ATTRIBUTE_DO_COMPLETE_FIRST),
            ("OFFLINE", winspool::PRINTER_ATTRIBUTE_WORK_OFFLINE),
            ("ENABLE-BIDI", winspool::PRINTER_ATTRIBUTE_ENABLE_BIDI),
            ("RAW-ONLY", winspool::PRINTER_ATTRIBUTE_RAW_ONLY),
            ("PUBLISHED", winspool::PRINTER_ATTRIBUTE_PUBLISHED),
            ("FAX", winspool::PRINTER_ATTRIBUTE_FAX),
            ("TS", winspool::PRINTER_ATTRIBUTE_TS),
            ("PUSHED-USER", winspool::PRINTER_ATTRIBUTE_PUSHED_USER),
            ("PUSHED-MACHINE", winspool::PRINTER_ATTRIBUTE_PUSHED_MACHINE),
            ("MACHINE", winspool::PRINTER_ATTRIBUTE_MACHINE),
            ("FRIENDLY-NAME", winspool::PRINTER_ATTRIBUTE_FRIENDLY_NAME),
        ],
    ),
    job_status: CodeTable::new(
        CodeKind::Bitmask,
        Operation::GetJobs,
        &[
            ("PENDING", 0),
            ("PAUSED", winspool::JOB_STATUS_PAUSED),
            ("ERROR", winspool::JOB_STATUS_ERROR),
            ("DELETING", winspool::JOB_STATUS_DELETING),
            ("SPOOLING", winspool::JOB_STATUS_SPOOLING),
            ("PRINTING", winspool::JOB_STATUS_PRINTING),
            ("OFFLINE", winspool::JOB_STATUS_OFFLINE),
            ("PAPEROUT", winspool::JOB_STATUS_PAPEROUT),
            ("PRINTED", winspool::JOB_STATUS_PRINTED),
            ("DELETED", winspool::JOB_STATUS_DELETED),
            ("BLOCKED-DEVQ", winspool::JOB_STATUS_BLOCKED_DEVQ),
            ("USER-INTERVENTION", winspool::JOB_STATUS_USER_INTERVENTION),
            ("RESTART", winspool::JOB_STATUS_RESTART),
            ("COMPLETE", winspool::JOB_STATUS_COMPLETE),
            ("RETAINED", winspool::JOB_STATUS_RETAINED),
        ],
    ),
    job_commands: CodeTable::new(
        CodeKind::Enumerated,
        Operation::GetSupportedJobCommands,
        &[
            ("CANCEL", winspool::JOB_CONTROL_CANCEL),
            ("PAUSE", winspool::JOB_CONTROL_PAUSE),
            ("RESUME", winspool::JOB_CONTROL_RESUME),
            ("RESTART", winspool::JOB_CONTROL_RESTART),
            ("DELETE", winspool::JOB_CONTROL_DELETE),
            ("SENT-TO-PRINTER", winspool::JOB_CONTROL_SENT_TO_PRINTER),
            ("LAST-PAGE-EJECTED", winspool::JOB_CONTROL_LAST_PAGE_EJECTED),
            ("RETAIN", winspool::JOB_CONTROL_RETAIN),
            ("RELEASE", winspool::JOB_CONTROL_RELEASE),
        ],
    ),
    formats: FormatTable::new(&[
        ("RAW", "RAW"),
        ("TEXT", "TEXT"),
        ("EMF", "NT EMF 1.008"),
        ("XPS", "XPS_PASS"),
        ("RAW-FF", "RAW [FF appended]"),
        ("RAW-FF-AUTO", "RAW [FF auto]"),
    ]),
};
