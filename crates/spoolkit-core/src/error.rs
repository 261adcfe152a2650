// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for spoolkit.

use std::fmt;

use thiserror::Error;

/// Public operations of the print service.
///
/// The names returned by [`Operation::name`] are the stable, host-facing
/// identifiers (e.g. `getSupportedJobCommands`) and are what every error
/// message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListPrinters,
    GetDefaultPrinterName,
    GetPrinter,
    GetDriverOptions,
    GetSelectedPaperSize,
    GetJobs,
    GetJob,
    SetJobCommand,
    SubmitData,
    SubmitFile,
    GetSupportedFormats,
    GetSupportedJobCommands,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListPrinters => "listPrinters",
            Self::GetDefaultPrinterName => "getDefaultPrinterName",
            Self::GetPrinter => "getPrinter",
            Self::GetDriverOptions => "getDriverOptions",
            Self::GetSelectedPaperSize => "getSelectedPaperSize",
            Self::GetJobs => "getJobs",
            Self::GetJob => "getJob",
            Self::SetJobCommand => "setJobCommand",
            Self::SubmitData => "submitData",
            Self::SubmitFile => "submitFile",
            Self::GetSupportedFormats => "getSupportedFormats",
            Self::GetSupportedJobCommands => "getSupportedJobCommands",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level error type for all spoolkit operations.
#[derive(Debug, Error)]
pub enum SpoolError {
    // -- Caller errors, raised before any native call --
    #[error("{operation}: invalid argument: {message}")]
    InvalidArgument {
        operation: Operation,
        message: String,
    },

    #[error("{operation}: {what} not found")]
    NotFound { operation: Operation, what: String },

    #[error("{operation}: not supported on {platform}")]
    UnsupportedOnPlatform {
        operation: Operation,
        platform: &'static str,
    },

    #[error("{operation}: unsupported value '{value}', use {discovery} to list the valid values")]
    UnsupportedValue {
        operation: Operation,
        value: String,
        discovery: Operation,
    },

    // -- Native printing service --
    #[error("{operation}: native call failed{}: {message}", code_suffix(.code))]
    NativeOperationFailed {
        operation: Operation,
        code: Option<i64>,
        message: String,
    },

    // -- Ambient --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

impl SpoolError {
    pub fn invalid(operation: Operation, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation,
            message: message.into(),
        }
    }

    pub fn not_found(operation: Operation, what: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            what: what.into(),
        }
    }

    pub fn native(operation: Operation, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::NativeOperationFailed {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Wrap an I/O failure coming from the native layer, keeping the OS code.
    pub fn native_io(operation: Operation, err: &std::io::Error) -> Self {
        Self::native(operation, err.raw_os_error().map(i64::from), err.to_string())
    }

    /// Attribute the error to `operation`, keeping every other detail. Used
    /// when one public operation is built on top of another.
    pub fn reattribute(self, operation: Operation) -> Self {
        match self {
            Self::InvalidArgument { message, .. } => Self::InvalidArgument { operation, message },
            Self::NotFound { what, .. } => Self::NotFound { operation, what },
            Self::UnsupportedOnPlatform { platform, .. } => {
                Self::UnsupportedOnPlatform { operation, platform }
            }
            Self::UnsupportedValue {
                value, discovery, ..
            } => Self::UnsupportedValue {
                operation,
                value,
                discovery,
            },
            Self::NativeOperationFailed { code, message, .. } => Self::NativeOperationFailed {
                operation,
                code,
                message,
            },
            other => other,
        }
    }

    /// The operation the error was raised by, when it carries one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::InvalidArgument { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::UnsupportedOnPlatform { operation, .. }
            | Self::UnsupportedValue { operation, .. }
            | Self::NativeOperationFailed { operation, .. } => Some(*operation),
            Self::Config(_) | Self::Io(_) | Self::Serialization(_) => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoolError>;
