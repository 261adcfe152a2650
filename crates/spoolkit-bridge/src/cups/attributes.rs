// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Builders turning IPP attribute groups into normalized records.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use ipp::prelude::{IppAttribute, IppValue};

use spoolkit_core::codec::{CUPS_TABLES, ipp as codes};
use spoolkit_core::types::{Job, JobDetails, JobId, Printer};

/// One IPP attribute group, keyed by attribute name.
pub type AttributeMap = HashMap<String, IppAttribute>;

/// Attributes requested for every job listing.
pub const JOB_ATTRIBUTES: &[&str] = &[
    "job-id",
    "job-name",
    "job-originating-user-name",
    "job-printer-uri",
    "document-format",
    "job-priority",
    "job-k-octets",
    "job-state",
    "job-printer-state-message",
    "time-at-creation",
    "time-at-processing",
    "time-at-completed",
];

/// Job priority CUPS assigns when none was requested.
const DEFAULT_JOB_PRIORITY: u32 = 50;

pub(crate) fn int_attr(attrs: &AttributeMap, name: &str) -> Option<i32> {
    match attrs.get(name)?.value() {
        IppValue::Integer(v) | IppValue::Enum(v) => Some(*v),
        _ => None,
    }
}

fn uint_attr(attrs: &AttributeMap, name: &str) -> Option<u32> {
    int_attr(attrs, name).and_then(|v| u32::try_from(v).ok())
}

fn text_attr(attrs: &AttributeMap, name: &str) -> Option<String> {
    let attr = attrs.get(name)?;
    if matches!(attr.value(), IppValue::NoValue) {
        return None;
    }
    let text = attr.value().to_string();
    (!text.is_empty()).then_some(text)
}

/// CUPS reports unset job times as zero.
fn time_attr(attrs: &AttributeMap, name: &str) -> Option<DateTime<Utc>> {
    int_attr(attrs, name)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
}

/// Build a printer record from a Printer Attributes group.
///
/// Returns `None` when the group carries no `printer-name`.
pub fn printer_from_attributes(attrs: &AttributeMap, jobs: Vec<Job>) -> Option<Printer> {
    let name = text_attr(attrs, "printer-name")?;
    let state = uint_attr(attrs, "printer-state").unwrap_or(0);
    let printer_type = uint_attr(attrs, "printer-type").unwrap_or(0);

    let options: BTreeMap<String, String> = attrs
        .iter()
        .map(|(key, attr)| (key.clone(), attr.value().to_string()))
        .collect();

    Some(Printer {
        name,
        is_default: printer_type & codes::TYPE_DEFAULT != 0,
        instance: None,
        options,
        status: CUPS_TABLES.printer_status.decode(state),
        status_number: state,
        attributes: CUPS_TABLES.printer_attributes.decode(printer_type),
        priority: 0,
        default_priority: uint_attr(attrs, "job-priority-default").unwrap_or(DEFAULT_JOB_PRIORITY),
        average_ppm: uint_attr(attrs, "pages-per-minute").unwrap_or(0),
        start_time: None,
        until_time: None,
        jobs,
    })
}

/// Build a job record from a Job Attributes group.
///
/// Returns `None` when the group carries no usable `job-id`.
pub fn job_from_attributes(attrs: &AttributeMap) -> Option<Job> {
    let id = uint_attr(attrs, "job-id").filter(|id| *id > 0)?;
    let state = uint_attr(attrs, "job-state").unwrap_or(0);
    let printer_name = text_attr(attrs, "job-printer-uri")
        .as_deref()
        .and_then(|uri| uri.rsplit('/').next())
        .unwrap_or_default()
        .to_string();
    let format = text_attr(attrs, "document-format")
        .map(|native| CUPS_TABLES.formats.normalize(&native))
        .unwrap_or_default();
    let size_kb = uint_attr(attrs, "job-k-octets").unwrap_or(0);

    Some(Job {
        id: JobId(id),
        name: text_attr(attrs, "job-name").unwrap_or_default(),
        printer_name,
        user: text_attr(attrs, "job-originating-user-name").unwrap_or_default(),
        format,
        priority: uint_attr(attrs, "job-priority").unwrap_or(DEFAULT_JOB_PRIORITY),
        size: u64::from(size_kb) * 1024,
        status: CUPS_TABLES.job_status.decode(state),
        status_message: text_attr(attrs, "job-printer-state-message"),
        details: JobDetails::Cups {
            creation_time: time_attr(attrs, "time-at-creation"),
            processing_time: time_attr(attrs, "time-at-processing"),
            completed_time: time_attr(attrs, "time-at-completed"),
        },
    })
}

/// IPP value for a caller-supplied job option.
///
/// The options bag is untyped; integers and booleans are sent as such and
/// everything else as a name.
pub fn option_value(value: &str) -> IppValue {
    if let Ok(n) = value.parse::<i32>() {
        return IppValue::Integer(n);
    }
    match value {
        "true" => IppValue::Boolean(true),
        "false" => IppValue::Boolean(false),
        _ if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') => {
            IppValue::Keyword(value.to_string())
        }
        _ => IppValue::NameWithoutLanguage(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(values: Vec<(&str, IppValue)>) -> AttributeMap {
        values
            .into_iter()
            .map(|(name, value)| (name.to_string(), IppAttribute::new(name, value)))
            .collect()
    }

    fn printer_group(printer_type: i32) -> AttributeMap {
        group(vec![
            ("printer-name", IppValue::NameWithoutLanguage("Office-Laser".into())),
            ("printer-state", IppValue::Enum(3)),
            ("printer-type", IppValue::Enum(printer_type)),
            ("printer-info", IppValue::TextWithoutLanguage("Second floor".into())),
        ])
    }

    #[test]
    fn printer_decodes_state_and_type() {
        let printer_type = (codes::TYPE_COLOR | codes::TYPE_DUPLEX) as i32;
        let printer = printer_from_attributes(&printer_group(printer_type), Vec::new()).unwrap();

        assert_eq!(printer.name, "Office-Laser");
        assert!(printer.status.contains("IDLE"));
        assert_eq!(printer.status_number, 3);
        assert!(printer.attributes.contains("COLOR"));
        assert!(printer.attributes.contains("DUPLEX"));
        assert!(!printer.is_default);
        assert_eq!(printer.options["printer-info"], "Second floor");
        assert_eq!(printer.default_priority, 50);
    }

    #[test]
    fn default_bit_marks_default_printer() {
        let printer_type = codes::TYPE_DEFAULT as i32;
        let printer = printer_from_attributes(&printer_group(printer_type), Vec::new()).unwrap();
        assert!(printer.is_default);
    }

    #[test]
    fn group_without_name_skipped() {
        let attrs = group(vec![("printer-state", IppValue::Enum(3))]);
        assert!(printer_from_attributes(&attrs, Vec::new()).is_none());
    }

    #[test]
    fn job_fields_normalized() {
        let attrs = group(vec![
            ("job-id", IppValue::Integer(17)),
            ("job-name", IppValue::NameWithoutLanguage("report".into())),
            ("job-originating-user-name", IppValue::NameWithoutLanguage("alice".into())),
            (
                "job-printer-uri",
                IppValue::Uri("ipp://localhost:631/printers/Office-Laser".into()),
            ),
            ("document-format", IppValue::MimeMediaType("application/pdf".into())),
            ("job-k-octets", IppValue::Integer(3)),
            ("job-state", IppValue::Enum(5)),
            ("time-at-creation", IppValue::Integer(1_700_000_000)),
            ("time-at-completed", IppValue::Integer(0)),
        ]);
        let job = job_from_attributes(&attrs).unwrap();

        assert_eq!(job.id, JobId(17));
        assert_eq!(job.printer_name, "Office-Laser");
        assert_eq!(job.user, "alice");
        assert_eq!(job.format, "PDF");
        assert_eq!(job.size, 3 * 1024);
        assert!(job.status.contains("PRINTING"));
        match job.details {
            JobDetails::Cups {
                creation_time,
                completed_time,
                ..
            } => {
                assert_eq!(creation_time.map(|t| t.timestamp()), Some(1_700_000_000));
                assert!(completed_time.is_none());
            }
            other => panic!("unexpected details: {other:?}"),
        }
    }

    #[test]
    fn unknown_format_and_state_pass_through() {
        let attrs = group(vec![
            ("job-id", IppValue::Integer(4)),
            ("document-format", IppValue::MimeMediaType("image/urf".into())),
            ("job-state", IppValue::Enum(42)),
        ]);
        let job = job_from_attributes(&attrs).unwrap();
        assert_eq!(job.format, "image/urf");
        assert_eq!(job.status.len(), 1);
        assert!(job.status.contains("unsupported:42"));
    }

    #[test]
    fn option_values_typed() {
        assert!(matches!(option_value("2"), IppValue::Integer(2)));
        assert!(matches!(option_value("true"), IppValue::Boolean(true)));
        assert!(matches!(option_value("two-sided-long-edge"), IppValue::Keyword(_)));
        assert!(matches!(option_value("Quarterly report"), IppValue::NameWithoutLanguage(_)));
    }
}
