// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Normalized printer, job and driver-option records.
//
// Every value here is a point-in-time snapshot built inside a single query.
// Nothing is cached and nothing holds on to a native handle.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Operation, Result, SpoolError};

/// A set of portable labels decoded from a native code.
pub type LabelSet = BTreeSet<String>;

/// Opaque job options, handed to the native job-creation call unchanged.
pub type JobOptions = BTreeMap<String, String>;

/// Identifier of a job within one destination's live job table.
///
/// Ids are neither globally unique nor stable once a job completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u32);

impl JobId {
    /// Validate a caller-supplied id. Negative or out-of-range values are
    /// rejected before anything reaches the native layer.
    pub fn from_raw(raw: i64, operation: Operation) -> Result<Self> {
        if raw < 0 {
            return Err(SpoolError::invalid(
                operation,
                format!("job id must not be negative, got {raw}"),
            ));
        }
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| SpoolError::invalid(operation, format!("job id {raw} is out of range")))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which jobs a catalog query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobScope {
    /// Pending, held and printing jobs.
    Active,
    /// Active jobs plus whatever completed jobs the service still remembers.
    All,
}

/// A print destination registered with the native service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub name: String,
    pub is_default: bool,
    pub instance: Option<String>,
    /// Native key/value pairs, passed through verbatim.
    pub options: BTreeMap<String, String>,
    pub status: LabelSet,
    /// Raw native status code, kept for diagnostics.
    pub status_number: u32,
    pub attributes: LabelSet,
    pub priority: u32,
    pub default_priority: u32,
    pub average_ppm: u32,
    /// Earliest time of day the destination prints (spooler only).
    pub start_time: Option<NaiveTime>,
    /// Latest time of day the destination prints (spooler only).
    pub until_time: Option<NaiveTime>,
    /// Active jobs at the time of the query.
    pub jobs: Vec<Job>,
}

/// A unit of print work queued against a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub printer_name: String,
    pub user: String,
    /// Portable format label when recognized, the native format otherwise.
    pub format: String,
    pub priority: u32,
    /// Size in bytes.
    pub size: u64,
    /// Never empty.
    pub status: LabelSet,
    /// Free-form status text some drivers attach to a job.
    pub status_message: Option<String>,
    pub details: JobDetails,
}

/// Backend-specific job fields layered on top of the common [`Job`] base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum JobDetails {
    Cups {
        creation_time: Option<DateTime<Utc>>,
        processing_time: Option<DateTime<Utc>>,
        completed_time: Option<DateTime<Utc>>,
    },
    Spooler {
        /// Position in the print queue.
        position: u32,
        start_time: Option<NaiveTime>,
        until_time: Option<NaiveTime>,
        total_pages: u32,
        pages_printed: u32,
        /// Time spent printing so far, in milliseconds.
        elapsed_ms: u32,
        machine_name: Option<String>,
        document: Option<String>,
        driver_name: Option<String>,
    },
}

/// Driver option tree.
///
/// A `Leaf` is a single choice of an option; options and the driver's own
/// grouping are both `Group`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OptionNode {
    Leaf { choice: String, marked: bool },
    Group { name: String, children: Vec<OptionNode> },
}

impl OptionNode {
    pub fn leaf(choice: impl Into<String>, marked: bool) -> Self {
        Self::Leaf {
            choice: choice.into(),
            marked,
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<OptionNode>) -> Self {
        Self::Group {
            name: name.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Leaf { choice, .. } => choice,
            Self::Group { name, .. } => name,
        }
    }

    pub fn children(&self) -> &[OptionNode] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Group { children, .. } => children,
        }
    }

    fn is_option(&self) -> bool {
        matches!(self, Self::Group { children, .. }
            if !children.is_empty() && children.iter().all(|c| matches!(c, Self::Leaf { .. })))
    }

    /// Depth-first search for the option group with the given keyword.
    pub fn find_option(&self, keyword: &str) -> Option<&OptionNode> {
        if self.is_option() && self.name() == keyword {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find_option(keyword))
    }

    /// The marked choice of an option, if the option exists and has one.
    pub fn marked_choice(&self, keyword: &str) -> Option<&str> {
        self.find_option(keyword)?
            .children()
            .iter()
            .find_map(|c| match c {
                Self::Leaf { choice, marked: true } => Some(choice.as_str()),
                _ => None,
            })
    }

    /// Flatten the tree to `keyword → (choice → marked)`, ignoring the
    /// driver's grouping.
    pub fn to_choice_map(&self) -> BTreeMap<String, BTreeMap<String, bool>> {
        let mut map = BTreeMap::new();
        self.collect_choices(&mut map);
        map
    }

    fn collect_choices(&self, map: &mut BTreeMap<String, BTreeMap<String, bool>>) {
        if self.is_option() {
            let choices = self
                .children()
                .iter()
                .filter_map(|c| match c {
                    Self::Leaf { choice, marked } => Some((choice.clone(), *marked)),
                    Self::Group { .. } => None,
                })
                .collect();
            map.insert(self.name().to_string(), choices);
            return;
        }
        for child in self.children() {
            child.collect_choices(map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> OptionNode {
        OptionNode::group(
            "Office-Laser",
            vec![OptionNode::group(
                "General",
                vec![
                    OptionNode::group(
                        "PageSize",
                        vec![OptionNode::leaf("Letter", false), OptionNode::leaf("A4", true)],
                    ),
                    OptionNode::group(
                        "Finishing",
                        vec![OptionNode::group(
                            "Cutter",
                            vec![OptionNode::leaf("Normal", true), OptionNode::leaf("NoWaste", false)],
                        )],
                    ),
                ],
            )],
        )
    }

    #[test]
    fn negative_job_id_rejected() {
        let err = JobId::from_raw(-1, Operation::GetJob).unwrap_err();
        assert!(matches!(err, SpoolError::InvalidArgument { operation: Operation::GetJob, .. }));
    }

    #[test]
    fn oversized_job_id_rejected() {
        assert!(JobId::from_raw(i64::from(u32::MAX) + 1, Operation::GetJob).is_err());
        assert_eq!(JobId::from_raw(42, Operation::GetJob).unwrap(), JobId(42));
    }

    #[test]
    fn marked_choice_found_in_nested_group() {
        let tree = sample_tree();
        assert_eq!(tree.marked_choice("PageSize"), Some("A4"));
        assert_eq!(tree.marked_choice("Cutter"), Some("Normal"));
        assert_eq!(tree.marked_choice("Duplex"), None);
    }

    #[test]
    fn choice_map_flattens_groups() {
        let map = sample_tree().to_choice_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["PageSize"]["A4"], true);
        assert_eq!(map["Cutter"]["NoWaste"], false);
        assert!(!map.contains_key("General"));
    }

    #[test]
    fn job_details_serialize_with_backend_tag() {
        let details = JobDetails::Cups {
            creation_time: None,
            processing_time: None,
            completed_time: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["backend"], "cups");
    }
}
