//! Structured pipeline diagnostics.
//!
//! Nothing in the ingestion or aggregation pipeline aborts a run. Conditions
//! that degrade output are recorded as [`Issue`]s in a [`Diagnostics`]
//! collector threaded through each call; the caller decides when to log them.

use std::path::PathBuf;

use itertools::Itertools;
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use crate::schema::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One row dropped during validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarantinedRow {
    /// Zero-based position within the source file.
    pub index: usize,
    /// Projected row content in schema order.
    pub fields: Vec<(String, String)>,
    pub invalid_columns: Vec<String>,
}

impl QuarantinedRow {
    pub fn render(&self) -> String {
        let body = self
            .fields
            .iter()
            .map(|(name, value)| format!("{name}: {value:?}"))
            .join(", ");
        format!("{{{body}}}")
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum Issue {
    #[error("Error reading file {path:?}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },
    #[error("Column '{column}' missing in file {path:?}; every row is marked missing")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{} row(s) with issues in file {path:?}", .rows.len())]
    QuarantinedRows {
        path: PathBuf,
        rows: Vec<QuarantinedRow>,
    },
    #[error("No {format} files found for {layout} in {dir:?}")]
    NoSourceFiles {
        layout: Layout,
        format: String,
        dir: PathBuf,
    },
    #[error("No valid data found for {layout}")]
    EmptyDataset { layout: Layout },
    #[error("No claims data available for metrics computation")]
    MetricsWithoutClaims,
    #[error("No reverts data found; reverted counts default to 0")]
    MetricsWithoutReverts,
    #[error(
        "Insufficient data to compute top chains per drug: empty {}",
        .missing.iter().join(", ")
    )]
    RecommendationsWithoutInput { missing: Vec<Layout> },
    #[error("Insufficient claims data to compute common prescription quantities")]
    QuantitiesWithoutClaims,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::MissingColumn { .. }
            | Issue::QuarantinedRows { .. }
            | Issue::NoSourceFiles { .. } => Severity::Warning,
            Issue::UnreadableFile { .. }
            | Issue::EmptyDataset { .. }
            | Issue::MetricsWithoutClaims
            | Issue::MetricsWithoutReverts
            | Issue::RecommendationsWithoutInput { .. }
            | Issue::QuantitiesWithoutClaims => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    issues: Vec<Issue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn quarantined_row_count(&self) -> usize {
        self.issues
            .iter()
            .map(|issue| match issue {
                Issue::QuarantinedRows { rows, .. } => rows.len(),
                _ => 0,
            })
            .sum()
    }

    /// Emits every issue through the `log` facade and clears the collector.
    pub fn log(&mut self) {
        for issue in self.issues.drain(..) {
            match issue.severity() {
                Severity::Error => error!("{issue}"),
                Severity::Warning => warn!("{issue}"),
            }
            if let Issue::QuarantinedRows { rows, .. } = &issue {
                for row in rows {
                    warn!(
                        "Problematic row - index {} (invalid: {}): {}",
                        row.index,
                        row.invalid_columns.join(", "),
                        row.render()
                    );
                }
            }
        }
    }
}
