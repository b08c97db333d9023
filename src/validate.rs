//! Chain validation and health checking utilities.
//!
//! The traversal engine tolerates malformed data at call time (orphan
//! parent ids simply match nothing), so corruption can go unnoticed.
//! This module makes it visible:
//! - duplicate entity ids within a level (lookups pick one arbitrarily)
//! - parent ids pointing at absent records
//! - unreadable or mis-categorized id fields
//! - empty levels
//!
//! # Example
//!
//! ```rust,ignore
//! let health = check_chain(&dataset, traversal.chain());
//! if !health.is_healthy() {
//!     for issue in &health.validation.issues {
//!         eprintln!("{issue}");
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::debug;

use crate::dataset::HierarchicalStore;
use crate::traversal::chain::LevelChain;
use crate::traversal::index::IdIndex;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that may cause failures.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue found during a health check.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Optional level the issue belongs to, named by its entity field.
    pub level: Option<String>,
    /// Optional record position involved.
    pub record: Option<usize>,
    /// Optional additional context.
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            level: None,
            record: None,
            context: None,
        }
    }

    /// Attach the level this issue belongs to.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Attach a record position to this issue.
    pub fn with_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }

    /// Attach context to this issue.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(level) = &self.level {
            write!(f, " (level {})", level)?;
        }
        if let Some(record) = self.record {
            write!(f, " (record {})", record)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " - {}", ctx)?;
        }
        Ok(())
    }
}

/// Report from a validation/health check.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add an info-level issue.
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Info, message));
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Error, message));
    }

    /// Add a critical-level issue.
    pub fn critical(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Critical, message));
    }

    /// Check if the report contains no errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// Check if there are any issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Health report for a configured chain, with summary statistics.
#[derive(Debug, Clone)]
pub struct ChainHealth {
    /// Validation issues.
    pub validation: ValidationReport,
    /// Record count per level, root first, named by entity field.
    pub level_counts: Vec<(String, usize)>,
    /// Total records whose parent id matches nothing one level up.
    pub orphan_records: usize,
    /// Mean children per record across all non-leaf levels.
    pub mean_fanout: f64,
}

impl ChainHealth {
    /// Check if the chain is healthy (no errors or critical issues).
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl fmt::Display for ChainHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chain Health Report")?;
        writeln!(f, "===================")?;
        let levels: Vec<String> = self
            .level_counts
            .iter()
            .map(|(name, n)| format!("{name} ({n})"))
            .collect();
        writeln!(f, "Levels: {}", levels.join(" > "))?;
        writeln!(f, "Orphan records: {}", self.orphan_records)?;
        writeln!(f, "Mean fan-out: {:.2}", self.mean_fanout)?;
        writeln!(f)?;
        write!(f, "{}", self.validation)
    }
}

/// Check a dataset against a configured chain.
///
/// Orphan parent ids are warnings, not errors: every traversal operation
/// is defined over them (they match nothing). Duplicate entity ids are
/// errors, since id lookups then resolve to an arbitrary occurrence.
pub fn check_chain<I, S>(store: &S, chain: &LevelChain) -> ChainHealth
where
    I: Eq + Hash,
    S: HierarchicalStore<I>,
{
    let mut validation = ValidationReport::new();
    let mut level_counts = Vec::with_capacity(chain.len());
    let mut orphan_records = 0usize;

    let mut previous_ids: Option<&[I]> = None;
    for level in chain.levels() {
        let name = level.entity_field();
        let ids = match store
            .field(level.dimension(), name)
            .ok()
            .and_then(|d| d.as_ids())
        {
            Some(ids) => ids,
            None => {
                validation.add(
                    ValidationIssue::new(Severity::Critical, "entity ids unreadable")
                        .with_level(name),
                );
                level_counts.push((name.to_string(), 0));
                previous_ids = None;
                continue;
            }
        };
        level_counts.push((name.to_string(), ids.len()));

        if ids.is_empty() {
            validation.add(
                ValidationIssue::new(Severity::Info, "level has no records").with_level(name),
            );
        }

        let index = IdIndex::build(ids);
        if index.len() != ids.len() {
            validation.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("{} duplicate entity ids", ids.len() - index.len()),
                )
                .with_level(name),
            );
        }

        if let Some(parent_field) = level.parent_field() {
            match store
                .field(level.dimension(), parent_field)
                .ok()
                .and_then(|d| d.as_ids())
            {
                Some(parents) => {
                    if parents.len() != ids.len() {
                        validation.add(
                            ValidationIssue::new(
                                Severity::Error,
                                format!(
                                    "parent ids ({}) and entity ids ({}) differ in length",
                                    parents.len(),
                                    ids.len()
                                ),
                            )
                            .with_level(name),
                        );
                    }
                    if let Some(above) = previous_ids {
                        let above_index = IdIndex::build(above);
                        let orphans: Vec<usize> = parents
                            .iter()
                            .enumerate()
                            .filter(|(_, p)| !above_index.contains(p))
                            .map(|(pos, _)| pos)
                            .collect();
                        if !orphans.is_empty() {
                            orphan_records += orphans.len();
                            validation.add(
                                ValidationIssue::new(
                                    Severity::Warning,
                                    format!("{} records point at absent parents", orphans.len()),
                                )
                                .with_level(name)
                                .with_context(format!(
                                    "first few records: {:?}",
                                    &orphans[..orphans.len().min(5)]
                                )),
                            );
                        }
                    }
                }
                None => {
                    validation.add(
                        ValidationIssue::new(Severity::Critical, "parent ids unreadable")
                            .with_level(name)
                            .with_context(format!("field '{parent_field}'")),
                    );
                }
            }
        }

        previous_ids = Some(ids);
    }

    let total_parents: usize = level_counts
        .iter()
        .take(level_counts.len().saturating_sub(1))
        .map(|&(_, n)| n)
        .sum();
    let total_children: usize = level_counts.iter().skip(1).map(|&(_, n)| n).sum();
    let mean_fanout = if total_parents == 0 {
        0.0
    } else {
        total_children as f64 / total_parents as f64
    };

    debug!(issues = validation.issues.len(), orphan_records, "chain health computed");

    ChainHealth {
        validation,
        level_counts,
        orphan_records,
        mean_fanout,
    }
}
