//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::core::models::{
    AuditEntry, CanonicalRecord, ContributionEntry, ContributionStatus, Issue, IssueKind, Page,
    Triple,
};
use crate::core::services::{ReviewOutcome, SubmitOutcome};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn status_label(status: ContributionStatus) -> String {
    let label = status.to_string();
    match status {
        ContributionStatus::Applied => label.green().to_string(),
        ContributionStatus::Pending | ContributionStatus::Approved => label.yellow().to_string(),
        ContributionStatus::Superseded => label.magenta().to_string(),
        ContributionStatus::Rejected => label.red().to_string(),
    }
}

/// Result of a submit
#[derive(Debug, Serialize)]
pub struct SubmitReport {
    /// Record the value was proposed for
    pub triple: Triple,
    /// Engine outcome
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
}

impl SubmitReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        match (self.outcome.status, self.outcome.version) {
            (ContributionStatus::Applied, Some(version)) => println!(
                "{} {} (contribution #{}, now v{version})",
                "Applied".green().bold(),
                self.triple,
                self.outcome.entry_id
            ),
            (status, _) => {
                println!(
                    "{} {} (contribution #{})",
                    status_label(status).bold(),
                    self.triple,
                    self.outcome.entry_id
                );
                println!("A reviewer must approve this change before it is applied.");
            },
        }
    }
}

/// Result of a review
#[derive(Debug, Serialize)]
pub struct ReviewReport {
    /// Engine outcome
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

impl ReviewReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        let id = self.outcome.entry_id;
        match self.outcome.status {
            ContributionStatus::Applied => println!(
                "{} contribution #{id} (record now v{})",
                "Applied".green().bold(),
                self.outcome.version.unwrap_or_default()
            ),
            ContributionStatus::Superseded => {
                println!("{} contribution #{id}", "Superseded".magenta().bold());
                println!(
                    "The record changed after this contribution was made. \
                     Review the current value and resubmit if still needed."
                );
            },
            status => println!("{} contribution #{id}", status_label(status).bold()),
        }
    }
}

/// A page of ledger entries
#[derive(Debug, Serialize)]
pub struct PendingReport {
    /// The page
    #[serde(flatten)]
    pub page: Page<ContributionEntry>,
}

impl PendingReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.page.items.is_empty() {
            println!("No contributions.");
            return;
        }
        for entry in &self.page.items {
            println!(
                "  #{:<5} {:<11} {} = {} (by {}, base v{})",
                entry.id,
                status_label(entry.status),
                entry.triple,
                entry.proposed_value.to_string().bold(),
                entry.submitted_by,
                entry.based_on_version
            );
            if let Some(note) = &entry.source_note {
                println!("         source: {}", note.dimmed());
            }
        }
        render_page_footer(self.page.page, self.page.page_count(), self.page.total);
    }
}

/// A page of issues
#[derive(Debug, Serialize)]
pub struct IssueReport {
    /// The page
    #[serde(flatten)]
    pub page: Page<Issue>,
}

impl IssueReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.page.items.is_empty() {
            println!("{}", "No issues found.".green());
            return;
        }
        for issue in &self.page.items {
            print_issue_line(issue);
        }
        render_page_footer(self.page.page, self.page.page_count(), self.page.total);
    }
}

/// Print one issue as a single human-readable line
pub fn print_issue_line(issue: &Issue) {
    let kind = match issue.kind {
        IssueKind::Missing => "missing   ".yellow(),
        IssueKind::Suspicious => "suspicious".red(),
    };
    match &issue.reason {
        Some(reason) => println!("  {kind} {}  {reason}", issue.triple),
        None => println!("  {kind} {}", issue.triple),
    }
}

fn render_page_footer(page: usize, pages: usize, total: usize) {
    if pages > 1 {
        println!("\nPage {page} of {pages} ({total} total)");
    } else {
        println!("\n{total} total");
    }
}

/// Audit trail of a record
#[derive(Debug, Serialize)]
pub struct HistoryReport {
    /// Record
    pub triple: Triple,
    /// Entries, oldest first
    pub entries: Vec<AuditEntry>,
}

impl HistoryReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        println!("History of {}", self.triple.to_string().bold());
        if self.entries.is_empty() {
            println!("  (no entries)");
            return;
        }
        for entry in &self.entries {
            let change = match (&entry.before_value, &entry.after_value) {
                (Some(before), Some(after)) => format!("{before} -> {after}"),
                (None, Some(after)) => format!("-> {after}"),
                (Some(before), None) => before.to_string(),
                (None, None) => String::new(),
            };
            let contribution = entry.contribution_id.map(|id| format!(" #{id}")).unwrap_or_default();
            println!(
                "  {} v{:<3} {:<22} {:<10} {change}{contribution}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                entry.record_version,
                entry.action.to_string(),
                entry.actor
            );
            if let Some(note) = &entry.note {
                println!("      {}", note.dimmed());
            }
        }
    }
}

/// Current value of a record
#[derive(Debug, Serialize)]
pub struct RecordReport {
    /// Record
    pub triple: Triple,
    /// Stored record, if any
    pub record: Option<CanonicalRecord>,
}

impl RecordReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        match &self.record {
            Some(record) => println!(
                "{} = {} (v{}, modified {})",
                self.triple,
                record.value.to_string().bold(),
                record.version,
                record.last_modified.format("%Y-%m-%d %H:%M:%S")
            ),
            None => println!("{} has no value", self.triple),
        }
    }
}

/// Result of invalidating an issue
#[derive(Debug, Serialize)]
pub struct InvalidationReport {
    /// The audit entry written
    pub entry: AuditEntry,
}

impl InvalidationReport {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!(
                "Marked {} as not an issue (holds while the record stays at v{})",
                self.entry.triple, self.entry.record_version
            ),
            OutputMode::Json => print_json(self),
        }
    }
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl OperationResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!("{}", self.message),
            OutputMode::Json => print_json(self),
        }
    }
}
