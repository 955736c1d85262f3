//! Terminal output for gdarchive commands
//!
//! Human output uses status marks and indented detail lines. JSON output is
//! one object per line on stdout (errors and warnings on stderr), so
//! `tree --json` and `archive --json` can be piped into line-oriented tools.

use serde_json::{json, Value};

use gdarchive_sync::{Planned, TreeSummary};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Kind of one planned path in a tree listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Unresolved,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Directory => "directory",
            EntryKind::File => "file",
            EntryKind::Unresolved => "unresolved",
        }
    }

    /// Kind and local path of a planned walk entry
    pub fn of(planned: &Planned) -> (EntryKind, &str) {
        match planned {
            Planned::Directory(path) => (EntryKind::Directory, path),
            Planned::Unresolved(path) => (EntryKind::Unresolved, path),
            Planned::File(job) => (EntryKind::File, &job.path),
        }
    }
}

pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    /// One planned path of a tree listing
    fn entry(&self, kind: EntryKind, path: &str);
    /// Outcome counters of one archived tree
    fn tree_summary(&self, name: &str, summary: &TreeSummary);
    fn print_json(&self, value: &Value);
}

fn entry_line(kind: EntryKind, path: &str) -> String {
    match kind {
        EntryKind::Directory => format!("{path}/"),
        EntryKind::File => path.to_string(),
        EntryKind::Unresolved => format!("{path} (unresolved shortcut)"),
    }
}

fn entry_record(kind: EntryKind, path: &str) -> Value {
    json!({"kind": kind.as_str(), "path": path})
}

fn summary_line(name: &str, summary: &TreeSummary) -> String {
    format!(
        "{name}: {} directories, {} downloaded, {} up to date, {} unsupported, \
         {} unresolved, {} failed",
        summary.directories,
        summary.downloaded,
        summary.skipped,
        summary.unsupported,
        summary.unresolved,
        summary.failed,
    )
}

fn summary_record(name: &str, summary: &TreeSummary) -> Value {
    json!({
        "tree": name,
        "directories": summary.directories,
        "downloaded": summary.downloaded,
        "skipped": summary.skipped,
        "unsupported": summary.unsupported,
        "unresolved": summary.unresolved,
        "failed": summary.failed,
    })
}

pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {message}");
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {message}");
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {message}");
    }
    fn info(&self, message: &str) {
        println!("  {message}");
    }
    fn entry(&self, kind: EntryKind, path: &str) {
        println!("  {}", entry_line(kind, path));
    }
    fn tree_summary(&self, name: &str, summary: &TreeSummary) {
        println!("  {}", summary_line(name, summary));
    }
    fn print_json(&self, _value: &Value) {}
}

pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!("{}", json!({"success": true, "message": message}));
    }
    fn error(&self, message: &str) {
        eprintln!("{}", json!({"success": false, "error": message}));
    }
    fn warn(&self, message: &str) {
        eprintln!("{}", json!({"level": "warning", "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn entry(&self, kind: EntryKind, path: &str) {
        println!("{}", entry_record(kind, path));
    }
    fn tree_summary(&self, name: &str, summary: &TreeSummary) {
        println!("{}", summary_record(name, summary));
    }
    fn print_json(&self, value: &Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}
