//! HTML Diff Reports
//!
//! Renders a `SchemaDiff` as a static HTML page in the report directory and,
//! when asked to, hands the file to a local viewer. Rendering never decides
//! whether a report is needed; the pipeline does.

use crate::error::{IngestError, IngestResult};
use crate::models::SchemaSnapshot;
use crate::snapshot::SchemaDiff;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::JoinHandle;
use tracing::info;

/// Writes diff reports and optionally opens them
pub struct ReportGenerator {
    dir: PathBuf,
    open: bool,
    viewer_command: Option<String>,
}

impl ReportGenerator {
    pub fn new(dir: impl Into<PathBuf>, open: bool, viewer_command: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            open,
            viewer_command,
        }
    }

    /// Report file name for a dataset at a point in time
    pub fn file_name(dataset: &str, at: DateTime<Local>) -> String {
        format!("schema_diff_{}_{}.html", dataset, at.format("%Y-%m-%d_%H-%M-%S"))
    }

    /// Write the report and return its path
    pub fn write(
        &self,
        dataset: &str,
        diff: &SchemaDiff,
        old: &SchemaSnapshot,
        new: &SchemaSnapshot,
    ) -> IngestResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            IngestError::Report(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.dir.join(Self::file_name(dataset, Local::now()));
        let html = render(dataset, diff, old, new);

        fs::write(&path, html)
            .map_err(|e| IngestError::Report(format!("cannot write {}: {}", path.display(), e)))?;

        info!("📄 HTML diff report saved: {}", path.display());
        Ok(path)
    }

    /// Open a written report if viewing is enabled
    pub fn present(&self, path: &Path) -> IngestResult<()> {
        if !self.open {
            return Ok(());
        }

        let mut cmd = match &self.viewer_command {
            Some(viewer) => Command::new(viewer),
            None => default_opener(),
        };

        launch(cmd, path).map(|_| ())
    }
}

/// Spawn the viewer and reap it on a background thread
fn launch(mut cmd: Command, path: &Path) -> IngestResult<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = cmd
        .arg(path)
        .spawn()
        .map_err(|e| IngestError::Report(format!("cannot open {}: {}", path.display(), e)))?;

    Ok(std::thread::spawn(move || child.wait()))
}

#[cfg(target_os = "macos")]
fn default_opener() -> Command {
    Command::new("open")
}

#[cfg(target_os = "windows")]
fn default_opener() -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn default_opener() -> Command {
    Command::new("xdg-open")
}

/// Render the diff as a standalone HTML document
pub fn render(dataset: &str, diff: &SchemaDiff, old: &SchemaSnapshot, new: &SchemaSnapshot) -> String {
    let mut html = String::new();

    html.push_str("<html><head><meta charset=\"utf-8\"><title>Schema Diff Report</title></head><body>");
    let _ = write!(
        html,
        "<h2>Schema Diff Report for <code>{}</code></h2>",
        escape(dataset)
    );

    if !diff.added.is_empty() {
        html.push_str("<h3 style='color:green;'>➕ Added Fields:</h3><ul>");
        for field in &diff.added {
            match new.type_of(field) {
                Some(ty) => {
                    let _ = write!(html, "<li>{}: {}</li>", escape(field), escape(&ty.native_type));
                }
                None => {
                    let _ = write!(html, "<li>{}</li>", escape(field));
                }
            }
        }
        html.push_str("</ul>");
    }

    if !diff.removed.is_empty() {
        html.push_str("<h3 style='color:red;'>➖ Removed Fields:</h3><ul>");
        for field in &diff.removed {
            let _ = write!(html, "<li>{}</li>", escape(field));
        }
        html.push_str("</ul>");
    }

    if !diff.changed_type.is_empty() {
        html.push_str("<h3 style='color:orange;'>🔁 Changed Types:</h3><ul>");
        for field in &diff.changed_type {
            let before = old.type_of(field).map(|t| t.native_type.as_str()).unwrap_or("?");
            let after = new.type_of(field).map(|t| t.native_type.as_str()).unwrap_or("?");
            let _ = write!(
                html,
                "<li>{}: {} ➡️ {}</li>",
                escape(field),
                escape(before),
                escape(after)
            );
        }
        html.push_str("</ul>");
    }

    if diff.is_empty() {
        html.push_str("<p>No schema changes detected.</p>");
    }

    html.push_str("</body></html>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalType, FieldType};
    use crate::snapshot::DiffEngine;
    use chrono::TimeZone;

    fn snap(fields: &[(&str, CanonicalType, &str)]) -> SchemaSnapshot {
        SchemaSnapshot {
            fields: fields
                .iter()
                .map(|(n, c, native)| {
                    (
                        n.to_string(),
                        Some(FieldType {
                            canonical: *c,
                            native_type: native.to_string(),
                        }),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_file_name_format() {
        let at = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(
            ReportGenerator::file_name("userdata1", at),
            "schema_diff_userdata1_2025-03-07_09-05-01.html"
        );
    }

    #[test]
    fn test_render_lists_every_section() {
        let old = snap(&[("a", CanonicalType::Integer, "int"), ("b", CanonicalType::String, "string")]);
        let new = snap(&[("b", CanonicalType::Integer, "long"), ("c", CanonicalType::String, "string")]);
        let diff = DiffEngine::diff(&old, &new);

        let html = render("userdata1", &diff, &old, &new);

        assert!(html.contains("Added Fields"));
        assert!(html.contains("<li>c: string</li>"));
        assert!(html.contains("Removed Fields"));
        assert!(html.contains("<li>a</li>"));
        assert!(html.contains("<li>b: string ➡️ long</li>"));
        assert!(!html.contains("No schema changes detected."));
    }

    #[test]
    fn test_render_escapes_field_names() {
        let old = SchemaSnapshot::default();
        let new = snap(&[("<script>", CanonicalType::String, "string")]);
        let diff = DiffEngine::diff(&old, &new);

        let html = render("a&b", &diff, &old, &new);

        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<code>a&amp;b</code>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_empty_diff_renders_no_changes() {
        let snapshot = snap(&[("a", CanonicalType::Integer, "int")]);
        let html = render("d", &SchemaDiff::default(), &snapshot, &snapshot);
        assert!(html.contains("No schema changes detected."));
    }

    #[test]
    fn test_write_creates_report_dir() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().join("reports"), false, None);
        let old = SchemaSnapshot::names_only(["a"]);
        let new = SchemaSnapshot::names_only(["b"]);
        let diff = DiffEngine::diff(&old, &new);

        let path = generator.write("people-100", &diff, &old, &new).unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("schema_diff_people-100_"));
        assert!(name.ends_with(".html"));
        // Viewing disabled: nothing is spawned
        generator.present(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_viewer_process_is_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        fs::write(&path, "<html></html>").unwrap();

        let waiter = launch(Command::new("true"), &path).unwrap();
        let status = waiter.join().unwrap().unwrap();
        assert!(status.success());

        let generator = ReportGenerator::new(dir.path(), true, Some("true".to_string()));
        assert!(generator.present(&path).is_ok());
    }

    #[test]
    fn test_missing_viewer_is_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");
        let generator = ReportGenerator::new(
            dir.path(),
            true,
            Some("schemasync-no-such-viewer".to_string()),
        );

        let err = generator.present(&path).unwrap_err();
        assert!(matches!(err, IngestError::Report(_)));
    }
}
