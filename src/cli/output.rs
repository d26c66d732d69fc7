use std::fmt::Write as FmtWrite;

use crate::models::OutputFormat;
use crate::services::UrlReport;
use crate::utils::preview;

pub trait Formatter {
    fn format_collections(&self, collections: &[String]) -> String;
    fn format_tables(&self, tables: &[String]) -> String;
    fn format_upload_report(&self, report: &UploadReport) -> String;
    fn format_url_report(&self, report: &UrlReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub prem_url: String,
    pub prem_connected: bool,
    pub prem_configured: bool,
    pub qdrant_url: String,
    pub qdrant_connected: bool,
    pub collections: u64,
    pub database: String,
    pub database_connected: bool,
    pub tables: u64,
}

/// Result of uploading files to the repository.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// `(file name, reason)` for every file that was skipped.
    pub failed: Vec<(String, String)>,
}

fn mark(ok: bool) -> &'static str {
    if ok { "✓" } else { "✗" }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_collections(&self, collections: &[String]) -> String {
        if collections.is_empty() {
            return "No collections found\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Collections").unwrap();
        writeln!(output, "-----------").unwrap();
        for name in collections {
            writeln!(output, "  {}", name).unwrap();
        }
        output
    }

    fn format_tables(&self, tables: &[String]) -> String {
        if tables.is_empty() {
            return "No table found\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Tables").unwrap();
        writeln!(output, "------").unwrap();
        for name in tables {
            writeln!(output, "  {}", name).unwrap();
        }
        output
    }

    fn format_upload_report(&self, report: &UploadReport) -> String {
        let mut output = String::new();
        for (name, reason) in &report.failed {
            writeln!(output, "Error with file: {} ({})", name, reason).unwrap();
        }
        writeln!(output, "Uploaded {} files", report.uploaded.len()).unwrap();
        output
    }

    fn format_url_report(&self, report: &UrlReport) -> String {
        let mut output = String::new();
        for summary in &report.passed {
            writeln!(output, "URL: {}", summary.url).unwrap();
            writeln!(output, "{}", "-".repeat(summary.url.chars().count() + 5)).unwrap();
            writeln!(output, "{}\n", summary.output_text.trim()).unwrap();
        }

        if !report.failed.is_empty() {
            let failed = serde_json::to_string(&report.failed).unwrap_or_default();
            writeln!(output, "Failed URLs: {}", failed).unwrap();
        }
        for upload in &report.failed_uploads {
            writeln!(output, "Failed upload ({:?}): {}", upload.kind, upload.name).unwrap();
            writeln!(output, "  {}", preview(&upload.content, 80).replace('\n', " ")).unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let prem = if !status.prem_configured {
            "[NOT CONFIGURED]"
        } else if status.prem_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Prem API:      {}", prem).unwrap();
        writeln!(output, "  URL:         {}", status.prem_url).unwrap();
        writeln!(output).unwrap();

        let qdrant = if status.qdrant_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Qdrant:        {}", qdrant).unwrap();
        writeln!(output, "  URL:         {}", status.qdrant_url).unwrap();
        if status.qdrant_connected {
            writeln!(output, "  Collections: {}", status.collections).unwrap();
        }
        writeln!(output).unwrap();

        let database = if status.database_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "PostgreSQL:    {}", database).unwrap();
        writeln!(output, "  Database:    {}", status.database).unwrap();
        if status.database_connected {
            writeln!(output, "  Tables:      {}", status.tables).unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(json)
        } else {
            serde_json::to_string(json)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Formatter for JsonFormatter {
    fn format_collections(&self, collections: &[String]) -> String {
        self.render(&serde_json::json!({"collections": collections}))
    }

    fn format_tables(&self, tables: &[String]) -> String {
        self.render(&serde_json::json!({"tables": tables}))
    }

    fn format_upload_report(&self, report: &UploadReport) -> String {
        let failed: Vec<serde_json::Value> = report
            .failed
            .iter()
            .map(|(name, reason)| serde_json::json!({"file": name, "error": reason}))
            .collect();
        self.render(&serde_json::json!({
            "uploaded": report.uploaded,
            "failed": failed,
        }))
    }

    fn format_url_report(&self, report: &UrlReport) -> String {
        let summaries: Vec<serde_json::Value> = report
            .passed
            .iter()
            .map(|s| {
                serde_json::json!({
                    "url": s.url,
                    "summary": s.output_text,
                    "intermediate_steps": s.intermediate_steps,
                })
            })
            .collect();
        self.render(&serde_json::json!({
            "summaries": summaries,
            "failed": report.failed,
            "failed_uploads": report.failed_uploads,
        }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.render(&serde_json::json!({
            "prem": {
                "url": status.prem_url,
                "configured": status.prem_configured,
                "connected": status.prem_connected,
            },
            "qdrant": {
                "url": status.qdrant_url,
                "connected": status.qdrant_connected,
                "collections": status.collections,
            },
            "database": {
                "name": status.database,
                "connected": status.database_connected,
                "tables": status.tables,
            }
        }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_collections(&self, collections: &[String]) -> String {
        if collections.is_empty() {
            return "## Collections\n\n*No collections found.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Collections\n").unwrap();
        for name in collections {
            writeln!(output, "- `{}`", name).unwrap();
        }
        output
    }

    fn format_tables(&self, tables: &[String]) -> String {
        if tables.is_empty() {
            return "## Tables\n\n*No table found.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Tables\n").unwrap();
        for name in tables {
            writeln!(output, "- `{}`", name).unwrap();
        }
        output
    }

    fn format_upload_report(&self, report: &UploadReport) -> String {
        let mut output = String::new();
        writeln!(output, "## Upload\n").unwrap();
        writeln!(output, "Uploaded {} files\n", report.uploaded.len()).unwrap();
        if !report.failed.is_empty() {
            writeln!(output, "| File | Error |").unwrap();
            writeln!(output, "|------|-------|").unwrap();
            for (name, reason) in &report.failed {
                writeln!(output, "| `{}` | {} |", name, reason).unwrap();
            }
        }
        output
    }

    fn format_url_report(&self, report: &UrlReport) -> String {
        let mut output = String::new();
        for summary in &report.passed {
            writeln!(output, "## URL: {}\n", summary.url).unwrap();
            writeln!(output, "{}\n", summary.output_text.trim()).unwrap();
        }
        if !report.failed.is_empty() {
            writeln!(output, "### Failed URLs\n").unwrap();
            for url in &report.failed {
                writeln!(output, "- {}", url).unwrap();
            }
            writeln!(output).unwrap();
        }
        if !report.failed_uploads.is_empty() {
            writeln!(output, "### Failed uploads\n").unwrap();
            for upload in &report.failed_uploads {
                writeln!(output, "- `{}` ({:?})", upload.name, upload.kind).unwrap();
            }
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();
        writeln!(
            output,
            "### Prem API {}\n",
            mark(status.prem_configured && status.prem_connected)
        )
        .unwrap();
        writeln!(output, "- **URL:** `{}`\n", status.prem_url).unwrap();
        writeln!(output, "### Qdrant {}\n", mark(status.qdrant_connected)).unwrap();
        writeln!(output, "- **URL:** `{}`", status.qdrant_url).unwrap();
        writeln!(output, "- **Collections:** {}\n", status.collections).unwrap();
        writeln!(output, "### PostgreSQL {}\n", mark(status.database_connected)).unwrap();
        writeln!(output, "- **Database:** `{}`", status.database).unwrap();
        writeln!(output, "- **Tables:** {}", status.tables).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
