use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, PaperRecord};
use crate::services::RunSummary;

pub trait Formatter {
    fn format_summary(&self, summary: &RunSummary) -> String;
    fn format_record(&self, record: &PaperRecord) -> String;
    fn format_records(&self, records: &[PaperRecord]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub ollama_url: String,
    pub ollama_running: bool,
    pub model: String,
    pub model_available: bool,
    pub database_path: String,
    pub database_ok: bool,
    pub record_count: u64,
    pub directory: String,
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_summary(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        writeln!(output, "Scan Complete").unwrap();
        writeln!(output, "-------------").unwrap();
        writeln!(output, "Files found:      {}", summary.discovered).unwrap();
        writeln!(output, "Recorded:         {}", summary.recorded).unwrap();
        writeln!(output, "Already recorded: {}", summary.already_recorded).unwrap();
        writeln!(output, "Skipped:          {}", summary.skipped).unwrap();
        writeln!(output, "Needs review:     {}", summary.needs_review).unwrap();
        writeln!(output, "Failed:           {}", summary.failed).unwrap();
        writeln!(output, "Duration:         {}ms", summary.duration_ms).unwrap();
        output
    }

    fn format_record(&self, record: &PaperRecord) -> String {
        let mut output = String::new();
        writeln!(output, "{}", record.path).unwrap();
        writeln!(output, "  Title:   {}", or_placeholder(&record.title, "(none)")).unwrap();
        writeln!(
            output,
            "  Authors: {}",
            or_placeholder(&record.authors_column(), "(unknown)")
        )
        .unwrap();
        output
    }

    fn format_records(&self, records: &[PaperRecord]) -> String {
        if records.is_empty() {
            return "No papers recorded.\n".to_string();
        }

        let mut output = String::new();
        for record in records {
            output.push_str(&self.format_record(record));
        }
        writeln!(output, "\n{} paper(s)", records.len()).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let server = if status.ollama_running {
            "[RUNNING]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Model server:  {}", server).unwrap();
        writeln!(output, "  URL:         {}", status.ollama_url).unwrap();
        let model = if status.model_available {
            "[AVAILABLE]"
        } else {
            "[MISSING]"
        };
        writeln!(output, "  Model:       {} {}", status.model, model).unwrap();
        writeln!(output).unwrap();

        let database = if status.database_ok { "[OK]" } else { "[ERROR]" };
        writeln!(output, "Catalog:       {}", database).unwrap();
        writeln!(output, "  Path:        {}", status.database_path).unwrap();
        writeln!(output, "  Papers:      {}", status.record_count).unwrap();
        writeln!(output, "  Library:     {}", status.directory).unwrap();
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

    fn render(&self, value: &serde_json::Value) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut out = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
        out.push('\n');
        out
    }
}

impl Formatter for JsonFormatter {
    fn format_summary(&self, summary: &RunSummary) -> String {
        self.render(&serde_json::json!(summary))
    }

    fn format_record(&self, record: &PaperRecord) -> String {
        self.render(&serde_json::json!(record))
    }

    fn format_records(&self, records: &[PaperRecord]) -> String {
        self.render(&serde_json::json!({ "papers": records, "count": records.len() }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "model_server": {
                "url": status.ollama_url,
                "running": status.ollama_running,
                "model": status.model,
                "model_available": status.model_available,
            },
            "catalog": {
                "path": status.database_path,
                "ok": status.database_ok,
                "papers": status.record_count,
                "library": status.directory,
            }
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        self.render(&serde_json::json!({ "message": message }))
    }

    fn format_error(&self, error: &str) -> String {
        self.render(&serde_json::json!({ "error": error }))
    }
}

pub struct MarkdownFormatter;

/// Pipes would split a table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

impl Formatter for MarkdownFormatter {
    fn format_summary(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        writeln!(output, "## Scan Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Files found | {} |", summary.discovered).unwrap();
        writeln!(output, "| Recorded | {} |", summary.recorded).unwrap();
        writeln!(output, "| Already recorded | {} |", summary.already_recorded).unwrap();
        writeln!(output, "| Skipped | {} |", summary.skipped).unwrap();
        writeln!(output, "| Needs review | {} |", summary.needs_review).unwrap();
        writeln!(output, "| Failed | {} |", summary.failed).unwrap();
        writeln!(output, "| Duration | {}ms |", summary.duration_ms).unwrap();
        output
    }

    fn format_record(&self, record: &PaperRecord) -> String {
        let mut output = String::new();
        writeln!(output, "### {}\n", or_placeholder(&record.title, "No Title")).unwrap();
        writeln!(output, "- **Path:** `{}`", record.path).unwrap();
        writeln!(
            output,
            "- **Authors:** {}",
            or_placeholder(&record.authors_column(), "Unknown")
        )
        .unwrap();
        output
    }

    fn format_records(&self, records: &[PaperRecord]) -> String {
        if records.is_empty() {
            return "## Papers\n\n*No papers recorded.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Papers\n").unwrap();
        writeln!(output, "| Title | Authors | Path |").unwrap();
        writeln!(output, "|-------|---------|------|").unwrap();
        for record in records {
            writeln!(
                output,
                "| {} | {} | `{}` |",
                cell(or_placeholder(&record.title, "No Title")),
                cell(or_placeholder(&record.authors_column(), "Unknown")),
                record.path
            )
            .unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let server = if status.ollama_running { "✅" } else { "❌" };
        writeln!(output, "### Model Server {}\n", server).unwrap();
        writeln!(output, "- **URL:** `{}`", status.ollama_url).unwrap();
        let model = if status.model_available { "✅" } else { "❌" };
        writeln!(output, "- **Model:** {} {}", status.model, model).unwrap();
        writeln!(output).unwrap();

        let database = if status.database_ok { "✅" } else { "❌" };
        writeln!(output, "### Catalog {}\n", database).unwrap();
        writeln!(output, "- **Path:** `{}`", status.database_path).unwrap();
        writeln!(output, "- **Papers:** {}", status.record_count).unwrap();
        writeln!(output, "- **Library:** `{}`", status.directory).unwrap();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperMetadata;

    fn sample() -> PaperRecord {
        PaperRecord::new(
            "/papers/a.pdf",
            PaperMetadata::new(
                "Deep Learning for X",
                vec!["A. Smith".to_string(), "B. Jones".to_string()],
            ),
        )
    }

    #[test]
    fn test_text_summary_lists_counts() {
        let summary = RunSummary {
            discovered: 2,
            recorded: 1,
            skipped: 1,
            ..Default::default()
        };
        let text = TextFormatter.format_summary(&summary);
        assert!(text.contains("Files found:      2"));
        assert!(text.contains("Skipped:          1"));
    }

    #[test]
    fn test_json_record_round_trips() {
        let json = JsonFormatter::new(false).format_record(&sample());
        let parsed: PaperRecord = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_text_record_placeholders() {
        let blank = PaperRecord::new("/x.pdf", PaperMetadata::new("", Vec::new()));
        let text = TextFormatter.format_record(&blank);
        assert!(text.contains("(none)"));
        assert!(text.contains("(unknown)"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let mut record = sample();
        record.title = "A | B".to_string();
        let md = MarkdownFormatter.format_records(&[record]);
        assert!(md.contains("A \\| B"));
    }

    #[test]
    fn test_zero_summary_as_json() {
        let json = JsonFormatter::new(false).format_summary(&RunSummary::default());
        let value: serde_json::Value = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(value["discovered"], 0);
        assert_eq!(value["recorded"], 0);
        assert_eq!(value["failed"], 0);
    }

    #[test]
    fn test_error_rendering() {
        assert_eq!(TextFormatter.format_error("boom"), "Error: boom\n");
        let json = JsonFormatter::new(false).format_error("boom");
        let value: serde_json::Value = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(value["error"], "boom");
        assert!(MarkdownFormatter.format_error("boom").contains("**Error:** boom"));
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(TextFormatter.format_records(&[]), "No papers recorded.\n");
        assert!(MarkdownFormatter.format_records(&[]).contains("No papers recorded"));
    }
}
