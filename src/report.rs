use std::collections::BTreeMap;

use crate::diagnose::{Report, Severity};
use crate::registry::Registry;

/// Output shape for the operator report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Text,
    Html,
    Json,
}

impl Format {
    pub fn parse(raw: &str) -> Result<Format, String> {
        match raw.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Format::Text),
            "html" => Ok(Format::Html),
            "json" => Ok(Format::Json),
            other => Err(format!(
                "Unknown report format '{other}' (expected text, html or json)"
            )),
        }
    }
}

impl Registry {
    /// Render the diagnosis plus the full path listing for operators.
    /// A read-only projection; nothing is touched.
    pub fn create_report(&self, format: Format) -> String {
        let report = self.diagnose();
        let paths: BTreeMap<String, String> = self
            .get_all_paths()
            .into_iter()
            .map(|(key, path)| (key, path.display().to_string()))
            .collect();
        match format {
            Format::Text => render_text(&report, &paths),
            Format::Html => render_html(&report, &paths),
            Format::Json => render_json(&report, &paths),
        }
    }
}

fn render_text(report: &Report, paths: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("wayfinder path report\n");
    out.push_str(&format!("generated: {}\n", report.timestamp));
    out.push_str(&format!("status: {}\n\n", report.status));

    out.push_str("Paths\n");
    for (key, path) in paths {
        out.push_str(&format!("  {key:<20} {path}\n"));
    }

    out.push_str("\nIssues\n");
    if report.issues.is_empty() {
        out.push_str("  none\n");
    } else {
        for issue in &report.issues {
            out.push_str(&format!(
                "  [{}] {}: {} ({})\n",
                severity_label(issue.severity),
                issue.key,
                issue.kind,
                issue.path
            ));
            out.push_str(&format!("      fix: {}\n", issue.suggested_fix));
        }
    }

    out.push_str(&format!(
        "\nTotals: {} paths, {} missing, {} type mismatches, {} permission problems, {} missing keys\n",
        report.stats.total,
        report.stats.missing,
        report.stats.type_mismatches,
        report.stats.permission_issues,
        report.stats.missing_keys
    ));
    out
}

fn render_html(report: &Report, paths: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>wayfinder path report</title>\n");
    out.push_str(
        "<style>body{font-family:sans-serif;margin:2em}table{border-collapse:collapse}\
         td,th{border:1px solid #ccc;padding:4px 8px;text-align:left}\
         .high{color:#b00}.medium{color:#b60}</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str("<h1>wayfinder path report</h1>\n");
    out.push_str(&format!(
        "<p>generated {} — status <strong>{}</strong></p>\n",
        escape(&report.timestamp),
        escape(&report.status)
    ));

    out.push_str("<h2>Paths</h2>\n<table>\n<tr><th>Key</th><th>Location</th></tr>\n");
    for (key, path) in paths {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(key),
            escape(path)
        ));
    }
    out.push_str("</table>\n");

    out.push_str("<h2>Issues</h2>\n");
    if report.issues.is_empty() {
        out.push_str("<p>none</p>\n");
    } else {
        out.push_str(
            "<table>\n<tr><th>Severity</th><th>Key</th><th>Problem</th><th>Suggested fix</th></tr>\n",
        );
        for issue in &report.issues {
            let class = severity_label(issue.severity);
            out.push_str(&format!(
                "<tr><td class=\"{class}\">{class}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&issue.key),
                escape(&format!("{} ({})", issue.kind, issue.path)),
                escape(&issue.suggested_fix)
            ));
        }
        out.push_str("</table>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_json(report: &Report, paths: &BTreeMap<String, String>) -> String {
    let doc = serde_json::json!({
        "report": report,
        "paths": paths,
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "high",
        Severity::Medium => "medium",
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;
    use tempfile::tempdir;

    fn sample_registry() -> (tempfile::TempDir, Registry) {
        let tmp = tempdir().unwrap();
        let registry = Registry::new(Defaults::rooted_at(tmp.path()));
        registry.register_path("DATA_DIR", tmp.path());
        registry.register_path("STRAY_DIR", tmp.path().join("stray"));
        (tmp, registry)
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(Format::parse("text"), Ok(Format::Text));
        assert_eq!(Format::parse("HTML"), Ok(Format::Html));
        assert_eq!(Format::parse("json"), Ok(Format::Json));
        assert!(Format::parse("pdf").is_err());
    }

    #[test]
    fn text_report_lists_paths_and_issues() {
        let (_tmp, registry) = sample_registry();
        let report = registry.create_report(Format::Text);
        assert!(report.contains("DATA_DIR"));
        assert!(report.contains("STRAY_DIR"));
        assert!(report.contains("missing directory"));
        assert!(report.contains("Totals:"));
    }

    #[test]
    fn html_report_is_a_document() {
        let (_tmp, registry) = sample_registry();
        let report = registry.create_report(Format::Html);
        assert!(report.starts_with("<!DOCTYPE html>"));
        assert!(report.contains("<td>DATA_DIR</td>"));
        assert!(report.ends_with("</html>\n"));
    }

    #[test]
    fn json_report_round_trips() {
        let (_tmp, registry) = sample_registry();
        let report = registry.create_report(Format::Json);
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert!(value.get("report").is_some());
        assert!(value["paths"].get("DATA_DIR").is_some());
        assert_eq!(value["report"]["status"], "issues_found");
    }

    #[test]
    fn html_escapes_path_content() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
