// * Report renderers: JSON, HTML and CSV views of page analyses

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

use crate::engine::scorer::{recommendations_for, PageAnalysis};
use crate::generators::escape_xml;
use crate::persistence::history::MonitoringReport;

const CSV_HEADER: [&str; 5] = ["URL", "Type", "Priority", "Issue", "Suggestion"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Html,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("Unsupported report format: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV rendering failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Rendered report is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Renders analyses in the requested format. JSON of a single analysis is the bare object.
pub fn render(analyses: &[&PageAnalysis], format: ReportFormat) -> Result<String, RenderError> {
    match format {
        ReportFormat::Json => Ok(match analyses {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        }),
        ReportFormat::Html => Ok(render_html(analyses)),
        ReportFormat::Csv => render_csv(analyses),
    }
}

fn score_color(score: u8) -> &'static str {
    match score {
        80..=u8::MAX => "#28a745",
        60..=79 => "#ffc107",
        _ => "#dc3545",
    }
}

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:20px}\
.header{background:#f8f9fa;padding:20px;border-radius:5px}\
.section{margin:20px 0;padding:15px;border:1px solid #ddd;border-radius:5px}\
.issue{margin:10px 0;padding:10px;background:#f8f9fa;border-left:4px solid #007bff}\
.high{border-left-color:#dc3545}.medium{border-left-color:#ffc107}.low{border-left-color:#28a745}\
td,th{padding:4px 12px;text-align:left}";

fn write_analysis_html(out: &mut String, analysis: &PageAnalysis) {
    let url = escape_xml(&analysis.url);
    let _ = write!(
        out,
        "<div class=\"header\"><h2>{url}</h2><p><strong>Analysed:</strong> {}</p>\
<p><strong>Score:</strong> <span style=\"font-size:2em;color:{}\">{}/100</span></p></div>",
        analysis.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        score_color(analysis.score),
        analysis.score,
    );

    let b = &analysis.breakdown;
    let _ = write!(
        out,
        "<div class=\"section\"><h3>Breakdown</h3><table>\
<tr><th>Title</th><td>{}</td></tr><tr><th>Meta description</th><td>{}</td></tr>\
<tr><th>Headings</th><td>{}</td></tr><tr><th>Images</th><td>{}</td></tr>\
<tr><th>Social</th><td>{}</td></tr><tr><th>Structured data</th><td>{}</td></tr></table></div>",
        b.title, b.meta_description, b.headings, b.images, b.social, b.structured_data
    );

    out.push_str("<div class=\"section\"><h3>Issues</h3>");
    if analysis.issues.is_empty() {
        out.push_str("<p>No issues found.</p>");
    }
    for issue in &analysis.issues {
        let recs = recommendations_for(std::slice::from_ref(issue));
        let priority = recs.first().map(|r| r.priority.as_str()).unwrap_or("low");
        let _ = write!(out, "<div class=\"issue {}\"><strong>{}</strong>", priority, escape_xml(issue));
        for rec in &recs {
            let _ = write!(out, "<br><em>Suggestion: {}</em>", escape_xml(&rec.suggestion));
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

/// Standalone HTML document for one or more analyses
pub fn render_html(analyses: &[&PageAnalysis]) -> String {
    let title = match analyses {
        [single] => format!("SEO Report - {}", escape_xml(&single.url)),
        _ => format!("SEO Report - {} pages", analyses.len()),
    };
    let mut out = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );
    for analysis in analyses {
        write_analysis_html(&mut out, analysis);
    }
    out.push_str("\n</body>\n</html>\n");
    out
}

/// One row per (issue, recommendation); issues without a recommendation get empty cells
pub fn render_csv(analyses: &[&PageAnalysis]) -> Result<String, RenderError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for analysis in analyses {
        for issue in &analysis.issues {
            let recs = recommendations_for(std::slice::from_ref(issue));
            if recs.is_empty() {
                writer.write_record([analysis.url.as_str(), "", "", issue.as_str(), ""])?;
            }
            for rec in recs {
                writer.write_record([
                    analysis.url.as_str(),
                    rec.kind.as_str(),
                    rec.priority.as_str(),
                    issue.as_str(),
                    rec.suggestion.as_str(),
                ])?;
            }
        }
    }

    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// HTML digest of the monitoring summary, used for report mails
pub fn render_monitoring_html(report: &MonitoringReport) -> String {
    let s = &report.summary;
    let mut out = format!(
        "<html><body><h2>SEO Monitoring Report</h2><p>Generated {}</p><table>\
<tr><th>Total analyses</th><td>{}</td></tr><tr><th>Average score</th><td>{:.1}</td></tr>\
<tr><th>Tracked keywords</th><td>{}</td></tr><tr><th>Active alerts</th><td>{}</td></tr></table>",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        s.total_analyses,
        s.average_score,
        s.keyword_rankings,
        s.active_alerts,
    );

    if !report.recent_analyses.is_empty() {
        out.push_str("<h3>Recent analyses</h3><ul>");
        for a in &report.recent_analyses {
            let _ = write!(out, "<li>{}: {}/100</li>", escape_xml(&a.url), a.score);
        }
        out.push_str("</ul>");
    }
    if !report.alerts.is_empty() {
        out.push_str("<h3>Alerts</h3><ul>");
        for alert in &report.alerts {
            let _ = write!(out, "<li>[{}] {}</li>", alert.severity, escape_xml(&alert.message));
        }
        out.push_str("</ul>");
    }
    out.push_str("</body></html>");
    out
}
