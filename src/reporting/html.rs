//! Self-contained HTML report renderer.
//!
//! Produces a single HTML5 document with embedded CSS and no external
//! references, so it can be opened standalone or dropped into an inline
//! preview frame. Sections appear in a fixed order and every sequence keeps
//! its input order. Report text is HTML-escaped unless the caller opts into
//! trusted rich content.

use std::borrow::Cow;
use std::fmt::Write as FmtWrite;

use chrono::{DateTime, Local};

use crate::config::ReportConfig;
use crate::models::{AnalysisResult, Clock, Confidence, Reporter, SuggestedResponse};
use crate::RfpError;

pub const REPORT_TITLE: &str = "RFP Analysis Report";
pub const REPORT_SUBTITLE: &str = "Microsoft Dynamics 365 Competitive Response Pack";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// When `false`, report text is interpolated verbatim and may carry markup.
    pub escape_html: bool,
}

impl RenderOptions {
    /// Interpolate text verbatim. Only for content from a trusted source.
    pub fn trusted() -> Self {
        RenderOptions { escape_html: false }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions { escape_html: true }
    }
}

impl From<&ReportConfig> for RenderOptions {
    fn from(config: &ReportConfig) -> Self {
        RenderOptions {
            escape_html: config.escape_html,
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// HTML-escape a string to prevent markup injection.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn text<'a>(s: &'a str, options: &RenderOptions) -> Cow<'a, str> {
    if options.escape_html {
        Cow::Owned(html_escape(s))
    } else {
        Cow::Borrowed(s)
    }
}

/// CSS class for a confidence level. Each known level has its own rule.
pub fn confidence_class(c: &Confidence) -> &'static str {
    match c {
        Confidence::High => "confidence-high",
        Confidence::Medium => "confidence-medium",
        Confidence::Low => "confidence-low",
        Confidence::Unrecognized(_) => "confidence-unrated",
    }
}

/// Local calendar date as `M/D/YYYY`.
pub fn format_report_date(at: &DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

// ---------------------------------------------------------------------------
// HTML generation
// ---------------------------------------------------------------------------

/// Renders an analysis result as a complete HTML document.
///
/// Pure: the same `result`, `options` and `generated_at` always yield
/// byte-identical output.
pub fn render(
    result: &AnalysisResult,
    options: &RenderOptions,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::with_capacity(8192);

    // DOCTYPE + head
    writeln!(out, "<!DOCTYPE html>").unwrap();
    writeln!(out, "<html lang=\"en\">").unwrap();
    writeln!(out, "<head>").unwrap();
    writeln!(out, "<meta charset=\"UTF-8\">").unwrap();
    writeln!(
        out,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
    )
    .unwrap();
    writeln!(out, "<title>{REPORT_TITLE} - Dynamics 365</title>").unwrap();
    writeln!(out, "<style>{CSS}</style>").unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, "<body>").unwrap();
    writeln!(out, "<div class=\"container\">").unwrap();

    // 1. Title block
    writeln!(
        out,
        "<div class=\"header\">\
         <h1>{REPORT_TITLE}</h1>\
         <p class=\"subtitle\">{REPORT_SUBTITLE}</p>\
         <p class=\"generated\">Generated on {}</p>\
         </div>",
        format_report_date(&generated_at)
    )
    .unwrap();

    // 2. Executive summary
    write_text_section(
        &mut out,
        "Executive Summary",
        &text(&result.executive_summary, options),
    );

    // 3. Key requirements
    open_section(&mut out, "Key Requirements Identified");
    for req in &result.key_requirements {
        writeln!(
            out,
            "<div class=\"requirement\">\u{2713} {}</div>",
            text(req, options)
        )
        .unwrap();
    }
    close_section(&mut out);

    // 4. Advantages
    open_section(&mut out, "Dynamics 365 Key Advantages");
    for adv in &result.d365_advantages {
        writeln!(out, "<div class=\"advantage\">{}</div>", text(adv, options)).unwrap();
    }
    close_section(&mut out);

    // 5. Suggested responses
    open_section(&mut out, "Suggested Responses");
    for resp in &result.suggested_responses {
        write_response(&mut out, resp, options);
    }
    close_section(&mut out);

    // 6. Competitive insights
    open_section(&mut out, "Competitive Insights");
    for insight in &result.competitive_insights {
        writeln!(out, "<div class=\"insight\">{}</div>", text(insight, options)).unwrap();
    }
    close_section(&mut out);

    // 7. Architecture (left) | timeline (right)
    writeln!(out, "<div class=\"grid\">").unwrap();
    write_column(
        &mut out,
        "Architecture Recommendations",
        &text(&result.architecture_recommendations, options),
    );
    write_column(
        &mut out,
        "Implementation Timeline",
        &text(&result.implementation_timeline, options),
    );
    writeln!(out, "</div>").unwrap();

    // 8. Risk assessment
    write_text_section(
        &mut out,
        "Risk Assessment",
        &text(&result.risk_assessment, options),
    );

    writeln!(out, "</div>").unwrap();
    writeln!(out, "</body>").unwrap();
    writeln!(out, "</html>").unwrap();
    out
}

fn open_section(out: &mut String, heading: &str) {
    writeln!(out, "<div class=\"section\">").unwrap();
    writeln!(out, "<h2>{heading}</h2>").unwrap();
}

fn close_section(out: &mut String) {
    writeln!(out, "</div>").unwrap();
}

fn write_text_section(out: &mut String, heading: &str, body: &str) {
    open_section(out, heading);
    writeln!(out, "<div class=\"summary\"><p>{body}</p></div>").unwrap();
    close_section(out);
}

fn write_column(out: &mut String, heading: &str, body: &str) {
    writeln!(
        out,
        "<div>\
         <h2>{heading}</h2>\
         <div class=\"summary\"><p>{body}</p></div>\
         </div>"
    )
    .unwrap();
}

fn write_response(out: &mut String, resp: &SuggestedResponse, options: &RenderOptions) {
    let label = match &resp.confidence {
        Confidence::Unrecognized(raw) if raw.trim().is_empty() => Cow::Borrowed("unrated"),
        // Unknown values are always escaped; they never carry trusted markup.
        Confidence::Unrecognized(raw) => Cow::Owned(html_escape(raw)),
        known => Cow::Borrowed(known.as_str()),
    };
    writeln!(
        out,
        "<div class=\"response\">\
         <h3>{} <span class=\"{}\">{label} confidence</span></h3>\
         <p>{}</p>\
         </div>",
        text(&resp.requirement, options),
        confidence_class(&resp.confidence),
        text(&resp.response, options),
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Embedded CSS
// ---------------------------------------------------------------------------

const CSS: &str = r#"
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; line-height: 1.6;
  margin: 0; padding: 20px; background: #f8fafc; }
.container { max-width: 1200px; margin: 0 auto; background: white; padding: 40px;
  border-radius: 12px; box-shadow: 0 4px 20px rgba(0,0,0,0.1); }
h1 { color: #1e293b; font-size: 2.5rem; margin-bottom: 10px;
  border-bottom: 3px solid #3b82f6; padding-bottom: 10px; }
h2 { color: #334155; font-size: 1.8rem; margin: 30px 0 15px 0; }
h3 { color: #475569; font-size: 1.3rem; margin: 25px 0 10px 0; }
.summary { background: #f1f5f9; padding: 20px; border-radius: 8px; margin: 20px 0;
  border-left: 4px solid #3b82f6; }
.requirement { background: #ecfdf5; padding: 12px; margin: 8px 0; border-radius: 6px;
  border-left: 3px solid #10b981; }
.advantage { background: #eff6ff; padding: 15px; margin: 10px 0; border-radius: 8px;
  border-left: 4px solid #2563eb; }
.insight { background: #fef7ff; padding: 15px; margin: 10px 0; border-radius: 8px;
  border-left: 4px solid #9333ea; }
.response { background: #fff7ed; padding: 15px; margin: 15px 0; border-radius: 8px;
  border-left: 4px solid #ea580c; }
.confidence-high { background: #dcfce7; color: #15803d; padding: 4px 8px;
  border-radius: 4px; font-size: 0.9rem; }
.confidence-medium { background: #fef3c7; color: #d97706; padding: 4px 8px;
  border-radius: 4px; font-size: 0.9rem; }
.confidence-low { background: #fee2e2; color: #dc2626; padding: 4px 8px;
  border-radius: 4px; font-size: 0.9rem; }
.confidence-unrated { background: #e2e8f0; color: #475569; padding: 4px 8px;
  border-radius: 4px; font-size: 0.9rem; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; margin: 20px 0; }
@media (max-width: 768px) { .grid { grid-template-columns: 1fr; } }
.section { margin: 30px 0; }
.header { text-align: center; margin-bottom: 40px; }
.subtitle { color: #64748b; font-size: 1.2rem; margin-top: 10px; }
.generated { color: #64748b; }
"#;

// ---------------------------------------------------------------------------
// HtmlReporter
// ---------------------------------------------------------------------------

/// Standalone HTML reporter for sharing and archiving analysis results.
pub struct HtmlReporter;

impl Reporter for HtmlReporter {
    fn format_name(&self) -> &str {
        "html"
    }

    fn render(
        &self,
        result: &AnalysisResult,
        config: &ReportConfig,
        clock: &dyn Clock,
    ) -> Result<String, RfpError> {
        Ok(render(result, &RenderOptions::from(config), clock.now()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
