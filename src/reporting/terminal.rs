//! ANSI-colored terminal reporter.
//!
//! Prints the analysis as a readable outline. Colors are disabled when
//! stdout is not a TTY, when writing to a file, or when `NO_COLOR` is set.
//! Quiet verbosity prints only the headline counts; normal verbosity lists
//! every item; verbose verbosity adds full response text.

use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};

use crate::config::{ReportConfig, Verbosity};
use crate::models::{AnalysisResult, Clock, Confidence, Reporter};
use crate::RfpError;

// ---------------------------------------------------------------------------
// ANSI escape codes
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Returns `true` when ANSI color output should be used.
fn use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}

fn confidence_color(c: &Confidence, color: bool) -> (&'static str, &'static str) {
    if !color {
        return ("", "");
    }
    match c {
        Confidence::High => ("\x1b[32m\x1b[1m", RESET), // green+bold
        Confidence::Medium => ("\x1b[33m", RESET),      // yellow
        Confidence::Low => ("\x1b[31m", RESET),         // red
        Confidence::Unrecognized(_) => ("\x1b[2m\x1b[90m", RESET),
    }
}

fn confidence_tag(c: &Confidence) -> &'static str {
    match c {
        Confidence::High => "HIGH",
        Confidence::Medium => "MED",
        Confidence::Low => "LOW",
        Confidence::Unrecognized(_) => "??",
    }
}

/// Truncates to `max` characters, appending an ellipsis when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}\u{2026}", cut.trim_end())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub(crate) fn format_terminal(
    result: &AnalysisResult,
    config: &ReportConfig,
    clock: &dyn Clock,
    color: bool,
) -> String {
    let (b, d, r) = if color { (BOLD, DIM, RESET) } else { ("", "", "") };
    let mut out = String::new();

    writeln!(
        out,
        "\n{b}── RFP Analysis Report ──{r}  {d}{}{r}",
        clock.now().format("%Y-%m-%d %H:%M")
    )
    .unwrap();
    writeln!(
        out,
        "Requirements: {}  |  Advantages: {}  |  Insights: {}  |  Responses: {}",
        result.key_requirements.len(),
        result.d365_advantages.len(),
        result.competitive_insights.len(),
        result.suggested_responses.len(),
    )
    .unwrap();

    if config.verbosity == Verbosity::Quiet {
        return out;
    }

    let summary_width = if config.verbosity == Verbosity::Verbose {
        usize::MAX
    } else {
        240
    };

    write_heading(&mut out, "Executive Summary", b, r);
    writeln!(out, "  {}", truncate(&result.executive_summary, summary_width)).unwrap();

    write_list(&mut out, "Key Requirements", &result.key_requirements, "\u{2713}", b, r);
    write_list(&mut out, "Dynamics 365 Advantages", &result.d365_advantages, "+", b, r);

    write_heading(&mut out, "Suggested Responses", b, r);
    for resp in &result.suggested_responses {
        let (cs, ce) = confidence_color(&resp.confidence, color);
        writeln!(
            out,
            "  {cs}[{}]{ce} {}",
            confidence_tag(&resp.confidence),
            resp.requirement
        )
        .unwrap();
        if config.verbosity == Verbosity::Verbose {
            writeln!(out, "        {d}{}{r}", resp.response).unwrap();
        }
    }

    write_list(&mut out, "Competitive Insights", &result.competitive_insights, "*", b, r);

    write_heading(&mut out, "Architecture Recommendations", b, r);
    writeln!(out, "  {}", truncate(&result.architecture_recommendations, summary_width)).unwrap();
    write_heading(&mut out, "Implementation Timeline", b, r);
    writeln!(out, "  {}", truncate(&result.implementation_timeline, summary_width)).unwrap();
    write_heading(&mut out, "Risk Assessment", b, r);
    writeln!(out, "  {}", truncate(&result.risk_assessment, summary_width)).unwrap();

    out
}

fn write_heading(out: &mut String, title: &str, b: &str, r: &str) {
    writeln!(out, "\n{b}{title}{r}").unwrap();
}

fn write_list(out: &mut String, title: &str, items: &[String], bullet: &str, b: &str, r: &str) {
    write_heading(out, title, b, r);
    if items.is_empty() {
        writeln!(out, "  (none)").unwrap();
    }
    for item in items {
        writeln!(out, "  {bullet} {item}").unwrap();
    }
}

// ---------------------------------------------------------------------------
// TerminalReporter
// ---------------------------------------------------------------------------

/// Human-readable outline of an analysis for the console.
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn format_name(&self) -> &str {
        "terminal"
    }

    fn render(
        &self,
        result: &AnalysisResult,
        config: &ReportConfig,
        clock: &dyn Clock,
    ) -> Result<String, RfpError> {
        let color = use_color() && config.output_path.is_none();
        Ok(format_terminal(result, config, clock, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FixedClock, SuggestedResponse};
    use chrono::{Local, TimeZone};

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap())
    }

    fn sample() -> AnalysisResult {
        AnalysisResult {
            executive_summary: "Modernize the legacy ERP".into(),
            key_requirements: vec!["Inventory".into(), "Reporting".into()],
            d365_advantages: vec![],
            competitive_insights: vec!["SAP costs more".into()],
            suggested_responses: vec![SuggestedResponse {
                requirement: "Inventory".into(),
                response: "Real-time visibility".into(),
                confidence: Confidence::Medium,
            }],
            architecture_recommendations: "Phased cloud".into(),
            implementation_timeline: "13 months".into(),
            risk_assessment: "Low".into(),
        }
    }

    fn config(verbosity: Verbosity) -> ReportConfig {
        ReportConfig {
            verbosity,
            ..ReportConfig::default()
        }
    }

    #[test]
    fn normal_lists_items_without_color() {
        let out = format_terminal(&sample(), &config(Verbosity::Normal), &clock(), false);
        assert!(out.contains("── RFP Analysis Report ──  2024-03-07 09:05"));
        assert!(out.contains("Requirements: 2  |  Advantages: 0"));
        assert!(out.contains("  \u{2713} Inventory\n  \u{2713} Reporting"));
        assert!(out.contains("[MED] Inventory"));
        assert!(out.contains("(none)"));
        assert!(!out.contains("Real-time visibility"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn quiet_prints_only_counts() {
        let out = format_terminal(&sample(), &config(Verbosity::Quiet), &clock(), false);
        assert!(out.contains("Responses: 1"));
        assert!(!out.contains("Executive Summary"));
    }

    #[test]
    fn verbose_includes_response_text() {
        let out = format_terminal(&sample(), &config(Verbosity::Verbose), &clock(), false);
        assert!(out.contains("Real-time visibility"));
    }

    #[test]
    fn color_wraps_confidence_tag() {
        let out = format_terminal(&sample(), &config(Verbosity::Normal), &clock(), true);
        assert!(out.contains("\x1b[33m[MED]\x1b[0m"));
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd\u{2026}");
    }
}
